pub mod error;
pub mod event_source;
pub mod ingest;
pub mod inputs;
pub mod main_app;
pub mod navigation;
pub mod notification;
pub mod panic_handler;
pub mod sequence;
pub mod session;
pub mod settings;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use error::{IngestError, Result};
pub use ingest::{FolderSource, PdfImageExtractor, TempWorkspace};
pub use main_app::{App, run_app_with_event_source};
pub use navigation::{Gesture, PageCursor, ReadingDirection, gesture_delta};
pub use sequence::{ImagePath, ImageSequence};
pub use session::{PageDisplay, PageView, ReadingSession};
