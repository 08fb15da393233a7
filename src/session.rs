use log::{info, warn};
use std::fs::File;
use std::path::{Path, PathBuf};

use crate::error::{IngestError, Result};
use crate::ingest::{FolderSource, PdfImageExtractor, TempWorkspace};
use crate::navigation::{Gesture, PageCursor, ReadingDirection};
use crate::sequence::{ImagePath, ImageSequence};

/// Where the current sequence came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceKind {
    Folder(PathBuf),
    Pdf(PathBuf),
}

impl SourceKind {
    pub fn path(&self) -> &Path {
        match self {
            SourceKind::Folder(path) | SourceKind::Pdf(path) => path,
        }
    }
}

/// Snapshot handed to the display whenever the visible page changes
#[derive(Debug, Clone, Copy)]
pub struct PageView<'a> {
    pub image: Option<&'a ImagePath>,
    pub index: Option<usize>,
    pub len: usize,
    pub direction: ReadingDirection,
}

/// The collaborator that puts pages on screen
pub trait PageDisplay {
    fn refresh(&mut self, view: PageView<'_>);

    fn direction_changed(&mut self, _direction: ReadingDirection) {}
}

/// Display that ignores every notification
#[derive(Debug, Default, Clone, Copy)]
pub struct NullDisplay;

impl PageDisplay for NullDisplay {
    fn refresh(&mut self, _view: PageView<'_>) {}
}

/// Sequence, cursor and reading direction behind a single owner.
///
/// Installing a sequence always resets the cursor to the first page. Paths of
/// images extracted from a PDF are only valid until the next PDF load or
/// workspace cleanup; the session drops such sequences when that happens.
pub struct ReadingSession<D: PageDisplay = NullDisplay> {
    workspace: TempWorkspace,
    folders: FolderSource,
    extractor: PdfImageExtractor,
    sequence: ImageSequence,
    cursor: PageCursor,
    direction: ReadingDirection,
    source: Option<SourceKind>,
    display: D,
}

impl ReadingSession<NullDisplay> {
    pub fn new(workspace: TempWorkspace) -> Self {
        Self::with_display(workspace, NullDisplay)
    }
}

impl<D: PageDisplay> ReadingSession<D> {
    pub fn with_display(workspace: TempWorkspace, display: D) -> Self {
        Self {
            workspace,
            folders: FolderSource::new(),
            extractor: PdfImageExtractor::new(),
            sequence: ImageSequence::new(),
            cursor: PageCursor::default(),
            direction: ReadingDirection::default(),
            source: None,
            display,
        }
    }

    /// Replace the sequence with the images of a folder.
    ///
    /// On error the previous sequence stays in place.
    pub fn load_folder(&mut self, dir: impl AsRef<Path>) -> Result<()> {
        let dir = dir.as_ref();
        let sequence = self.folders.scan(dir)?;
        info!("Opened folder {dir:?} with {} images", sequence.len());
        self.install(sequence, Some(SourceKind::Folder(dir.to_path_buf())));
        Ok(())
    }

    /// Replace the sequence with the images embedded in a PDF.
    ///
    /// A PDF that cannot be opened leaves the session untouched, like a failed
    /// folder load. Otherwise the workspace is recreated first; if extraction
    /// fails part-way, the images written before the failure are installed and
    /// the error is returned.
    pub fn load_pdf(&mut self, file: impl AsRef<Path>) -> Result<()> {
        let file = file.as_ref();
        File::open(file).map_err(|e| IngestError::io(file, e))?;
        if let Err(e) = self.workspace.reset() {
            self.drop_extracted_sequence();
            return Err(e);
        }

        let mut sequence = ImageSequence::new();
        let outcome = self
            .extractor
            .extract_into(file, &self.workspace, &mut sequence);
        match &outcome {
            Ok(count) => info!("Opened PDF {file:?} with {count} images"),
            Err(e) => warn!(
                "PDF {file:?} loaded with {} images before failure: {e}",
                sequence.len()
            ),
        }
        self.install(sequence, Some(SourceKind::Pdf(file.to_path_buf())));
        outcome.map(|_| ())
    }

    /// Flip the reading direction. The current page stays where it is.
    pub fn toggle_direction(&mut self) {
        self.direction = self.direction.toggled();
        info!("Reading direction: {}", self.direction.as_str());
        self.display.direction_changed(self.direction);
    }

    pub fn set_direction(&mut self, direction: ReadingDirection) {
        if self.direction != direction {
            self.toggle_direction();
        }
    }

    /// Apply a gesture; the display is refreshed only when the page changes
    pub fn navigate(&mut self, gesture: Gesture) {
        if self.cursor.advance_by_gesture(gesture, self.direction) {
            self.notify();
        }
    }

    pub fn current_image(&self) -> Option<&ImagePath> {
        self.cursor
            .current()
            .and_then(|index| self.sequence.get(index))
    }

    pub fn current_index(&self) -> Option<usize> {
        self.cursor.current()
    }

    pub fn sequence_len(&self) -> usize {
        self.sequence.len()
    }

    pub fn sequence(&self) -> &ImageSequence {
        &self.sequence
    }

    pub fn direction(&self) -> ReadingDirection {
        self.direction
    }

    pub fn source(&self) -> Option<&SourceKind> {
        self.source.as_ref()
    }

    pub fn workspace(&self) -> &TempWorkspace {
        &self.workspace
    }

    pub fn display(&self) -> &D {
        &self.display
    }

    pub fn display_mut(&mut self) -> &mut D {
        &mut self.display
    }

    /// Release extracted files. Runs before each PDF load and at shutdown;
    /// calling it again is harmless.
    pub fn cleanup_workspace(&mut self) {
        self.workspace.cleanup();
        self.drop_extracted_sequence();
    }

    pub fn view(&self) -> PageView<'_> {
        PageView {
            image: self.current_image(),
            index: self.cursor.current(),
            len: self.sequence.len(),
            direction: self.direction,
        }
    }

    fn drop_extracted_sequence(&mut self) {
        if matches!(self.source, Some(SourceKind::Pdf(_))) {
            self.install(ImageSequence::new(), None);
        }
    }

    fn install(&mut self, sequence: ImageSequence, source: Option<SourceKind>) {
        self.cursor.reset(sequence.len());
        self.sequence = sequence;
        self.source = source;
        self.notify();
    }

    fn notify(&mut self) {
        let view = PageView {
            image: self.cursor.current().and_then(|i| self.sequence.get(i)),
            index: self.cursor.current(),
            len: self.sequence.len(),
            direction: self.direction,
        };
        self.display.refresh(view);
    }
}
