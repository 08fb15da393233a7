//! Building image sequences from folders and PDFs

mod folder;
mod pdf;
mod workspace;

pub use folder::{FolderSource, IMAGE_EXTENSIONS};
pub use pdf::PdfImageExtractor;
pub use workspace::TempWorkspace;

use std::path::Path;

/// Whether a path names a PDF file (by extension, case-insensitive)
pub fn is_pdf(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.eq_ignore_ascii_case("pdf"))
        .unwrap_or(false)
}
