use log::{debug, info};
use std::ffi::OsString;
use std::fs;
use std::path::Path;

use crate::error::{IngestError, Result};
use crate::sequence::{ImagePath, ImageSequence};

/// Extensions accepted by folder ingestion (matched case-insensitively)
pub const IMAGE_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "webp"];

/// Builds an image sequence from the files directly inside a directory
#[derive(Debug, Clone)]
pub struct FolderSource {
    suffixes: Vec<String>,
}

impl Default for FolderSource {
    fn default() -> Self {
        Self::new()
    }
}

impl FolderSource {
    pub fn new() -> Self {
        Self {
            suffixes: IMAGE_EXTENSIONS.iter().map(|ext| format!(".{ext}")).collect(),
        }
    }

    /// Whether a file name ends with one of the allow-listed extensions
    pub fn accepts(&self, file_name: &str) -> bool {
        let lower = file_name.to_lowercase();
        self.suffixes.iter().any(|suffix| lower.ends_with(suffix.as_str()))
    }

    /// List matching files sorted by file name. Subdirectories are skipped, not entered.
    pub fn scan(&self, dir: &Path) -> Result<ImageSequence> {
        let entries = fs::read_dir(dir).map_err(|e| IngestError::io(dir, e))?;

        let mut names: Vec<OsString> = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| IngestError::io(dir, e))?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let name = entry.file_name();
            if self.accepts(&name.to_string_lossy()) {
                names.push(name);
            } else {
                debug!("Skipping {path:?}");
            }
        }
        names.sort();

        info!("Found {} images in {dir:?}", names.len());
        Ok(names
            .into_iter()
            .map(|name| ImagePath::new(dir.join(name)))
            .collect())
    }
}
