//! Errors raised while building an image sequence

use std::io;
use std::path::{Path, PathBuf};

/// Failure of an ingestion step (folder scan, PDF extraction, workspace setup)
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("I/O error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot parse {}: {detail}", .path.display())]
    Parse { path: PathBuf, detail: String },
}

impl IngestError {
    pub fn io(path: impl AsRef<Path>, source: io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    pub fn parse(path: impl AsRef<Path>, detail: impl Into<String>) -> Self {
        Self::Parse {
            path: path.as_ref().to_path_buf(),
            detail: detail.into(),
        }
    }

    pub fn is_io(&self) -> bool {
        matches!(self, Self::Io { .. })
    }

    pub fn is_parse(&self) -> bool {
        matches!(self, Self::Parse { .. })
    }

    pub fn path(&self) -> &Path {
        match self {
            Self::Io { path, .. } | Self::Parse { path, .. } => path,
        }
    }
}

pub type Result<T> = std::result::Result<T, IngestError>;
