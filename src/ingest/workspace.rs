use log::{debug, error, info};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tempfile::{Builder, TempDir};

use crate::error::{IngestError, Result};

const WORKSPACE_PREFIX: &str = "mangaview-";

/// Scratch directory that holds images extracted from PDFs.
///
/// The directory is created on construction, recreated by [`reset`](Self::reset)
/// before every PDF ingestion and removed by [`cleanup`](Self::cleanup) or on drop.
/// Every reset hands out a fresh directory, so paths from an earlier extraction
/// never point at files of a later one.
#[derive(Debug)]
pub struct TempWorkspace {
    parent: PathBuf,
    dir: Option<TempDir>,
}

impl TempWorkspace {
    /// Create a workspace under the system temp directory
    pub fn new() -> Result<Self> {
        Self::new_in(std::env::temp_dir())
    }

    pub fn new_in(parent: impl Into<PathBuf>) -> Result<Self> {
        let mut workspace = Self {
            parent: parent.into(),
            dir: None,
        };
        workspace.create()?;
        Ok(workspace)
    }

    /// Root of the live workspace, `None` after cleanup
    pub fn path(&self) -> Option<&Path> {
        self.dir.as_ref().map(TempDir::path)
    }

    pub fn parent(&self) -> &Path {
        &self.parent
    }

    /// Wipe the current directory tree and start a new, empty one
    pub fn reset(&mut self) -> Result<&Path> {
        self.cleanup();
        self.create()
    }

    /// Remove the workspace directory. Safe to call repeatedly; failures are logged.
    pub fn cleanup(&mut self) {
        let Some(dir) = self.dir.take() else {
            return;
        };
        let path = dir.path().to_path_buf();
        debug!("Removing workspace {path:?}");
        match dir.close() {
            Ok(()) => info!("Workspace {path:?} cleaned up"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("Workspace {path:?} was already gone")
            }
            Err(e) => error!("Failed to clean up workspace {path:?}: {e}"),
        }
    }

    fn create(&mut self) -> Result<&Path> {
        fs::create_dir_all(&self.parent).map_err(|e| IngestError::io(&self.parent, e))?;
        let dir = Builder::new()
            .prefix(WORKSPACE_PREFIX)
            .tempdir_in(&self.parent)
            .map_err(|e| IngestError::io(&self.parent, e))?;
        debug!("Created workspace {:?}", dir.path());
        Ok(self.dir.insert(dir).path())
    }
}

impl Drop for TempWorkspace {
    fn drop(&mut self) {
        self.cleanup();
    }
}
