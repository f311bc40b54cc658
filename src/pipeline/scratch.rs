//! Per-render scratch directories.

use crate::error::Result;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A uniquely named working directory owned by one render attempt.
///
/// The directory is removed when the guard is dropped, on success and on
/// every error path, unless it was created with `retain`. Removal failures
/// are logged and never propagated.
#[derive(Debug)]
pub struct ScratchDir {
    dir: Option<TempDir>,
    path: PathBuf,
    retain: bool,
}

impl ScratchDir {
    /// Create a fresh directory under the system temp directory.
    pub fn create(prefix: &str, retain: bool) -> Result<Self> {
        let dir = tempfile::Builder::new().prefix(prefix).tempdir()?;
        let path = dir.path().to_path_buf();
        log::debug!("created scratch directory {}", path.display());
        Ok(Self {
            dir: Some(dir),
            path,
            retain,
        })
    }

    /// Directory path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path of a file inside the directory.
    pub fn join(&self, name: impl AsRef<Path>) -> PathBuf {
        self.path.join(name)
    }

    /// Whether the directory outlives the guard.
    pub fn is_retained(&self) -> bool {
        self.retain
    }

    fn release(&mut self) {
        let Some(dir) = self.dir.take() else {
            return;
        };

        if self.retain {
            #[allow(deprecated)]
            let kept = dir.into_path();
            log::info!("intermediate files kept in {}", kept.display());
            return;
        }

        if let Err(e) = dir.close() {
            log::error!(
                "failed to remove scratch directory {}: {}",
                self.path.display(),
                e
            );
        }
    }
}

impl Drop for ScratchDir {
    fn drop(&mut self) {
        self.release();
    }
}
