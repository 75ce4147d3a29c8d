//! Temporary file cleanup
//!
//! Provider outputs live on local disk only until they are uploaded.
//! [`TempFiles`] owns those paths for the duration of a separation and
//! deletes whatever is still registered when it goes out of scope, so a
//! cancelled request (client disconnect, timeout) leaves nothing behind.

use std::io::ErrorKind;
use std::mem;
use std::path::{Path, PathBuf};

/// Set of local files deleted on drop unless released
#[derive(Debug, Default)]
pub struct TempFiles {
    paths: Vec<PathBuf>,
}

impl TempFiles {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `path` for deletion
    pub fn track(&mut self, path: impl Into<PathBuf>) {
        self.paths.push(path.into());
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Hand the registered paths to the caller; nothing is deleted
    pub fn release(mut self) -> Vec<PathBuf> {
        mem::take(&mut self.paths)
    }

    /// Delete every registered file now, logging failures
    pub async fn remove_all(mut self) {
        for path in mem::take(&mut self.paths) {
            match tokio::fs::remove_file(&path).await {
                Ok(()) => tracing::debug!(path = %path.display(), "Removed temporary file"),
                Err(e) => log_failure(&path, &e),
            }
        }
    }
}

impl Drop for TempFiles {
    fn drop(&mut self) {
        for path in self.paths.drain(..) {
            match std::fs::remove_file(&path) {
                Ok(()) => tracing::debug!(path = %path.display(), "Removed abandoned temporary file"),
                Err(e) => log_failure(&path, &e),
            }
        }
    }
}

fn log_failure(path: &Path, e: &std::io::Error) {
    if e.kind() == ErrorKind::NotFound {
        tracing::debug!(path = %path.display(), "Temporary file already gone");
    } else {
        tracing::warn!(path = %path.display(), error = %e, "Failed to remove temporary file");
    }
}
