use std::path::{Path, PathBuf};

use tracing::{trace, warn};

/// Path to a file that is deleted when the guard is dropped.
///
/// The file does not need to exist yet; guards are usually taken before
/// writing so that a failed write still gets cleaned up.
#[derive(Debug)]
pub struct TempFile {
    path: PathBuf,
}
impl TempFile {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempFile {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => trace!(path = ?self.path, "Removed temp file"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = ?self.path, ?e, "Failed to remove temp file"),
        }
    }
}
