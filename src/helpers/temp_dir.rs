use std::{
    ffi::OsString,
    fs,
    path::{Path, PathBuf},
};

use tracing::{trace, warn};

/// Directory that is removed, with everything inside it, when dropped.
#[derive(Debug)]
pub struct TempDir {
    path: PathBuf,
}
impl TempDir {
    pub async fn new<T: Into<OsString>>(root: &Path, dir_name: T) -> Result<Self, std::io::Error> {
        let path = root.join(dir_name.into());

        tokio::fs::create_dir_all(&path).await?;
        trace!(?path, "Created temp dir");

        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempDir {
    fn drop(&mut self) {
        match fs::remove_dir_all(&self.path) {
            Ok(()) => trace!(path = ?self.path, "Removed temp dir"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = ?self.path, ?e, "Failed to remove temp dir"),
        }
    }
}
