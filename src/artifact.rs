use std::path::Path;

use crate::helpers::temp_file::TempFile;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    Image,
    Video,
    Audio,
    Archive,
}

/// A finished file ready to be sent. Dropping it deletes the file.
#[derive(Debug)]
pub struct MediaArtifact {
    file: TempFile,
    kind: ArtifactKind,
    size: u64,
    display_name: Option<String>,
}
impl MediaArtifact {
    /// Take ownership of a written file. On error the file is removed.
    pub async fn from_file(file: TempFile, kind: ArtifactKind) -> std::io::Result<Self> {
        let size = tokio::fs::metadata(file.path()).await?.len();

        Ok(Self {
            file,
            kind,
            size,
            display_name: None,
        })
    }

    #[must_use]
    pub fn with_display_name<T: Into<String>>(mut self, name: T) -> Self {
        self.display_name = Some(name.into());
        self
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    pub const fn kind(&self) -> ArtifactKind {
        self.kind
    }

    pub const fn size(&self) -> u64 {
        self.size
    }

    pub fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }

    #[allow(clippy::cast_precision_loss)]
    pub fn size_mb(&self) -> f64 {
        self.size as f64 / (1024.0 * 1024.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn measures_and_deletes() {
        let root = tempfile::tempdir().expect("tempdir");
        let path = root.path().join("a.zip");
        std::fs::write(&path, vec![0_u8; 1024 * 1024 + 10]).expect("write");

        let artifact = MediaArtifact::from_file(TempFile::new(&path), ArtifactKind::Archive)
            .await
            .expect("artifact");
        assert_eq!(artifact.size(), 1024 * 1024 + 10);
        assert!(artifact.size_mb() > 1.0);

        drop(artifact);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn missing_file_is_an_error() {
        let root = tempfile::tempdir().expect("tempdir");
        let res =
            MediaArtifact::from_file(TempFile::new(root.path().join("nope")), ArtifactKind::Image)
                .await;
        assert!(res.is_err());
    }
}
