use tracing::{debug, info};

use crate::{artifact::MediaArtifact, error::PipelineError};

/// Refuses artifacts that the transport would reject for being too large.
#[derive(Debug, Clone, Copy)]
pub struct SizeGate {
    ceiling_mb: f64,
}
impl SizeGate {
    pub const fn new(ceiling_mb: f64) -> Self {
        Self { ceiling_mb }
    }

    pub fn check(&self, artifact: &MediaArtifact) -> Result<(), PipelineError> {
        let megabytes = artifact.size_mb();

        if megabytes < self.ceiling_mb {
            debug!(megabytes, ceiling = self.ceiling_mb, "Artifact fits");
            Ok(())
        } else {
            info!(megabytes, ceiling = self.ceiling_mb, "Artifact too large to send");
            Err(PipelineError::SizeExceeded { megabytes })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{artifact::ArtifactKind, helpers::temp_file::TempFile};

    async fn artifact_of(bytes: usize, dir: &std::path::Path) -> MediaArtifact {
        let path = dir.join(format!("{bytes}.zip"));
        std::fs::write(&path, vec![1_u8; bytes]).expect("write");
        MediaArtifact::from_file(TempFile::new(path), ArtifactKind::Archive)
            .await
            .expect("artifact")
    }

    #[tokio::test]
    async fn below_ceiling_passes() {
        let dir = tempfile::tempdir().expect("tempdir");
        let gate = SizeGate::new(1.0);

        assert!(gate.check(&artifact_of(1024, dir.path()).await).is_ok());
    }

    #[tokio::test]
    async fn at_or_above_ceiling_is_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let gate = SizeGate::new(1.0);

        let exact = artifact_of(1024 * 1024, dir.path()).await;
        assert!(matches!(gate.check(&exact), Err(PipelineError::SizeExceeded { .. })));

        let over = artifact_of(1024 * 1024 * 3 / 2, dir.path()).await;
        let err = gate.check(&over).unwrap_err();
        assert!(err.to_string().contains("1.5 MB"), "{err}");
    }
}
