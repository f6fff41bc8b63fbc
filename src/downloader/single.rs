use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use tracing::{debug, trace, warn};

use super::handlers::{Extracted, MediaExtractor};
use crate::{
    artifact::{ArtifactKind, MediaArtifact},
    error::PipelineError,
    helpers::temp_file::TempFile,
    request::{Format, RequestId},
};

#[derive(Debug)]
pub struct SingleItemDownloader {
    extractor: Arc<dyn MediaExtractor>,
    download_dir: PathBuf,
}
impl SingleItemDownloader {
    pub fn new(extractor: Arc<dyn MediaExtractor>, download_dir: PathBuf) -> Self {
        Self {
            extractor,
            download_dir,
        }
    }

    #[tracing::instrument(skip(self))]
    pub async fn download(
        &self,
        id: RequestId,
        url: &str,
        format: Format,
    ) -> Result<MediaArtifact, PipelineError> {
        let output_stem = self.download_dir.join(id.to_string());
        let mut leftovers = Leftovers::new(&self.download_dir, id.to_string());

        let res = match self.extractor.extract(url, format, &output_stem).await {
            Ok(extracted) => Self::into_artifact(extracted, format).await,
            Err(e) => Err(e),
        };

        match res {
            Ok(artifact) => {
                debug!(path = ?artifact.path(), size = artifact.size(), "Media downloaded");
                leftovers.disarm();
                Ok(artifact)
            }
            Err(e) => {
                warn!(?e, "Media download failed");
                Err(PipelineError::transfer(&e))
            }
        }
    }

    async fn into_artifact(extracted: Extracted, format: Format) -> anyhow::Result<MediaArtifact> {
        let kind = match format {
            Format::Audio => ArtifactKind::Audio,
            Format::Video => ArtifactKind::Video,
        };

        let display_name = extracted.title.as_deref().map(|title| {
            let ext = extracted
                .path
                .extension()
                .map_or_else(|| format.as_str().into(), |e| e.to_string_lossy());
            format!("{}.{ext}", title.replace(['/', '\\'], "_"))
        });

        let artifact = MediaArtifact::from_file(TempFile::new(extracted.path), kind).await?;

        Ok(match display_name {
            Some(name) => artifact.with_display_name(name),
            None => artifact,
        })
    }
}

/// Removes anything the extractor left behind for a request (`.part` files,
/// unmerged streams) when dropped, unless the download went through.
struct Leftovers<'a> {
    dir: &'a Path,
    prefix: String,
    armed: bool,
}
impl<'a> Leftovers<'a> {
    const fn new(dir: &'a Path, prefix: String) -> Self {
        Self {
            dir,
            prefix,
            armed: true,
        }
    }

    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for Leftovers<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }

        let Ok(entries) = std::fs::read_dir(self.dir) else {
            return;
        };

        for entry in entries.flatten() {
            if entry.file_name().to_string_lossy().starts_with(&self.prefix) {
                trace!(path = ?entry.path(), "Removing leftover download");
                let _ = std::fs::remove_file(entry.path());
            }
        }
    }
}
