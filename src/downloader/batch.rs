use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use tracing::{debug, info, warn};

use super::handlers::Catalog;
use crate::{error::PipelineError, helpers::temp_dir::TempDir, request::RequestId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackStatus {
    Pending,
    Succeeded,
    Failed,
}

#[derive(Debug, Clone)]
pub struct TrackDescriptor {
    pub title: String,
    pub artist: String,
    pub source_url: String,
    pub status: TrackStatus,
}
impl TrackDescriptor {
    pub const fn new(title: String, artist: String, source_url: String) -> Self {
        Self {
            title,
            artist,
            source_url,
            status: TrackStatus::Pending,
        }
    }
}

/// Workspace holding every track that downloaded, plus the per-track tally.
#[derive(Debug)]
pub struct BatchResult {
    pub workspace: TempDir,
    pub succeeded: usize,
    pub failed: usize,
}

#[derive(Debug)]
pub struct BatchDownloader {
    catalog: Arc<dyn Catalog>,
    download_dir: PathBuf,
}
impl BatchDownloader {
    pub fn new(catalog: Arc<dyn Catalog>, download_dir: PathBuf) -> Self {
        Self {
            catalog,
            download_dir,
        }
    }

    #[tracing::instrument(skip(self))]
    pub async fn resolve(
        &self,
        id: RequestId,
        url: &str,
    ) -> Result<Vec<TrackDescriptor>, PipelineError> {
        let res = async {
            let scratch = TempDir::new(&self.download_dir, format!("resolve-{id}")).await?;
            self.catalog.resolve(url, scratch.path()).await
        }
        .await;

        let tracks = res.map_err(|e| {
            warn!(?e, "Could not resolve catalog link");
            PipelineError::catalog(&e)
        })?;

        info!(count = tracks.len(), "Catalog link resolved");

        if tracks.is_empty() {
            return Err(PipelineError::ResolutionEmpty);
        }

        Ok(tracks)
    }

    /// Fetch every track in order. A failed track is marked and skipped; the
    /// batch only fails when nothing at all was downloaded.
    #[tracing::instrument(skip_all, fields(%id, tracks = tracks.len()))]
    pub async fn download_all(
        &self,
        id: RequestId,
        tracks: &mut [TrackDescriptor],
    ) -> Result<BatchResult, PipelineError> {
        let workspace = TempDir::new(&self.download_dir, format!("batch-{id}"))
            .await
            .map_err(|e| PipelineError::catalog(&anyhow::Error::from(e)))?;

        for (n, track) in tracks.iter_mut().enumerate() {
            match self.fetch_track(id, n, track, workspace.path()).await {
                Ok(path) => {
                    debug!(title = %track.title, ?path, "Track downloaded");
                    track.status = TrackStatus::Succeeded;
                }
                Err(e) => {
                    warn!(title = %track.title, ?e, "Track failed, skipping");
                    track.status = TrackStatus::Failed;
                }
            }
        }

        let succeeded = count(tracks, TrackStatus::Succeeded);
        let failed = count(tracks, TrackStatus::Failed);
        info!(succeeded, failed, "Batch finished");

        if succeeded == 0 {
            return Err(PipelineError::BatchAllFailed);
        }

        Ok(BatchResult {
            workspace,
            succeeded,
            failed,
        })
    }

    async fn fetch_track(
        &self,
        id: RequestId,
        n: usize,
        track: &TrackDescriptor,
        workspace: &Path,
    ) -> anyhow::Result<PathBuf> {
        let scratch = TempDir::new(&self.download_dir, format!("track-{id}-{n}")).await?;
        let downloaded = self.catalog.fetch(track, scratch.path()).await?;

        let Some(file_name) = downloaded.file_name() else {
            anyhow::bail!("Track download has no file name: {}", downloaded.display());
        };

        let mut dest = workspace.join(file_name);
        if tokio::fs::try_exists(&dest).await? {
            let mut numbered = std::ffi::OsString::from(format!("{:02} - ", n + 1));
            numbered.push(file_name);
            dest = workspace.join(numbered);
        }

        tokio::fs::rename(&downloaded, &dest).await?;

        Ok(dest)
    }
}

fn count(tracks: &[TrackDescriptor], status: TrackStatus) -> usize {
    tracks.iter().filter(|t| t.status == status).count()
}

/// Name used for the archive: the artist for a single track, otherwise "Playlist".
pub fn batch_label(tracks: &[TrackDescriptor]) -> String {
    let name = match tracks {
        [only] if !only.artist.is_empty() => only.artist.as_str(),
        _ => "Playlist",
    };

    name.replace(' ', "_")
}
