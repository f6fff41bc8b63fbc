use std::{path::PathBuf, sync::Arc, time::Duration};

use tracing::{debug, info, trace, warn};

use crate::{
    artifact::{ArtifactKind, MediaArtifact},
    bot::Transport,
    classifier::Platform,
    downloader::{
        batch::batch_label,
        handlers::{Catalog, MediaExtractor, MediaLocator},
        BatchDownloader, ScrapeDownloader, SingleItemDownloader,
    },
    error::PipelineError,
    helpers::{download::HttpFetch, temp_file::TempFile},
    processor::{archive::archive_directory, size_gate::SizeGate},
    request::{Format, ReplyTarget, Request},
};

/// Clients the pipeline talks to, built once at startup.
pub struct Collaborators {
    pub transport: Arc<dyn Transport>,
    pub extractor: Arc<dyn MediaExtractor>,
    pub catalog: Arc<dyn Catalog>,
    pub http: Arc<dyn HttpFetch>,
    pub locator: Arc<dyn MediaLocator>,
}

#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub download_dir: PathBuf,
    pub archive_limit_mb: f64,
    pub scrape_timeout: Duration,
}

pub struct Pipeline {
    transport: Arc<dyn Transport>,
    single: SingleItemDownloader,
    scrape: ScrapeDownloader,
    batch: BatchDownloader,
    size_gate: SizeGate,
    download_dir: PathBuf,
}

impl Pipeline {
    pub fn new(collaborators: Collaborators, settings: PipelineSettings) -> Self {
        let Collaborators {
            transport,
            extractor,
            catalog,
            http,
            locator,
        } = collaborators;
        let dir = settings.download_dir;

        Self {
            transport,
            single: SingleItemDownloader::new(extractor, dir.clone()),
            scrape: ScrapeDownloader::new(http, locator, dir.clone(), settings.scrape_timeout),
            batch: BatchDownloader::new(catalog, dir.clone()),
            size_gate: SizeGate::new(settings.archive_limit_mb),
            download_dir: dir,
        }
    }

    /// Cheap first look at a request, run directly on the update loop.
    ///
    /// Returns the request back when it needs a download worker.
    #[tracing::instrument(skip_all, fields(id = %request.id, platform = %request.platform))]
    pub async fn admit(&self, request: Request) -> Option<Request> {
        let target = request.target;

        match (request.platform, request.format) {
            (Platform::Unsupported, _) => {
                debug!(url = %request.url, "Unsupported link");
                self.report(&target, &PipelineError::Unsupported.to_string())
                    .await;
                None
            }
            (Platform::YouTube, None) => {
                if let Err(e) = self.transport.offer_formats(&target, &request.url).await {
                    warn!(?e, "Could not offer formats");
                    self.report(&target, "Could not offer download formats for this link.")
                        .await;
                }
                None
            }
            (Platform::YouTube, Some(_)) => Some(request),
            (Platform::Spotify, _) => {
                self.report(&target, "Spotify detected → starting download...")
                    .await;
                Some(request)
            }
            (Platform::Pinterest, _) => {
                self.report(&target, "Pinterest detected → fetching media...")
                    .await;
                Some(request)
            }
        }
    }

    /// Run a request to completion. Every transient file it created is gone
    /// by the time this returns.
    #[tracing::instrument(
        skip_all,
        fields(
            id = %request.id,
            chat = %request.target.chat,
            platform = %request.platform,
            url = %request.url,
        )
    )]
    pub async fn process(&self, request: Request) {
        info!("Processing request");
        let target = request.target;

        let res = match (request.platform, request.format) {
            (Platform::Spotify, _) => self.run_batch(&request).await,
            (Platform::Pinterest, _) => self.run_scrape(&request).await,
            (Platform::YouTube, Some(format)) => self.run_single(&request, format).await,
            (Platform::YouTube, None) | (Platform::Unsupported, _) => {
                Err(PipelineError::Unsupported)
            }
        };

        match res {
            Ok(()) => info!("Request done"),
            Err(e) => {
                warn!(error = %e, "Request failed");
                self.report(&target, &e.to_string()).await;
            }
        }

        if let Some(prompt) = target.prompt {
            if let Err(e) = self.transport.remove_message(target.chat, prompt).await {
                debug!(?e, "Could not remove format prompt");
            }
        }
    }

    async fn run_single(&self, request: &Request, format: Format) -> Result<(), PipelineError> {
        let artifact = self.single.download(request.id, &request.url, format).await?;

        self.dispatch(&request.target, vec![artifact], None).await
    }

    async fn run_scrape(&self, request: &Request) -> Result<(), PipelineError> {
        let artifacts = self.scrape.download(request.id, &request.url).await;
        if artifacts.is_empty() {
            return Err(PipelineError::ScrapeEmpty);
        }

        self.dispatch(&request.target, artifacts, None).await
    }

    async fn run_batch(&self, request: &Request) -> Result<(), PipelineError> {
        let mut tracks = self.batch.resolve(request.id, &request.url).await?;

        self.report(
            &request.target,
            &format!("Found {} track(s). Downloading...", tracks.len()),
        )
        .await;

        let batch = self.batch.download_all(request.id, &mut tracks).await?;
        let label = batch_label(&tracks);

        let archive_file = TempFile::new(self.download_dir.join(format!("{}.zip", request.id)));
        let archive = async {
            archive_directory(
                batch.workspace.path().to_path_buf(),
                archive_file.path().to_path_buf(),
            )
            .await?;
            MediaArtifact::from_file(archive_file, ArtifactKind::Archive)
                .await
                .map_err(anyhow::Error::from)
        }
        .await
        .map_err(|e| PipelineError::catalog(&e))?
        .with_display_name(format!("{label}.zip"));

        trace!(size = archive.size(), failed = batch.failed, "Archive built");
        self.size_gate.check(&archive)?;

        let caption = format!(
            "Spotify download: {} ({} of {} tracks)",
            label.replace('_', " "),
            batch.succeeded,
            tracks.len()
        );

        self.dispatch(&request.target, vec![archive], Some(&caption))
            .await
    }

    /// Send each artifact, then let it drop so its file is deleted whether or
    /// not the send went through.
    async fn dispatch(
        &self,
        target: &ReplyTarget,
        artifacts: Vec<MediaArtifact>,
        caption: Option<&str>,
    ) -> Result<(), PipelineError> {
        let mut first_err = None;

        for artifact in artifacts {
            trace!(path = ?artifact.path(), kind = ?artifact.kind(), "Sending artifact");
            if let Err(e) = self.transport.send_artifact(target, &artifact, caption).await {
                warn!(?e, path = ?artifact.path(), "Failed to send artifact");
                first_err.get_or_insert(e);
            }
        }

        match first_err {
            Some(e) => Err(PipelineError::delivery(&e)),
            None => Ok(()),
        }
    }

    async fn report(&self, target: &ReplyTarget, text: &str) {
        if let Err(e) = self.transport.send_text(target, text).await {
            warn!(?e, "Failed to report to requester");
        }
    }
}
