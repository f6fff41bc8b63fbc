use std::{path::PathBuf, sync::Arc, time::Duration};

use futures::future::join;
use tracing::{debug, warn};
use url::Url;

use super::handlers::{LocatedMedia, MediaLocator};
use crate::{
    artifact::{ArtifactKind, MediaArtifact},
    helpers::{download::HttpFetch, temp_file::TempFile},
    request::RequestId,
};

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp"];
const DEFAULT_IMAGE_EXTENSION: &str = "jpg";
const VIDEO_EXTENSION: &str = "mp4";

/// Best-effort media scraping: any failure ends up as "nothing found".
#[derive(Debug)]
pub struct ScrapeDownloader {
    http: Arc<dyn HttpFetch>,
    locator: Arc<dyn MediaLocator>,
    download_dir: PathBuf,
    page_timeout: Duration,
}
impl ScrapeDownloader {
    pub fn new(
        http: Arc<dyn HttpFetch>,
        locator: Arc<dyn MediaLocator>,
        download_dir: PathBuf,
        page_timeout: Duration,
    ) -> Self {
        Self {
            http,
            locator,
            download_dir,
            page_timeout,
        }
    }

    #[tracing::instrument(skip(self))]
    pub async fn download(&self, id: RequestId, url: &str) -> Vec<MediaArtifact> {
        let located = match self.locate(url).await {
            Ok(located) => located,
            Err(e) => {
                warn!(?e, "Could not scrape page");
                return Vec::new();
            }
        };

        if located.is_empty() {
            debug!("No media on page");
            return Vec::new();
        }

        let image = async {
            match &located.image {
                Some(src) => {
                    let path = self
                        .download_dir
                        .join(format!("{id}-image.{}", image_extension(src)));
                    self.fetch_resource(src, path, ArtifactKind::Image).await
                }
                None => None,
            }
        };
        let video = async {
            match &located.video {
                Some(src) => {
                    let path = self
                        .download_dir
                        .join(format!("{id}-video.{VIDEO_EXTENSION}"));
                    self.fetch_resource(src, path, ArtifactKind::Video).await
                }
                None => None,
            }
        };

        let (image, video) = join(image, video).await;

        image.into_iter().chain(video).collect()
    }

    async fn locate(&self, url: &str) -> anyhow::Result<LocatedMedia> {
        let page_url = Url::parse(url)?;
        let html = self.http.fetch_text(url, self.page_timeout).await?;

        Ok(self.locator.locate(&page_url, &html))
    }

    async fn fetch_resource(
        &self,
        src: &Url,
        path: PathBuf,
        kind: ArtifactKind,
    ) -> Option<MediaArtifact> {
        let file = TempFile::new(path);

        if let Err(e) = self.http.download_file(src.as_str(), file.path()).await {
            warn!(?e, %src, ?kind, "Media download failed");
            return None;
        }

        match MediaArtifact::from_file(file, kind).await {
            Ok(artifact) => Some(artifact),
            Err(e) => {
                warn!(?e, %src, "Downloaded media is unreadable");
                None
            }
        }
    }
}

fn image_extension(src: &Url) -> &'static str {
    let ext = src
        .path()
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase());

    ext.and_then(|ext| IMAGE_EXTENSIONS.iter().find(|known| **known == ext).copied())
        .unwrap_or(DEFAULT_IMAGE_EXTENSION)
}
