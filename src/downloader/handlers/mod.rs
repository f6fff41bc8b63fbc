pub mod pinterest;
pub mod spotdl;
pub mod ytdlp;

use std::path::{Path, PathBuf};

use url::Url;

use super::batch::TrackDescriptor;
use crate::request::Format;

/// Resolves a single video link into one local media file.
#[async_trait::async_trait]
pub trait MediaExtractor: std::fmt::Debug + Send + Sync {
    /// Download `url` to `output_stem` plus whatever extension the result has.
    async fn extract(&self, url: &str, format: Format, output_stem: &Path)
        -> anyhow::Result<Extracted>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extracted {
    pub path: PathBuf,
    pub title: Option<String>,
}

/// Resolves catalog links into tracks and fetches the audio for each one.
#[async_trait::async_trait]
pub trait Catalog: std::fmt::Debug + Send + Sync {
    async fn resolve(&self, url: &str, scratch_dir: &Path) -> anyhow::Result<Vec<TrackDescriptor>>;

    /// Download one track into `download_dir` and return the file written.
    async fn fetch(&self, track: &TrackDescriptor, download_dir: &Path) -> anyhow::Result<PathBuf>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocatedMedia {
    pub image: Option<Url>,
    pub video: Option<Url>,
}
impl LocatedMedia {
    pub const fn is_empty(&self) -> bool {
        self.image.is_none() && self.video.is_none()
    }
}

/// Finds downloadable media references in a fetched page.
pub trait MediaLocator: std::fmt::Debug + Send + Sync {
    fn locate(&self, page_url: &Url, html: &str) -> LocatedMedia;
}
