use thiserror::Error;

use crate::helpers::text::truncate_chars;

pub const SINGLE_ITEM_ERROR_CHARS: usize = 200;
pub const BATCH_ERROR_CHARS: usize = 300;

/// Terminal outcomes of a request that are reported back to the requester.
/// The `Display` text is what the requester sees.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Only Spotify, Pinterest, YouTube links supported.")]
    Unsupported,

    #[error("No tracks found on Spotify.")]
    ResolutionEmpty,

    #[error("YouTube download failed: {0}")]
    Transfer(String),

    #[error("Could not send the file: {0}")]
    Delivery(String),

    #[error("Spotify error: {0}")]
    Catalog(String),

    #[error("Download failed — no files saved.")]
    BatchAllFailed,

    #[error(
        "ZIP is too big ({megabytes:.1} MB). Telegram limit is ~50 MB.\nTry a smaller playlist or \
         ask for individual songs."
    )]
    SizeExceeded { megabytes: f64 },

    #[error("Could not download Pinterest media (page changed?).")]
    ScrapeEmpty,
}
impl PipelineError {
    pub fn transfer(err: &anyhow::Error) -> Self {
        Self::Transfer(truncate_chars(&format!("{err:#}"), SINGLE_ITEM_ERROR_CHARS).to_string())
    }

    pub fn delivery(err: &anyhow::Error) -> Self {
        Self::Delivery(truncate_chars(&format!("{err:#}"), SINGLE_ITEM_ERROR_CHARS).to_string())
    }

    pub fn catalog(err: &anyhow::Error) -> Self {
        Self::Catalog(truncate_chars(&format!("{err:#}"), BATCH_ERROR_CHARS).to_string())
    }
}
