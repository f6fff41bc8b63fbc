use std::fmt::Display;

use url::Url;

use crate::helpers::domain::DomainParser;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    /// Catalog links (track, album, playlist), downloaded as a zipped batch.
    Spotify,
    /// Pin pages, scraped for one image and/or one video.
    Pinterest,
    /// Single videos, fetched as audio or video on request.
    YouTube,
    Unsupported,
}
impl Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Spotify => f.write_str("spotify"),
            Self::Pinterest => f.write_str("pinterest"),
            Self::YouTube => f.write_str("youtube"),
            Self::Unsupported => f.write_str("unsupported"),
        }
    }
}

const SCHEMES: &[&str] = &["http://", "https://"];

/// Work out which platform a piece of text links to. Never touches the network.
pub fn classify(text: &str) -> Platform {
    if !SCHEMES.iter().any(|s| text.starts_with(s)) {
        return Platform::Unsupported;
    }

    let Ok(url) = Url::parse(text) else {
        return Platform::Unsupported;
    };

    let Some(root) = DomainParser::get_domain_root(&url) else {
        return Platform::Unsupported;
    };

    if root == "spotify.com" {
        Platform::Spotify
    } else if root == "pin.it" || root.starts_with("pinterest.") {
        Platform::Pinterest
    } else if root == "youtube.com" || root == "youtu.be" {
        Platform::YouTube
    } else {
        Platform::Unsupported
    }
}
