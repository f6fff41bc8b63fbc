use std::fmt::Display;

use teloxide::types::{ChatId, MessageId};
use uuid::Uuid;

use crate::classifier::{classify, Platform};

/// Unique per request; every transient file name is derived from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestId(Uuid);
impl RequestId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}
impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}
impl Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Audio,
    Video,
}
impl Format {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Audio => "mp3",
            Self::Video => "mp4",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "mp3" => Some(Self::Audio),
            "mp4" => Some(Self::Video),
            _ => None,
        }
    }
}

/// Where replies for a request go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplyTarget {
    pub chat: ChatId,
    pub reply_to: Option<MessageId>,
    /// Format-choice message to remove once the request is done.
    pub prompt: Option<MessageId>,
}

#[derive(Debug, Clone)]
pub struct Request {
    pub id: RequestId,
    pub url: String,
    pub platform: Platform,
    pub format: Option<Format>,
    pub target: ReplyTarget,
}
impl Request {
    pub fn new(url: &str, format: Option<Format>, target: ReplyTarget) -> Self {
        let url = url.trim().to_string();
        let platform = classify(&url);

        Self {
            id: RequestId::new(),
            url,
            platform,
            format,
            target,
        }
    }
}

const CALLBACK_PLATFORM: &str = "yt";
const CALLBACK_SEPARATOR: char = '|';

/// Payload of the format-choice buttons: `yt|<format>|<url>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatChoice {
    pub format: Format,
    pub url: String,
}
impl FormatChoice {
    pub fn encode(format: Format, url: &str) -> String {
        format!(
            "{CALLBACK_PLATFORM}{CALLBACK_SEPARATOR}{}{CALLBACK_SEPARATOR}{url}",
            format.as_str()
        )
    }

    pub fn decode(data: &str) -> Option<Self> {
        let mut parts = data.splitn(3, CALLBACK_SEPARATOR);
        if parts.next()? != CALLBACK_PLATFORM {
            return None;
        }
        let format = Format::parse(parts.next()?)?;
        let url = parts.next()?.to_string();

        Some(Self { format, url })
    }
}
