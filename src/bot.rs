use teloxide::{
    adaptors::trace,
    payloads::{
        SendAudioSetters, SendDocumentSetters, SendMessageSetters, SendPhotoSetters,
        SendVideoSetters,
    },
    requests::{Requester, RequesterExt},
    types::{ChatId, InlineKeyboardButton, InlineKeyboardMarkup, InputFile, MessageId},
    utils::html,
};

use crate::{
    artifact::{ArtifactKind, MediaArtifact},
    request::{Format, FormatChoice, ReplyTarget},
};

pub type TeloxideBot =
    teloxide::adaptors::CacheMe<trace::Trace<teloxide::adaptors::DefaultParseMode<teloxide::Bot>>>;

pub struct TelegramBot;
impl TelegramBot {
    pub fn new(token: &str) -> TeloxideBot {
        teloxide::Bot::new(token)
            .parse_mode(teloxide::types::ParseMode::Html)
            .trace(trace::Settings::TRACE_EVERYTHING)
            .cache_me()
    }
}

/// Outbound side of the messaging channel. Text arguments are plain text;
/// implementations take care of any markup escaping.
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    async fn send_text(&self, target: &ReplyTarget, text: &str) -> anyhow::Result<()>;

    /// Send a file using the send kind matching the artifact (photo, video,
    /// audio or document).
    async fn send_artifact(
        &self,
        target: &ReplyTarget,
        artifact: &MediaArtifact,
        caption: Option<&str>,
    ) -> anyhow::Result<()>;

    /// Ask which format a single-item link should be downloaded as.
    async fn offer_formats(&self, target: &ReplyTarget, url: &str) -> anyhow::Result<()>;

    async fn remove_message(&self, chat: ChatId, message: MessageId) -> anyhow::Result<()>;
}

#[async_trait::async_trait]
impl Transport for TeloxideBot {
    async fn send_text(&self, target: &ReplyTarget, text: &str) -> anyhow::Result<()> {
        let mut req = self.send_message(target.chat, html::escape(text));
        if let Some(id) = target.reply_to {
            req = req.reply_to_message_id(id);
        }
        req.await?;

        Ok(())
    }

    async fn send_artifact(
        &self,
        target: &ReplyTarget,
        artifact: &MediaArtifact,
        caption: Option<&str>,
    ) -> anyhow::Result<()> {
        let mut file = InputFile::file(artifact.path().to_path_buf());
        if let Some(name) = artifact.display_name() {
            file = file.file_name(name.to_string());
        }
        let caption = caption.map(html::escape);

        match artifact.kind() {
            ArtifactKind::Image => {
                let mut req = self.send_photo(target.chat, file);
                if let Some(caption) = caption {
                    req = req.caption(caption);
                }
                if let Some(id) = target.reply_to {
                    req = req.reply_to_message_id(id);
                }
                req.await?;
            }
            ArtifactKind::Video => {
                let mut req = self.send_video(target.chat, file);
                if let Some(caption) = caption {
                    req = req.caption(caption);
                }
                if let Some(id) = target.reply_to {
                    req = req.reply_to_message_id(id);
                }
                req.await?;
            }
            ArtifactKind::Audio => {
                let mut req = self.send_audio(target.chat, file);
                if let Some(caption) = caption {
                    req = req.caption(caption);
                }
                if let Some(id) = target.reply_to {
                    req = req.reply_to_message_id(id);
                }
                req.await?;
            }
            ArtifactKind::Archive => {
                let mut req = self.send_document(target.chat, file);
                if let Some(caption) = caption {
                    req = req.caption(caption);
                }
                if let Some(id) = target.reply_to {
                    req = req.reply_to_message_id(id);
                }
                req.await?;
            }
        }

        Ok(())
    }

    async fn offer_formats(&self, target: &ReplyTarget, url: &str) -> anyhow::Result<()> {
        let keyboard = InlineKeyboardMarkup::new([[
            InlineKeyboardButton::callback(
                "🎵 MP3 (audio)",
                FormatChoice::encode(Format::Audio, url),
            ),
            InlineKeyboardButton::callback(
                "🎥 MP4 (video)",
                FormatChoice::encode(Format::Video, url),
            ),
        ]]);

        let mut req = self
            .send_message(target.chat, "YouTube detected → choose format:")
            .reply_markup(keyboard);
        if let Some(id) = target.reply_to {
            req = req.reply_to_message_id(id);
        }
        req.await?;

        Ok(())
    }

    async fn remove_message(&self, chat: ChatId, message: MessageId) -> anyhow::Result<()> {
        self.delete_message(chat, message).await?;

        Ok(())
    }
}
