//! Telegram client using teloxide.

use async_trait::async_trait;
use teloxide::net::Download;
use teloxide::prelude::*;
use teloxide::types::{CallbackQueryId, ChatAction, FileId, InputFile, MessageId, ReplyMarkup};
use tracing::{info, warn};

/// Everything the engine needs to talk back to the chat platform.
///
/// Errors are plain strings. Implementations log send failures themselves,
/// callers only turn them into an outcome.
#[async_trait]
pub trait ChatApi: Send + Sync {
    async fn send_text(&self, chat_id: i64, text: &str, markup: ReplyMarkup) -> Result<i64, String>;

    async fn send_voice(
        &self,
        chat_id: i64,
        voice_data: Vec<u8>,
        caption: &str,
        markup: ReplyMarkup,
    ) -> Result<i64, String>;

    async fn send_chat_action(&self, chat_id: i64, action: ChatAction) -> Result<(), String>;

    /// Fetch the contents of an uploaded file.
    async fn download_file(&self, file_id: &str) -> Result<Vec<u8>, String>;

    /// Show a toast for an inline button press.
    async fn answer_callback(&self, query_id: &str, text: &str) -> Result<(), String>;

    /// Replace a message's text. Any inline keyboard is dropped.
    async fn edit_message_text(&self, chat_id: i64, message_id: i32, text: &str) -> Result<(), String>;
}

pub(crate) fn callback_query_id(query_id: &str) -> CallbackQueryId {
    CallbackQueryId(query_id.to_string())
}

/// Telegram API client.
pub struct TelegramClient {
    bot: Bot,
}

impl TelegramClient {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl ChatApi for TelegramClient {
    async fn send_text(&self, chat_id: i64, text: &str, markup: ReplyMarkup) -> Result<i64, String> {
        self.bot
            .send_message(ChatId(chat_id), text)
            .reply_markup(markup)
            .await
            .map(|msg| msg.id.0 as i64)
            .map_err(|e| {
                let msg = format!("Failed to send message: {e}");
                warn!("{}", msg);
                msg
            })
    }

    async fn send_voice(
        &self,
        chat_id: i64,
        voice_data: Vec<u8>,
        caption: &str,
        markup: ReplyMarkup,
    ) -> Result<i64, String> {
        info!("🔊 Sending voice to chat {} ({} bytes)", chat_id, voice_data.len());

        let input_file = InputFile::memory(voice_data).file_name("voice.ogg");

        self.bot
            .send_voice(ChatId(chat_id), input_file)
            .caption(caption)
            .reply_markup(markup)
            .await
            .map(|msg| msg.id.0 as i64)
            .map_err(|e| {
                let msg = format!("Failed to send voice: {e}");
                warn!("{}", msg);
                msg
            })
    }

    async fn send_chat_action(&self, chat_id: i64, action: ChatAction) -> Result<(), String> {
        self.bot
            .send_chat_action(ChatId(chat_id), action)
            .await
            .map(|_| ())
            .map_err(|e| format!("Failed to send chat action: {e}"))
    }

    async fn download_file(&self, file_id: &str) -> Result<Vec<u8>, String> {
        let file = self
            .bot
            .get_file(FileId(file_id.to_string()))
            .await
            .map_err(|e| format!("Failed to get file: {e}"))?;

        let mut data = Vec::new();
        self.bot
            .download_file(&file.path, &mut data)
            .await
            .map_err(|e| format!("Failed to download file: {e}"))?;

        info!("📥 Downloaded voice ({} bytes)", data.len());
        Ok(data)
    }

    async fn answer_callback(&self, query_id: &str, text: &str) -> Result<(), String> {
        self.bot
            .answer_callback_query(callback_query_id(query_id))
            .text(text)
            .await
            .map(|_| ())
            .map_err(|e| {
                let msg = format!("Failed to answer callback query: {e}");
                warn!("{}", msg);
                msg
            })
    }

    async fn edit_message_text(&self, chat_id: i64, message_id: i32, text: &str) -> Result<(), String> {
        self.bot
            .edit_message_text(ChatId(chat_id), MessageId(message_id), text)
            .await
            .map(|_| ())
            .map_err(|e| {
                let msg = format!("Failed to edit message text: {e}");
                warn!("{}", msg);
                msg
            })
    }
}
