//! Voice engine - turns updates into replies.
//!
//! One transaction per update. The only state carried between updates is
//! each user's selected preset in the [`SessionStore`].

use std::sync::Arc;

use teloxide::types::ChatAction;
use tracing::{debug, info, warn};

use crate::bot::command::{
    conversion_failed_message, help_text, no_such_preset_message, preset_changed_message,
    unknown_command_message, CallbackAction, TextCommand, MESSAGE_CANCELED, MESSAGE_DEFAULT,
    MESSAGE_NO_PRESET, MESSAGE_PRESET_NOT_SET, MESSAGE_SELECT_PRESET,
};
use crate::bot::converter::Converter;
use crate::bot::keyboard::{preset_keyboard, reply_keyboard};
use crate::bot::session::{Session, SessionStore};
use crate::bot::telegram::ChatApi;
use crate::bot::update::{Incoming, IncomingCallback, IncomingMessage, Sender};
use crate::config::Config;

/// Result of handling a single update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// A reply (or callback acknowledgement) went out.
    Replied,
    /// Sender not allowed; nothing was sent.
    Rejected,
    /// Nothing to do for this update.
    Ignored,
    /// Something failed along the way. Already logged.
    Failed,
}

pub struct VoiceEngine {
    config: Arc<Config>,
    sessions: SessionStore,
    converter: Converter,
    api: Arc<dyn ChatApi>,
}

impl VoiceEngine {
    pub fn new(config: Arc<Config>, api: Arc<dyn ChatApi>) -> Self {
        let converter = Converter::from_config(&config);
        Self::with_converter(config, api, converter)
    }

    pub fn with_converter(config: Arc<Config>, api: Arc<dyn ChatApi>, converter: Converter) -> Self {
        let sessions = SessionStore::new(config.available_ids.iter().cloned());
        Self {
            config,
            sessions,
            converter,
            api,
        }
    }

    #[cfg(test)]
    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    pub async fn handle(&self, update: Incoming) -> Outcome {
        match update {
            Incoming::Message(msg) => self.handle_message(msg).await,
            Incoming::Callback(query) => self.handle_callback(query).await,
        }
    }

    /// Returns the username if the sender is on the allow-list.
    fn authorize<'a>(&self, sender: Option<&'a Sender>) -> Option<&'a str> {
        let Some(sender) = sender else {
            warn!("*** Not allowed (no sender)");
            return None;
        };
        let Some(username) = sender.username.as_deref() else {
            warn!("*** Not allowed (no user name): {}", sender.first_name);
            return None;
        };
        if !self.config.is_available_id(username) {
            warn!("*** Id not allowed: {}", username);
            return None;
        }
        Some(username)
    }

    pub async fn handle_message(&self, msg: IncomingMessage) -> Outcome {
        let Some(user_id) = self.authorize(msg.sender.as_ref()) else {
            return Outcome::Rejected;
        };

        let Some(session) = self.sessions.get(user_id).await else {
            warn!("*** Session does not exist for id: {}", user_id);
            return Outcome::Failed;
        };

        if let Some(file_id) = msg.voice_file_id.as_deref() {
            return self.handle_voice(msg.chat_id, file_id, &session).await;
        }

        let text = msg.text.as_deref().unwrap_or("");
        let command = TextCommand::parse(text);
        info!("📨 {} from {}", describe(&command), user_id);

        let (reply, markup) = match command {
            TextCommand::Start => (MESSAGE_DEFAULT.to_string(), reply_keyboard()),
            TextCommand::ListPresets if self.config.presets.is_empty() => {
                (MESSAGE_NO_PRESET.to_string(), reply_keyboard())
            }
            TextCommand::ListPresets => (MESSAGE_SELECT_PRESET.to_string(), preset_keyboard(&self.config.presets)),
            TextCommand::Help => (help_text().to_string(), reply_keyboard()),
            TextCommand::Unknown(text) => (unknown_command_message(&text), reply_keyboard()),
        };

        match self.api.send_text(msg.chat_id, &reply, markup).await {
            Ok(_) => Outcome::Replied,
            Err(_) => Outcome::Failed,
        }
    }

    async fn handle_voice(&self, chat_id: i64, file_id: &str, session: &Session) -> Outcome {
        if let Err(e) = self.api.send_chat_action(chat_id, ChatAction::RecordVoice).await {
            debug!("{e}");
        }

        let preset = session.selected_preset.as_deref();
        let converted = match self.api.download_file(file_id).await {
            Ok(data) => self.converter.convert(&data, preset).await.map_err(|e| e.to_string()),
            Err(e) => Err(e),
        };

        match converted {
            Ok(data) => {
                if let Err(e) = self.api.send_chat_action(chat_id, ChatAction::UploadVoice).await {
                    debug!("{e}");
                }
                let caption = self.caption_for(preset);
                match self.api.send_voice(chat_id, data, &caption, reply_keyboard()).await {
                    Ok(_) => Outcome::Replied,
                    Err(_) => Outcome::Failed,
                }
            }
            Err(reason) => {
                warn!("*** Voice conversion failed for {}: {}", session.user_id, reason);
                let reply = conversion_failed_message(&reason);
                self.api.send_text(chat_id, &reply, reply_keyboard()).await.ok();
                Outcome::Failed
            }
        }
    }

    /// "name (arg arg ...)" for a selected preset, a fixed notice otherwise.
    fn caption_for(&self, preset: Option<&str>) -> String {
        match preset.filter(|p| !p.is_empty()) {
            Some(name) => {
                let args = self.config.preset(name).map(|a| a.join(" ")).unwrap_or_default();
                format!("{} ({})", name, args)
            }
            None => MESSAGE_PRESET_NOT_SET.to_string(),
        }
    }

    pub async fn handle_callback(&self, query: IncomingCallback) -> Outcome {
        let Some(user_id) = self.authorize(Some(&query.sender)) else {
            return Outcome::Rejected;
        };

        let data = query.data.as_deref().unwrap_or("");
        let message = match CallbackAction::parse(data) {
            CallbackAction::ChangePreset(name) => {
                if self.config.preset(&name).is_some() {
                    if !self.sessions.select_preset(user_id, &name).await {
                        warn!("*** Session does not exist for id: {}", user_id);
                        return Outcome::Failed;
                    }
                    info!("🎛️ {} selected preset {}", user_id, name);
                    preset_changed_message(&name)
                } else {
                    no_such_preset_message(&name)
                }
            }
            CallbackAction::Cancel => MESSAGE_CANCELED.to_string(),
            CallbackAction::Unknown(data) => {
                warn!("*** Unprocessable callback query: {}", data);
                return Outcome::Ignored;
            }
        };

        if self.api.answer_callback(&query.query_id, &message).await.is_err() {
            return Outcome::Failed;
        }

        let Some((chat_id, message_id)) = query.origin else {
            debug!("Callback query without origin message, nothing to edit");
            return Outcome::Replied;
        };
        match self.api.edit_message_text(chat_id, message_id, &message).await {
            Ok(()) => Outcome::Replied,
            Err(_) => Outcome::Failed,
        }
    }
}

fn describe(command: &TextCommand) -> &'static str {
    match command {
        TextCommand::Start => "start",
        TextCommand::ListPresets => "preset list",
        TextCommand::Help => "help",
        TextCommand::Unknown(_) => "unknown command",
    }
}
