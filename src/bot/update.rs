//! Platform-neutral view of the two update kinds the bot reacts to.

use std::convert::Infallible;

use teloxide::types::{CallbackQuery, Message, Update, User};

/// Who sent an update. `username` is the identity checked against the allow-list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sender {
    pub username: Option<String>,
    pub first_name: String,
}

impl Sender {
    #[cfg(test)]
    pub fn named(username: &str) -> Self {
        Self {
            username: Some(username.to_string()),
            first_name: username.to_string(),
        }
    }

    fn from_user(user: &User) -> Self {
        Self {
            username: user.username.clone(),
            first_name: user.first_name.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct IncomingMessage {
    pub chat_id: i64,
    pub sender: Option<Sender>,
    pub text: Option<String>,
    pub voice_file_id: Option<String>,
}

#[derive(Debug, Clone)]
pub struct IncomingCallback {
    pub query_id: String,
    pub sender: Sender,
    pub data: Option<String>,
    /// Chat and message id of the message carrying the inline keyboard.
    pub origin: Option<(i64, i32)>,
}

#[derive(Debug, Clone)]
pub enum Incoming {
    Message(IncomingMessage),
    Callback(IncomingCallback),
}

impl From<&Message> for IncomingMessage {
    fn from(msg: &Message) -> Self {
        Self {
            chat_id: msg.chat.id.0,
            sender: msg.from.as_ref().map(Sender::from_user),
            text: msg.text().map(str::to_string),
            voice_file_id: msg.voice().map(|v| v.file.id.0.clone()),
        }
    }
}

impl From<&CallbackQuery> for IncomingCallback {
    fn from(q: &CallbackQuery) -> Self {
        Self {
            query_id: q.id.to_string(),
            sender: Sender::from_user(&q.from),
            data: q.data.clone(),
            origin: q.message.as_ref().map(|m| (m.chat().id.0, m.id().0)),
        }
    }
}

/// Dispatcher distribution key: none, so every update runs on its own worker
/// instead of queueing behind earlier updates from the same chat.
pub fn independent_updates(_update: &Update) -> Option<Infallible> {
    None
}
