//! Test doubles shared by the bot tests.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

use async_trait::async_trait;
use tempfile::TempDir;
use teloxide::types::{ChatAction, ReplyMarkup};

use super::telegram::ChatApi;

/// Write an executable shell script standing in for sox.
#[cfg(unix)]
pub fn fake_binary(body: &str) -> (TempDir, PathBuf) {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fake-sox");
    std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    (dir, path)
}

/// Everything the engine sent, in order.
#[derive(Debug, Clone)]
pub enum Sent {
    Text { chat_id: i64, text: String, markup: ReplyMarkup },
    Voice { chat_id: i64, data: Vec<u8>, caption: String },
    Action { chat_id: i64, action: ChatAction },
    Answer { query_id: String, text: String },
    Edit { chat_id: i64, message_id: i32, text: String },
}

impl Sent {
    /// Target chat, if the call addressed one.
    pub fn chat_id(&self) -> Option<i64> {
        match self {
            Self::Text { chat_id, .. }
            | Self::Voice { chat_id, .. }
            | Self::Action { chat_id, .. }
            | Self::Edit { chat_id, .. } => Some(*chat_id),
            Self::Answer { .. } => None,
        }
    }
}

#[derive(Default)]
pub struct MockChatApi {
    pub sent: Mutex<Vec<Sent>>,
    pub files: Mutex<HashMap<String, Vec<u8>>>,
    pub fail_sends: bool,
}

impl MockChatApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(self, file_id: &str, data: &[u8]) -> Self {
        self.files.lock().unwrap().insert(file_id.to_string(), data.to_vec());
        self
    }

    pub fn sent(&self) -> Vec<Sent> {
        self.sent.lock().unwrap().clone()
    }

    /// Sent items other than chat actions.
    pub fn replies(&self) -> Vec<Sent> {
        self.sent()
            .into_iter()
            .filter(|s| !matches!(s, Sent::Action { .. }))
            .collect()
    }

    fn record(&self, item: Sent) -> Result<(), String> {
        self.sent.lock().unwrap().push(item);
        if self.fail_sends {
            Err("mock send failure".to_string())
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl ChatApi for MockChatApi {
    async fn send_text(&self, chat_id: i64, text: &str, markup: ReplyMarkup) -> Result<i64, String> {
        self.record(Sent::Text { chat_id, text: text.to_string(), markup })?;
        Ok(1)
    }

    async fn send_voice(
        &self,
        chat_id: i64,
        voice_data: Vec<u8>,
        caption: &str,
        _markup: ReplyMarkup,
    ) -> Result<i64, String> {
        self.record(Sent::Voice { chat_id, data: voice_data, caption: caption.to_string() })?;
        Ok(2)
    }

    async fn send_chat_action(&self, chat_id: i64, action: ChatAction) -> Result<(), String> {
        self.record(Sent::Action { chat_id, action })
    }

    async fn download_file(&self, file_id: &str) -> Result<Vec<u8>, String> {
        self.files
            .lock()
            .unwrap()
            .get(file_id)
            .cloned()
            .ok_or_else(|| format!("Failed to get file: {file_id} not found"))
    }

    async fn answer_callback(&self, query_id: &str, text: &str) -> Result<(), String> {
        self.record(Sent::Answer { query_id: query_id.to_string(), text: text.to_string() })
    }

    async fn edit_message_text(&self, chat_id: i64, message_id: i32, text: &str) -> Result<(), String> {
        self.record(Sent::Edit { chat_id, message_id, text: text.to_string() })
    }
}
