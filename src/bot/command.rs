//! Classification of incoming text and callback payloads.
//!
//! Text commands are matched by prefix, case-sensitive, first match wins,
//! in the order start, preset, help. Anything else is echoed back as unknown.

pub const COMMAND_START: &str = "/start";
pub const COMMAND_PRESET: &str = "/preset";
pub const COMMAND_CHANGE_PRESET: &str = "/presetchange";
pub const COMMAND_HELP: &str = "/help";
pub const COMMAND_CANCEL: &str = "/cancel";

pub const MESSAGE_DEFAULT: &str = "Record your voice to start.";
pub const MESSAGE_SELECT_PRESET: &str = "Select a preset.";
pub const MESSAGE_NO_PRESET: &str = "No preset available.";
pub const MESSAGE_NO_MATCHING_PRESET: &str = "No such preset";
pub const MESSAGE_PRESET_CHANGED: &str = "Applied preset";
pub const MESSAGE_PRESET_NOT_SET: &str = "Preset not set";
pub const MESSAGE_UNKNOWN_COMMAND: &str = "Unknown command";
pub const MESSAGE_CANCEL: &str = "Cancel";
pub const MESSAGE_CANCELED: &str = "Canceled.";
pub const MESSAGE_CONVERSION_FAILED: &str = "Failed to convert voice";

/// Telegram limit for inline button callback data, in bytes.
pub const MAX_CALLBACK_DATA_LEN: usize = 64;

pub fn help_text() -> &'static str {
    "
Following commands are supported:

/preset: change preset
/help : show this help message
"
}

/// A text message, classified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextCommand {
    Start,
    ListPresets,
    Help,
    Unknown(String),
}

impl TextCommand {
    pub fn parse(text: &str) -> Self {
        if text.starts_with(COMMAND_START) {
            Self::Start
        } else if text.starts_with(COMMAND_PRESET) {
            Self::ListPresets
        } else if text.starts_with(COMMAND_HELP) {
            Self::Help
        } else {
            Self::Unknown(text.to_string())
        }
    }
}

/// An inline-button payload, classified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackAction {
    ChangePreset(String),
    Cancel,
    Unknown(String),
}

impl CallbackAction {
    pub fn parse(data: &str) -> Self {
        if let Some(rest) = data.strip_prefix(COMMAND_CHANGE_PRESET) {
            Self::ChangePreset(rest.trim().to_string())
        } else if data.starts_with(COMMAND_CANCEL) {
            Self::Cancel
        } else {
            Self::Unknown(data.to_string())
        }
    }
}

pub fn callback_data_for_preset(name: &str) -> String {
    format!("{COMMAND_CHANGE_PRESET} {name}")
}

pub fn unknown_command_message(text: &str) -> String {
    format!("{MESSAGE_UNKNOWN_COMMAND}: {text}")
}

pub fn preset_changed_message(name: &str) -> String {
    format!("{MESSAGE_PRESET_CHANGED}: {name}")
}

pub fn no_such_preset_message(name: &str) -> String {
    format!("{MESSAGE_NO_MATCHING_PRESET}: {name}")
}

pub fn conversion_failed_message(reason: &str) -> String {
    format!("{MESSAGE_CONVERSION_FAILED}: {reason}")
}
