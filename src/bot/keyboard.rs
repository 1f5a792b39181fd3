use std::collections::BTreeMap;

use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup, KeyboardButton, KeyboardMarkup, ReplyMarkup};

use super::command::{callback_data_for_preset, COMMAND_CANCEL, COMMAND_HELP, COMMAND_PRESET, MESSAGE_CANCEL};

/// Persistent keyboard attached to every text reply.
pub fn reply_keyboard() -> ReplyMarkup {
    ReplyMarkup::Keyboard(
        KeyboardMarkup::new(vec![vec![
            KeyboardButton::new(COMMAND_PRESET),
            KeyboardButton::new(COMMAND_HELP),
        ]])
        .resize_keyboard(),
    )
}

/// One row per preset, followed by a cancel row.
pub fn preset_keyboard(presets: &BTreeMap<String, Vec<String>>) -> ReplyMarkup {
    let mut rows: Vec<Vec<InlineKeyboardButton>> = presets
        .keys()
        .map(|name| vec![InlineKeyboardButton::callback(name.clone(), callback_data_for_preset(name))])
        .collect();
    rows.push(vec![InlineKeyboardButton::callback(MESSAGE_CANCEL, COMMAND_CANCEL)]);
    ReplyMarkup::InlineKeyboard(InlineKeyboardMarkup::new(rows))
}
