//! Bot module - preset selection and voice conversion over Telegram.

pub mod command;
pub mod converter;
pub mod engine;
pub mod keyboard;
pub mod session;
pub mod telegram;
pub mod update;

#[cfg(test)]
mod testing;

pub use converter::{ConversionError, Converter};
pub use engine::{Outcome, VoiceEngine};
pub use session::{Session, SessionStore};
pub use telegram::{ChatApi, TelegramClient};
pub use update::{Incoming, IncomingCallback, IncomingMessage, Sender};
