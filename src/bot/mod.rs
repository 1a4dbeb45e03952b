//! Telegram-facing layer: commands, conversation dispatch, the callback
//! token codec and the moderation request protocol.

pub mod commands;
pub mod handlers;
pub mod keyboards;
pub mod moderation;
pub mod session;
pub mod states;
