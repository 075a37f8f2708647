//! Telegram bot integration and handlers

pub mod bot;
pub mod handlers;

pub use bot::{create_bot, deep_link, setup_bot_commands, Command};

pub type Bot = teloxide::Bot;
