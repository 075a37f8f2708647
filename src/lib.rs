//! Two Telegram bots sharing one codebase: a group file-storage bot that
//! hands stored media out by deep link, and a Terabox share-link relay.

pub mod cli;
pub mod core;
pub mod storage;
pub mod telegram;
pub mod terabox;

pub use crate::core::error::{AppError, AppResult};
