//! Bot initialization and command definitions
//!
//! This module contains:
//! - Command enum definition
//! - Bot instance creation
//! - Deep link construction for shared files

use reqwest::ClientBuilder;
use teloxide::prelude::*;
use teloxide::utils::command::BotCommands;

use crate::core::config;
use crate::telegram::Bot;

/// Bot commands enum with descriptions
#[derive(BotCommands, Clone, Debug)]
#[command(rename_rule = "lowercase", description = "I can:")]
pub enum Command {
    #[command(description = "welcome message, or fetch a shared file")]
    Start(String),
    #[command(description = "list recent stored files")]
    Myfiles,
    #[command(description = "search stored files by name")]
    Search(String),
    #[command(description = "storage statistics")]
    Stats,
    #[command(description = "how the bot works")]
    Help,
}

/// Creates a Bot instance with the configured request timeout
///
/// # Returns
/// * `Ok(Bot)` - Successfully created bot instance
/// * `Err(anyhow::Error)` - Failed to build the HTTP client
pub fn create_bot() -> anyhow::Result<Bot> {
    let client = ClientBuilder::new().timeout(config::network::timeout()).build()?;
    Ok(Bot::with_client(config::BOT_TOKEN.as_str(), client))
}

/// Sets up bot commands in Telegram UI
pub async fn setup_bot_commands(bot: &Bot) -> Result<(), teloxide::RequestError> {
    use teloxide::types::BotCommand;

    bot.set_my_commands(vec![
        BotCommand::new("start", "welcome message, or fetch a shared file"),
        BotCommand::new("myfiles", "list recent stored files"),
        BotCommand::new("search", "search stored files by name"),
        BotCommand::new("stats", "storage statistics"),
        BotCommand::new("help", "how the bot works"),
    ])
    .await?;

    Ok(())
}

/// Builds a t.me deep link that resolves to `/start <link>` for this bot.
pub fn deep_link(bot_username: Option<&str>, link: &str) -> String {
    match bot_username {
        Some(username) => format!("https://t.me/{}?start={}", username, link),
        None => format!("/start {}", link),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_descriptions_present() {
        let commands = Command::descriptions();
        let command_list = format!("{}", commands);

        assert!(command_list.contains("I can"));
        assert!(command_list.contains("start"));
        assert!(command_list.contains("myfiles"));
        assert!(command_list.contains("search"));
    }

    #[test]
    fn test_start_payload_parsing() {
        let cmd = Command::parse("/start report_2024", "storage_bot").unwrap();
        match cmd {
            Command::Start(payload) => assert_eq!(payload, "report_2024"),
            other => panic!("expected Start, got {:?}", other),
        }

        let cmd = Command::parse("/start", "storage_bot").unwrap();
        match cmd {
            Command::Start(payload) => assert!(payload.is_empty()),
            other => panic!("expected Start, got {:?}", other),
        }
    }

    #[test]
    fn test_deep_link_format() {
        assert_eq!(
            deep_link(Some("storage_bot"), "notes"),
            "https://t.me/storage_bot?start=notes"
        );
        assert_eq!(deep_link(None, "notes"), "/start notes");
    }
}
