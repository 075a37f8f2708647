use anyhow::Result;
use dotenvy::dotenv;
use std::sync::Arc;
use std::time::Duration;
use teloxide::prelude::*;
use tokio::time::sleep;

use stashbot::cli::{Cli, Commands};
use stashbot::core::{config, logging::init_logger, web_server};
use stashbot::storage::db::create_pool;
use stashbot::telegram::handlers::{schema, HandlerDeps};
use stashbot::telegram::{create_bot, setup_bot_commands, Bot};
use stashbot::terabox::handlers::{self as terabox_handlers, TeraboxDeps};

/// Main entry point
///
/// Parses CLI arguments and dispatches to the selected bot.
///
/// # Errors
/// Returns an error if initialization fails (logging, database, bot creation).
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse_args();

    // Log panics from dispatcher tasks instead of dying silently.
    std::panic::set_hook(Box::new(|panic_info| {
        log::error!("Panic caught: {:?}", panic_info);
        if let Some(location) = panic_info.location() {
            log::error!("Panic at {}:{}:{}", location.file(), location.line(), location.column());
        }
    }));

    // Load environment variables from .env before anything reads them,
    // LOG_FILE_PATH included.
    let _ = dotenv();

    init_logger(&config::LOG_FILE_PATH)?;

    match cli.command {
        Some(Commands::Storage) => run_storage_bot().await,
        Some(Commands::Terabox) => run_terabox_bot().await,
        None => {
            log::info!("No command specified, running storage bot");
            run_storage_bot().await
        }
    }
}

/// Fetches bot identity, retrying while the Bot API is still coming up.
async fn get_me_with_retry(bot: &Bot) -> Result<teloxide::types::Me> {
    let max_retries = 12;
    let mut retry = 0;
    loop {
        match bot.get_me().await {
            Ok(info) => return Ok(info),
            Err(e) => {
                retry += 1;
                if retry >= max_retries {
                    return Err(anyhow::anyhow!("Failed to connect to Bot API after {} retries: {}", retry, e));
                }
                log::warn!("Bot API not ready (attempt {}/{}): {}. Retrying in 5 seconds...", retry, max_retries, e);
                sleep(Duration::from_secs(5)).await;
            }
        }
    }
}

fn spawn_keep_alive_server() {
    let port = *config::KEEP_ALIVE_PORT;
    tokio::spawn(async move {
        if let Err(e) = web_server::start_keep_alive_server(port).await {
            log::error!("Keep-alive server failed: {}", e);
        }
    });
}

fn require_bot_token() -> Result<()> {
    if config::BOT_TOKEN.is_empty() {
        return Err(anyhow::anyhow!("BOT_TOKEN environment variable not set"));
    }
    Ok(())
}

/// Run the group file-storage bot
async fn run_storage_bot() -> Result<()> {
    log::info!("Starting storage bot...");
    require_bot_token()?;

    let db_pool = Arc::new(create_pool(&config::DATABASE_PATH)?);

    spawn_keep_alive_server();

    let bot = create_bot()?;
    let bot_info = get_me_with_retry(&bot).await?;
    let bot_username = bot_info.username.clone();
    log::info!("Bot username: {:?}, Bot ID: {}", bot_username, bot_info.id);

    setup_bot_commands(&bot).await?;

    let deps = HandlerDeps::new(db_pool, bot_username);

    log::info!("Storage bot is running (group id: {})", *config::GROUP_ID);
    Dispatcher::builder(bot, schema(deps))
        .dependencies(dptree::deps![])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    Ok(())
}

/// Run the Terabox relay bot
async fn run_terabox_bot() -> Result<()> {
    use teloxide::types::BotCommand;

    log::info!("Starting Terabox relay bot...");
    require_bot_token()?;

    spawn_keep_alive_server();

    let bot = create_bot()?;
    let bot_info = get_me_with_retry(&bot).await?;
    log::info!("Bot username: {:?}, Bot ID: {}", bot_info.username, bot_info.id);

    bot.set_my_commands(vec![
        BotCommand::new("start", "welcome message"),
        BotCommand::new("help", "how to use the bot"),
        BotCommand::new("about", "about this bot"),
    ])
    .await?;

    let deps = TeraboxDeps::new()?;

    log::info!("Terabox relay bot is running");
    Dispatcher::builder(bot, terabox_handlers::schema(deps))
        .dependencies(dptree::deps![])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    Ok(())
}
