//! Dispatcher schema and handler chain builders

use teloxide::dispatching::{UpdateFilterExt, UpdateHandler};
use teloxide::prelude::*;
use teloxide::types::Message;

use super::commands::{
    handle_callback, handle_help_command, handle_myfiles_command, handle_search_command, handle_start_command,
    handle_stats_command,
};
use super::ingest::media_ingest_handler;
use super::types::{HandlerDeps, HandlerError};
use crate::telegram::bot::Command;
use crate::telegram::Bot;

/// Creates the main dispatcher schema for the storage bot.
///
/// Returns a handler tree usable with teloxide's Dispatcher. The same schema
/// is used in production and in integration tests.
pub fn schema(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    let deps_commands = deps.clone();
    let deps_ingest = deps.clone();
    let deps_callback = deps;

    dptree::entry()
        // Commands first so /commands posted in the group are not ingested
        .branch(command_handler(deps_commands))
        // Media posted in the monitored group
        .branch(media_ingest_handler(deps_ingest))
        // Plain text in private chats
        .branch(private_text_handler())
        // Inline keyboard buttons
        .branch(callback_handler(deps_callback))
}

/// Handler for plain text sent in a private chat
fn private_text_handler() -> UpdateHandler<HandlerError> {
    use teloxide::types::ChatKind;

    Update::filter_message()
        .filter(|msg: Message| {
            matches!(msg.chat.kind, ChatKind::Private(_)) && msg.text().map(|t| !t.starts_with('/')).unwrap_or(false)
        })
        .endpoint(|bot: Bot, msg: Message| async move {
            bot.send_message(msg.chat.id, "ℹ️ Send /help to see what I can do, or open a shared file link.")
                .await?;
            Ok(())
        })
}

/// Handler for bot commands (/start, /myfiles, /search, /stats, /help)
fn command_handler(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    Update::filter_message().branch(dptree::entry().filter_command::<Command>().endpoint(
        move |bot: Bot, msg: Message, cmd: Command| {
            let deps = deps.clone();
            async move {
                log::info!("Received command: {:?} from chat {}", cmd, msg.chat.id);

                match cmd {
                    Command::Start(payload) => {
                        handle_start_command(&bot, &msg, &deps, &payload).await?;
                    }
                    Command::Myfiles => {
                        handle_myfiles_command(&bot, &msg, &deps).await?;
                    }
                    Command::Search(query) => {
                        handle_search_command(&bot, &msg, &deps, &query).await?;
                    }
                    Command::Stats => {
                        handle_stats_command(&bot, &msg, &deps).await?;
                    }
                    Command::Help => {
                        handle_help_command(&bot, &msg).await?;
                    }
                }
                Ok(())
            }
        },
    ))
}

/// Handler for callback queries (inline keyboard buttons)
fn callback_handler(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    Update::filter_callback_query().endpoint(move |bot: Bot, q: CallbackQuery| {
        let deps = deps.clone();
        async move {
            if let Err(e) = handle_callback(&bot, &q, &deps).await {
                log::error!("Callback handler failed: {:?}", e);
            }
            Ok(())
        }
    })
}
