//! Command and callback handlers for the storage bot

use teloxide::prelude::*;
use teloxide::types::{ChatId, InlineKeyboardButton, InlineKeyboardMarkup, Message};

use super::serve::serve_by_link;
use super::types::{HandlerDeps, HandlerError};
use crate::core::{config, utils::format_size};
use crate::storage::db::get_connection;
use crate::storage::files::{self, FileRecord};
use crate::telegram::{deep_link, Bot};

/// How many files /myfiles shows.
const MYFILES_LIMIT: i64 = 10;

/// Button label budget; Telegram truncates long labels anyway.
const BUTTON_NAME_LEN: usize = 30;

fn truncate_name(name: &str, max_chars: usize) -> String {
    if name.chars().count() <= max_chars {
        name.to_string()
    } else {
        let head: String = name.chars().take(max_chars.saturating_sub(1)).collect();
        format!("{}…", head)
    }
}

/// One row per file: fetch the file, or get its shareable link.
pub(super) fn files_keyboard(records: &[FileRecord]) -> InlineKeyboardMarkup {
    let rows: Vec<Vec<InlineKeyboardButton>> = records
        .iter()
        .filter_map(|r| {
            let link = r.custom_link.as_ref()?;
            Some(vec![
                InlineKeyboardButton::callback(
                    format!("📥 {}", truncate_name(&r.file_name, BUTTON_NAME_LEN)),
                    format!("get_{}", link),
                ),
                InlineKeyboardButton::callback("🔗 Link", format!("copy_{}", link)),
            ])
        })
        .collect();
    InlineKeyboardMarkup::new(rows)
}

/// Menu shown under /start.
pub(super) fn start_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![
        InlineKeyboardButton::callback("📂 My Files", "myfiles"),
        InlineKeyboardButton::callback("🔍 Search", "search"),
    ]])
}

/// Join links shown under /help. Buttons whose configured link is not a
/// valid URL are dropped.
pub(super) fn help_keyboard() -> InlineKeyboardMarkup {
    let mut row = Vec::new();
    if let Ok(url) = url::Url::parse(&config::GROUP_LINK) {
        row.push(InlineKeyboardButton::url("👥 Join group", url));
    }
    if let Ok(url) = url::Url::parse(&config::CHANNEL_LINK) {
        row.push(InlineKeyboardButton::url("📣 Channel", url));
    }
    InlineKeyboardMarkup::new(vec![row])
}

/// One listing line per file: name, size, downloads, link.
fn listing_line(record: &FileRecord, bot_username: Option<&str>) -> String {
    let link = record
        .custom_link
        .as_deref()
        .map(|l| deep_link(bot_username, l))
        .unwrap_or_else(|| "(no link)".to_string());
    format!(
        "📁 {} · {} · 📥 {}\n{}",
        record.file_name,
        format_size(record.file_size),
        record.download_count,
        link
    )
}

/// /start - welcome message, or file delivery when a deep link payload is present
pub async fn handle_start_command(
    bot: &Bot,
    msg: &Message,
    deps: &HandlerDeps,
    payload: &str,
) -> Result<(), HandlerError> {
    let payload = payload.trim();
    if !payload.is_empty() {
        return serve_by_link(bot, msg.chat.id, deps, payload).await;
    }

    let text = "👋 Hi! I keep files shared in our group and hand them out by link.\n\n\
         📥 Open a shared link (or send /start <name>) to get a file.\n\
         📂 /myfiles - recent stored files\n\
         🔍 /search <name> - find a file\n\
         📊 /stats - storage statistics\n\
         ℹ️ /help - how it works";
    bot.send_message(msg.chat.id, text)
        .reply_markup(start_keyboard())
        .await?;
    Ok(())
}

/// /help - usage overview with join links
pub async fn handle_help_command(bot: &Bot, msg: &Message) -> Result<(), HandlerError> {
    let text = "ℹ️ How it works\n\n\
         Post a photo, video, document or audio in the group and I store it \
         and reply with a shareable link. Anyone who opens the link gets the \
         file sent to them here.\n\n\
         📂 /myfiles - recent stored files\n\
         🔍 /search <name> - find a file by name\n\
         📊 /stats - storage statistics";
    bot.send_message(msg.chat.id, text)
        .reply_markup(help_keyboard())
        .await?;
    Ok(())
}

/// Sends the most recently stored files, newest first.
async fn send_recent_files(bot: &Bot, chat_id: ChatId, deps: &HandlerDeps) -> Result<(), HandlerError> {
    let records = {
        let conn = get_connection(&deps.db_pool)?;
        files::list_recent(&conn, MYFILES_LIMIT, 0)?
    };

    if records.is_empty() {
        bot.send_message(chat_id, "📂 No stored files yet. Post one in the group!")
            .await?;
        return Ok(());
    }

    let lines: Vec<String> = records
        .iter()
        .map(|r| listing_line(r, deps.bot_username.as_deref()))
        .collect();
    let text = format!("📂 Recent files ({}):\n\n{}", records.len(), lines.join("\n\n"));
    bot.send_message(chat_id, text)
        .reply_markup(files_keyboard(&records))
        .await?;
    Ok(())
}

/// /myfiles - the most recently stored files
pub async fn handle_myfiles_command(bot: &Bot, msg: &Message, deps: &HandlerDeps) -> Result<(), HandlerError> {
    send_recent_files(bot, msg.chat.id, deps).await
}

/// /search - substring search over file names
pub async fn handle_search_command(
    bot: &Bot,
    msg: &Message,
    deps: &HandlerDeps,
    query: &str,
) -> Result<(), HandlerError> {
    let query = query.trim();
    if query.is_empty() {
        bot.send_message(msg.chat.id, "🔍 Usage: /search <name>").await?;
        return Ok(());
    }

    let records = {
        let conn = get_connection(&deps.db_pool)?;
        files::search(&conn, query)?
    };

    if records.is_empty() {
        bot.send_message(msg.chat.id, format!("🔍 No files matching \"{}\".", query))
            .await?;
        return Ok(());
    }

    let lines: Vec<String> = records
        .iter()
        .map(|r| listing_line(r, deps.bot_username.as_deref()))
        .collect();
    let text = format!(
        "🔍 Found {} file(s) for \"{}\":\n\n{}",
        records.len(),
        query,
        lines.join("\n\n")
    );
    bot.send_message(msg.chat.id, text)
        .reply_markup(files_keyboard(&records))
        .await?;
    Ok(())
}

/// /stats - aggregate storage counters
pub async fn handle_stats_command(bot: &Bot, msg: &Message, deps: &HandlerDeps) -> Result<(), HandlerError> {
    let stats = {
        let conn = get_connection(&deps.db_pool)?;
        files::aggregate_stats(&conn)?
    };

    let text = format!(
        "📊 Storage statistics\n\n\
         📁 Files: {}\n\
         💾 Total size: {}\n\
         📥 Downloads: {}\n\
         👤 Uploaders: {}\n\n\
         🕒 {}",
        stats.total_files,
        format_size(stats.total_size),
        stats.total_downloads,
        stats.distinct_uploaders,
        chrono::Utc::now().format("%Y-%m-%d %H:%M UTC")
    );
    bot.send_message(msg.chat.id, text).await?;
    Ok(())
}

/// Handler for inline keyboard callbacks
/// (myfiles, search, get_<link>, copy_<link>)
pub async fn handle_callback(bot: &Bot, q: &CallbackQuery, deps: &HandlerDeps) -> Result<(), HandlerError> {
    let data = match q.data.as_deref() {
        Some(d) => d,
        None => return Ok(()),
    };
    let (chat_id, message_id) = match q.message.as_ref() {
        Some(m) => (m.chat().id, m.id()),
        None => return Ok(()),
    };

    bot.answer_callback_query(q.id.clone()).await?;

    if let Some(link) = data.strip_prefix("get_") {
        serve_by_link(bot, chat_id, deps, link).await?;
    } else if let Some(link) = data.strip_prefix("copy_") {
        // Replace the listing with the bare link so it is easy to forward.
        bot.edit_message_text(chat_id, message_id, deep_link(deps.bot_username.as_deref(), link))
            .await?;
    } else if data == "myfiles" {
        send_recent_files(bot, chat_id, deps).await?;
    } else if data == "search" {
        bot.send_message(chat_id, "🔍 Usage: /search <name>").await?;
    } else {
        log::warn!("Unknown callback data: {}", data);
    }

    Ok(())
}
