//! Serving stored files back to users
//!
//! Resolves a shareable link, bumps the retrieval counter, and resends the
//! original media by its Telegram file identifier (no re-upload).

use teloxide::prelude::*;
use teloxide::types::{ChatAction, ChatId, FileId, InputFile};

use super::types::{HandlerDeps, HandlerError};
use crate::storage::db::get_connection;
use crate::storage::files::{self, FileRecord, MediaKind};
use crate::telegram::Bot;

/// Caption attached to a served file.
fn file_caption(record: &FileRecord, download_count: i64) -> String {
    format!("📁 {}\n📥 Downloads: {}", record.file_name, download_count)
}

/// Looks up `link` and delivers the stored file to `chat_id`.
///
/// Unknown links get a short notice rather than an error.
pub async fn serve_by_link(
    bot: &Bot,
    chat_id: ChatId,
    deps: &HandlerDeps,
    link: &str,
) -> Result<(), HandlerError> {
    let record = {
        let conn = get_connection(&deps.db_pool)?;
        files::fetch_by_link(&conn, link)?
    };

    let record = match record {
        Some(r) => r,
        None => {
            bot.send_message(chat_id, "❌ File not found. The link may be wrong or the file was removed.")
                .await?;
            return Ok(());
        }
    };

    let count = {
        let conn = get_connection(&deps.db_pool)?;
        files::record_retrieval(&conn, record.id)?
    };

    bot.send_chat_action(chat_id, ChatAction::UploadDocument).await?;

    let input = InputFile::file_id(FileId(record.file_id.clone()));
    let caption = file_caption(&record, count);

    match record.file_type {
        MediaKind::Document => {
            bot.send_document(chat_id, input).caption(caption).await?;
        }
        MediaKind::Video => {
            bot.send_video(chat_id, input).caption(caption).await?;
        }
        MediaKind::Photo => {
            bot.send_photo(chat_id, input).caption(caption).await?;
        }
        MediaKind::Audio => {
            bot.send_audio(chat_id, input).caption(caption).await?;
        }
    }

    log::info!("Served file id={} via link={} (downloads={})", record.id, link, count);
    Ok(())
}
