//! Group media ingestion handler
//!
//! Watches the monitored group: every photo, video, document or audio
//! message becomes a stored file row with a shareable deep link.

use teloxide::prelude::*;
use teloxide::types::Message;

use super::types::{HandlerDeps, HandlerError};
use crate::core::{config, utils::format_size};
use crate::storage::db::get_connection;
use crate::storage::files::{self, IngestOutcome, MediaKind, NewFile};
use crate::telegram::{deep_link, Bot};

/// Media fields pulled out of an incoming group message.
#[derive(Debug, Clone)]
pub struct ExtractedMedia {
    pub file_id: String,
    pub file_unique_id: String,
    pub file_name: String,
    pub file_size: i64,
    pub mime_type: Option<String>,
    pub kind: MediaKind,
}

/// Extracts media from a message. For photos the largest rendition wins.
pub fn extract_media(msg: &Message) -> Option<ExtractedMedia> {
    if let Some(doc) = msg.document() {
        return Some(ExtractedMedia {
            file_id: doc.file.id.0.clone(),
            file_unique_id: doc.file.unique_id.0.clone(),
            file_name: doc
                .file_name
                .clone()
                .unwrap_or_else(|| format!("document_{}", doc.file.unique_id.0)),
            file_size: doc.file.size as i64,
            mime_type: doc.mime_type.as_ref().map(|m| m.to_string()),
            kind: MediaKind::Document,
        });
    }

    if let Some(video) = msg.video() {
        return Some(ExtractedMedia {
            file_id: video.file.id.0.clone(),
            file_unique_id: video.file.unique_id.0.clone(),
            file_name: video
                .file_name
                .clone()
                .unwrap_or_else(|| format!("video_{}.mp4", video.file.unique_id.0)),
            file_size: video.file.size as i64,
            mime_type: video.mime_type.as_ref().map(|m| m.to_string()),
            kind: MediaKind::Video,
        });
    }

    if let Some(photos) = msg.photo() {
        let photo = photos.iter().max_by_key(|p| p.width * p.height)?;
        return Some(ExtractedMedia {
            file_id: photo.file.id.0.clone(),
            file_unique_id: photo.file.unique_id.0.clone(),
            file_name: format!("photo_{}.jpg", photo.file.unique_id.0),
            file_size: photo.file.size as i64,
            mime_type: Some("image/jpeg".to_string()),
            kind: MediaKind::Photo,
        });
    }

    if let Some(audio) = msg.audio() {
        return Some(ExtractedMedia {
            file_id: audio.file.id.0.clone(),
            file_unique_id: audio.file.unique_id.0.clone(),
            file_name: audio
                .file_name
                .clone()
                .unwrap_or_else(|| format!("audio_{}.mp3", audio.file.unique_id.0)),
            file_size: audio.file.size as i64,
            mime_type: audio.mime_type.as_ref().map(|m| m.to_string()),
            kind: MediaKind::Audio,
        });
    }

    None
}

/// Returns true when the file is over the configured size ceiling.
pub fn exceeds_size_cap(file_size: i64, max_bytes: u64) -> bool {
    file_size > 0 && file_size as u64 > max_bytes
}

/// Keyboard attached to the stored-file confirmation.
pub(super) fn stored_keyboard(link: &str) -> teloxide::types::InlineKeyboardMarkup {
    use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};

    InlineKeyboardMarkup::new(vec![
        vec![
            InlineKeyboardButton::callback("📥 Get file", format!("get_{}", link)),
            InlineKeyboardButton::callback("🔗 Link", format!("copy_{}", link)),
        ],
        vec![InlineKeyboardButton::callback("📂 My Files", "myfiles")],
    ])
}

/// Handler for media posted in the monitored group
pub(super) fn media_ingest_handler(deps: HandlerDeps) -> teloxide::dispatching::UpdateHandler<HandlerError> {
    use teloxide::dispatching::UpdateFilterExt;

    Update::filter_message()
        .filter(|msg: Message| {
            msg.chat.id.0 == *config::GROUP_ID
                && (msg.photo().is_some() || msg.video().is_some() || msg.document().is_some() || msg.audio().is_some())
        })
        .endpoint(move |bot: Bot, msg: Message| {
            let deps = deps.clone();
            async move {
                let chat_id = msg.chat.id;
                let media = match extract_media(&msg) {
                    Some(m) => m,
                    None => return Ok(()),
                };

                if exceeds_size_cap(media.file_size, config::max_file_size_bytes()) {
                    bot.send_message(
                        chat_id,
                        format!(
                            "❌ File is too large ({}). Maximum size is {} MB.",
                            format_size(media.file_size),
                            *config::MAX_FILE_SIZE_MB
                        ),
                    )
                    .await?;
                    return Ok(());
                }

                let uploaded_by = msg.from.as_ref().and_then(|u| i64::try_from(u.id.0).ok()).unwrap_or(0);

                let conn = match get_connection(&deps.db_pool) {
                    Ok(c) => c,
                    Err(e) => {
                        log::error!("Failed to get DB connection: {}", e);
                        return Ok(());
                    }
                };

                let new_file = NewFile {
                    file_id: media.file_id.clone(),
                    file_name: media.file_name.clone(),
                    file_size: media.file_size,
                    mime_type: media.mime_type.clone(),
                    caption: msg.caption().map(|c| c.to_string()),
                    uploaded_by,
                    file_type: media.kind,
                    file_unique_id: Some(media.file_unique_id.clone()),
                    message_id: Some(msg.id.0 as i64),
                };

                match files::ingest(&conn, &new_file) {
                    Ok(IngestOutcome::Created(id)) => {
                        // Minted links are always random; name-derived links are
                        // reserved for an explicitly chosen name.
                        let link = match files::assign_link(&conn, &media.file_id, None) {
                            Ok(link) => link,
                            Err(e) => {
                                log::error!("Failed to assign link for file id {}: {}", id, e);
                                bot.send_message(chat_id, "❌ Could not store the file. Try again.").await?;
                                return Ok(());
                            }
                        };

                        log::info!(
                            "Stored file: id={}, name={}, size={}, link={}",
                            id,
                            media.file_name,
                            media.file_size,
                            link
                        );

                        bot.send_message(
                            chat_id,
                            format!(
                                "✅ File stored!\n\n📁 {}\n💾 {}\n\n🔗 {}",
                                media.file_name,
                                format_size(media.file_size),
                                deep_link(deps.bot_username.as_deref(), &link)
                            ),
                        )
                        .reply_markup(stored_keyboard(&link))
                        .await?;
                    }
                    Ok(IngestOutcome::AlreadyExists(existing)) => {
                        bot.send_message(
                            chat_id,
                            format!("ℹ️ This file is already stored as 📁 {}", existing.file_name),
                        )
                        .await?;
                    }
                    Err(e) => {
                        log::error!("Failed to ingest file {}: {}", media.file_id, e);
                        bot.send_message(chat_id, "❌ Could not store the file. Try again.").await?;
                    }
                }

                Ok(())
            }
        })
}
