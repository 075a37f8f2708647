//! Update handlers for the Terabox relay bot

use teloxide::dispatching::{UpdateFilterExt, UpdateHandler};
use teloxide::prelude::*;
use teloxide::types::{ChatAction, InlineKeyboardButton, InlineKeyboardMarkup, InputFile, Message};
use teloxide::utils::command::BotCommands;

use crate::core::config;
use crate::core::error::AppError;
use crate::telegram::handlers::HandlerError;
use crate::telegram::Bot;
use crate::terabox::downloader::download_payload;
use crate::terabox::extractor::{extract_info, is_terabox_url, PageInfo};

/// Shown when a share page yields no usable name.
const UNKNOWN_FILE: &str = "Unknown File";
/// Shown when a share page yields no size label.
const UNKNOWN_SIZE: &str = "Unknown Size";

/// Bot commands enum with descriptions
#[derive(BotCommands, Clone, Debug)]
#[command(rename_rule = "lowercase", description = "I can:")]
pub enum TeraboxCommand {
    #[command(description = "welcome message")]
    Start,
    #[command(description = "how to use the bot")]
    Help,
    #[command(description = "about this bot")]
    About,
}

/// Dependencies required by the relay handlers
#[derive(Clone)]
pub struct TeraboxDeps {
    pub client: reqwest::Client,
}

impl TeraboxDeps {
    pub fn new() -> anyhow::Result<Self> {
        // Share pages serve a stub to non-browser agents.
        let client = reqwest::Client::builder()
            .timeout(config::network::timeout())
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36")
            .build()?;
        Ok(Self { client })
    }
}

/// Display fields for a share page result, with placeholders for anything
/// the page did not yield.
pub fn display_fields(info: &PageInfo) -> (String, String) {
    match info {
        PageInfo::Extracted { title, size } => (
            title.clone(),
            size.clone().unwrap_or_else(|| UNKNOWN_SIZE.to_string()),
        ),
        PageInfo::Degraded { .. } => (UNKNOWN_FILE.to_string(), UNKNOWN_SIZE.to_string()),
    }
}

fn info_text(info: &PageInfo) -> String {
    let (name, size) = display_fields(info);
    format!("📁 File: {}\n💾 Size: {}", name, size)
}

fn link_keyboard(url: &str) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![
        InlineKeyboardButton::callback("📥 Download", format!("download_{}", url)),
        InlineKeyboardButton::callback("ℹ️ File Info", format!("info_{}", url)),
    ]])
}

/// Creates the dispatcher schema for the relay bot.
pub fn schema(deps: TeraboxDeps) -> UpdateHandler<HandlerError> {
    let deps_links = deps.clone();
    let deps_callback = deps;

    dptree::entry()
        .branch(command_handler())
        .branch(link_handler(deps_links))
        .branch(unsupported_text_handler())
        .branch(callback_handler(deps_callback))
}

/// True for plain chat text that is neither a command nor a Terabox link.
fn is_unsupported_text(text: &str) -> bool {
    let text = text.trim();
    !text.is_empty() && !text.starts_with('/') && !is_terabox_url(text)
}

/// Handler for text that is not a Terabox link. Replies without touching
/// the network.
fn unsupported_text_handler() -> UpdateHandler<HandlerError> {
    Update::filter_message()
        .filter(|msg: Message| msg.text().map(is_unsupported_text).unwrap_or(false))
        .endpoint(|bot: Bot, msg: Message| async move {
            bot.send_message(
                msg.chat.id,
                "❌ That is not a Terabox link.\n\n\
                 Send a share link from terabox.com, 1024tera.com or teraboxapp.com.",
            )
            .await?;
            Ok(())
        })
}

/// Handler for bot commands (/start, /help, /about)
fn command_handler() -> UpdateHandler<HandlerError> {
    Update::filter_message().branch(dptree::entry().filter_command::<TeraboxCommand>().endpoint(
        |bot: Bot, msg: Message, cmd: TeraboxCommand| async move {
            log::info!("Received command: {:?} from chat {}", cmd, msg.chat.id);

            let text = match cmd {
                TeraboxCommand::Start => {
                    "👋 Hi! Send me a Terabox share link and I will fetch the file for you.\n\n\
                     Supported hosts: terabox.com, 1024tera.com, teraboxapp.com"
                }
                TeraboxCommand::Help => {
                    "ℹ️ Paste a Terabox share link into the chat.\n\n\
                     📥 Download - I fetch the file and send it here\n\
                     ℹ️ File Info - name and size without downloading"
                }
                TeraboxCommand::About => {
                    "🤖 A small relay for Terabox share links. It reads the share \
                     page for the file name and size, and can stream the payload \
                     straight into this chat."
                }
            };
            bot.send_message(msg.chat.id, text).await?;
            Ok(())
        },
    ))
}

/// Handler for plain messages carrying a Terabox link
fn link_handler(deps: TeraboxDeps) -> UpdateHandler<HandlerError> {
    Update::filter_message()
        .filter(|msg: Message| msg.text().map(|t| is_terabox_url(t.trim())).unwrap_or(false))
        .endpoint(move |bot: Bot, msg: Message| {
            let deps = deps.clone();
            async move {
                let url = match msg.text() {
                    Some(t) => t.trim().to_string(),
                    None => return Ok(()),
                };

                let info = match extract_info(&deps.client, &url).await {
                    Ok(info) => info,
                    Err(e) => {
                        log::error!("Failed to inspect {}: {}", url, e);
                        bot.send_message(msg.chat.id, "❌ Could not reach that link. Try again later.")
                            .await?;
                        return Ok(());
                    }
                };

                bot.send_message(msg.chat.id, info_text(&info))
                    .reply_markup(link_keyboard(&url))
                    .await?;
                Ok(())
            }
        })
}

/// Handler for callback queries (download_<url>, info_<url>)
fn callback_handler(deps: TeraboxDeps) -> UpdateHandler<HandlerError> {
    Update::filter_callback_query().endpoint(move |bot: Bot, q: CallbackQuery| {
        let deps = deps.clone();
        async move {
            let data = match q.data.as_deref() {
                Some(d) => d.to_string(),
                None => return Ok(()),
            };
            let chat_id = match q.message.as_ref().map(|m| m.chat().id) {
                Some(id) => id,
                None => return Ok(()),
            };

            bot.answer_callback_query(q.id.clone()).await?;

            if let Some(url) = data.strip_prefix("download_") {
                if let Err(e) = relay_download(&bot, chat_id, &deps, url).await {
                    log::error!("Relay of {} failed: {}", url, e);
                    let notice = match e {
                        AppError::Validation(reason) => format!("❌ {}", reason),
                        _ => "❌ Download failed. The share may be expired or rate-limited.".to_string(),
                    };
                    bot.send_message(chat_id, notice).await?;
                }
            } else if let Some(url) = data.strip_prefix("info_") {
                match extract_info(&deps.client, url).await {
                    Ok(info) => {
                        bot.send_message(chat_id, info_text(&info)).await?;
                    }
                    Err(e) => {
                        log::error!("Failed to inspect {}: {}", url, e);
                        bot.send_message(chat_id, "❌ Could not reach that link. Try again later.")
                            .await?;
                    }
                }
            } else {
                log::warn!("Unknown callback data: {}", data);
            }

            Ok(())
        }
    })
}

/// Streams the shared payload and re-sends it as a document.
async fn relay_download(
    bot: &Bot,
    chat_id: teloxide::types::ChatId,
    deps: &TeraboxDeps,
    url: &str,
) -> Result<(), AppError> {
    bot.send_chat_action(chat_id, ChatAction::UploadDocument).await?;

    let info = extract_info(&deps.client, url).await?;
    let (name, _) = display_fields(&info);

    let payload = download_payload(&deps.client, url, config::max_file_size_bytes()).await?;

    bot.send_document(chat_id, InputFile::memory(payload).file_name(name.clone()))
        .caption(format!("📁 {}", name))
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_fields_placeholders() {
        let degraded = PageInfo::Degraded {
            reason: "HTTP 404".to_string(),
        };
        assert_eq!(
            display_fields(&degraded),
            ("Unknown File".to_string(), "Unknown Size".to_string())
        );

        let partial = PageInfo::Extracted {
            title: "movie.mkv".to_string(),
            size: None,
        };
        assert_eq!(
            display_fields(&partial),
            ("movie.mkv".to_string(), "Unknown Size".to_string())
        );
    }

    #[test]
    fn test_link_keyboard_embeds_url() {
        let kb = link_keyboard("https://terabox.com/s/abc");
        let row = &kb.inline_keyboard[0];
        assert_eq!(row.len(), 2);
        match &row[0].kind {
            teloxide::types::InlineKeyboardButtonKind::CallbackData(data) => {
                assert_eq!(data, "download_https://terabox.com/s/abc");
            }
            other => panic!("expected callback button, got {:?}", other),
        }
        match &row[1].kind {
            teloxide::types::InlineKeyboardButtonKind::CallbackData(data) => {
                assert_eq!(data, "info_https://terabox.com/s/abc");
            }
            other => panic!("expected callback button, got {:?}", other),
        }
    }

    #[test]
    fn test_unsupported_text_detection() {
        assert!(is_unsupported_text("hello there"));
        assert!(is_unsupported_text("https://example.com/s/abc"));
        assert!(!is_unsupported_text("https://terabox.com/s/abc"));
        assert!(!is_unsupported_text("  https://1024tera.com/s/abc  "));
        assert!(!is_unsupported_text("/start"));
        assert!(!is_unsupported_text("   "));
    }

    #[test]
    fn test_info_text_format() {
        let info = PageInfo::Extracted {
            title: "holiday.mp4".to_string(),
            size: Some("1.5 GB".to_string()),
        };
        assert_eq!(info_text(&info), "📁 File: holiday.mp4\n💾 Size: 1.5 GB");
    }
}
