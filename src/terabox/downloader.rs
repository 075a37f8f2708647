//! Streaming download of shared payloads
//!
//! Relayed files are buffered in memory before being re-sent through
//! Telegram, so the size ceiling is enforced both up front (Content-Length)
//! and while streaming, in case the header lies or is absent.

use bytes::{Bytes, BytesMut};
use futures_util::StreamExt;

use crate::core::error::{AppError, AppResult};

/// Downloads `url` into memory, refusing payloads over `max_bytes`.
pub async fn download_payload(client: &reqwest::Client, url: &str, max_bytes: u64) -> AppResult<Bytes> {
    let resp = client.get(url).send().await?;
    let status = resp.status();
    if !status.is_success() {
        return Err(AppError::HttpStatus(status));
    }

    if let Some(declared) = resp.content_length() {
        if declared > max_bytes {
            return Err(AppError::Validation(format!(
                "payload is {} bytes, over the {} byte limit",
                declared, max_bytes
            )));
        }
    }

    let mut buf = BytesMut::new();
    let mut stream = resp.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        if (buf.len() + chunk.len()) as u64 > max_bytes {
            return Err(AppError::Validation(format!(
                "payload exceeded the {} byte limit while streaming",
                max_bytes
            )));
        }
        buf.extend_from_slice(&chunk);
    }

    Ok(buf.freeze())
}
