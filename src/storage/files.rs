//! Stored file records and shareable links.
//!
//! Every media message ingested from the monitored group becomes one row in
//! the `files` table, keyed by the Telegram file identifier. A row may later
//! get a unique `custom_link` handle used in deep links.

use rand::Rng;
use rusqlite::{params, OptionalExtension};

use crate::core::error::{AppError, AppResult};
use crate::storage::db::DbConnection;

/// Attempts before giving up on finding a free link.
const LINK_RETRY_BUDGET: usize = 16;

/// Length of a generated link for a file with no usable name.
const LINK_DEFAULT_LEN: usize = 8;

/// Length of fallback candidates generated after a collision.
const LINK_RETRY_LEN: usize = 10;

const LINK_CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Media class of a stored file, as received from Telegram.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Document,
    Video,
    Photo,
    Audio,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Document => "document",
            MediaKind::Video => "video",
            MediaKind::Photo => "photo",
            MediaKind::Audio => "audio",
        }
    }

    /// Parses the stored `file_type` column. Unknown values fall back to
    /// `Document`, which is always resendable.
    pub fn from_db(s: &str) -> MediaKind {
        match s {
            "video" => MediaKind::Video,
            "photo" => MediaKind::Photo,
            "audio" => MediaKind::Audio,
            _ => MediaKind::Document,
        }
    }
}

/// A stored file row.
#[derive(Debug, Clone)]
pub struct FileRecord {
    pub id: i64,
    /// Telegram file identifier, used to resend without re-uploading
    pub file_id: String,
    pub file_name: String,
    pub file_size: i64,
    pub mime_type: Option<String>,
    pub caption: Option<String>,
    pub uploaded_by: i64,
    pub uploaded_at: String,
    pub download_count: i64,
    pub file_type: MediaKind,
    pub file_unique_id: Option<String>,
    pub message_id: Option<i64>,
    pub custom_link: Option<String>,
}

/// Fields captured from an incoming group media message.
#[derive(Debug, Clone)]
pub struct NewFile {
    pub file_id: String,
    pub file_name: String,
    pub file_size: i64,
    pub mime_type: Option<String>,
    pub caption: Option<String>,
    pub uploaded_by: i64,
    pub file_type: MediaKind,
    pub file_unique_id: Option<String>,
    pub message_id: Option<i64>,
}

/// Result of an ingest attempt.
#[derive(Debug)]
pub enum IngestOutcome {
    /// New row created with this rowid.
    Created(i64),
    /// The file identifier was already stored; the existing row is returned
    /// so callers can surface its link.
    AlreadyExists(FileRecord),
}

/// Aggregate counters for /stats.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageStats {
    pub total_files: i64,
    pub total_size: i64,
    pub total_downloads: i64,
    pub distinct_uploaders: i64,
}

const FILE_COLUMNS: &str = "id, file_id, file_name, file_size, mime_type, caption, uploaded_by, \
     uploaded_at, download_count, file_type, file_unique_id, message_id, custom_link";

fn map_file_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<FileRecord> {
    let file_type: String = row.get(9)?;
    Ok(FileRecord {
        id: row.get(0)?,
        file_id: row.get(1)?,
        file_name: row.get(2)?,
        file_size: row.get(3)?,
        mime_type: row.get(4)?,
        caption: row.get(5)?,
        uploaded_by: row.get(6)?,
        uploaded_at: row.get(7)?,
        download_count: row.get(8)?,
        file_type: MediaKind::from_db(&file_type),
        file_unique_id: row.get(10)?,
        message_id: row.get(11)?,
        custom_link: row.get(12)?,
    })
}

/// Returns true when `err` is a SQLite UNIQUE violation on the given column.
fn is_unique_violation(err: &rusqlite::Error, column: &str) -> bool {
    match err {
        rusqlite::Error::SqliteFailure(inner, Some(msg)) => {
            inner.code == rusqlite::ErrorCode::ConstraintViolation && msg.contains(column)
        }
        _ => false,
    }
}

/// Stores an incoming file, relying on the UNIQUE constraint on `file_id`
/// to detect duplicates instead of a read-then-write check.
pub fn ingest(conn: &DbConnection, new_file: &NewFile) -> AppResult<IngestOutcome> {
    let result = conn.execute(
        "INSERT INTO files (file_id, file_name, file_size, mime_type, caption, uploaded_by, file_type, file_unique_id, message_id)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            new_file.file_id,
            new_file.file_name,
            new_file.file_size,
            new_file.mime_type,
            new_file.caption,
            new_file.uploaded_by,
            new_file.file_type.as_str(),
            new_file.file_unique_id,
            new_file.message_id,
        ],
    );

    match result {
        Ok(_) => Ok(IngestOutcome::Created(conn.last_insert_rowid())),
        Err(err) if is_unique_violation(&err, "files.file_id") => {
            let existing = fetch_by_file_id(conn, &new_file.file_id)?.ok_or_else(|| {
                AppError::Validation(format!(
                    "duplicate file {} vanished during ingest",
                    new_file.file_id
                ))
            })?;
            Ok(IngestOutcome::AlreadyExists(existing))
        }
        Err(err) => Err(err.into()),
    }
}

/// Lowercases `name` and strips everything outside `[a-z0-9_]`.
/// Returns `None` when nothing survives.
pub fn sanitize_link_name(name: &str) -> Option<String> {
    let cleaned: String = name
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '_')
        .collect();
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned)
    }
}

/// Generates a random link of the given length from the link charset.
pub fn random_link(len: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| LINK_CHARSET[rng.gen_range(0..LINK_CHARSET.len())] as char)
        .collect()
}

/// Assigns a shareable link to a stored file.
///
/// With no desired name the link is random. A desired name is sanitized
/// first, falling back to random when nothing survives. On a collision with
/// an existing link a fresh, longer random candidate is tried. A file keeps
/// its first link forever; a second assignment attempt fails.
pub fn assign_link(conn: &DbConnection, file_id: &str, desired_name: Option<&str>) -> AppResult<String> {
    let mut candidate = desired_name
        .and_then(sanitize_link_name)
        .unwrap_or_else(|| random_link(LINK_DEFAULT_LEN));

    for _ in 0..LINK_RETRY_BUDGET {
        let result = conn.execute(
            "UPDATE files SET custom_link = ?1 WHERE file_id = ?2 AND custom_link IS NULL",
            params![candidate, file_id],
        );

        match result {
            Ok(1) => return Ok(candidate),
            Ok(_) => {
                return Err(AppError::Validation(format!(
                    "file {} is unknown or already has a link",
                    file_id
                )))
            }
            Err(err) if is_unique_violation(&err, "files.custom_link") => {
                candidate = random_link(LINK_RETRY_LEN);
            }
            Err(err) => return Err(err.into()),
        }
    }

    Err(AppError::LinkSpace(LINK_RETRY_BUDGET))
}

pub fn fetch_by_link(conn: &DbConnection, link: &str) -> AppResult<Option<FileRecord>> {
    let record = conn
        .query_row(
            &format!("SELECT {FILE_COLUMNS} FROM files WHERE custom_link = ?1"),
            params![link],
            map_file_row,
        )
        .optional()?;
    Ok(record)
}

pub fn fetch_by_file_id(conn: &DbConnection, file_id: &str) -> AppResult<Option<FileRecord>> {
    let record = conn
        .query_row(
            &format!("SELECT {FILE_COLUMNS} FROM files WHERE file_id = ?1"),
            params![file_id],
            map_file_row,
        )
        .optional()?;
    Ok(record)
}

/// Increments the retrieval counter in one statement and returns the new
/// value. The increment is atomic, so concurrent retrievals never lose
/// counts.
pub fn record_retrieval(conn: &DbConnection, id: i64) -> AppResult<i64> {
    let updated = conn.execute(
        "UPDATE files SET download_count = download_count + 1 WHERE id = ?1",
        params![id],
    )?;
    if updated == 0 {
        return Err(AppError::Validation(format!("no stored file with id {}", id)));
    }
    let count = conn.query_row(
        "SELECT download_count FROM files WHERE id = ?1",
        params![id],
        |row| row.get(0),
    )?;
    Ok(count)
}

/// Most recent files, newest first, with offset-based pagination.
pub fn list_recent(conn: &DbConnection, limit: i64, offset: i64) -> AppResult<Vec<FileRecord>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {FILE_COLUMNS} FROM files
         ORDER BY uploaded_at DESC, id DESC LIMIT ?1 OFFSET ?2"
    ))?;
    let rows = stmt.query_map(params![limit, offset], map_file_row)?;

    let mut records = Vec::new();
    for row in rows {
        records.push(row?);
    }
    Ok(records)
}

/// Case-insensitive substring search over file names, capped at 20 results.
/// An empty query matches nothing rather than everything.
pub fn search(conn: &DbConnection, query: &str) -> AppResult<Vec<FileRecord>> {
    let query = query.trim();
    if query.is_empty() {
        return Ok(Vec::new());
    }
    let pattern = format!("%{}%", query);
    let mut stmt = conn.prepare(&format!(
        "SELECT {FILE_COLUMNS} FROM files WHERE file_name LIKE ?1
         ORDER BY uploaded_at DESC, id DESC LIMIT 20"
    ))?;
    let rows = stmt.query_map(params![pattern], map_file_row)?;

    let mut records = Vec::new();
    for row in rows {
        records.push(row?);
    }
    Ok(records)
}

/// Aggregate counters over all stored files. An empty store yields zeros.
pub fn aggregate_stats(conn: &DbConnection) -> AppResult<StorageStats> {
    let stats = conn.query_row(
        "SELECT COUNT(*),
                COALESCE(SUM(file_size), 0),
                COALESCE(SUM(download_count), 0),
                COUNT(DISTINCT uploaded_by)
         FROM files",
        [],
        |row| {
            Ok(StorageStats {
                total_files: row.get(0)?,
                total_size: row.get(1)?,
                total_downloads: row.get(2)?,
                distinct_uploaders: row.get(3)?,
            })
        },
    )?;
    Ok(stats)
}
