//! Integration tests for the file store

use pretty_assertions::assert_eq;
use regex::Regex;
use tempfile::TempDir;

use stashbot::storage::db::{create_pool, get_connection, DbPool};
use stashbot::storage::files::{self, IngestOutcome, MediaKind, NewFile, StorageStats};
use stashbot::AppError;

/// Fresh on-disk database per test. Pooled connections share one file, so
/// `:memory:` would give every connection its own empty database.
fn test_pool() -> (TempDir, DbPool) {
    let dir = TempDir::new().expect("create temp dir");
    let path = dir.path().join("storage.db");
    let pool = create_pool(path.to_str().expect("utf-8 path")).expect("create pool");
    (dir, pool)
}

fn new_file(file_id: &str, name: &str, uploaded_by: i64, size: i64) -> NewFile {
    NewFile {
        file_id: file_id.to_string(),
        file_name: name.to_string(),
        file_size: size,
        mime_type: Some("application/pdf".to_string()),
        caption: None,
        uploaded_by,
        file_type: MediaKind::Document,
        file_unique_id: Some(format!("u_{}", file_id)),
        message_id: Some(1),
    }
}

fn ingest_created(pool: &DbPool, nf: &NewFile) -> i64 {
    let conn = get_connection(pool).expect("get connection");
    match files::ingest(&conn, nf).expect("ingest") {
        IngestOutcome::Created(id) => id,
        other => panic!("expected Created, got {:?}", other),
    }
}

#[test]
fn duplicate_ingest_reports_existing_row() {
    let (_dir, pool) = test_pool();
    let nf = new_file("AAA", "report.pdf", 7, 1024);
    let id = ingest_created(&pool, &nf);

    let conn = get_connection(&pool).unwrap();
    match files::ingest(&conn, &nf).unwrap() {
        IngestOutcome::AlreadyExists(existing) => {
            assert_eq!(existing.id, id);
            assert_eq!(existing.file_name, "report.pdf");
        }
        other => panic!("expected AlreadyExists, got {:?}", other),
    }

    // The duplicate must not create a second row.
    let stats = files::aggregate_stats(&conn).unwrap();
    assert_eq!(stats.total_files, 1);
}

#[test]
fn assign_link_uses_sanitized_name() {
    let (_dir, pool) = test_pool();
    let nf = new_file("AAA", "My Report 2024.PDF", 7, 1024);
    ingest_created(&pool, &nf);

    let conn = get_connection(&pool).unwrap();
    let link = files::assign_link(&conn, "AAA", Some("My Report 2024.PDF")).unwrap();
    assert_eq!(link, "myreport2024pdf");

    let fetched = files::fetch_by_link(&conn, &link).unwrap().unwrap();
    assert_eq!(fetched.file_id, "AAA");
    // Fetching by link alone does not count as a retrieval.
    assert_eq!(fetched.download_count, 0);
}

#[test]
fn assign_link_without_name_mints_a_random_link() {
    let (_dir, pool) = test_pool();
    ingest_created(&pool, &new_file("AAA", "report.pdf", 7, 1024));

    let conn = get_connection(&pool).unwrap();
    let link = files::assign_link(&conn, "AAA", None).unwrap();

    // The file name must not leak into an unrequested link.
    assert_ne!(link, "reportpdf");
    let shape = Regex::new("^[a-z0-9]{8}$").unwrap();
    assert!(shape.is_match(&link), "unexpected link shape: {}", link);
}

#[test]
fn assign_link_falls_back_to_random_for_unusable_names() {
    let (_dir, pool) = test_pool();
    let nf = new_file("AAA", "отчёт.пдф", 7, 1024);
    ingest_created(&pool, &nf);

    let conn = get_connection(&pool).unwrap();
    let link = files::assign_link(&conn, "AAA", Some("отчёт.пдф")).unwrap();

    let shape = Regex::new("^[a-z0-9]{8}$").unwrap();
    assert!(shape.is_match(&link), "unexpected link shape: {}", link);
}

#[test]
fn assign_link_retries_on_collision() {
    let (_dir, pool) = test_pool();
    ingest_created(&pool, &new_file("AAA", "notes.txt", 7, 10));
    ingest_created(&pool, &new_file("BBB", "notes.txt", 8, 10));

    let conn = get_connection(&pool).unwrap();
    let first = files::assign_link(&conn, "AAA", Some("notes.txt")).unwrap();
    let second = files::assign_link(&conn, "BBB", Some("notes.txt")).unwrap();

    assert_eq!(first, "notestxt");
    assert_ne!(second, first);
    let shape = Regex::new("^[a-z0-9]{10}$").unwrap();
    assert!(shape.is_match(&second), "unexpected retry link shape: {}", second);

    // Both links resolve to their own file.
    assert_eq!(files::fetch_by_link(&conn, &first).unwrap().unwrap().file_id, "AAA");
    assert_eq!(files::fetch_by_link(&conn, &second).unwrap().unwrap().file_id, "BBB");
}

#[test]
fn assign_link_never_reassigns() {
    let (_dir, pool) = test_pool();
    ingest_created(&pool, &new_file("AAA", "notes.txt", 7, 10));

    let conn = get_connection(&pool).unwrap();
    let link = files::assign_link(&conn, "AAA", Some("notes.txt")).unwrap();

    let err = files::assign_link(&conn, "AAA", Some("other_name")).unwrap_err();
    assert!(matches!(err, AppError::Validation(_)), "got {:?}", err);

    // The original link survives.
    let fetched = files::fetch_by_link(&conn, &link).unwrap().unwrap();
    assert_eq!(fetched.custom_link.as_deref(), Some(link.as_str()));
}

#[test]
fn assign_link_rejects_unknown_file() {
    let (_dir, pool) = test_pool();
    let conn = get_connection(&pool).unwrap();
    let err = files::assign_link(&conn, "NOPE", Some("notes.txt")).unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
}

#[test]
fn record_retrieval_increments() {
    let (_dir, pool) = test_pool();
    let id = ingest_created(&pool, &new_file("AAA", "notes.txt", 7, 10));

    let conn = get_connection(&pool).unwrap();
    for expected in 1..=5 {
        let count = files::record_retrieval(&conn, id).unwrap();
        assert_eq!(count, expected);
    }
}

#[test]
fn concurrent_retrievals_lose_no_counts() {
    let (_dir, pool) = test_pool();
    let id = ingest_created(&pool, &new_file("AAA", "notes.txt", 7, 10));

    let mut handles = Vec::new();
    for _ in 0..8 {
        let pool = pool.clone();
        handles.push(std::thread::spawn(move || {
            let conn = get_connection(&pool).expect("get connection");
            for _ in 0..5 {
                files::record_retrieval(&conn, id).expect("record retrieval");
            }
        }));
    }
    for handle in handles {
        handle.join().expect("retrieval thread");
    }

    let conn = get_connection(&pool).unwrap();
    let record = files::fetch_by_file_id(&conn, "AAA").unwrap().unwrap();
    assert_eq!(record.download_count, 40);
}

#[test]
fn stats_on_empty_store_are_zero() {
    let (_dir, pool) = test_pool();
    let conn = get_connection(&pool).unwrap();
    assert_eq!(
        files::aggregate_stats(&conn).unwrap(),
        StorageStats {
            total_files: 0,
            total_size: 0,
            total_downloads: 0,
            distinct_uploaders: 0,
        }
    );
}

#[test]
fn stats_aggregate_across_uploaders() {
    let (_dir, pool) = test_pool();
    let id = ingest_created(&pool, &new_file("AAA", "a.txt", 7, 100));
    ingest_created(&pool, &new_file("BBB", "b.txt", 7, 200));
    ingest_created(&pool, &new_file("CCC", "c.txt", 9, 300));

    let conn = get_connection(&pool).unwrap();
    files::record_retrieval(&conn, id).unwrap();
    files::record_retrieval(&conn, id).unwrap();

    assert_eq!(
        files::aggregate_stats(&conn).unwrap(),
        StorageStats {
            total_files: 3,
            total_size: 600,
            total_downloads: 2,
            distinct_uploaders: 2,
        }
    );
}

#[test]
fn search_is_capped_at_twenty() {
    let (_dir, pool) = test_pool();
    for i in 0..25 {
        ingest_created(&pool, &new_file(&format!("F{}", i), &format!("invoice_{}.pdf", i), 7, 10));
    }

    let conn = get_connection(&pool).unwrap();
    let hits = files::search(&conn, "invoice").unwrap();
    assert_eq!(hits.len(), 20);
}

#[test]
fn search_without_matches_is_empty() {
    let (_dir, pool) = test_pool();
    ingest_created(&pool, &new_file("AAA", "notes.txt", 7, 10));

    let conn = get_connection(&pool).unwrap();
    assert!(files::search(&conn, "zzz_no_such_file").unwrap().is_empty());
}

#[test]
fn empty_query_matches_nothing() {
    let (_dir, pool) = test_pool();
    ingest_created(&pool, &new_file("AAA", "notes.txt", 7, 10));

    let conn = get_connection(&pool).unwrap();
    assert!(files::search(&conn, "").unwrap().is_empty());
    assert!(files::search(&conn, "   ").unwrap().is_empty());
}

#[test]
fn fetch_by_unknown_link_is_none() {
    let (_dir, pool) = test_pool();
    let conn = get_connection(&pool).unwrap();
    assert!(files::fetch_by_link(&conn, "missing").unwrap().is_none());
}

#[test]
fn list_recent_is_newest_first_and_paginates() {
    let (_dir, pool) = test_pool();
    for i in 0..5 {
        ingest_created(&pool, &new_file(&format!("F{}", i), &format!("file_{}.txt", i), 7, 10));
    }

    let conn = get_connection(&pool).unwrap();
    let first_page = files::list_recent(&conn, 3, 0).unwrap();

    assert_eq!(first_page.len(), 3);
    // Rows share a CURRENT_TIMESTAMP second, so ordering falls back to id.
    assert!(first_page.windows(2).all(|w| w[0].id > w[1].id));
    assert_eq!(first_page[0].file_name, "file_4.txt");

    let second_page = files::list_recent(&conn, 3, 3).unwrap();
    assert_eq!(second_page.len(), 2);
    assert_eq!(second_page[0].file_name, "file_1.txt");
    assert_eq!(second_page[1].file_name, "file_0.txt");
}
