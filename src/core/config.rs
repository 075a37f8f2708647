use once_cell::sync::Lazy;
use std::env;
use std::time::Duration;

/// Bot token
/// Read from BOT_TOKEN or TELOXIDE_TOKEN environment variable
pub static BOT_TOKEN: Lazy<String> = Lazy::new(|| {
    env::var("BOT_TOKEN")
        .or_else(|_| env::var("TELOXIDE_TOKEN"))
        .unwrap_or_else(|_| String::new())
});

/// Chat ID of the monitored group whose media uploads are ingested
/// Read from GROUP_ID environment variable
/// Default: 0 (ingestion effectively disabled until configured)
pub static GROUP_ID: Lazy<i64> = Lazy::new(|| {
    env::var("GROUP_ID")
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(0)
});

/// Database file path
/// Read from DATABASE_PATH environment variable
/// Default: storage.db
pub static DATABASE_PATH: Lazy<String> =
    Lazy::new(|| env::var("DATABASE_PATH").unwrap_or_else(|_| "storage.db".to_string()));

/// Log file path
/// Read from LOG_FILE_PATH environment variable
/// Default: bot.log
pub static LOG_FILE_PATH: Lazy<String> =
    Lazy::new(|| env::var("LOG_FILE_PATH").unwrap_or_else(|_| "bot.log".to_string()));

/// Public invite link of the monitored group, shown in /start and /help
pub static GROUP_LINK: Lazy<String> =
    Lazy::new(|| env::var("GROUP_LINK").unwrap_or_else(|_| "https://t.me/your_group".to_string()));

/// Optional companion channel link
pub static CHANNEL_LINK: Lazy<String> =
    Lazy::new(|| env::var("CHANNEL_LINK").unwrap_or_else(|_| "https://t.me/your_channel".to_string()));

/// Maximum accepted file size in megabytes
/// Read from MAX_FILE_SIZE_MB environment variable
/// Default: 2000 (2 GB)
pub static MAX_FILE_SIZE_MB: Lazy<u64> = Lazy::new(|| {
    env::var("MAX_FILE_SIZE_MB")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(2000)
});

/// Maximum accepted file size in bytes.
///
/// The same ceiling applies to group ingestion and to the Terabox relay
/// download path.
pub fn max_file_size_bytes() -> u64 {
    *MAX_FILE_SIZE_MB * 1024 * 1024
}

/// Port for the keep-alive HTTP server
/// Read from KEEP_ALIVE_PORT environment variable
/// Default: 8080
pub static KEEP_ALIVE_PORT: Lazy<u16> = Lazy::new(|| {
    env::var("KEEP_ALIVE_PORT")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(8080)
});

/// Admin configuration
pub mod admin {
    use once_cell::sync::Lazy;
    use std::env;

    fn parse_admin_ids(raw: &str) -> Vec<i64> {
        raw.split([',', ' ', '\n', '\t'])
            .filter_map(|part| part.trim().parse::<i64>().ok())
            .collect()
    }

    /// Admin user IDs (comma-separated)
    /// Read from ADMIN_IDS environment variable
    pub static ADMIN_IDS: Lazy<Vec<i64>> = Lazy::new(|| {
        env::var("ADMIN_IDS")
            .ok()
            .map(|raw| parse_admin_ids(&raw))
            .unwrap_or_default()
    });

    /// Returns true if the given user ID is in the admin allowlist.
    pub fn is_admin(user_id: i64) -> bool {
        ADMIN_IDS.contains(&user_id)
    }

    #[cfg(test)]
    mod tests {
        use super::parse_admin_ids;

        #[test]
        fn test_parse_admin_ids_mixed_separators() {
            assert_eq!(parse_admin_ids("1,2 3\n4"), vec![1, 2, 3, 4]);
            assert_eq!(parse_admin_ids("  42  "), vec![42]);
            assert_eq!(parse_admin_ids("abc, 7"), vec![7]);
            assert!(parse_admin_ids("").is_empty());
        }
    }
}

/// Network configuration
pub mod network {
    use super::Duration;

    /// Request timeout for HTTP requests (in seconds)
    /// Generous because relayed downloads can be large
    pub const REQUEST_TIMEOUT_SECS: u64 = 300;

    /// Request timeout duration
    pub fn timeout() -> Duration {
        Duration::from_secs(REQUEST_TIMEOUT_SECS)
    }
}
