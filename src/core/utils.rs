/// Formats a byte count as a human-readable size string.
///
/// Matches the display used in ingest replies, listings, and /stats:
/// `512 B`, `1.5 KB`, `12.0 MB`, `1.2 GB`.
pub fn format_size(size_bytes: i64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = 1024.0 * 1024.0;
    const GB: f64 = 1024.0 * 1024.0 * 1024.0;

    let size = size_bytes.max(0) as f64;
    if size < KB {
        format!("{} B", size_bytes.max(0))
    } else if size < MB {
        format!("{:.1} KB", size / KB)
    } else if size < GB {
        format!("{:.1} MB", size / MB)
    } else {
        format!("{:.1} GB", size / GB)
    }
}
