//! Share page scraping for Terabox links
//!
//! The share page is plain HTML; the file name sits in the `<title>` tag and
//! the size appears as a localized "文件大小" label. Pages that render neither
//! are reported as degraded rather than failing the whole interaction.

use once_cell::sync::Lazy;
use regex::Regex;
use select::document::Document;
use select::predicate::Name;
use url::Url;

use crate::core::error::AppResult;

/// Hostnames (and their subdomains) accepted as Terabox share links.
const ALLOWED_HOSTS: &[&str] = &["terabox.com", "1024tera.com", "teraboxapp.com"];

static SIZE_LABEL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"文件大小[：:]\s*([\d.]+\s*[GMK]B)").unwrap_or_else(|e| panic!("invalid size regex: {e}"))
});

/// What a share page yielded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageInfo {
    /// The page rendered a usable file name, maybe with a size label.
    Extracted { title: String, size: Option<String> },
    /// The page came back but nothing usable could be read from it.
    Degraded { reason: String },
}

/// Returns true when `url` points at a known Terabox host.
/// Subdomains count; lookalike hosts with a matching suffix do not.
pub fn is_terabox_url(url: &str) -> bool {
    let parsed = match Url::parse(url) {
        Ok(u) => u,
        Err(_) => return false,
    };
    let host = match parsed.host_str() {
        Some(h) => h.to_lowercase(),
        None => return false,
    };
    ALLOWED_HOSTS
        .iter()
        .any(|allowed| host == *allowed || host.ends_with(&format!(".{}", allowed)))
}

/// Strips branding suffixes Terabox appends to the page title.
fn clean_title(raw: &str) -> String {
    let trimmed = raw.trim();
    for suffix in [" - TeraBox", " | TeraBox", "- TeraBox"] {
        if let Some(stripped) = trimmed.strip_suffix(suffix) {
            return stripped.trim().to_string();
        }
    }
    trimmed.to_string()
}

/// Parses a share page body. Pure so it can be tested without a server.
pub fn parse_page(html: &str) -> PageInfo {
    let document = Document::from(html);

    let title = document
        .find(Name("title"))
        .next()
        .map(|n| clean_title(&n.text()))
        .filter(|t| !t.is_empty());

    let size = SIZE_LABEL
        .captures(html)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string());

    match title {
        Some(title) => PageInfo::Extracted { title, size },
        None => PageInfo::Degraded {
            reason: "share page has no readable title".to_string(),
        },
    }
}

/// Fetches a share page and extracts what it can.
///
/// Callers gate URLs through [`is_terabox_url`] first. A non-success HTTP
/// status degrades the result instead of erroring, since expired shares
/// commonly return error pages. Transport failures still surface as errors.
pub async fn extract_info(client: &reqwest::Client, url: &str) -> AppResult<PageInfo> {
    let resp = client.get(url).send().await?;
    let status = resp.status();
    if !status.is_success() {
        return Ok(PageInfo::Degraded {
            reason: format!("share page returned HTTP {}", status),
        });
    }

    let body = resp.text().await?;
    Ok(parse_page(&body))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_terabox_url_allowlist() {
        assert!(is_terabox_url("https://terabox.com/s/abc123"));
        assert!(is_terabox_url("https://www.terabox.com/s/abc123"));
        assert!(is_terabox_url("https://1024tera.com/s/abc123"));
        assert!(is_terabox_url("https://dl.teraboxapp.com/file/xyz"));

        assert!(!is_terabox_url("https://example.com/s/abc123"));
        assert!(!is_terabox_url("https://eviltherabox.com/s/abc"));
        assert!(!is_terabox_url("https://terabox.com.evil.io/s/abc"));
        assert!(!is_terabox_url("not a url"));
    }

    #[test]
    fn test_parse_page_title_and_size() {
        let html = r#"<html><head><title>holiday.mp4 - TeraBox</title></head>
            <body>文件大小: 1.5 GB</body></html>"#;
        assert_eq!(
            parse_page(html),
            PageInfo::Extracted {
                title: "holiday.mp4".to_string(),
                size: Some("1.5 GB".to_string()),
            }
        );
    }

    #[test]
    fn test_parse_page_title_without_size() {
        let html = "<html><head><title>notes.pdf</title></head><body></body></html>";
        assert_eq!(
            parse_page(html),
            PageInfo::Extracted {
                title: "notes.pdf".to_string(),
                size: None,
            }
        );
    }

    #[test]
    fn test_parse_page_missing_title_degrades() {
        let html = "<html><head></head><body>nothing here</body></html>";
        match parse_page(html) {
            PageInfo::Degraded { reason } => assert!(reason.contains("title")),
            other => panic!("expected Degraded, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_page_empty_title_degrades() {
        let html = "<html><head><title>   </title></head><body></body></html>";
        assert!(matches!(parse_page(html), PageInfo::Degraded { .. }));
    }
}
