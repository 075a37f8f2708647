//! Terabox share-link inspection and relay

pub mod downloader;
pub mod extractor;
pub mod handlers;

pub use extractor::{extract_info, is_terabox_url, PageInfo};
