pub mod config;
pub mod error;
pub mod logging;
pub mod utils;
pub mod web_server;
