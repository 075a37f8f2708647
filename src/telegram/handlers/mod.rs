//! Dispatcher schema and update handlers for the storage bot

pub mod commands;
pub mod ingest;
pub mod schema;
pub mod serve;
pub mod types;

pub use schema::schema;
pub use types::{HandlerDeps, HandlerError};
