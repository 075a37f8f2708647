//! Handler types and shared dependencies

use std::sync::Arc;

use crate::storage::db::DbPool;

/// Error type for handlers
pub type HandlerError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Dependencies required by handlers
#[derive(Clone)]
pub struct HandlerDeps {
    pub db_pool: Arc<DbPool>,
    /// Username of the running bot, used to build t.me deep links.
    pub bot_username: Option<String>,
}

impl HandlerDeps {
    pub fn new(db_pool: Arc<DbPool>, bot_username: Option<String>) -> Self {
        Self { db_pool, bot_username }
    }
}
