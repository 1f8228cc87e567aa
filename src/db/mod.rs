mod schema;
pub mod queries;

pub use schema::init_db;

use std::sync::Arc;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::processor::ProcessorClient;

pub type DbPool = Pool<SqliteConnectionManager>;

/// Application state shared across request handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: DbPool,
    pub config: Arc<Config>,
    /// Shared HTTP client for processor API calls.
    pub http: reqwest::Client,
}

impl AppState {
    /// Processor client for the configured mode. Fails if no API key is
    /// set for that mode.
    pub fn processor_client(&self) -> Result<ProcessorClient> {
        let mode = self.config.mode;
        let api_key = self
            .config
            .api_key(mode)
            .filter(|k| !k.is_empty())
            .ok_or_else(|| {
                AppError::Internal(format!("processor API key not configured for {} mode", mode))
            })?;

        Ok(ProcessorClient::new(
            self.http.clone(),
            self.config.api_url(mode).to_string(),
            api_key.to_string(),
        ))
    }
}

pub fn create_pool(database_path: &str) -> std::result::Result<DbPool, r2d2::Error> {
    let manager = SqliteConnectionManager::file(database_path);
    Pool::builder().max_size(10).build(manager)
}
