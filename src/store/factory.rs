//! Store backend factory

use std::sync::Arc;

use crate::config::DatabaseConfig;

use super::backend::{StoreBackend, StoreError};
use super::memory_backend::MemoryStore;
use super::postgres_backend::PostgresStore;

/// Create a store backend based on configuration.
///
/// - `"postgres"`: connects to the configured database URL and runs
///   migrations; falls back to memory with a warning when no URL is set
/// - `"memory"` (default): in-memory store, records lost on restart
pub async fn create_store(config: &DatabaseConfig) -> Result<Arc<dyn StoreBackend>, StoreError> {
    match config.backend.as_str() {
        "postgres" => {
            if let Some(url) = &config.url {
                tracing::info!(backend = "postgres", "Creating PostgreSQL store");
                Ok(Arc::new(PostgresStore::connect(config, url).await?))
            } else {
                tracing::warn!(
                    "PostgreSQL backend requested but no database URL configured, falling back to memory"
                );
                Ok(Arc::new(MemoryStore::new()))
            }
        }
        other => {
            if other != "memory" {
                tracing::warn!(backend = %other, "Unknown store backend, using memory");
            } else {
                tracing::info!(backend = "memory", "Creating in-memory store");
            }
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}
