use anyhow::{Context, Result};
use async_trait::async_trait;
use log::info;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Schema};
use std::path::Path;

use super::KeyValueStore;
use crate::entities::kv_entry;
use crate::repositories::KvRepository;

/// Persistent key-value storage backed by SQLite
pub struct LocalStorage {
    pub conn: DatabaseConnection,
}

impl LocalStorage {
    /// Open (creating if needed) the key-value database at `database_url`.
    pub async fn new(database_url: &str) -> Result<Self> {
        if let Some(path) = sqlite_file_path(database_url) {
            if let Some(parent) = Path::new(path).parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create cache directory: {}", parent.display()))?;
            }
        }

        let mut options = ConnectOptions::new(database_url.to_string());
        options.sqlx_logging(false);
        if database_url.contains(":memory:") {
            // Every pooled connection would otherwise see its own empty database
            options.max_connections(1).min_connections(1);
        }

        let conn = Database::connect(options)
            .await
            .with_context(|| format!("Failed to open local cache: {database_url}"))?;

        let storage = LocalStorage { conn };
        storage.init_schema().await?;
        info!("💾 Local cache ready at {database_url}");

        Ok(storage)
    }

    /// Private in-memory database, used by tests and dry runs.
    pub async fn in_memory() -> Result<Self> {
        Self::new("sqlite::memory:").await
    }

    /// Initialize database schema
    async fn init_schema(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        let schema = Schema::new(backend);
        let mut statement = schema.create_table_from_entity(kv_entry::Entity);
        statement.if_not_exists();
        self.conn.execute(backend.build(&statement)).await?;
        Ok(())
    }

    /// All keys currently stored
    pub async fn keys(&self) -> Result<Vec<String>> {
        KvRepository::keys(&self.conn).await
    }
}

#[async_trait]
impl KeyValueStore for LocalStorage {
    async fn get_item(&self, key: &str) -> Result<Option<String>> {
        Ok(KvRepository::get(&self.conn, key).await?.map(|entry| entry.value))
    }

    async fn set_item(&self, key: &str, value: &str) -> Result<()> {
        KvRepository::upsert(&self.conn, key, value).await
    }

    async fn remove_item(&self, key: &str) -> Result<()> {
        KvRepository::delete(&self.conn, key).await.map(|_| ())
    }
}

/// File path part of a `sqlite://path?query` URL.
fn sqlite_file_path(database_url: &str) -> Option<&str> {
    let rest = database_url.strip_prefix("sqlite://")?;
    let path = rest.split('?').next().unwrap_or(rest);
    if path.is_empty() || path.contains(":memory:") {
        None
    } else {
        Some(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sqlite_file_path() {
        assert_eq!(sqlite_file_path("sqlite:///tmp/x/cache.db?mode=rwc"), Some("/tmp/x/cache.db"));
        assert_eq!(sqlite_file_path("sqlite://cache.db"), Some("cache.db"));
        assert_eq!(sqlite_file_path("sqlite::memory:"), None);
        assert_eq!(sqlite_file_path("postgres://localhost/db"), None);
    }
}
