//! Store factory for creating remote store instances from configuration.

use anyhow::{anyhow, Result};
use std::sync::Arc;

use super::{firestore::FirestoreStore, memory::MemoryStore, rest::RestStore, DocumentStore};
use crate::config::RemoteConfig;

/// Create a remote store instance from the `[remote]` configuration section.
///
/// # Errors
/// Returns error if:
/// - Store type is unknown
/// - Required settings for the store type are missing
/// - The HTTP client cannot be built
pub fn create_store(config: &RemoteConfig) -> Result<Arc<dyn DocumentStore>> {
    match config.store_type.as_str() {
        "firestore" => {
            if config.project_id.is_empty() {
                return Err(anyhow!("Missing 'project_id' in Firestore configuration"));
            }
            let store = if config.base_url.is_empty() {
                FirestoreStore::new(
                    &config.project_id,
                    &config.database,
                    config.api_key(),
                    config.request_timeout(),
                )?
            } else {
                FirestoreStore::with_base_url(
                    &config.base_url,
                    &config.project_id,
                    &config.database,
                    config.api_key(),
                    config.request_timeout(),
                )?
            };
            Ok(Arc::new(store))
        }
        "rest" => {
            if config.base_url.is_empty() {
                return Err(anyhow!("Missing 'base_url' in REST configuration"));
            }
            Ok(Arc::new(RestStore::new(&config.base_url, config.request_timeout())?))
        }
        "memory" => Ok(Arc::new(MemoryStore::new())),
        other => Err(anyhow!("Unknown store type: {}", other)),
    }
}
