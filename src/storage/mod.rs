//! Local storage module for the browser-style key-value cache
//!
//! This module provides:
//! - the [`KeyValueStore`] capability (string keys, string values)
//! - [`LocalStorage`], a persistent SQLite implementation using SeaORM
//! - [`MemoryKeyValueStore`], a process-local implementation
//! - [`LocalCache`], the typed per-entity adapter the repositories use

use anyhow::Result;
use async_trait::async_trait;

pub mod cache;
pub mod db;
pub mod memory;

pub use cache::{CacheError, CacheSnapshot, LocalCache};
pub use db::LocalStorage;
pub use memory::MemoryKeyValueStore;

/// String key-value store with `localStorage` semantics.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get_item(&self, key: &str) -> Result<Option<String>>;
    async fn set_item(&self, key: &str, value: &str) -> Result<()>;
    async fn remove_item(&self, key: &str) -> Result<()>;
}
