//! Typed local cache adapter.
//!
//! Stores one JSON array per entity collection under the collection's cache
//! key. Reads never fail: a missing key, a value that is not JSON, or JSON that
//! is not an array all read back as an empty collection. Writes are
//! best-effort and only logged on failure.
//!
//! Fallback writes go through a [`CacheSnapshot`], which edits the raw array
//! so elements that no longer match the entity schema are carried along
//! untouched instead of being dropped.

use log::{debug, error, warn};
use serde_json::Value;
use std::marker::PhantomData;
use std::sync::Arc;

use super::KeyValueStore;
use crate::constants::LOG_CACHE_CORRUPT;
use crate::models::{Entity, Record, RecordId};

/// Local cache failures. Both are absorbed by [`LocalCache`] and only logged.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("Corrupt cache value under '{key}': {reason}")]
    Corrupt { key: String, reason: String },

    #[error("Local storage error: {0}")]
    Storage(String),
}

/// Cache of one entity collection.
pub struct LocalCache<E> {
    kv: Arc<dyn KeyValueStore>,
    _entity: PhantomData<fn() -> E>,
}

impl<E> Clone for LocalCache<E> {
    fn clone(&self) -> Self {
        Self {
            kv: Arc::clone(&self.kv),
            _entity: PhantomData,
        }
    }
}

impl<E: Entity> LocalCache<E> {
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self {
            kv,
            _entity: PhantomData,
        }
    }

    /// Cache key of this collection.
    pub fn key(&self) -> &'static str {
        E::COLLECTION.name()
    }

    /// Cached records; empty when absent or malformed.
    pub async fn get(&self) -> Vec<Record<E>> {
        self.snapshot().await.records()
    }

    /// Same as [`LocalCache::get`] but reports why the cache read as empty.
    pub async fn try_get(&self) -> Result<Vec<Record<E>>, CacheError> {
        Ok(self.try_snapshot().await?.records())
    }

    /// Raw cached array; empty when absent or malformed.
    pub async fn snapshot(&self) -> CacheSnapshot<E> {
        match self.try_snapshot().await {
            Ok(snapshot) => snapshot,
            Err(e @ CacheError::Corrupt { .. }) => {
                warn!("{LOG_CACHE_CORRUPT}: {e}");
                CacheSnapshot::default()
            }
            Err(e) => {
                error!("❌ Failed to read local cache: {e}");
                CacheSnapshot::default()
            }
        }
    }

    pub async fn try_snapshot(&self) -> Result<CacheSnapshot<E>, CacheError> {
        let raw = self
            .kv
            .get_item(self.key())
            .await
            .map_err(|e| CacheError::Storage(e.to_string()))?;
        match raw {
            Some(raw) => CacheSnapshot::parse(self.key(), &raw),
            None => Ok(CacheSnapshot::default()),
        }
    }

    /// Overwrite the cached collection. Failures are logged, not returned.
    pub async fn set(&self, records: &[Record<E>]) {
        let mut snapshot = CacheSnapshot::default();
        for record in records {
            snapshot.push(record);
        }
        self.store(&snapshot).await;
    }

    /// Write a snapshot back, undecodable elements included.
    pub async fn store(&self, snapshot: &CacheSnapshot<E>) {
        let encoded = match serde_json::to_string(&snapshot.items) {
            Ok(encoded) => encoded,
            Err(e) => {
                error!("❌ Failed to encode {} for local cache: {e}", self.key());
                return;
            }
        };
        match self.kv.set_item(self.key(), &encoded).await {
            Ok(()) => debug!("Cached {} {} entries", snapshot.len(), self.key()),
            Err(e) => error!("❌ Failed to write {} to local cache: {e}", self.key()),
        }
    }

    /// Drop the cached collection entirely.
    pub async fn remove(&self) {
        if let Err(e) = self.kv.remove_item(self.key()).await {
            error!("❌ Failed to remove {} from local cache: {e}", self.key());
        }
    }

    /// Decode a raw cache value. Elements that do not match the entity schema
    /// are left out of the result.
    pub fn decode(key: &str, raw: &str) -> Result<Vec<Record<E>>, CacheError> {
        Ok(CacheSnapshot::<E>::parse(key, raw)?.records())
    }
}

/// Raw elements of one cached collection.
///
/// Typed edits only touch the elements they address; every other element is
/// kept verbatim, whether or not it still decodes.
#[derive(Debug, Clone)]
pub struct CacheSnapshot<E> {
    items: Vec<Value>,
    _entity: PhantomData<fn() -> E>,
}

impl<E> Default for CacheSnapshot<E> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            _entity: PhantomData,
        }
    }
}

impl<E: Entity> CacheSnapshot<E> {
    fn parse(key: &str, raw: &str) -> Result<Self, CacheError> {
        let value: Value = serde_json::from_str(raw).map_err(|e| CacheError::Corrupt {
            key: key.to_string(),
            reason: e.to_string(),
        })?;
        let Value::Array(items) = value else {
            return Err(CacheError::Corrupt {
                key: key.to_string(),
                reason: "value is not an array".to_string(),
            });
        };
        Ok(Self {
            items,
            _entity: PhantomData,
        })
    }

    /// Number of elements, decodable or not.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Every element with its decoding result, in cache order.
    pub fn entries(&self) -> impl Iterator<Item = Result<Record<E>, serde_json::Error>> + '_ {
        self.items.iter().map(|item| serde_json::from_value(item.clone()))
    }

    /// Decodable records; the others are logged and skipped.
    pub fn records(&self) -> Vec<Record<E>> {
        self.entries()
            .filter_map(|entry| match entry {
                Ok(record) => Some(record),
                Err(e) => {
                    warn!("⚠️  Skipping malformed {} entry in local cache: {e}", E::COLLECTION);
                    None
                }
            })
            .collect()
    }

    /// Next local id, counting the ids of undecodable elements too.
    pub fn next_local_id(&self) -> RecordId {
        let ids: Vec<RecordId> = self.items.iter().filter_map(item_id).collect();
        RecordId::next_local(ids.iter())
    }

    pub fn get(&self, id: &RecordId) -> Option<Record<E>> {
        let item = self.position(id).map(|index| &self.items[index])?;
        serde_json::from_value(item.clone()).ok()
    }

    pub fn push(&mut self, record: &Record<E>) {
        if let Some(item) = encode(record) {
            self.items.push(item);
        }
    }

    /// Replace the element with the record's id. Returns false when absent.
    pub fn replace(&mut self, record: &Record<E>) -> bool {
        let Some(index) = self.position(&record.id) else {
            return false;
        };
        match encode(record) {
            Some(item) => {
                self.items[index] = item;
                true
            }
            None => false,
        }
    }

    pub fn upsert(&mut self, record: &Record<E>) {
        if !self.replace(record) {
            self.push(record);
        }
    }

    /// Drop every element with the given id. Returns whether any was removed.
    pub fn remove(&mut self, id: &RecordId) -> bool {
        let before = self.items.len();
        self.items.retain(|item| item_id(item).as_ref() != Some(id));
        self.items.len() != before
    }

    /// Set one field on the element with the given id, leaving its other
    /// fields as they are. Returns false when absent or not an object.
    pub fn set_field(&mut self, id: &RecordId, field: &str, value: Value) -> bool {
        let Some(index) = self.position(id) else {
            return false;
        };
        match self.items[index].as_object_mut() {
            Some(object) => {
                object.insert(field.to_string(), value);
                true
            }
            None => false,
        }
    }

    fn position(&self, id: &RecordId) -> Option<usize> {
        self.items.iter().position(|item| item_id(item).as_ref() == Some(id))
    }
}

fn item_id(item: &Value) -> Option<RecordId> {
    item.get("id").and_then(|id| serde_json::from_value(id.clone()).ok())
}

fn encode<E: Entity>(record: &Record<E>) -> Option<Value> {
    match serde_json::to_value(record) {
        Ok(item) => Some(item),
        Err(e) => {
            error!("❌ Failed to encode {} {} for local cache: {e}", E::COLLECTION, record.id);
            None
        }
    }
}
