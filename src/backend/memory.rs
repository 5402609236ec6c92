//! In-process document store.
//!
//! Keeps collections in insertion order behind a mutex. The store can be
//! switched offline to simulate an outage: every call then fails with
//! [`RemoteError::Unavailable`].

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use uuid::Uuid;

use super::{Document, DocumentStore, Fields, RemoteError};
use crate::constants::TIMESTAMP_FIELD;

/// Memory-backed store implementation.
#[derive(Default)]
pub struct MemoryStore {
    collections: Mutex<HashMap<String, Vec<Document>>>,
    offline: AtomicBool,
    calls: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Toggle the simulated outage.
    pub fn set_online(&self, online: bool) {
        self.offline.store(!online, Ordering::SeqCst);
    }

    pub fn is_online(&self) -> bool {
        !self.offline.load(Ordering::SeqCst)
    }

    /// Number of store calls made so far, including failed ones.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Number of documents currently held in a collection.
    pub fn len(&self, collection: &str) -> usize {
        self.lock().get(collection).map(Vec::len).unwrap_or(0)
    }

    pub fn is_empty(&self, collection: &str) -> bool {
        self.len(collection) == 0
    }

    /// Snapshot of a collection, bypassing the outage switch.
    pub fn documents(&self, collection: &str) -> Vec<Document> {
        self.lock().get(collection).cloned().unwrap_or_default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Vec<Document>>> {
        // A poisoned lock only means another test thread panicked mid-call
        self.collections.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn enter(&self) -> Result<(), RemoteError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.is_online() {
            Ok(())
        } else {
            Err(RemoteError::Unavailable("memory store is offline".to_string()))
        }
    }

    fn stamp(fields: &mut Fields) -> chrono::DateTime<Utc> {
        let now = Utc::now();
        fields.insert(TIMESTAMP_FIELD.to_string(), Value::String(now.to_rfc3339()));
        now
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    fn store_type(&self) -> &str {
        "memory"
    }

    async fn ping(&self) -> Result<(), RemoteError> {
        self.enter()
    }

    async fn list(&self, collection: &str) -> Result<Vec<Document>, RemoteError> {
        self.enter()?;
        Ok(self.documents(collection))
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, RemoteError> {
        self.enter()?;
        Ok(self
            .lock()
            .get(collection)
            .and_then(|docs| docs.iter().find(|d| d.id == id).cloned()))
    }

    async fn find_by_field(&self, collection: &str, field: &str, value: &str) -> Result<Vec<Document>, RemoteError> {
        self.enter()?;
        Ok(self
            .lock()
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .filter(|d| d.fields.get(field).and_then(Value::as_str) == Some(value))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn insert(&self, collection: &str, mut fields: Fields) -> Result<Document, RemoteError> {
        self.enter()?;
        let timestamp = Self::stamp(&mut fields);
        let document = Document {
            id: format!("mem-{}", Uuid::new_v4().simple()),
            fields,
            timestamp: Some(timestamp),
        };
        self.lock()
            .entry(collection.to_string())
            .or_default()
            .push(document.clone());
        Ok(document)
    }

    async fn replace(&self, collection: &str, id: &str, mut fields: Fields) -> Result<Document, RemoteError> {
        self.enter()?;
        let timestamp = Self::stamp(&mut fields);
        let mut collections = self.lock();
        let existing = collections
            .get_mut(collection)
            .and_then(|docs| docs.iter_mut().find(|d| d.id == id))
            .ok_or_else(|| RemoteError::NotFound(format!("{collection}/{id}")))?;
        existing.fields = fields;
        existing.timestamp = Some(timestamp);
        Ok(existing.clone())
    }

    async fn remove(&self, collection: &str, id: &str) -> Result<(), RemoteError> {
        self.enter()?;
        if let Some(docs) = self.lock().get_mut(collection) {
            docs.retain(|d| d.id != id);
        }
        Ok(())
    }
}
