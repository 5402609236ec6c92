//! Remote store abstraction layer.
//!
//! This module defines the document-store interface every remote backend must
//! implement, the backend-agnostic document representation and the error type,
//! plus [`RemoteCollection`], the typed per-entity view repositories work with.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::warn;
use serde_json::{Map, Value};
use std::marker::PhantomData;
use std::sync::Arc;

use crate::constants::TIMESTAMP_FIELD;
use crate::models::{Entity, Record, RecordId};

pub mod factory;
pub mod firestore;
pub mod memory;
pub mod rest;

/// Field map of a document, without its id.
pub type Fields = Map<String, Value>;

/// Errors reported by remote stores.
///
/// Repositories treat every variant as "remote unavailable" and fall back to
/// the local cache; the distinction only matters for logs and diagnostics.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RemoteError {
    #[error("Remote store unavailable: {0}")]
    Unavailable(String),

    #[error("Document not found: {0}")]
    NotFound(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Remote request timed out")]
    Timeout,

    #[error("Invalid data: {0}")]
    InvalidData(String),
}

/// Backend-agnostic document representation.
#[derive(Clone, Debug, PartialEq)]
pub struct Document {
    pub id: String,
    pub fields: Fields,
    /// Server-assigned write time, when the store reports one
    pub timestamp: Option<DateTime<Utc>>,
}

impl Document {
    pub fn new(id: impl Into<String>, fields: Fields) -> Self {
        Self {
            id: id.into(),
            fields,
            timestamp: None,
        }
    }

    /// Decode into a typed record. The server timestamp is not part of the record.
    pub fn into_record<E: Entity>(self) -> Result<Record<E>, RemoteError> {
        let mut fields = self.fields;
        fields.remove(TIMESTAMP_FIELD);
        fields.remove("id");
        let data: E = serde_json::from_value(Value::Object(fields))
            .map_err(|e| RemoteError::InvalidData(format!("{} document {}: {e}", E::COLLECTION, self.id)))?;
        Ok(Record::new(self.id, data))
    }
}

/// Encode an entity payload into a document field map.
pub fn entity_fields<E: Entity>(entity: &E) -> Result<Fields, RemoteError> {
    match serde_json::to_value(entity) {
        Ok(Value::Object(mut fields)) => {
            fields.remove("id");
            fields.remove(TIMESTAMP_FIELD);
            Ok(fields)
        }
        Ok(other) => Err(RemoteError::InvalidData(format!(
            "{} payload is not an object: {other}",
            E::COLLECTION
        ))),
        Err(e) => Err(RemoteError::InvalidData(e.to_string())),
    }
}

/// Document store trait that all remote backends must implement.
///
/// Writes attach a server-assigned timestamp under the `timestamp` field.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Returns the store type identifier (e.g., "firestore", "rest").
    fn store_type(&self) -> &str;

    /// Lightweight reachability call against the store's base endpoint.
    async fn ping(&self) -> Result<(), RemoteError>;

    // Collection-level operations
    async fn list(&self, collection: &str) -> Result<Vec<Document>, RemoteError>;
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, RemoteError>;
    async fn find_by_field(&self, collection: &str, field: &str, value: &str) -> Result<Vec<Document>, RemoteError>;

    // Writes
    async fn insert(&self, collection: &str, fields: Fields) -> Result<Document, RemoteError>;
    /// Full overwrite; fails with `NotFound` when the document does not exist.
    async fn replace(&self, collection: &str, id: &str, fields: Fields) -> Result<Document, RemoteError>;
    async fn remove(&self, collection: &str, id: &str) -> Result<(), RemoteError>;
}

/// Typed view of one remote collection.
pub struct RemoteCollection<E> {
    store: Arc<dyn DocumentStore>,
    _entity: PhantomData<fn() -> E>,
}

impl<E> Clone for RemoteCollection<E> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            _entity: PhantomData,
        }
    }
}

impl<E: Entity> RemoteCollection<E> {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            _entity: PhantomData,
        }
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    fn name(&self) -> &'static str {
        E::COLLECTION.name()
    }

    /// All decodable documents of the collection. Documents that do not match
    /// the entity schema are skipped, not treated as a store failure.
    pub async fn list_all(&self) -> Result<Vec<Record<E>>, RemoteError> {
        let documents = self.store.list(self.name()).await?;
        Ok(documents
            .into_iter()
            .filter_map(|document| match document.into_record::<E>() {
                Ok(record) => Some(record),
                Err(e) => {
                    warn!("⚠️  Skipping remote document: {e}");
                    None
                }
            })
            .collect())
    }

    pub async fn get(&self, id: &RecordId) -> Result<Option<Record<E>>, RemoteError> {
        self.store
            .get(self.name(), id.as_str())
            .await?
            .map(Document::into_record)
            .transpose()
    }

    pub async fn insert(&self, data: &E) -> Result<Record<E>, RemoteError> {
        let document = self.store.insert(self.name(), entity_fields(data)?).await?;
        Ok(Record::new(document.id, data.clone()))
    }

    pub async fn replace(&self, id: &RecordId, data: &E) -> Result<Record<E>, RemoteError> {
        let document = self.store.replace(self.name(), id.as_str(), entity_fields(data)?).await?;
        Ok(Record::new(document.id, data.clone()))
    }

    pub async fn remove(&self, id: &RecordId) -> Result<(), RemoteError> {
        self.store.remove(self.name(), id.as_str()).await
    }
}
