//! REST backend implementation for json-server style APIs.
//!
//! Endpoints: `GET/POST /{collection}`, `GET/PUT/DELETE /{collection}/{id}` and
//! `GET /{collection}?{field}={value}` for equality lookups. The server mints
//! ids; this API has no server-side clock, so the write time is stamped here.

use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde_json::Value;
use std::time::Duration;

use super::{Document, DocumentStore, Fields, RemoteError};
use crate::constants::TIMESTAMP_FIELD;

/// REST store implementation.
pub struct RestStore {
    client: Client,
    base_url: String,
}

impl RestStore {
    pub fn new(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, RemoteError> {
        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                RemoteError::Timeout
            } else {
                RemoteError::Unavailable(e.to_string())
            }
        })?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(match status {
            StatusCode::NOT_FOUND => RemoteError::NotFound(body),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => RemoteError::PermissionDenied(body),
            _ => RemoteError::Unavailable(format!("API request failed: {status}")),
        })
    }

    async fn read_document(response: Response) -> Result<Document, RemoteError> {
        let value: Value = response
            .json()
            .await
            .map_err(|e| RemoteError::InvalidData(e.to_string()))?;
        to_document(value)
    }

    async fn read_documents(response: Response) -> Result<Vec<Document>, RemoteError> {
        let value: Value = response
            .json()
            .await
            .map_err(|e| RemoteError::InvalidData(e.to_string()))?;
        match value {
            Value::Array(items) => items.into_iter().map(to_document).collect(),
            other => Err(RemoteError::InvalidData(format!("expected an array, got {other}"))),
        }
    }

    fn stamp(mut fields: Fields) -> Fields {
        fields.insert(TIMESTAMP_FIELD.to_string(), Value::String(Utc::now().to_rfc3339()));
        fields
    }
}

fn to_document(value: Value) -> Result<Document, RemoteError> {
    let Value::Object(mut fields) = value else {
        return Err(RemoteError::InvalidData("document is not an object".to_string()));
    };
    let id = match fields.remove("id") {
        Some(Value::String(s)) => s,
        Some(Value::Number(n)) => n.to_string(),
        _ => return Err(RemoteError::InvalidData("document has no id".to_string())),
    };
    let timestamp = fields
        .get(TIMESTAMP_FIELD)
        .and_then(Value::as_str)
        .and_then(|s| chrono::DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc));
    Ok(Document { id, fields, timestamp })
}

#[async_trait]
impl DocumentStore for RestStore {
    fn store_type(&self) -> &str {
        "rest"
    }

    async fn ping(&self) -> Result<(), RemoteError> {
        self.client
            .get(&self.base_url)
            .send()
            .await
            .map(|_| ())
            .map_err(|e| RemoteError::Unavailable(e.to_string()))
    }

    async fn list(&self, collection: &str) -> Result<Vec<Document>, RemoteError> {
        let response = self.send(self.client.get(self.url(collection))).await?;
        Self::read_documents(response).await
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, RemoteError> {
        match self.send(self.client.get(self.url(&format!("{collection}/{id}")))).await {
            Ok(response) => Self::read_document(response).await.map(Some),
            Err(RemoteError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn find_by_field(&self, collection: &str, field: &str, value: &str) -> Result<Vec<Document>, RemoteError> {
        let request = self.client.get(self.url(collection)).query(&[(field, value)]);
        let response = self.send(request).await?;
        Self::read_documents(response).await
    }

    async fn insert(&self, collection: &str, fields: Fields) -> Result<Document, RemoteError> {
        let body = Value::Object(Self::stamp(fields));
        let response = self.send(self.client.post(self.url(collection)).json(&body)).await?;
        Self::read_document(response).await
    }

    async fn replace(&self, collection: &str, id: &str, fields: Fields) -> Result<Document, RemoteError> {
        let body = Value::Object(Self::stamp(fields));
        let response = self
            .send(self.client.put(self.url(&format!("{collection}/{id}"))).json(&body))
            .await?;
        Self::read_document(response).await
    }

    async fn remove(&self, collection: &str, id: &str) -> Result<(), RemoteError> {
        match self.send(self.client.delete(self.url(&format!("{collection}/{id}")))).await {
            Ok(_) | Err(RemoteError::NotFound(_)) => Ok(()),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_to_document_accepts_numeric_ids() {
        let document = to_document(json!({ "id": 7, "title": "Site", "timestamp": "2024-01-02T03:04:05Z" })).unwrap();
        assert_eq!(document.id, "7");
        assert_eq!(document.fields["title"], json!("Site"));
        assert!(document.timestamp.is_some());
        assert!(!document.fields.contains_key("id"));
    }

    #[test]
    fn test_to_document_rejects_missing_id() {
        assert!(matches!(
            to_document(json!({ "title": "Site" })),
            Err(RemoteError::InvalidData(_))
        ));
    }
}
