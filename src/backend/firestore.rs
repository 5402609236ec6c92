//! Firestore backend implementation (REST API).
//!
//! Documents are exchanged in Firestore's typed value encoding and converted
//! to plain JSON at the boundary. All writes go through `:commit` so the
//! `timestamp` field can be set with a `REQUEST_TIME` server transform.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::debug;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::time::Duration;
use uuid::Uuid;

use super::{Document, DocumentStore, Fields, RemoteError};
use crate::constants::{FIRESTORE_AUTO_ID_LEN, FIRESTORE_BASE_URL, FIRESTORE_PAGE_SIZE, TIMESTAMP_FIELD};

/// Firestore store implementation.
pub struct FirestoreStore {
    client: Client,
    base_url: String,
    /// `projects/{project}/databases/{database}/documents`
    root: String,
    api_key: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawDocument {
    name: String,
    #[serde(default)]
    fields: Map<String, Value>,
    update_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListResponse {
    #[serde(default)]
    documents: Vec<RawDocument>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RunQueryItem {
    document: Option<RawDocument>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CommitResponse {
    #[serde(default)]
    write_results: Vec<WriteResult>,
    commit_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WriteResult {
    #[serde(default)]
    transform_results: Vec<Value>,
}

impl FirestoreStore {
    /// Create a store for the given project and database.
    pub fn new(project_id: &str, database: &str, api_key: Option<String>, timeout: Duration) -> anyhow::Result<Self> {
        Self::with_base_url(FIRESTORE_BASE_URL, project_id, database, api_key, timeout)
    }

    /// Same as [`FirestoreStore::new`] against a custom endpoint (e.g. the local emulator).
    pub fn with_base_url(
        base_url: &str,
        project_id: &str,
        database: &str,
        api_key: Option<String>,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            root: format!("projects/{project_id}/databases/{database}/documents"),
            api_key,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}{}", self.base_url, self.root, path)
    }

    fn document_name(&self, collection: &str, id: &str) -> String {
        format!("{}/{}/{}", self.root, collection, id)
    }

    fn with_key(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.api_key {
            Some(key) => request.query(&[("key", key)]),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, RemoteError> {
        let response = self.with_key(request).send().await.map_err(transport_error)?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(status_error(status, body))
    }

    async fn commit(&self, writes: Vec<Value>) -> Result<CommitResponse, RemoteError> {
        let response = self
            .send(self.client.post(self.url(":commit")).json(&json!({ "writes": writes })))
            .await?;
        response
            .json::<CommitResponse>()
            .await
            .map_err(|e| RemoteError::InvalidData(e.to_string()))
    }

    async fn write(&self, collection: &str, id: &str, fields: Fields, must_exist: bool) -> Result<Document, RemoteError> {
        let write = json!({
            "update": {
                "name": self.document_name(collection, id),
                "fields": encode_fields(&fields),
            },
            "updateTransforms": [
                { "fieldPath": TIMESTAMP_FIELD, "setToServerValue": "REQUEST_TIME" }
            ],
            "currentDocument": { "exists": must_exist },
        });
        let response = self.commit(vec![write]).await?;
        Ok(Document {
            id: id.to_string(),
            fields,
            timestamp: commit_timestamp(&response),
        })
    }
}

#[async_trait]
impl DocumentStore for FirestoreStore {
    fn store_type(&self) -> &str {
        "firestore"
    }

    async fn ping(&self) -> Result<(), RemoteError> {
        // Any HTTP answer proves the endpoint is reachable
        self.client
            .get(&self.base_url)
            .send()
            .await
            .map(|_| ())
            .map_err(transport_error)
    }

    async fn list(&self, collection: &str) -> Result<Vec<Document>, RemoteError> {
        let mut documents = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut request = self
                .client
                .get(self.url(&format!("/{collection}")))
                .query(&[("pageSize", FIRESTORE_PAGE_SIZE.to_string())]);
            if let Some(token) = &page_token {
                request = request.query(&[("pageToken", token)]);
            }

            let page: ListResponse = self
                .send(request)
                .await?
                .json()
                .await
                .map_err(|e| RemoteError::InvalidData(e.to_string()))?;

            documents.extend(page.documents.into_iter().map(decode_document));

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        debug!("Listed {} documents from {collection}", documents.len());
        Ok(documents)
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, RemoteError> {
        match self.send(self.client.get(self.url(&format!("/{collection}/{id}")))).await {
            Ok(response) => {
                let raw: RawDocument = response
                    .json()
                    .await
                    .map_err(|e| RemoteError::InvalidData(e.to_string()))?;
                Ok(Some(decode_document(raw)))
            }
            Err(RemoteError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn find_by_field(&self, collection: &str, field: &str, value: &str) -> Result<Vec<Document>, RemoteError> {
        let query = json!({
            "structuredQuery": {
                "from": [{ "collectionId": collection }],
                "where": {
                    "fieldFilter": {
                        "field": { "fieldPath": field },
                        "op": "EQUAL",
                        "value": { "stringValue": value },
                    }
                },
            }
        });
        let items: Vec<RunQueryItem> = self
            .send(self.client.post(self.url(":runQuery")).json(&query))
            .await?
            .json()
            .await
            .map_err(|e| RemoteError::InvalidData(e.to_string()))?;

        Ok(items
            .into_iter()
            .filter_map(|item| item.document)
            .map(decode_document)
            .collect())
    }

    async fn insert(&self, collection: &str, fields: Fields) -> Result<Document, RemoteError> {
        self.write(collection, &auto_id(), fields, false).await
    }

    async fn replace(&self, collection: &str, id: &str, fields: Fields) -> Result<Document, RemoteError> {
        self.write(collection, id, fields, true).await
    }

    async fn remove(&self, collection: &str, id: &str) -> Result<(), RemoteError> {
        self.commit(vec![json!({ "delete": self.document_name(collection, id) })])
            .await
            .map(|_| ())
    }
}

fn transport_error(error: reqwest::Error) -> RemoteError {
    if error.is_timeout() {
        RemoteError::Timeout
    } else {
        RemoteError::Unavailable(error.to_string())
    }
}

fn status_error(status: StatusCode, body: String) -> RemoteError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => RemoteError::PermissionDenied(body),
        StatusCode::NOT_FOUND => RemoteError::NotFound(body),
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => RemoteError::Timeout,
        _ => RemoteError::Unavailable(format!("HTTP {status}: {body}")),
    }
}

fn commit_timestamp(response: &CommitResponse) -> Option<DateTime<Utc>> {
    response
        .write_results
        .first()
        .and_then(|result| result.transform_results.first())
        .and_then(|value| value.get("timestampValue"))
        .and_then(Value::as_str)
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
        .or(response.commit_time)
}

/// Client-side document id, in the same shape Firestore SDKs mint.
fn auto_id() -> String {
    const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
    let bytes: Vec<u8> = Uuid::new_v4()
        .as_bytes()
        .iter()
        .chain(Uuid::new_v4().as_bytes())
        .copied()
        .collect();
    let mut id: String = bytes
        .iter()
        .take(FIRESTORE_AUTO_ID_LEN)
        .map(|b| ALPHABET[*b as usize % ALPHABET.len()] as char)
        .collect();
    // All-digit ids are reserved for locally minted records
    if id.bytes().all(|b| b.is_ascii_digit()) {
        id.replace_range(0..1, "A");
    }
    id
}

fn decode_document(raw: RawDocument) -> Document {
    let id = raw.name.rsplit('/').next().unwrap_or_default().to_string();
    let fields = decode_fields(&raw.fields);
    let timestamp = fields
        .get(TIMESTAMP_FIELD)
        .and_then(Value::as_str)
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
        .or(raw.update_time);
    Document { id, fields, timestamp }
}

fn encode_fields(fields: &Fields) -> Value {
    Value::Object(fields.iter().map(|(k, v)| (k.clone(), encode_value(v))).collect())
}

fn decode_fields(fields: &Map<String, Value>) -> Fields {
    fields.iter().map(|(k, v)| (k.clone(), decode_value(v))).collect()
}

fn encode_value(value: &Value) -> Value {
    match value {
        Value::Null => json!({ "nullValue": null }),
        Value::Bool(b) => json!({ "booleanValue": b }),
        Value::Number(n) => match n.as_i64() {
            Some(i) => json!({ "integerValue": i.to_string() }),
            None => json!({ "doubleValue": n.as_f64().unwrap_or_default() }),
        },
        Value::String(s) => json!({ "stringValue": s }),
        Value::Array(items) => json!({
            "arrayValue": { "values": items.iter().map(encode_value).collect::<Vec<_>>() }
        }),
        Value::Object(map) => json!({ "mapValue": { "fields": encode_fields(map) } }),
    }
}

fn decode_value(value: &Value) -> Value {
    let Some((kind, inner)) = value.as_object().and_then(|obj| obj.iter().next()) else {
        return Value::Null;
    };
    match kind.as_str() {
        "nullValue" => Value::Null,
        "booleanValue" => Value::Bool(inner.as_bool().unwrap_or_default()),
        "integerValue" => inner
            .as_str()
            .and_then(|s| s.parse::<i64>().ok())
            .or_else(|| inner.as_i64())
            .map(Value::from)
            .unwrap_or(Value::Null),
        "doubleValue" => inner.as_f64().map(Value::from).unwrap_or(Value::Null),
        "arrayValue" => Value::Array(
            inner
                .get("values")
                .and_then(Value::as_array)
                .map(|values| values.iter().map(decode_value).collect())
                .unwrap_or_default(),
        ),
        "mapValue" => Value::Object(
            inner
                .get("fields")
                .and_then(Value::as_object)
                .map(decode_fields)
                .unwrap_or_default(),
        ),
        // stringValue, timestampValue, referenceValue, bytesValue, geoPointValue
        _ => inner.clone(),
    }
}
