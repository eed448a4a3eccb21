//! Firestore Document Store
//!
//! Talks to the Firestore REST API (v1). Documents carry typed values
//! (`{"stringValue": ..}`, `{"integerValue": ".."}`), so records are
//! encoded and decoded field by field here.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Map, Value};

use crate::config::FirestoreConfig;
use crate::domain::{NewProjectRecord, Project, ProjectField, ProjectPatch};
use crate::identity::IdentityProvider;
use super::traits::{DocumentStore, StoreError, StoreResult, PROJECTS_COLLECTION};

const DEFAULT_ENDPOINT: &str = "https://firestore.googleapis.com/v1";
const CREATED_AT: &str = "createdAt";

impl From<reqwest::Error> for StoreError {
    fn from(e: reqwest::Error) -> Self {
        StoreError::new(e.to_string())
    }
}

#[derive(Debug, Deserialize)]
struct Document {
    name: String,
    #[serde(default)]
    fields: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct RunQueryRow {
    #[serde(default)]
    document: Option<Document>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

pub struct FirestoreDocumentStore {
    client: reqwest::Client,
    config: FirestoreConfig,
    identity: Option<Arc<dyn IdentityProvider>>,
}

impl FirestoreDocumentStore {
    pub fn new(config: FirestoreConfig, identity: Option<Arc<dyn IdentityProvider>>) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
            identity,
        }
    }

    fn database_path(&self) -> String {
        format!(
            "{}/projects/{}/databases/(default)/documents",
            self.config.endpoint.as_deref().unwrap_or(DEFAULT_ENDPOINT).trim_end_matches('/'),
            self.config.project_id
        )
    }

    fn collection_url(&self) -> String {
        format!("{}/{}", self.database_path(), PROJECTS_COLLECTION)
    }

    fn document_url(&self, id: &str) -> String {
        format!("{}/{}", self.collection_url(), id)
    }

    /// Attach the API key and the signed-in user's token, if any
    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let mut request = request;
        if let Some(key) = &self.config.api_key {
            request = request.query(&[("key", key.as_str())]);
        }
        let token = self
            .identity
            .as_ref()
            .and_then(|provider| provider.current_session())
            .and_then(|identity| identity.id_token);
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        request
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> StoreResult<reqwest::Response> {
        let response = self.authorize(request).send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let err = match serde_json::from_str::<ErrorEnvelope>(&body) {
            Ok(envelope) => StoreError::new(envelope.error.message),
            Err(_) => StoreError::new(format!("Firestore request failed with status {}", status)),
        };
        log::warn!("firestore request failed: {}", err);
        Err(err)
    }
}

#[async_trait]
impl DocumentStore for FirestoreDocumentStore {
    async fn list_ordered_by_created_at_desc(&self) -> StoreResult<Vec<Project>> {
        let url = format!("{}:runQuery", self.database_path());
        let body = json!({
            "structuredQuery": {
                "from": [{ "collectionId": PROJECTS_COLLECTION }],
                "orderBy": [{
                    "field": { "fieldPath": CREATED_AT },
                    "direction": "DESCENDING"
                }]
            }
        });

        let rows: Vec<RunQueryRow> = self
            .send(self.client.post(url).json(&body))
            .await?
            .json()
            .await?;

        rows.into_iter()
            .filter_map(|row| row.document)
            .map(|doc| decode_document(&doc))
            .collect()
    }

    async fn create(&self, record: &NewProjectRecord) -> StoreResult<String> {
        let doc: Document = self
            .send(self.client.post(self.collection_url()).json(&encode_record(record)))
            .await?
            .json()
            .await?;
        Ok(document_id(&doc.name).to_string())
    }

    async fn delete(&self, id: &str) -> StoreResult<()> {
        self.send(self.client.delete(self.document_url(id))).await?;
        Ok(())
    }

    async fn update(&self, id: &str, patch: &ProjectPatch) -> StoreResult<()> {
        if patch.is_empty() {
            // An empty update mask would overwrite the whole document
            self.send(self.client.get(self.document_url(id))).await?;
            return Ok(());
        }

        let (body, mask) = encode_patch(patch);
        let mut query: Vec<(&str, &str)> = mask
            .iter()
            .map(|path| ("updateMask.fieldPaths", *path))
            .collect();
        query.push(("currentDocument.exists", "true"));

        self.send(self.client.patch(self.document_url(id)).query(&query).json(&body))
            .await?;
        Ok(())
    }
}

// ========================
// Value encoding
// ========================

fn string_value(value: &str) -> Value {
    json!({ "stringValue": value })
}

fn encode_record(record: &NewProjectRecord) -> Value {
    let mut fields = Map::new();
    for field in ProjectField::ALL {
        fields.insert(field.field_path().to_string(), string_value(record.value(field)));
    }
    fields.insert(
        CREATED_AT.to_string(),
        json!({ "integerValue": record.created_at.to_string() }),
    );
    json!({ "fields": fields })
}

fn encode_patch(patch: &ProjectPatch) -> (Value, Vec<&'static str>) {
    let mut fields = Map::new();
    let mut mask = Vec::new();
    for (field, value) in patch.fields() {
        fields.insert(field.field_path().to_string(), string_value(value));
        mask.push(field.field_path());
    }
    (json!({ "fields": fields }), mask)
}

/// Last path segment of `projects/<db>/databases/(default)/documents/projects/<id>`
fn document_id(name: &str) -> &str {
    name.rsplit('/').next().unwrap_or(name)
}

fn decode_string(fields: &Map<String, Value>, field: ProjectField) -> String {
    fields
        .get(field.field_path())
        .and_then(|v| v.get("stringValue"))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn decode_created_at(fields: &Map<String, Value>) -> StoreResult<i64> {
    let Some(value) = fields.get(CREATED_AT) else {
        return Ok(0);
    };
    if let Some(int) = value.get("integerValue") {
        return match int {
            Value::String(s) => s
                .parse()
                .map_err(|_| StoreError::new(format!("invalid {} value {:?}", CREATED_AT, s))),
            Value::Number(n) => n
                .as_i64()
                .ok_or_else(|| StoreError::new(format!("invalid {} value {}", CREATED_AT, n))),
            other => Err(StoreError::new(format!("invalid {} value {}", CREATED_AT, other))),
        };
    }
    if let Some(double) = value.get("doubleValue").and_then(Value::as_f64) {
        return Ok(double as i64);
    }
    Err(StoreError::new(format!("unsupported {} value {}", CREATED_AT, value)))
}

fn decode_document(doc: &Document) -> StoreResult<Project> {
    let fields = &doc.fields;
    Ok(Project {
        id: document_id(&doc.name).to_string(),
        name: decode_string(fields, ProjectField::Name),
        date: decode_string(fields, ProjectField::Date),
        day: decode_string(fields, ProjectField::Day),
        start_date: decode_string(fields, ProjectField::StartDate),
        end_date: decode_string(fields, ProjectField::EndDate),
        contractor: decode_string(fields, ProjectField::Contractor),
        consultant: decode_string(fields, ProjectField::Consultant),
        created_at: decode_created_at(fields)?,
    })
}
