use std::time::Duration as StdDuration;

use async_trait::async_trait;
use chrono::DateTime;
use serde_json::{json, Value as JsonValue};
use tracing::debug;

use crate::error::{AppError, AppResult};
use crate::store::{Document, DocumentRef, DocumentStore, FieldMap, Filter, FilterOp};

pub const DEFAULT_BASE_URL: &str = "https://firestore.googleapis.com/v1";
const DEFAULT_HTTP_TIMEOUT: StdDuration = StdDuration::from_secs(10);

#[derive(Debug, Clone)]
pub struct FirestoreConfig {
    pub project_id: String,
    /// Web API key, sent as the `key` query parameter.
    pub api_key: Option<String>,
    /// Per-session bearer token from the auth collaborator.
    pub auth_token: Option<String>,
    /// Override for emulators and tests; defaults to the hosted endpoint.
    pub base_url: Option<String>,
    pub http_timeout: StdDuration,
}

impl FirestoreConfig {
    pub fn new(project_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            api_key: None,
            auth_token: None,
            base_url: None,
            http_timeout: DEFAULT_HTTP_TIMEOUT,
        }
    }
}

/// Firestore REST v1 backend. Documents live under
/// `projects/{project}/databases/(default)/documents/{collection}/{id}`;
/// queries go through `:runQuery` with a structured query.
pub struct FirestoreStore {
    client: reqwest::Client,
    documents_url: String,
    api_key: Option<String>,
    auth_token: Option<String>,
}

impl FirestoreStore {
    pub fn try_new(config: &FirestoreConfig) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .pool_max_idle_per_host(2)
            .build()
            .map_err(|err| {
                AppError::config(format!("failed to build firestore http client: {err}"))
            })?;

        let base_url = config
            .base_url
            .as_deref()
            .unwrap_or(DEFAULT_BASE_URL)
            .trim_end_matches('/')
            .to_string();
        let documents_url = format!(
            "{}/projects/{}/databases/(default)/documents",
            base_url, config.project_id
        );

        Ok(Self {
            client,
            documents_url,
            api_key: config.api_key.clone(),
            auth_token: config.auth_token.clone(),
        })
    }

    fn apply_auth(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let request = match &self.auth_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        };
        match &self.api_key {
            Some(key) => request.query(&[("key", key.as_str())]),
            None => request,
        }
    }
}

#[async_trait]
impl DocumentStore for FirestoreStore {
    async fn query(&self, collection: &str, filters: &[Filter]) -> AppResult<Vec<Document>> {
        let url = format!("{}:runQuery", self.documents_url);
        let body = build_query_body(collection, filters);

        let response = self.apply_auth(self.client.post(&url)).json(&body).send().await?;
        let response = check_status(response).await?;
        let payload: JsonValue = response.json().await?;

        let mut documents = Vec::new();
        for row in payload.as_array().map(Vec::as_slice).unwrap_or_default() {
            // Rows without a `document` key carry only a read timestamp.
            if let Some(doc) = row.get("document") {
                documents.push(decode_document(doc)?);
            }
        }
        debug!(target: "app::store", collection, count = documents.len(), "firestore query");
        Ok(documents)
    }

    async fn insert(&self, collection: &str, fields: FieldMap) -> AppResult<Document> {
        let url = format!("{}/{}", self.documents_url, collection);
        let body = json!({ "fields": encode_fields(&fields) });

        let response = self.apply_auth(self.client.post(&url)).json(&body).send().await?;
        let response = check_status(response).await?;
        let payload: JsonValue = response.json().await?;
        let document = decode_document(&payload)?;
        debug!(target: "app::store", collection, document_id = %document.id, "firestore insert");
        Ok(document)
    }

    async fn update(&self, doc: &DocumentRef, fields: FieldMap) -> AppResult<()> {
        let url = format!("{}/{}/{}", self.documents_url, doc.collection, doc.id);
        // An update mask restricts the patch to the supplied fields so the
        // rest of the document is left untouched.
        let mask: Vec<(&str, &str)> = fields
            .keys()
            .map(|key| ("updateMask.fieldPaths", key.as_str()))
            .collect();
        let body = json!({ "fields": encode_fields(&fields) });

        let response = self
            .apply_auth(self.client.patch(&url).query(&mask))
            .json(&body)
            .send()
            .await?;
        check_status(response).await?;
        debug!(target: "app::store", collection = %doc.collection, document_id = %doc.id, "firestore update");
        Ok(())
    }

    async fn delete(&self, doc: &DocumentRef) -> AppResult<()> {
        let url = format!("{}/{}/{}", self.documents_url, doc.collection, doc.id);
        let response = self.apply_auth(self.client.delete(&url)).send().await?;
        check_status(response).await?;
        debug!(target: "app::store", collection = %doc.collection, document_id = %doc.id, "firestore delete");
        Ok(())
    }
}

async fn check_status(response: reqwest::Response) -> AppResult<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        let body = response.text().await.unwrap_or_default();
        Err(AppError::store(format!("firestore responded {status}: {body}")))
    }
}

fn build_query_body(collection: &str, filters: &[Filter]) -> JsonValue {
    let mut structured = json!({ "from": [{ "collectionId": collection }] });

    let mut encoded: Vec<JsonValue> = filters.iter().map(encode_filter).collect();
    let clause = match encoded.len() {
        0 => None,
        1 => encoded.pop(),
        _ => Some(json!({
            "compositeFilter": { "op": "AND", "filters": encoded }
        })),
    };
    if let Some(clause) = clause {
        structured["where"] = clause;
    }

    json!({ "structuredQuery": structured })
}

fn encode_filter(filter: &Filter) -> JsonValue {
    json!({
        "fieldFilter": {
            "field": { "fieldPath": filter.field },
            "op": op_name(filter.op),
            "value": encode_value(&filter.value),
        }
    })
}

fn op_name(op: FilterOp) -> &'static str {
    match op {
        FilterOp::Eq => "EQUAL",
        FilterOp::Gte => "GREATER_THAN_OR_EQUAL",
        FilterOp::Lt => "LESS_THAN",
    }
}

fn encode_fields(fields: &FieldMap) -> JsonValue {
    let encoded: serde_json::Map<String, JsonValue> = fields
        .iter()
        .map(|(key, value)| (key.clone(), encode_value(value)))
        .collect();
    JsonValue::Object(encoded)
}

/// RFC 3339 strings travel as Firestore timestamps so the server orders range
/// queries on them as instants.
fn encode_value(value: &JsonValue) -> JsonValue {
    match value {
        JsonValue::Null => json!({ "nullValue": null }),
        JsonValue::Bool(flag) => json!({ "booleanValue": flag }),
        JsonValue::Number(number) => match number.as_i64() {
            Some(integer) => json!({ "integerValue": integer.to_string() }),
            None => json!({ "doubleValue": number.as_f64() }),
        },
        JsonValue::String(text) => {
            if DateTime::parse_from_rfc3339(text).is_ok() {
                json!({ "timestampValue": text })
            } else {
                json!({ "stringValue": text })
            }
        }
        JsonValue::Array(items) => json!({
            "arrayValue": { "values": items.iter().map(encode_value).collect::<Vec<_>>() }
        }),
        JsonValue::Object(map) => {
            let fields: serde_json::Map<String, JsonValue> = map
                .iter()
                .map(|(key, value)| (key.clone(), encode_value(value)))
                .collect();
            json!({ "mapValue": { "fields": fields } })
        }
    }
}

fn decode_value(value: &JsonValue) -> JsonValue {
    let Some(typed) = value.as_object() else {
        return JsonValue::Null;
    };
    if let Some(text) = typed.get("stringValue") {
        return text.clone();
    }
    if let Some(text) = typed.get("timestampValue") {
        return text.clone();
    }
    if let Some(raw) = typed.get("integerValue") {
        return raw
            .as_str()
            .and_then(|s| s.parse::<i64>().ok())
            .map(JsonValue::from)
            .unwrap_or_else(|| raw.clone());
    }
    if let Some(number) = typed.get("doubleValue") {
        return number.clone();
    }
    if let Some(flag) = typed.get("booleanValue") {
        return flag.clone();
    }
    if typed.contains_key("nullValue") {
        return JsonValue::Null;
    }
    if let Some(array) = typed.get("arrayValue") {
        let items = array
            .get("values")
            .and_then(JsonValue::as_array)
            .map(|values| values.iter().map(decode_value).collect())
            .unwrap_or_default();
        return JsonValue::Array(items);
    }
    if let Some(map) = typed.get("mapValue") {
        let fields = map
            .get("fields")
            .and_then(JsonValue::as_object)
            .map(|fields| {
                fields
                    .iter()
                    .map(|(key, value)| (key.clone(), decode_value(value)))
                    .collect()
            })
            .unwrap_or_default();
        return JsonValue::Object(fields);
    }
    JsonValue::Null
}

fn decode_document(payload: &JsonValue) -> AppResult<Document> {
    let name = payload
        .get("name")
        .and_then(JsonValue::as_str)
        .ok_or_else(|| AppError::store("firestore document is missing a name"))?;
    let id = name
        .rsplit('/')
        .next()
        .ok_or_else(|| AppError::store("firestore document has an empty name"))?
        .to_string();

    let fields = payload
        .get("fields")
        .and_then(JsonValue::as_object)
        .map(|fields| {
            fields
                .iter()
                .map(|(key, value)| (key.clone(), decode_value(value)))
                .collect()
        })
        .unwrap_or_default();

    Ok(Document { id, fields })
}
