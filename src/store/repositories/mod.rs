use chrono::{DateTime, SecondsFormat, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value as JsonValue;

use crate::error::{AppError, AppResult};
use crate::store::{Document, FieldMap};

pub mod completion_repository;
pub mod profile_repository;
pub mod summary_repository;
pub mod task_repository;

/// Shape a typed record into a schemaless document body. The id lives in the
/// document name, never in the fields.
pub(crate) fn encode_record<T: Serialize>(record: &T) -> AppResult<FieldMap> {
    let value = serde_json::to_value(record)?;
    let JsonValue::Object(mut fields) = value else {
        return Err(AppError::store("record did not serialize to an object"));
    };
    fields.remove("id");
    Ok(fields)
}

pub(crate) fn decode_record<T: DeserializeOwned>(document: Document) -> AppResult<T> {
    let mut fields = document.fields;
    fields.insert("id".to_string(), JsonValue::String(document.id));
    Ok(serde_json::from_value(JsonValue::Object(fields))?)
}

/// Instants are stored and filtered as RFC 3339 strings in the same shape
/// chrono's serde uses, so stored fields and filter bounds stay comparable.
pub(crate) fn timestamp_value(instant: DateTime<Utc>) -> JsonValue {
    JsonValue::String(instant.to_rfc3339_opts(SecondsFormat::AutoSi, true))
}
