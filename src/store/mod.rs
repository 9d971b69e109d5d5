use async_trait::async_trait;
use chrono::DateTime;
use serde_json::Value as JsonValue;

use crate::error::AppResult;

pub mod firestore;
pub mod memory;
pub mod repositories;

/// Collection names, matching the wire schema of the hosted backend.
pub mod collections {
    pub const TASKS: &str = "tasks";
    pub const TASK_COMPLETIONS: &str = "taskCompletions";
    pub const WEEKLY_AGGREGATES: &str = "weeklyAggregates";
    pub const DAILY_SUMMARIES: &str = "dailySummaries";
    pub const USERS: &str = "users";
}

pub type FieldMap = serde_json::Map<String, JsonValue>;

/// A schemaless key/value record. The repositories own the per-entity shape;
/// the store only moves documents around.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub fields: FieldMap,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentRef {
    pub collection: String,
    pub id: String,
}

impl DocumentRef {
    pub fn new(collection: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            id: id.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Eq,
    Gte,
    Lt,
}

/// Equality/range predicate on a named field.
#[derive(Debug, Clone)]
pub struct Filter {
    pub field: String,
    pub op: FilterOp,
    pub value: JsonValue,
}

impl Filter {
    pub fn eq(field: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        Self {
            field: field.into(),
            op: FilterOp::Eq,
            value: value.into(),
        }
    }

    pub fn gte(field: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        Self {
            field: field.into(),
            op: FilterOp::Gte,
            value: value.into(),
        }
    }

    pub fn lt(field: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        Self {
            field: field.into(),
            op: FilterOp::Lt,
            value: value.into(),
        }
    }

    /// Whether a document's fields satisfy this predicate. A missing field
    /// never matches.
    pub fn matches(&self, fields: &FieldMap) -> bool {
        let Some(actual) = fields.get(&self.field) else {
            return false;
        };
        match self.op {
            FilterOp::Eq => compare_values(actual, &self.value) == Some(std::cmp::Ordering::Equal),
            FilterOp::Gte => matches!(
                compare_values(actual, &self.value),
                Some(std::cmp::Ordering::Greater | std::cmp::Ordering::Equal)
            ),
            FilterOp::Lt => {
                compare_values(actual, &self.value) == Some(std::cmp::Ordering::Less)
            }
        }
    }
}

/// Ordering used by range filters: RFC 3339 strings compare as instants (the
/// serialized fraction length varies, so lexicographic order is not enough),
/// numbers compare numerically, everything else falls back to exact forms.
fn compare_values(left: &JsonValue, right: &JsonValue) -> Option<std::cmp::Ordering> {
    match (left, right) {
        (JsonValue::String(a), JsonValue::String(b)) => {
            match (
                DateTime::parse_from_rfc3339(a),
                DateTime::parse_from_rfc3339(b),
            ) {
                (Ok(ta), Ok(tb)) => Some(ta.cmp(&tb)),
                _ => Some(a.cmp(b)),
            }
        }
        (JsonValue::Number(a), JsonValue::Number(b)) => {
            a.as_f64().partial_cmp(&b.as_f64())
        }
        (JsonValue::Bool(a), JsonValue::Bool(b)) => Some(a.cmp(b)),
        (JsonValue::Null, JsonValue::Null) => Some(std::cmp::Ordering::Equal),
        _ => None,
    }
}

/// Remote document-store collaborator. All accounting persistence goes
/// through this seam; backends are interchangeable.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// All documents in `collection` satisfying every filter.
    async fn query(&self, collection: &str, filters: &[Filter]) -> AppResult<Vec<Document>>;

    /// Persist a new document; the returned document carries the generated id.
    async fn insert(&self, collection: &str, fields: FieldMap) -> AppResult<Document>;

    /// Merge `fields` into an existing document.
    async fn update(&self, doc: &DocumentRef, fields: FieldMap) -> AppResult<()>;

    /// Remove a document. Deleting a document that no longer exists is a
    /// no-op, matching the hosted backend.
    async fn delete(&self, doc: &DocumentRef) -> AppResult<()>;
}
