use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::services::limits::MAX_DAILY_CEILING;

/// A user-defined recurring activity with a point value and an optional
/// per-day completion cap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskRecord {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub points: i64,
    pub urgency: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Absent means unlimited. Stored values are clamped at creation time,
    /// and clamped again here on read so out-of-range documents written by
    /// older clients never surface above the ceiling.
    #[serde(default, deserialize_with = "lenient_max_daily")]
    pub max_daily: Option<u32>,
    pub is_repeating: bool,
    pub created_at: DateTime<Utc>,
}

/// Input for creating a new task. `max_daily` is raw user input: non-positive
/// values are rejected, values above the ceiling are clamped.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskCreateInput {
    pub name: String,
    pub points: i64,
    pub urgency: u8,
    pub description: Option<String>,
    pub max_daily: Option<i64>,
    pub is_repeating: Option<bool>,
}

/// Stored `maxDaily` values are not trusted: anything that is not a positive
/// integer is treated as unlimited, anything above the ceiling is capped.
fn lenient_max_daily<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match raw.as_ref().and_then(|value| value.as_i64()) {
        Some(n) if n > 0 => Some((n as u32).min(MAX_DAILY_CEILING)),
        _ => None,
    })
}
