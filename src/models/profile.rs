use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Per-user profile document, ensured on login with merge semantics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    pub user_id: String,
    pub nickname: String,
    pub email: String,
    pub weekly_target_points: i64,
    pub created_at: DateTime<Utc>,
}

/// Partial profile update; absent fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdateInput {
    pub nickname: Option<String>,
    pub weekly_target_points: Option<i64>,
}
