use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One recorded instance of a task being done. `points_earned` is a snapshot
/// of the task's point value at completion time, so historical totals stay
/// stable if the task is later re-pointed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionRecord {
    pub id: String,
    pub task_id: String,
    pub user_id: String,
    pub completed_at: DateTime<Utc>,
    pub points_earned: i64,
}
