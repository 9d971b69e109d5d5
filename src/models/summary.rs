use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Cached weekly point total. The completion ledger is the source of truth;
/// this record is a denormalized read optimization, re-derived on every
/// reconciliation. At most one exists per (user, week start).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyAggregate {
    pub id: String,
    pub user_id: String,
    /// Monday 00:00 in the accounting timezone.
    pub week_start: DateTime<Utc>,
    pub total_points: i64,
    pub last_updated: DateTime<Utc>,
}

/// Cached daily point total, keyed by local calendar date. Reconciled
/// independently of the weekly aggregate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailySummary {
    pub id: String,
    pub user_id: String,
    pub date: NaiveDate,
    pub points_earned_today: i64,
    /// Fraction of the user's weekly target earned today.
    pub pizza_earned_today: f64,
    pub last_updated: DateTime<Utc>,
}
