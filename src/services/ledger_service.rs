use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::auth::SessionContext;
use crate::error::AppResult;
use crate::models::completion::CompletionRecord;
use crate::models::task::TaskRecord;
use crate::services::calendar::Calendar;
use crate::services::limits::{self, CompletionGate};
use crate::store::repositories::completion_repository::CompletionRepository;
use crate::store::DocumentStore;

/// Result of a "complete task" action. `LimitReached` is a normal outcome,
/// not an error: the tap was valid, the cap was already met.
#[derive(Debug, Clone, PartialEq)]
pub enum CompletionOutcome {
    Recorded(CompletionRecord),
    LimitReached { cap: u32 },
}

/// Append-only record of task completions; the source of truth every total
/// is derived from.
#[derive(Clone)]
pub struct LedgerService {
    store: Arc<dyn DocumentStore>,
    calendar: Calendar,
}

impl LedgerService {
    pub fn new(store: Arc<dyn DocumentStore>, calendar: Calendar) -> Self {
        Self { store, calendar }
    }

    /// Record one completion. Deliberately no deduplication: five rapid taps
    /// log five entries.
    pub async fn record_completion(
        &self,
        session: &SessionContext,
        task_id: &str,
        points_earned: i64,
        at: DateTime<Utc>,
    ) -> AppResult<CompletionRecord> {
        let record = CompletionRecord {
            id: String::new(),
            task_id: task_id.to_string(),
            user_id: session.user_id().to_string(),
            completed_at: at,
            points_earned,
        };
        let created = CompletionRepository::insert(self.store.as_ref(), &record).await?;
        info!(
            target: "app::ledger",
            completion_id = %created.id,
            task_id,
            points_earned,
            "completion recorded"
        );
        Ok(created)
    }

    /// The full §2 control flow for a "+" tap: count today's completions for
    /// the task, consult the limit gate, then record. Nothing is persisted
    /// when the cap is already met.
    pub async fn complete_task(
        &self,
        session: &SessionContext,
        task: &TaskRecord,
        at: DateTime<Utc>,
    ) -> AppResult<CompletionOutcome> {
        let (day_start, day_end) = self.calendar.day_window(at);
        let today = CompletionRepository::list_for_task_in_range(
            self.store.as_ref(),
            session.user_id(),
            &task.id,
            day_start,
            day_end,
        )
        .await?;

        match limits::can_complete(task, &today) {
            CompletionGate::LimitReached { cap } => {
                info!(
                    target: "app::ledger",
                    task_id = %task.id,
                    cap,
                    count_today = today.len(),
                    "completion rejected, daily limit reached"
                );
                Ok(CompletionOutcome::LimitReached { cap })
            }
            CompletionGate::Allowed => {
                let recorded = self
                    .record_completion(session, &task.id, task.points, at)
                    .await?;
                Ok(CompletionOutcome::Recorded(recorded))
            }
        }
    }

    /// Completions for the session user in `[range_start, range_end)`. A
    /// completion at exactly `range_end` is excluded.
    pub async fn list_completions(
        &self,
        session: &SessionContext,
        range_start: DateTime<Utc>,
        range_end: DateTime<Utc>,
    ) -> AppResult<Vec<CompletionRecord>> {
        CompletionRepository::list_in_range(
            self.store.as_ref(),
            session.user_id(),
            range_start,
            range_end,
        )
        .await
    }

    /// Remove the latest completion for `task_id` within `window`. Returns
    /// `None` when there is nothing to undo; that is a no-op, not an error.
    pub async fn undo_most_recent(
        &self,
        session: &SessionContext,
        task_id: &str,
        window: (DateTime<Utc>, DateTime<Utc>),
    ) -> AppResult<Option<CompletionRecord>> {
        let (range_start, range_end) = window;
        let entries = CompletionRepository::list_for_task_in_range(
            self.store.as_ref(),
            session.user_id(),
            task_id,
            range_start,
            range_end,
        )
        .await?;

        let Some(latest) = entries
            .into_iter()
            .max_by_key(|entry| entry.completed_at)
        else {
            debug!(target: "app::ledger", task_id, "nothing to undo");
            return Ok(None);
        };

        CompletionRepository::delete(self.store.as_ref(), &latest).await?;
        info!(
            target: "app::ledger",
            completion_id = %latest.id,
            task_id,
            points_earned = latest.points_earned,
            "completion undone"
        );
        Ok(Some(latest))
    }
}
