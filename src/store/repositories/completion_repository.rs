use chrono::{DateTime, Utc};

use crate::error::AppResult;
use crate::models::completion::CompletionRecord;
use crate::store::{collections, DocumentRef, DocumentStore, Filter};

use super::{decode_record, encode_record, timestamp_value};

pub struct CompletionRepository;

impl CompletionRepository {
    pub async fn insert(
        store: &dyn DocumentStore,
        record: &CompletionRecord,
    ) -> AppResult<CompletionRecord> {
        let document = store
            .insert(collections::TASK_COMPLETIONS, encode_record(record)?)
            .await?;
        let mut created = record.clone();
        created.id = document.id;
        Ok(created)
    }

    /// Completions for a user in `[range_start, range_end)`, oldest first.
    pub async fn list_in_range(
        store: &dyn DocumentStore,
        user_id: &str,
        range_start: DateTime<Utc>,
        range_end: DateTime<Utc>,
    ) -> AppResult<Vec<CompletionRecord>> {
        let filters = [
            Filter::eq("userId", user_id),
            Filter::gte("completedAt", timestamp_value(range_start)),
            Filter::lt("completedAt", timestamp_value(range_end)),
        ];
        Self::query_sorted(store, &filters).await
    }

    /// Completions for one task in `[range_start, range_end)`, oldest first.
    pub async fn list_for_task_in_range(
        store: &dyn DocumentStore,
        user_id: &str,
        task_id: &str,
        range_start: DateTime<Utc>,
        range_end: DateTime<Utc>,
    ) -> AppResult<Vec<CompletionRecord>> {
        let filters = [
            Filter::eq("userId", user_id),
            Filter::eq("taskId", task_id),
            Filter::gte("completedAt", timestamp_value(range_start)),
            Filter::lt("completedAt", timestamp_value(range_end)),
        ];
        Self::query_sorted(store, &filters).await
    }

    pub async fn delete(store: &dyn DocumentStore, record: &CompletionRecord) -> AppResult<()> {
        store
            .delete(&DocumentRef::new(collections::TASK_COMPLETIONS, &record.id))
            .await
    }

    async fn query_sorted(
        store: &dyn DocumentStore,
        filters: &[Filter],
    ) -> AppResult<Vec<CompletionRecord>> {
        let documents = store.query(collections::TASK_COMPLETIONS, filters).await?;
        let mut records = documents
            .into_iter()
            .map(decode_record)
            .collect::<AppResult<Vec<CompletionRecord>>>()?;
        records.sort_by_key(|record| record.completed_at);
        Ok(records)
    }
}
