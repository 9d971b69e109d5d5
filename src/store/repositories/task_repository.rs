use crate::error::AppResult;
use crate::models::task::TaskRecord;
use crate::store::{collections, DocumentStore, Filter};

use super::{decode_record, encode_record};

pub struct TaskRepository;

impl TaskRepository {
    pub async fn insert(store: &dyn DocumentStore, record: &TaskRecord) -> AppResult<TaskRecord> {
        let document = store
            .insert(collections::TASKS, encode_record(record)?)
            .await?;
        let mut created = record.clone();
        created.id = document.id;
        Ok(created)
    }

    pub async fn list_for_user(
        store: &dyn DocumentStore,
        user_id: &str,
    ) -> AppResult<Vec<TaskRecord>> {
        let documents = store
            .query(collections::TASKS, &[Filter::eq("userId", user_id)])
            .await?;
        documents.into_iter().map(decode_record).collect()
    }
}
