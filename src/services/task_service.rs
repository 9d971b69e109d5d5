use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};

use crate::auth::SessionContext;
use crate::error::{AppError, AppResult};
use crate::models::task::{TaskCreateInput, TaskRecord};
use crate::services::limits::MAX_DAILY_CEILING;
use crate::store::repositories::task_repository::TaskRepository;
use crate::store::DocumentStore;

const URGENCY_MIN: u8 = 1;
const URGENCY_MAX: u8 = 5;

#[derive(Clone)]
pub struct TaskService {
    store: Arc<dyn DocumentStore>,
}

impl TaskService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub async fn list_tasks(&self, session: &SessionContext) -> AppResult<Vec<TaskRecord>> {
        let tasks = TaskRepository::list_for_user(self.store.as_ref(), session.user_id()).await?;
        debug!(target: "app::tasks", count = tasks.len(), "tasks listed");
        Ok(tasks)
    }

    pub async fn create_task(
        &self,
        session: &SessionContext,
        input: TaskCreateInput,
    ) -> AppResult<TaskRecord> {
        let record = build_record_from_create(session.user_id(), input)?;
        let created = TaskRepository::insert(self.store.as_ref(), &record).await?;
        info!(
            target: "app::tasks",
            task_id = %created.id,
            points = created.points,
            max_daily = ?created.max_daily,
            "task created"
        );
        Ok(created)
    }
}

fn build_record_from_create(user_id: &str, mut input: TaskCreateInput) -> AppResult<TaskRecord> {
    let name = normalize_name(&input.name)?;
    let points = validate_points(input.points)?;
    let urgency = validate_urgency(input.urgency)?;
    let max_daily = normalize_max_daily(input.max_daily.take())?;
    let description = normalize_optional_string(input.description.take());

    Ok(TaskRecord {
        id: String::new(),
        user_id: user_id.to_string(),
        name,
        points,
        urgency,
        description,
        max_daily,
        is_repeating: input.is_repeating.unwrap_or(true),
        created_at: Utc::now(),
    })
}

fn normalize_name(name: &str) -> AppResult<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(AppError::validation("task name must not be empty"));
    }
    Ok(trimmed.to_string())
}

fn validate_points(points: i64) -> AppResult<i64> {
    if points <= 0 {
        return Err(AppError::validation("points must be a positive integer"));
    }
    Ok(points)
}

fn validate_urgency(urgency: u8) -> AppResult<u8> {
    if !(URGENCY_MIN..=URGENCY_MAX).contains(&urgency) {
        return Err(AppError::validation(format!(
            "urgency must be between {URGENCY_MIN} and {URGENCY_MAX}"
        )));
    }
    Ok(urgency)
}

/// Non-positive caps are rejected; caps above the ceiling are silently
/// clamped, not rejected. The asymmetry is deliberate anti-abuse policy.
fn normalize_max_daily(max_daily: Option<i64>) -> AppResult<Option<u32>> {
    match max_daily {
        None => Ok(None),
        Some(cap) if cap <= 0 => Err(AppError::validation("maxDaily must be a positive integer")),
        Some(cap) => Ok(Some(cap.min(i64::from(MAX_DAILY_CEILING)) as u32)),
    }
}

fn normalize_optional_string(value: Option<String>) -> Option<String> {
    value
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}
