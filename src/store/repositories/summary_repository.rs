use chrono::{DateTime, NaiveDate, Utc};

use crate::error::AppResult;
use crate::models::summary::{DailySummary, WeeklyAggregate};
use crate::store::{collections, DocumentRef, DocumentStore, Filter};

use super::{decode_record, encode_record, timestamp_value};

pub struct SummaryRepository;

impl SummaryRepository {
    /// The cached aggregate for `(user, week_start)`, if one exists. The
    /// reconciler queries before inserting to keep the pair unique.
    pub async fn find_week(
        store: &dyn DocumentStore,
        user_id: &str,
        week_start: DateTime<Utc>,
    ) -> AppResult<Option<WeeklyAggregate>> {
        let documents = store
            .query(
                collections::WEEKLY_AGGREGATES,
                &[
                    Filter::eq("userId", user_id),
                    Filter::eq("weekStart", timestamp_value(week_start)),
                ],
            )
            .await?;
        documents.into_iter().next().map(decode_record).transpose()
    }

    pub async fn insert_week(
        store: &dyn DocumentStore,
        aggregate: &WeeklyAggregate,
    ) -> AppResult<WeeklyAggregate> {
        let document = store
            .insert(collections::WEEKLY_AGGREGATES, encode_record(aggregate)?)
            .await?;
        let mut created = aggregate.clone();
        created.id = document.id;
        Ok(created)
    }

    pub async fn update_week(
        store: &dyn DocumentStore,
        aggregate: &WeeklyAggregate,
    ) -> AppResult<()> {
        store
            .update(
                &DocumentRef::new(collections::WEEKLY_AGGREGATES, &aggregate.id),
                encode_record(aggregate)?,
            )
            .await
    }

    pub async fn find_day(
        store: &dyn DocumentStore,
        user_id: &str,
        date: NaiveDate,
    ) -> AppResult<Option<DailySummary>> {
        let documents = store
            .query(
                collections::DAILY_SUMMARIES,
                &[
                    Filter::eq("userId", user_id),
                    Filter::eq("date", date.to_string()),
                ],
            )
            .await?;
        documents.into_iter().next().map(decode_record).transpose()
    }

    pub async fn insert_day(
        store: &dyn DocumentStore,
        summary: &DailySummary,
    ) -> AppResult<DailySummary> {
        let document = store
            .insert(collections::DAILY_SUMMARIES, encode_record(summary)?)
            .await?;
        let mut created = summary.clone();
        created.id = document.id;
        Ok(created)
    }

    pub async fn update_day(store: &dyn DocumentStore, summary: &DailySummary) -> AppResult<()> {
        store
            .update(
                &DocumentRef::new(collections::DAILY_SUMMARIES, &summary.id),
                encode_record(summary)?,
            )
            .await
    }
}
