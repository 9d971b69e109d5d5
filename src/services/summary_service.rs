use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::auth::SessionContext;
use crate::error::AppResult;
use crate::models::summary::{DailySummary, WeeklyAggregate};
use crate::services::calendar::Calendar;
use crate::services::profile_service::DEFAULT_WEEKLY_TARGET_POINTS;
use crate::store::repositories::completion_repository::CompletionRepository;
use crate::store::repositories::profile_repository::ProfileRepository;
use crate::store::repositories::summary_repository::SummaryRepository;
use crate::store::DocumentStore;

/// Derives daily and weekly point totals from the completion ledger and keeps
/// the cached aggregate records consistent with it. The ledger sum is always
/// the authoritative value; the cache is a read optimization that may lag.
#[derive(Clone)]
pub struct SummaryService {
    store: Arc<dyn DocumentStore>,
    calendar: Calendar,
}

impl SummaryService {
    pub fn new(store: Arc<dyn DocumentStore>, calendar: Calendar) -> Self {
        Self { store, calendar }
    }

    /// Recompute the weekly total from the ledger and bring the cached
    /// aggregate in line with it. The returned aggregate carries the ledger
    /// sum even when the cache write fails; the caller's display never blocks
    /// on cache persistence.
    pub async fn reconcile_week(
        &self,
        session: &SessionContext,
        week_start: DateTime<Utc>,
    ) -> AppResult<WeeklyAggregate> {
        let week_start = self.calendar.start_of_week(week_start);
        let week_end = self.calendar.end_of_week(week_start);

        let completions = CompletionRepository::list_in_range(
            self.store.as_ref(),
            session.user_id(),
            week_start,
            week_end,
        )
        .await?;
        let calculated: i64 = completions.iter().map(|entry| entry.points_earned).sum();

        let existing =
            SummaryRepository::find_week(self.store.as_ref(), session.user_id(), week_start)
                .await?;
        let now = Utc::now();

        let aggregate = match existing {
            Some(stored) if stored.total_points == calculated => stored,
            Some(stored) => {
                let updated = WeeklyAggregate {
                    total_points: calculated,
                    last_updated: now,
                    ..stored
                };
                if let Err(error) =
                    SummaryRepository::update_week(self.store.as_ref(), &updated).await
                {
                    warn!(target: "app::reconcile", %error, "weekly aggregate cache write failed");
                }
                updated
            }
            None => {
                let fresh = WeeklyAggregate {
                    id: String::new(),
                    user_id: session.user_id().to_string(),
                    week_start,
                    total_points: calculated,
                    last_updated: now,
                };
                match SummaryRepository::insert_week(self.store.as_ref(), &fresh).await {
                    Ok(created) => created,
                    Err(error) => {
                        warn!(target: "app::reconcile", %error, "weekly aggregate cache write failed");
                        fresh
                    }
                }
            }
        };

        info!(
            target: "app::reconcile",
            week_start = %week_start,
            total_points = aggregate.total_points,
            completions = completions.len(),
            "week reconciled"
        );
        Ok(aggregate)
    }

    /// Daily counterpart of `reconcile_week`, keyed by local calendar date.
    /// Also derives the pizza figure from the user's weekly target.
    pub async fn reconcile_day(
        &self,
        session: &SessionContext,
        instant: DateTime<Utc>,
    ) -> AppResult<DailySummary> {
        let (day_start, day_end) = self.calendar.day_window(instant);
        let date = self.calendar.local_date(day_start);

        let completions = CompletionRepository::list_in_range(
            self.store.as_ref(),
            session.user_id(),
            day_start,
            day_end,
        )
        .await?;
        let calculated: i64 = completions.iter().map(|entry| entry.points_earned).sum();

        let weekly_target =
            match ProfileRepository::find(self.store.as_ref(), session.user_id()).await? {
                Some(profile) => profile.weekly_target_points.max(1),
                None => DEFAULT_WEEKLY_TARGET_POINTS,
            };
        let pizza = calculated as f64 / weekly_target as f64;

        let existing =
            SummaryRepository::find_day(self.store.as_ref(), session.user_id(), date).await?;
        let now = Utc::now();

        let summary = match existing {
            Some(stored)
                if stored.points_earned_today == calculated
                    && stored.pizza_earned_today == pizza =>
            {
                stored
            }
            Some(stored) => {
                let updated = DailySummary {
                    points_earned_today: calculated,
                    pizza_earned_today: pizza,
                    last_updated: now,
                    ..stored
                };
                if let Err(error) =
                    SummaryRepository::update_day(self.store.as_ref(), &updated).await
                {
                    warn!(target: "app::reconcile", %error, "daily summary cache write failed");
                }
                updated
            }
            None => {
                let fresh = DailySummary {
                    id: String::new(),
                    user_id: session.user_id().to_string(),
                    date,
                    points_earned_today: calculated,
                    pizza_earned_today: pizza,
                    last_updated: now,
                };
                match SummaryRepository::insert_day(self.store.as_ref(), &fresh).await {
                    Ok(created) => created,
                    Err(error) => {
                        warn!(target: "app::reconcile", %error, "daily summary cache write failed");
                        fresh
                    }
                }
            }
        };

        info!(
            target: "app::reconcile",
            date = %date,
            points = summary.points_earned_today,
            "day reconciled"
        );
        Ok(summary)
    }

    /// Delete every completion in the week and zero the cached aggregate.
    /// Any deletion failure aborts the reset and surfaces as an error so the
    /// caller never believes a half-deleted week was cleared.
    pub async fn reset_week(
        &self,
        session: &SessionContext,
        week_start: DateTime<Utc>,
    ) -> AppResult<()> {
        let week_start = self.calendar.start_of_week(week_start);
        let week_end = self.calendar.end_of_week(week_start);

        let completions = CompletionRepository::list_in_range(
            self.store.as_ref(),
            session.user_id(),
            week_start,
            week_end,
        )
        .await?;
        let total = completions.len();
        for completion in &completions {
            CompletionRepository::delete(self.store.as_ref(), completion).await?;
        }

        let now = Utc::now();
        match SummaryRepository::find_week(self.store.as_ref(), session.user_id(), week_start)
            .await?
        {
            Some(stored) => {
                let zeroed = WeeklyAggregate {
                    total_points: 0,
                    last_updated: now,
                    ..stored
                };
                SummaryRepository::update_week(self.store.as_ref(), &zeroed).await?;
            }
            None => {
                let zeroed = WeeklyAggregate {
                    id: String::new(),
                    user_id: session.user_id().to_string(),
                    week_start,
                    total_points: 0,
                    last_updated: now,
                };
                SummaryRepository::insert_week(self.store.as_ref(), &zeroed).await?;
            }
        }

        info!(
            target: "app::reconcile",
            week_start = %week_start,
            deleted = total,
            "week reset"
        );
        Ok(())
    }
}
