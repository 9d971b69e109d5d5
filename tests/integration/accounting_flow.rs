use std::sync::Arc;

use chrono::{DateTime, Utc};
use pizza_points::auth::{SessionContext, StaticAuth};
use pizza_points::models::profile::ProfileUpdateInput;
use pizza_points::models::task::TaskCreateInput;
use pizza_points::services::calendar::Calendar;
use pizza_points::services::ledger_service::{CompletionOutcome, LedgerService};
use pizza_points::services::profile_service::ProfileService;
use pizza_points::services::summary_service::SummaryService;
use pizza_points::services::task_service::TaskService;
use pizza_points::store::memory::MemoryStore;
use pizza_points::store::{collections, DocumentStore};

struct Harness {
    store: Arc<MemoryStore>,
    session: SessionContext,
    calendar: Calendar,
    tasks: TaskService,
    ledger: LedgerService,
    summaries: SummaryService,
    profiles: ProfileService,
}

fn harness() -> Harness {
    let store = Arc::new(MemoryStore::new());
    let shared: Arc<dyn DocumentStore> = store.clone();
    let session = SessionContext::establish(&StaticAuth::new("user-1")).expect("session");
    let calendar = Calendar::utc();
    Harness {
        tasks: TaskService::new(shared.clone()),
        ledger: LedgerService::new(shared.clone(), calendar),
        summaries: SummaryService::new(shared.clone(), calendar),
        profiles: ProfileService::new(shared),
        store,
        session,
        calendar,
    }
}

fn at(raw: &str) -> DateTime<Utc> {
    raw.parse().expect("test instant")
}

#[tokio::test]
async fn capped_task_allows_two_completions_then_rejects_the_third() {
    let h = harness();
    let task = h
        .tasks
        .create_task(
            &h.session,
            TaskCreateInput {
                name: "Dishes".into(),
                points: 10,
                urgency: 2,
                max_daily: Some(2),
                ..Default::default()
            },
        )
        .await
        .expect("create task");

    let first = h
        .ledger
        .complete_task(&h.session, &task, at("2026-08-05T09:00:00Z"))
        .await
        .expect("first completion");
    assert!(matches!(first, CompletionOutcome::Recorded(_)));

    let second = h
        .ledger
        .complete_task(&h.session, &task, at("2026-08-05T10:00:00Z"))
        .await
        .expect("second completion");
    assert!(matches!(second, CompletionOutcome::Recorded(_)));

    let week = h
        .summaries
        .reconcile_week(&h.session, at("2026-08-05T10:00:00Z"))
        .await
        .expect("reconcile");
    assert_eq!(week.total_points, 20);

    let third = h
        .ledger
        .complete_task(&h.session, &task, at("2026-08-05T11:00:00Z"))
        .await
        .expect("third attempt");
    assert_eq!(third, CompletionOutcome::LimitReached { cap: 2 });

    // The rejected attempt persisted nothing.
    assert_eq!(h.store.len(collections::TASK_COMPLETIONS), 2);

    // The cap is per-day: the next morning is allowed again.
    let next_day = h
        .ledger
        .complete_task(&h.session, &task, at("2026-08-06T08:00:00Z"))
        .await
        .expect("next day");
    assert!(matches!(next_day, CompletionOutcome::Recorded(_)));
}

#[tokio::test]
async fn rapid_repeated_completions_each_create_an_entry() {
    let h = harness();
    let task = h
        .tasks
        .create_task(
            &h.session,
            TaskCreateInput {
                name: "Pushups".into(),
                points: 5,
                urgency: 4,
                ..Default::default()
            },
        )
        .await
        .expect("create task");

    let tap = at("2026-08-05T12:00:00Z");
    for _ in 0..5 {
        let outcome = h
            .ledger
            .complete_task(&h.session, &task, tap)
            .await
            .expect("tap");
        assert!(matches!(outcome, CompletionOutcome::Recorded(_)));
    }

    assert_eq!(h.store.len(collections::TASK_COMPLETIONS), 5);
    let week = h
        .summaries
        .reconcile_week(&h.session, tap)
        .await
        .expect("reconcile");
    assert_eq!(week.total_points, 25);
}

#[tokio::test]
async fn undo_with_no_completions_is_a_noop() {
    let h = harness();
    let task = h
        .tasks
        .create_task(
            &h.session,
            TaskCreateInput {
                name: "Laundry".into(),
                points: 15,
                urgency: 3,
                ..Default::default()
            },
        )
        .await
        .expect("create task");

    let window = h.calendar.week_window(at("2026-08-05T12:00:00Z"));
    let undone = h
        .ledger
        .undo_most_recent(&h.session, &task.id, window)
        .await
        .expect("undo");
    assert!(undone.is_none());

    let week = h
        .summaries
        .reconcile_week(&h.session, at("2026-08-05T12:00:00Z"))
        .await
        .expect("reconcile");
    assert_eq!(week.total_points, 0);
}

#[tokio::test]
async fn undo_removes_the_latest_completion_in_the_window() {
    let h = harness();
    let task = h
        .tasks
        .create_task(
            &h.session,
            TaskCreateInput {
                name: "Reading".into(),
                points: 10,
                urgency: 1,
                ..Default::default()
            },
        )
        .await
        .expect("create task");

    h.ledger
        .complete_task(&h.session, &task, at("2026-08-05T09:00:00Z"))
        .await
        .expect("morning");
    h.ledger
        .complete_task(&h.session, &task, at("2026-08-05T21:00:00Z"))
        .await
        .expect("evening");

    let window = h.calendar.day_window(at("2026-08-05T12:00:00Z"));
    let undone = h
        .ledger
        .undo_most_recent(&h.session, &task.id, window)
        .await
        .expect("undo")
        .expect("an entry was removed");
    assert_eq!(undone.completed_at, at("2026-08-05T21:00:00Z"));

    let remaining = h
        .ledger
        .list_completions(&h.session, window.0, window.1)
        .await
        .expect("list");
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].completed_at, at("2026-08-05T09:00:00Z"));
}

#[tokio::test]
async fn reconcile_week_is_idempotent_and_matches_the_ledger_sum() {
    let h = harness();
    for (points, raw) in [
        (10, "2026-08-03T08:00:00Z"),
        (10, "2026-08-04T08:00:00Z"),
        (15, "2026-08-09T23:00:00Z"),
    ] {
        h.ledger
            .record_completion(&h.session, "task-1", points, at(raw))
            .await
            .expect("record");
    }

    let first = h
        .summaries
        .reconcile_week(&h.session, at("2026-08-06T12:00:00Z"))
        .await
        .expect("first reconcile");
    let second = h
        .summaries
        .reconcile_week(&h.session, at("2026-08-06T12:00:00Z"))
        .await
        .expect("second reconcile");

    assert_eq!(first.total_points, 35);
    assert_eq!(second.total_points, 35);
    assert_eq!(first.id, second.id);
    // Query-before-insert keeps one aggregate per (user, week start).
    assert_eq!(h.store.len(collections::WEEKLY_AGGREGATES), 1);

    let completions = h
        .ledger
        .list_completions(
            &h.session,
            h.calendar.start_of_week(at("2026-08-06T12:00:00Z")),
            h.calendar.end_of_week(h.calendar.start_of_week(at("2026-08-06T12:00:00Z"))),
        )
        .await
        .expect("list");
    let ledger_sum: i64 = completions.iter().map(|c| c.points_earned).sum();
    assert_eq!(ledger_sum, second.total_points);
}

#[tokio::test]
async fn week_range_is_half_open() {
    let h = harness();
    // Monday midnight is included, the following Monday midnight is not.
    h.ledger
        .record_completion(&h.session, "task-1", 10, at("2026-08-03T00:00:00Z"))
        .await
        .expect("record at start");
    h.ledger
        .record_completion(&h.session, "task-1", 99, at("2026-08-10T00:00:00Z"))
        .await
        .expect("record at end");

    let week = h
        .summaries
        .reconcile_week(&h.session, at("2026-08-05T00:00:00Z"))
        .await
        .expect("reconcile");
    assert_eq!(week.total_points, 10);

    let next_week = h
        .summaries
        .reconcile_week(&h.session, at("2026-08-10T00:00:00Z"))
        .await
        .expect("reconcile next week");
    assert_eq!(next_week.total_points, 99);
}

#[tokio::test]
async fn reconcile_repairs_a_drifted_aggregate() {
    let h = harness();
    h.ledger
        .record_completion(&h.session, "task-1", 10, at("2026-08-04T10:00:00Z"))
        .await
        .expect("record");
    let stale = h
        .summaries
        .reconcile_week(&h.session, at("2026-08-04T10:00:00Z"))
        .await
        .expect("reconcile");
    assert_eq!(stale.total_points, 10);

    // Another device adds a completion behind our back; the cached total is
    // now stale until the next reconciliation.
    h.ledger
        .record_completion(&h.session, "task-1", 25, at("2026-08-04T11:00:00Z"))
        .await
        .expect("record elsewhere");

    let repaired = h
        .summaries
        .reconcile_week(&h.session, at("2026-08-04T11:00:00Z"))
        .await
        .expect("reconcile again");
    assert_eq!(repaired.total_points, 35);
    assert_eq!(h.store.len(collections::WEEKLY_AGGREGATES), 1);
}

#[tokio::test]
async fn reset_week_clears_the_ledger_and_zeroes_the_aggregate() {
    let h = harness();
    for (points, raw) in [
        (10, "2026-08-03T08:00:00Z"),
        (10, "2026-08-05T08:00:00Z"),
        (15, "2026-08-07T08:00:00Z"),
    ] {
        h.ledger
            .record_completion(&h.session, "task-1", points, at(raw))
            .await
            .expect("record");
    }
    let before = h
        .summaries
        .reconcile_week(&h.session, at("2026-08-05T09:00:00Z"))
        .await
        .expect("reconcile");
    assert_eq!(before.total_points, 35);

    h.summaries
        .reset_week(&h.session, at("2026-08-05T09:00:00Z"))
        .await
        .expect("reset");

    assert_eq!(h.store.len(collections::TASK_COMPLETIONS), 0);
    let after = h
        .summaries
        .reconcile_week(&h.session, at("2026-08-05T09:00:00Z"))
        .await
        .expect("reconcile after reset");
    assert_eq!(after.total_points, 0);
    assert_eq!(h.store.len(collections::WEEKLY_AGGREGATES), 1);
}

#[tokio::test]
async fn daily_and_weekly_windows_reconcile_independently() {
    let h = harness();
    h.ledger
        .record_completion(&h.session, "task-1", 10, at("2026-08-04T09:00:00Z"))
        .await
        .expect("tuesday");
    h.ledger
        .record_completion(&h.session, "task-1", 20, at("2026-08-05T09:00:00Z"))
        .await
        .expect("wednesday");

    let wednesday = h
        .summaries
        .reconcile_day(&h.session, at("2026-08-05T18:00:00Z"))
        .await
        .expect("daily");
    assert_eq!(wednesday.points_earned_today, 20);
    assert_eq!(wednesday.date.to_string(), "2026-08-05");

    let week = h
        .summaries
        .reconcile_week(&h.session, at("2026-08-05T18:00:00Z"))
        .await
        .expect("weekly");
    assert_eq!(week.total_points, 30);

    assert_eq!(h.store.len(collections::DAILY_SUMMARIES), 1);
    assert_eq!(h.store.len(collections::WEEKLY_AGGREGATES), 1);
}

#[tokio::test]
async fn daily_summary_derives_pizza_from_the_weekly_target() {
    let h = harness();
    h.profiles
        .ensure_profile(&h.session, "Sam", "sam@example.com")
        .await
        .expect("profile");
    h.ledger
        .record_completion(&h.session, "task-1", 50, at("2026-08-05T09:00:00Z"))
        .await
        .expect("record");

    let summary = h
        .summaries
        .reconcile_day(&h.session, at("2026-08-05T09:00:00Z"))
        .await
        .expect("daily");
    assert_eq!(summary.points_earned_today, 50);
    assert_eq!(summary.pizza_earned_today, 0.5);

    h.profiles
        .update_profile(
            &h.session,
            ProfileUpdateInput {
                weekly_target_points: Some(200),
                ..Default::default()
            },
        )
        .await
        .expect("raise target");

    let recomputed = h
        .summaries
        .reconcile_day(&h.session, at("2026-08-05T09:00:00Z"))
        .await
        .expect("daily again");
    assert_eq!(recomputed.pizza_earned_today, 0.25);
}

#[tokio::test]
async fn rejected_task_input_never_reaches_the_store() {
    let h = harness();
    let result = h
        .tasks
        .create_task(
            &h.session,
            TaskCreateInput {
                name: "Overeager".into(),
                points: 10,
                urgency: 2,
                max_daily: Some(-5),
                ..Default::default()
            },
        )
        .await;
    assert!(result.unwrap_err().is_validation());
    assert_eq!(h.store.len(collections::TASKS), 0);
}

#[tokio::test]
async fn weekly_target_survives_re_login() {
    let h = harness();
    h.profiles
        .ensure_profile(&h.session, "Sam", "sam@example.com")
        .await
        .expect("first login");
    h.profiles
        .update_profile(
            &h.session,
            ProfileUpdateInput {
                weekly_target_points: Some(250),
                ..Default::default()
            },
        )
        .await
        .expect("update target");

    let after_relogin = h
        .profiles
        .ensure_profile(&h.session, "Sam", "sam@example.com")
        .await
        .expect("second login");
    assert_eq!(after_relogin.weekly_target_points, 250);
    assert_eq!(h.store.len(collections::USERS), 1);
}
