use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;

/// Day and week boundary arithmetic in the accounting timezone. "Local" is
/// configuration, not the host clock, so totals stay stable across devices.
#[derive(Debug, Clone, Copy)]
pub struct Calendar {
    tz: Tz,
}

impl Calendar {
    pub fn new(tz: Tz) -> Self {
        Self { tz }
    }

    pub fn utc() -> Self {
        Self::new(Tz::UTC)
    }

    /// Local midnight at or before `instant`.
    pub fn start_of_day(&self, instant: DateTime<Utc>) -> DateTime<Utc> {
        self.local_midnight(self.local_date(instant))
    }

    /// The Monday midnight at or before `instant`. Idempotent: applying it to
    /// its own result returns the same instant.
    pub fn start_of_week(&self, instant: DateTime<Utc>) -> DateTime<Utc> {
        let date = self.local_date(instant);
        let monday = date - Duration::days(i64::from(date.weekday().num_days_from_monday()));
        self.local_midnight(monday)
    }

    /// Exclusive upper bound of the day starting at `day_start`.
    pub fn end_of_day(&self, day_start: DateTime<Utc>) -> DateTime<Utc> {
        self.local_midnight(self.local_date(day_start) + Duration::days(1))
    }

    /// Exclusive upper bound of the week starting at `week_start`.
    pub fn end_of_week(&self, week_start: DateTime<Utc>) -> DateTime<Utc> {
        self.local_midnight(self.local_date(week_start) + Duration::days(7))
    }

    /// `[start_of_day, start_of_day + 1d)` around `instant`.
    pub fn day_window(&self, instant: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
        let start = self.start_of_day(instant);
        (start, self.end_of_day(start))
    }

    /// `[start_of_week, start_of_week + 7d)` around `instant`.
    pub fn week_window(&self, instant: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
        let start = self.start_of_week(instant);
        (start, self.end_of_week(start))
    }

    /// The local calendar date, used as the key of daily summaries.
    pub fn local_date(&self, instant: DateTime<Utc>) -> NaiveDate {
        instant.with_timezone(&self.tz).date_naive()
    }

    fn local_midnight(&self, date: NaiveDate) -> DateTime<Utc> {
        let midnight = date.and_time(NaiveTime::MIN);
        if let Some(resolved) = self.tz.from_local_datetime(&midnight).earliest() {
            return resolved.with_timezone(&Utc);
        }
        // Midnight was skipped by a DST jump; the day starts at the earliest
        // valid local time after it.
        for step in 1..=48 {
            let probe = midnight + Duration::minutes(30 * step);
            if let Some(resolved) = self.tz.from_local_datetime(&probe).earliest() {
                return resolved.with_timezone(&Utc);
            }
        }
        Utc.from_utc_datetime(&midnight)
    }
}
