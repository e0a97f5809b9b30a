//! Rating conditions: independent predicates over the usage record.
//!
//! Every condition is total. Missing data never errors; it maps to a fixed answer (closed for
//! usage gates such as days used, open for history gates such as "never declined").

mod backoff;
mod history;
mod usage;

pub use backoff::{effective_wait_days, UNLIMITED_RECURRING_PROMPTS};
pub use history::{
    NotDeclinedToRateAnyVersion, NotDeclinedToRateCurrentVersion, NotPostponedDueToReminder,
    NotRatedAnyVersion, NotRatedCurrentVersion,
};
pub use usage::{EnoughAppSessions, EnoughDaysUsed, EnoughSignificantEvents};

use chrono::{DateTime, Utc};

use super::record::UsageRecord;

/// Everything a condition may look at.
#[derive(Debug, Clone, Copy)]
pub struct ConditionContext<'a> {
    pub record: &'a UsageRecord,
    pub app_version: &'a str,
    pub now: DateTime<Utc>,
}

impl<'a> ConditionContext<'a> {
    pub fn new(record: &'a UsageRecord, app_version: &'a str, now: DateTime<Utc>) -> Self {
        Self {
            record,
            app_version,
            now,
        }
    }
}

/// A single rule deciding whether the rating prompt may be shown.
pub trait RatingCondition: Send + Sync {
    /// Stable identifier used in diagnostics and status views.
    fn name(&self) -> &'static str;

    fn is_satisfied(&self, context: &ConditionContext<'_>) -> bool;
}

impl std::fmt::Debug for dyn RatingCondition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Whole calendar days from `from` to `to`, both truncated to the start of their UTC day.
///
/// Negative when `from` lies on a later day than `to`.
pub fn calendar_days_between(from: DateTime<Utc>, to: DateTime<Utc>) -> i64 {
    (to.date_naive() - from.date_naive()).num_days()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn calendar_days_ignore_time_of_day() {
        let late = Utc.with_ymd_and_hms(2025, 3, 9, 23, 59, 0).unwrap();
        let just_after_midnight = Utc.with_ymd_and_hms(2025, 3, 10, 0, 1, 0).unwrap();
        assert_eq!(calendar_days_between(late, just_after_midnight), 1);

        let morning = Utc.with_ymd_and_hms(2025, 3, 10, 0, 0, 0).unwrap();
        let evening = morning + Duration::hours(23) + Duration::minutes(59);
        assert_eq!(calendar_days_between(morning, evening), 0);
        assert_eq!(calendar_days_between(morning, morning + Duration::hours(24)), 1);
    }

    #[test]
    fn calendar_days_are_negative_for_future_dates() {
        let now = Utc.with_ymd_and_hms(2025, 3, 10, 8, 0, 0).unwrap();
        assert_eq!(calendar_days_between(now + Duration::days(3), now), -3);
    }
}
