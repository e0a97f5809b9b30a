use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

use super::record::UsageRecord;

/// Usage signal reported by the host application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackedEvent {
    AppLaunch,
    SignificantEvent,
}

impl TrackedEvent {
    pub const fn label(self) -> &'static str {
        match self {
            Self::AppLaunch => "app launch",
            Self::SignificantEvent => "significant event",
        }
    }
}

/// Predicate deciding whether the whole record is wiped before tracking an event.
pub type ResetPredicate = dyn Fn(&UsageRecord, &str) -> bool + Send + Sync;

/// When to start counting from scratch.
#[derive(Clone, Default)]
pub enum ResetPolicy {
    #[default]
    Never,
    /// Reset when a previously stored version differs from the running one.
    OnVersionChange,
    Custom(Arc<ResetPredicate>),
}

impl ResetPolicy {
    pub fn custom<F>(predicate: F) -> Self
    where
        F: Fn(&UsageRecord, &str) -> bool + Send + Sync + 'static,
    {
        Self::Custom(Arc::new(predicate))
    }

    pub fn needs_reset(&self, record: &UsageRecord, current_version: &str) -> bool {
        match self {
            Self::Never => false,
            Self::OnVersionChange => record
                .previous_or_current_app_version
                .as_deref()
                .is_some_and(|stored| stored != current_version),
            Self::Custom(predicate) => predicate(record, current_version),
        }
    }
}

impl fmt::Debug for ResetPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Never => f.write_str("Never"),
            Self::OnVersionChange => f.write_str("OnVersionChange"),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// Applies usage signals to the record.
#[derive(Debug, Clone, Default)]
pub struct UsageTracker {
    reset_policy: ResetPolicy,
}

impl UsageTracker {
    pub fn new(reset_policy: ResetPolicy) -> Self {
        Self { reset_policy }
    }

    pub fn reset_policy(&self) -> &ResetPolicy {
        &self.reset_policy
    }

    /// Bookkeeping shared by every tracked event. Returns `true` when the record was reset.
    pub fn before_tracking_event(
        &self,
        record: &mut UsageRecord,
        current_version: &str,
        now: DateTime<Utc>,
    ) -> bool {
        let reset = self.reset_policy.needs_reset(record, current_version);
        if reset {
            record.reset_all();
        }

        if record.previous_or_current_app_version.as_deref() != Some(current_version) {
            record.previous_or_current_app_version = Some(current_version.to_string());
        }

        if record.first_use_date.is_none() {
            record.first_use_date = Some(now.trunc_subsecs(3));
        }

        reset
    }

    pub fn track_significant_event(
        &self,
        record: &mut UsageRecord,
        current_version: &str,
        now: DateTime<Utc>,
    ) -> bool {
        let reset = self.before_tracking_event(record, current_version, now);
        record.significant_event_count = record.significant_event_count.saturating_add(1);
        reset
    }

    pub fn track_app_launch(
        &self,
        record: &mut UsageRecord,
        current_version: &str,
        now: DateTime<Utc>,
    ) -> bool {
        let reset = self.before_tracking_event(record, current_version, now);
        record.app_sessions_count = record.app_sessions_count.saturating_add(1);
        reset
    }

    pub fn track(
        &self,
        event: TrackedEvent,
        record: &mut UsageRecord,
        current_version: &str,
        now: DateTime<Utc>,
    ) -> bool {
        match event {
            TrackedEvent::AppLaunch => self.track_app_launch(record, current_version, now),
            TrackedEvent::SignificantEvent => {
                self.track_significant_event(record, current_version, now)
            }
        }
    }
}
