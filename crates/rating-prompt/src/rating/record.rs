use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

/// A single prompt response, stamped with the app version it happened on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserAction {
    pub app_version: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub date: DateTime<Utc>,
}

impl UserAction {
    /// Dates are truncated to whole milliseconds, the persisted precision.
    pub fn new(app_version: impl Into<String>, date: DateTime<Utc>) -> Self {
        Self {
            app_version: app_version.into(),
            date: date.trunc_subsecs(3),
        }
    }
}

/// Usage and prompt history for one installed app.
///
/// The serialized keys are the stable names hosts persist under, so a record written by one
/// store can be read back by any other.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UsageRecord {
    #[serde(with = "chrono::serde::ts_milliseconds_option")]
    pub first_use_date: Option<DateTime<Utc>>,
    pub app_sessions_count: u64,
    pub significant_event_count: u64,
    pub previous_or_current_app_version: Option<String>,
    #[serde(rename = "opted_in_for_reminder_user_actions")]
    pub opted_in_for_reminder_actions: Vec<UserAction>,
    #[serde(rename = "rated_user_actions")]
    pub rated_actions: Vec<UserAction>,
    #[serde(rename = "declined_to_rate_user_actions")]
    pub declined_actions: Vec<UserAction>,
}

impl UsageRecord {
    pub fn most_recent_reminder(&self) -> Option<&UserAction> {
        most_recent(&self.opted_in_for_reminder_actions)
    }

    pub fn most_recent_rating(&self) -> Option<&UserAction> {
        most_recent(&self.rated_actions)
    }

    pub fn most_recent_decline(&self) -> Option<&UserAction> {
        most_recent(&self.declined_actions)
    }

    /// Clears the first use date and both counters.
    pub fn reset_usage_trackers(&mut self) {
        self.first_use_date = None;
        self.app_sessions_count = 0;
        self.significant_event_count = 0;
    }

    /// Clears every recorded prompt response.
    pub fn reset_user_actions(&mut self) {
        self.opted_in_for_reminder_actions.clear();
        self.rated_actions.clear();
        self.declined_actions.clear();
    }

    /// Returns the record to the state of a fresh install.
    pub fn reset_all(&mut self) {
        self.reset_usage_trackers();
        self.reset_user_actions();
        self.previous_or_current_app_version = None;
    }

    /// One-line dump used by debug logging.
    pub fn summary(&self) -> String {
        let first_use = self
            .first_use_date
            .map(|date| date.to_rfc3339())
            .unwrap_or_else(|| "never".to_string());
        let version = self
            .previous_or_current_app_version
            .as_deref()
            .unwrap_or("unknown");

        format!(
            "first use {first_use}, {} session(s), {} significant event(s), version {version}, \
             {} reminder(s), {} rating(s), {} decline(s)",
            self.app_sessions_count,
            self.significant_event_count,
            self.opted_in_for_reminder_actions.len(),
            self.rated_actions.len(),
            self.declined_actions.len(),
        )
    }
}

/// Latest action by date; list order is not trusted to be chronological.
pub(crate) fn most_recent(actions: &[UserAction]) -> Option<&UserAction> {
    actions.iter().max_by_key(|action| action.date)
}
