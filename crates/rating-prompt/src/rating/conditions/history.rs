use super::backoff::{effective_wait_days, recurring_cap_reached};
use super::{calendar_days_between, ConditionContext, RatingCondition};
use crate::rating::record::{most_recent, UserAction};

use chrono::{DateTime, Utc};

/// Holds the prompt back while a "remind me later" is still cooling down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotPostponedDueToReminder {
    pub days_before_reminding: u32,
}

impl NotPostponedDueToReminder {
    pub fn new(days_before_reminding: u32) -> Self {
        Self {
            days_before_reminding,
        }
    }
}

impl RatingCondition for NotPostponedDueToReminder {
    fn name(&self) -> &'static str {
        "not_postponed_due_to_reminder"
    }

    fn is_satisfied(&self, context: &ConditionContext<'_>) -> bool {
        let Some(latest) = context.record.most_recent_reminder() else {
            return true;
        };

        calendar_days_between(latest.date, context.now) >= i64::from(self.days_before_reminding)
    }
}

/// Cool-down shared by the decline and rating history conditions.
#[derive(Debug, Clone, Copy, PartialEq)]
struct RecurringPromptRule {
    base_days: u32,
    back_off_factor: Option<f64>,
    max_recurring_prompts: u32,
}

impl RecurringPromptRule {
    fn permits(&self, actions: &[UserAction], now: DateTime<Utc>) -> bool {
        let Some(latest) = most_recent(actions) else {
            return true;
        };

        if recurring_cap_reached(actions.len(), self.max_recurring_prompts) {
            return false;
        }

        let required = effective_wait_days(self.base_days, self.back_off_factor, actions.len());
        calendar_days_between(latest.date, now) >= required
    }
}

/// Waits after a decline before asking again, with optional exponential back-off and a cap
/// on how many times the prompt may return.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NotDeclinedToRateAnyVersion {
    rule: RecurringPromptRule,
}

impl NotDeclinedToRateAnyVersion {
    pub fn new(
        days_after_declining: u32,
        back_off_factor: Option<f64>,
        max_recurring_prompts: u32,
    ) -> Self {
        Self {
            rule: RecurringPromptRule {
                base_days: days_after_declining,
                back_off_factor,
                max_recurring_prompts,
            },
        }
    }

    /// Wait that applies after `times_declined` declines.
    pub fn required_wait_days(&self, times_declined: usize) -> i64 {
        effective_wait_days(self.rule.base_days, self.rule.back_off_factor, times_declined)
    }
}

impl RatingCondition for NotDeclinedToRateAnyVersion {
    fn name(&self) -> &'static str {
        "not_declined_to_rate_any_version"
    }

    fn is_satisfied(&self, context: &ConditionContext<'_>) -> bool {
        self.rule
            .permits(&context.record.declined_actions, context.now)
    }
}

/// Waits after a rating before asking again, same rules as for declines.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NotRatedAnyVersion {
    rule: RecurringPromptRule,
}

impl NotRatedAnyVersion {
    pub fn new(
        days_after_rating: u32,
        back_off_factor: Option<f64>,
        max_recurring_prompts: u32,
    ) -> Self {
        Self {
            rule: RecurringPromptRule {
                base_days: days_after_rating,
                back_off_factor,
                max_recurring_prompts,
            },
        }
    }

    /// Wait that applies after `times_rated` ratings.
    pub fn required_wait_days(&self, times_rated: usize) -> i64 {
        effective_wait_days(self.rule.base_days, self.rule.back_off_factor, times_rated)
    }
}

impl RatingCondition for NotRatedAnyVersion {
    fn name(&self) -> &'static str {
        "not_rated_any_version"
    }

    fn is_satisfied(&self, context: &ConditionContext<'_>) -> bool {
        self.rule.permits(&context.record.rated_actions, context.now)
    }
}

fn version_untouched(actions: &[UserAction], pinned: Option<&str>, context_version: &str) -> bool {
    let version = pinned.unwrap_or(context_version);
    !actions.iter().any(|action| action.app_version == version)
}

/// Never asks again on a version the user already declined on.
///
/// Checks the running version unless pinned to a specific one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotDeclinedToRateCurrentVersion {
    pinned_version: Option<String>,
}

impl NotDeclinedToRateCurrentVersion {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pinned(version: impl Into<String>) -> Self {
        Self {
            pinned_version: Some(version.into()),
        }
    }
}

impl RatingCondition for NotDeclinedToRateCurrentVersion {
    fn name(&self) -> &'static str {
        "not_declined_to_rate_current_version"
    }

    fn is_satisfied(&self, context: &ConditionContext<'_>) -> bool {
        version_untouched(
            &context.record.declined_actions,
            self.pinned_version.as_deref(),
            context.app_version,
        )
    }
}

/// Never asks again on a version the user already rated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotRatedCurrentVersion {
    pinned_version: Option<String>,
}

impl NotRatedCurrentVersion {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pinned(version: impl Into<String>) -> Self {
        Self {
            pinned_version: Some(version.into()),
        }
    }
}

impl RatingCondition for NotRatedCurrentVersion {
    fn name(&self) -> &'static str {
        "not_rated_current_version"
    }

    fn is_satisfied(&self, context: &ConditionContext<'_>) -> bool {
        version_untouched(
            &context.record.rated_actions,
            self.pinned_version.as_deref(),
            context.app_version,
        )
    }
}
