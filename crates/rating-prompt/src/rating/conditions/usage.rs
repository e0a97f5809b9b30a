use super::{calendar_days_between, ConditionContext, RatingCondition};

/// Requires a minimum number of app sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnoughAppSessions {
    pub required_sessions: u64,
}

impl EnoughAppSessions {
    pub fn new(required_sessions: u64) -> Self {
        Self { required_sessions }
    }
}

impl RatingCondition for EnoughAppSessions {
    fn name(&self) -> &'static str {
        "enough_app_sessions"
    }

    fn is_satisfied(&self, context: &ConditionContext<'_>) -> bool {
        context.record.app_sessions_count >= self.required_sessions
    }
}

/// Requires the app to have been in use for a number of calendar days.
///
/// Not satisfied until a first use date has been recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnoughDaysUsed {
    pub required_days: u32,
}

impl EnoughDaysUsed {
    pub fn new(required_days: u32) -> Self {
        Self { required_days }
    }
}

impl RatingCondition for EnoughDaysUsed {
    fn name(&self) -> &'static str {
        "enough_days_used"
    }

    fn is_satisfied(&self, context: &ConditionContext<'_>) -> bool {
        let Some(first_use) = context.record.first_use_date else {
            return false;
        };

        calendar_days_between(first_use, context.now) >= i64::from(self.required_days)
    }
}

/// Requires a minimum number of significant events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnoughSignificantEvents {
    pub required_events: u64,
}

impl EnoughSignificantEvents {
    pub fn new(required_events: u64) -> Self {
        Self { required_events }
    }
}

impl RatingCondition for EnoughSignificantEvents {
    fn name(&self) -> &'static str {
        "enough_significant_events"
    }

    fn is_satisfied(&self, context: &ConditionContext<'_>) -> bool {
        context.record.significant_event_count >= self.required_events
    }
}
