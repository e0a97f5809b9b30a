use serde::{Deserialize, Serialize};

use super::conditions::{
    EnoughAppSessions, EnoughDaysUsed, EnoughSignificantEvents, NotDeclinedToRateAnyVersion,
    NotDeclinedToRateCurrentVersion, NotPostponedDueToReminder, NotRatedAnyVersion,
    NotRatedCurrentVersion, RatingCondition, UNLIMITED_RECURRING_PROMPTS,
};

/// Thresholds for the standard condition set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RatingPolicy {
    pub min_days_used: u32,
    pub min_app_sessions: u64,
    pub min_significant_events: u64,
    pub reminder_cooldown_days: u32,
    pub decline_cooldown_days: u32,
    pub decline_back_off_factor: Option<f64>,
    pub decline_max_recurring_prompts: u32,
    pub rerate_cooldown_days: u32,
    pub rerate_back_off_factor: Option<f64>,
    pub rerate_max_recurring_prompts: u32,
    /// Never ask again on a version the user declined on.
    pub block_declined_version: bool,
    /// Never ask again on a version the user already rated.
    pub block_rated_version: bool,
}

impl Default for RatingPolicy {
    fn default() -> Self {
        Self {
            min_days_used: 30,
            min_app_sessions: 15,
            min_significant_events: 20,
            reminder_cooldown_days: 7,
            decline_cooldown_days: 30,
            decline_back_off_factor: Some(2.0),
            decline_max_recurring_prompts: 2,
            rerate_cooldown_days: 240,
            rerate_back_off_factor: None,
            rerate_max_recurring_prompts: UNLIMITED_RECURRING_PROMPTS,
            block_declined_version: false,
            block_rated_version: true,
        }
    }
}

impl RatingPolicy {
    /// Builds the ordered condition set this policy describes.
    pub fn conditions(&self) -> Vec<Box<dyn RatingCondition>> {
        let mut conditions: Vec<Box<dyn RatingCondition>> = vec![
            Box::new(EnoughDaysUsed::new(self.min_days_used)),
            Box::new(EnoughAppSessions::new(self.min_app_sessions)),
            Box::new(EnoughSignificantEvents::new(self.min_significant_events)),
            Box::new(NotPostponedDueToReminder::new(self.reminder_cooldown_days)),
            Box::new(NotDeclinedToRateAnyVersion::new(
                self.decline_cooldown_days,
                self.decline_back_off_factor,
                self.decline_max_recurring_prompts,
            )),
        ];

        if self.block_declined_version {
            conditions.push(Box::new(NotDeclinedToRateCurrentVersion::new()));
        }
        if self.block_rated_version {
            conditions.push(Box::new(NotRatedCurrentVersion::new()));
        }

        conditions.push(Box::new(NotRatedAnyVersion::new(
            self.rerate_cooldown_days,
            self.rerate_back_off_factor,
            self.rerate_max_recurring_prompts,
        )));

        conditions
    }
}
