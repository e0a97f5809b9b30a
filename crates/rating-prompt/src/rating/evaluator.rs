use serde::Serialize;
use tracing::debug;

use super::conditions::{ConditionContext, RatingCondition};

/// Outcome of checking every configured condition, used for status views.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EvaluationReport {
    pub satisfied: bool,
    pub evaluated: usize,
    pub unmet: Vec<&'static str>,
}

/// Logical AND over an ordered set of rating conditions.
pub struct ConditionEvaluator;

impl ConditionEvaluator {
    /// True when no condition is configured or every condition holds. Stops at the first
    /// failure, in list order.
    pub fn all_satisfied(
        conditions: &[Box<dyn RatingCondition>],
        context: &ConditionContext<'_>,
    ) -> bool {
        if conditions.is_empty() {
            debug!("no rating conditions configured, prompt is always eligible");
            return true;
        }

        conditions.iter().all(|condition| {
            let satisfied = condition.is_satisfied(context);
            if !satisfied {
                debug!(condition = condition.name(), "rating condition not satisfied");
            }
            satisfied
        })
    }

    /// Checks every condition and reports each unmet one.
    pub fn evaluate(
        conditions: &[Box<dyn RatingCondition>],
        context: &ConditionContext<'_>,
    ) -> EvaluationReport {
        let unmet: Vec<&'static str> = conditions
            .iter()
            .filter(|condition| !condition.is_satisfied(context))
            .map(|condition| condition.name())
            .collect();

        EvaluationReport {
            satisfied: unmet.is_empty(),
            evaluated: conditions.len(),
            unmet,
        }
    }
}
