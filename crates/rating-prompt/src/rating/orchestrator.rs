use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use serde::Serialize;
use tracing::{debug, info};

use super::clock::Clock;
use super::conditions::{ConditionContext, RatingCondition};
use super::evaluator::ConditionEvaluator;
use super::presenter::{
    PromptDetails, PromptOutcome, PromptResponder, RatePromptPresenter,
    RequestToRatePromptPresenter,
};
use super::record::{UsageRecord, UserAction};
use super::store::{RecordStore, StoreError};
use super::version::AppVersionProvider;

/// Host callback fired after an outcome has been recorded.
pub type OutcomeHook = Arc<dyn Fn() + Send + Sync>;

/// Optional host callbacks, one per outcome.
#[derive(Clone, Default)]
pub struct RatingHooks {
    pub on_agreed_to_rate: Option<OutcomeHook>,
    pub on_opted_in_for_reminder: Option<OutcomeHook>,
    pub on_declined_to_rate: Option<OutcomeHook>,
}

impl RatingHooks {
    fn for_outcome(&self, outcome: PromptOutcome) -> Option<&OutcomeHook> {
        match outcome {
            PromptOutcome::AgreeToRate => self.on_agreed_to_rate.as_ref(),
            PromptOutcome::RemindLater => self.on_opted_in_for_reminder.as_ref(),
            PromptOutcome::Decline => self.on_declined_to_rate.as_ref(),
        }
    }
}

impl fmt::Debug for RatingHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RatingHooks")
            .field("on_agreed_to_rate", &self.on_agreed_to_rate.is_some())
            .field("on_opted_in_for_reminder", &self.on_opted_in_for_reminder.is_some())
            .field("on_declined_to_rate", &self.on_declined_to_rate.is_some())
            .finish()
    }
}

/// What happened to a request to show the prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PromptRequest {
    /// Handed to the presenter; the answer arrives later through the responder.
    Shown,
    /// A prompt is still outstanding, the request was dropped.
    AlreadyShowing,
    ConditionsNotMet,
}

/// Collaborators the orchestrator needs to record an answer.
pub(crate) struct PromptCollaborators<S: ?Sized> {
    pub(crate) store: Arc<S>,
    pub(crate) versions: Arc<dyn AppVersionProvider>,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) request_presenter: Arc<dyn RequestToRatePromptPresenter>,
    pub(crate) rate_presenter: Arc<dyn RatePromptPresenter>,
    pub(crate) hooks: RatingHooks,
    pub(crate) details: PromptDetails,
}

struct PromptShared<S: ?Sized> {
    collaborators: PromptCollaborators<S>,
    in_flight: AtomicBool,
}

/// Shows the request-to-rate prompt and feeds the answer back into the record.
pub struct PromptOrchestrator<S: ?Sized> {
    shared: Arc<PromptShared<S>>,
}

impl<S> PromptOrchestrator<S>
where
    S: RecordStore + ?Sized + 'static,
{
    pub(crate) fn new(collaborators: PromptCollaborators<S>) -> Self {
        Self {
            shared: Arc::new(PromptShared {
                collaborators,
                in_flight: AtomicBool::new(false),
            }),
        }
    }

    /// Shows the prompt when every condition holds for `context`.
    pub fn maybe_prompt(
        &self,
        conditions: &[Box<dyn RatingCondition>],
        context: &ConditionContext<'_>,
    ) -> PromptRequest {
        if !ConditionEvaluator::all_satisfied(conditions, context) {
            return PromptRequest::ConditionsNotMet;
        }

        info!("all rating conditions met, requesting the rating prompt");
        self.show_request_prompt()
    }

    /// Shows the prompt regardless of conditions. A no-op while another one is outstanding.
    pub fn show_request_prompt(&self) -> PromptRequest {
        if self
            .shared
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("rating prompt already outstanding, ignoring request");
            return PromptRequest::AlreadyShowing;
        }

        // Presenters may park the responder, so it must not keep the engine alive.
        let shared: Weak<PromptShared<S>> = Arc::downgrade(&self.shared);
        let responder = PromptResponder::new(move |outcome| {
            let Some(shared) = shared.upgrade() else {
                return match outcome {
                    Some(_) => Err(StoreError::Unavailable(
                        "rating service has been dropped".to_string(),
                    )),
                    None => Ok(()),
                };
            };
            let result = match outcome {
                Some(outcome) => shared.record_outcome(outcome).map(|_| ()),
                None => {
                    debug!("rating prompt dismissed without an answer");
                    Ok(())
                }
            };
            shared.in_flight.store(false, Ordering::Release);

            if result.is_ok() {
                if let Some(outcome) = outcome {
                    shared.after_outcome(outcome);
                }
            }
            result
        });

        let collaborators = &self.shared.collaborators;
        collaborators
            .request_presenter
            .show(&collaborators.details, responder);
        PromptRequest::Shown
    }

    /// Starts the native store review flow directly, without bookkeeping.
    pub fn show_native_rating_flow(&self) {
        self.shared.collaborators.rate_presenter.show();
    }

    pub fn is_prompt_outstanding(&self) -> bool {
        self.shared.in_flight.load(Ordering::Acquire)
    }
}

impl<S> PromptShared<S>
where
    S: RecordStore + ?Sized,
{
    fn record_outcome(&self, outcome: PromptOutcome) -> Result<UsageRecord, StoreError> {
        let collaborators = &self.collaborators;
        let action = UserAction::new(
            collaborators.versions.app_version(),
            collaborators.clock.now(),
        );

        let record = collaborators.store.update(&mut |record| {
            let actions = match outcome {
                PromptOutcome::AgreeToRate => &mut record.rated_actions,
                PromptOutcome::RemindLater => &mut record.opted_in_for_reminder_actions,
                PromptOutcome::Decline => &mut record.declined_actions,
            };
            actions.push(action.clone());
        })?;

        info!(
            outcome = outcome.label(),
            app_version = %action.app_version,
            "rating prompt answered"
        );
        Ok(record)
    }

    fn after_outcome(&self, outcome: PromptOutcome) {
        if outcome == PromptOutcome::AgreeToRate {
            self.collaborators.rate_presenter.show();
        }

        if let Some(hook) = self.collaborators.hooks.for_outcome(outcome) {
            hook();
        }
    }
}
