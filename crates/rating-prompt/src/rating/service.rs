use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace};

use super::clock::{Clock, SystemClock};
use super::conditions::{ConditionContext, RatingCondition};
use super::evaluator::{ConditionEvaluator, EvaluationReport};
use super::orchestrator::{PromptCollaborators, PromptOrchestrator, PromptRequest, RatingHooks};
use super::policy::RatingPolicy;
use super::presenter::{
    LoggingRatePresenter, PromptDetails, RatePromptPresenter, RequestToRatePromptPresenter,
    UnattendedPromptPresenter,
};
use super::record::UsageRecord;
use super::store::{RecordStore, StoreError};
use super::tracker::{ResetPolicy, TrackedEvent, UsageTracker};
use super::version::{AppVersionProvider, StaticVersionProvider};

/// Which part of the record a reset clears.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResetScope {
    /// First use date and both counters.
    Usage,
    /// Every recorded prompt response.
    Actions,
    /// Everything, including the stored app version.
    All,
}

/// Result of tracking one usage signal.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackOutcome {
    pub event: TrackedEvent,
    /// Record as stored after the event was applied.
    pub record: UsageRecord,
    /// Whether the reset policy wiped the record first.
    pub reset: bool,
    /// `None` when prompting was not allowed for this event.
    pub prompt: Option<PromptRequest>,
}

/// Snapshot for status views.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RatingStatus {
    pub app_version: String,
    pub record: UsageRecord,
    pub evaluation: EvaluationReport,
    pub prompt_outstanding: bool,
}

/// Error raised by the rating service.
#[derive(Debug, thiserror::Error)]
pub enum RatingServiceError {
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Composition root for the engine: tracks usage, evaluates conditions and drives prompts.
pub struct RatingService<S: ?Sized> {
    store: Arc<S>,
    versions: Arc<dyn AppVersionProvider>,
    clock: Arc<dyn Clock>,
    conditions: Vec<Box<dyn RatingCondition>>,
    tracker: UsageTracker,
    orchestrator: PromptOrchestrator<S>,
    prompt_on_launch: bool,
    debug_enabled: bool,
}

impl<S> RatingService<S>
where
    S: RecordStore + ?Sized + 'static,
{
    pub fn builder(store: Arc<S>) -> RatingServiceBuilder<S> {
        RatingServiceBuilder::new(store)
    }

    /// Counts a caller-defined milestone, then prompts if allowed and eligible.
    pub fn track_significant_event(
        &self,
        can_prompt: bool,
    ) -> Result<TrackOutcome, RatingServiceError> {
        self.track(TrackedEvent::SignificantEvent, can_prompt)
    }

    /// Counts an "app became active" signal; prompts only when configured to on launch.
    pub fn track_app_launch(&self) -> Result<TrackOutcome, RatingServiceError> {
        self.track(TrackedEvent::AppLaunch, self.prompt_on_launch)
    }

    fn track(
        &self,
        event: TrackedEvent,
        can_prompt: bool,
    ) -> Result<TrackOutcome, RatingServiceError> {
        let app_version = self.versions.app_version();
        let now = self.clock.now();

        let mut reset = false;
        let record = self.store.update(&mut |record| {
            reset = self.tracker.track(event, record, &app_version, now);
        })?;

        if reset {
            info!(app_version = %app_version, "reset policy cleared all rating trackers");
        }
        self.log_record(event.label(), &record);

        let prompt = if can_prompt {
            let context = ConditionContext::new(&record, &app_version, now);
            Some(self.orchestrator.maybe_prompt(&self.conditions, &context))
        } else {
            None
        };

        Ok(TrackOutcome {
            event,
            record,
            reset,
            prompt,
        })
    }

    pub fn record(&self) -> Result<UsageRecord, RatingServiceError> {
        Ok(self.store.load()?)
    }

    /// Whether every configured condition currently holds.
    pub fn conditions_met(&self) -> Result<bool, RatingServiceError> {
        let record = self.store.load()?;
        let app_version = self.versions.app_version();
        let context = ConditionContext::new(&record, &app_version, self.clock.now());
        Ok(ConditionEvaluator::all_satisfied(&self.conditions, &context))
    }

    pub fn status(&self) -> Result<RatingStatus, RatingServiceError> {
        let record = self.store.load()?;
        let app_version = self.versions.app_version();
        let evaluation = {
            let context = ConditionContext::new(&record, &app_version, self.clock.now());
            ConditionEvaluator::evaluate(&self.conditions, &context)
        };

        Ok(RatingStatus {
            app_version,
            record,
            evaluation,
            prompt_outstanding: self.orchestrator.is_prompt_outstanding(),
        })
    }

    /// Shows the request-to-rate prompt without checking conditions.
    pub fn show_request_prompt(&self) -> PromptRequest {
        self.orchestrator.show_request_prompt()
    }

    /// Starts the native store review flow without checking conditions.
    pub fn show_native_rating_flow(&self) {
        self.orchestrator.show_native_rating_flow();
    }

    pub fn is_prompt_outstanding(&self) -> bool {
        self.orchestrator.is_prompt_outstanding()
    }

    pub fn reset_usage_trackers(&self) -> Result<UsageRecord, RatingServiceError> {
        self.reset(ResetScope::Usage)
    }

    pub fn reset_user_actions(&self) -> Result<UsageRecord, RatingServiceError> {
        self.reset(ResetScope::Actions)
    }

    pub fn reset_all(&self) -> Result<UsageRecord, RatingServiceError> {
        self.reset(ResetScope::All)
    }

    /// Clears the requested group in a single store update.
    pub fn reset(&self, scope: ResetScope) -> Result<UsageRecord, RatingServiceError> {
        let record = self.store.update(&mut |record| match scope {
            ResetScope::Usage => record.reset_usage_trackers(),
            ResetScope::Actions => record.reset_user_actions(),
            ResetScope::All => record.reset_all(),
        })?;

        info!(?scope, "rating trackers reset");
        self.log_record("reset", &record);
        Ok(record)
    }

    pub fn conditions(&self) -> &[Box<dyn RatingCondition>] {
        &self.conditions
    }

    pub fn tracker(&self) -> &UsageTracker {
        &self.tracker
    }

    fn log_record(&self, cause: &str, record: &UsageRecord) {
        if self.debug_enabled {
            debug!(cause, record = %record.summary(), "usage record updated");
        } else {
            trace!(cause, record = %record.summary(), "usage record updated");
        }
    }
}

/// Builder with a default for every collaborator except the store.
pub struct RatingServiceBuilder<S: ?Sized> {
    store: Arc<S>,
    versions: Option<Arc<dyn AppVersionProvider>>,
    clock: Option<Arc<dyn Clock>>,
    request_presenter: Option<Arc<dyn RequestToRatePromptPresenter>>,
    rate_presenter: Option<Arc<dyn RatePromptPresenter>>,
    conditions: Option<Vec<Box<dyn RatingCondition>>>,
    policy: RatingPolicy,
    reset_policy: ResetPolicy,
    hooks: RatingHooks,
    details: PromptDetails,
    prompt_on_launch: bool,
    debug_enabled: bool,
}

impl<S> RatingServiceBuilder<S>
where
    S: RecordStore + ?Sized + 'static,
{
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            versions: None,
            clock: None,
            request_presenter: None,
            rate_presenter: None,
            conditions: None,
            policy: RatingPolicy::default(),
            reset_policy: ResetPolicy::default(),
            hooks: RatingHooks::default(),
            details: PromptDetails::default(),
            prompt_on_launch: false,
            debug_enabled: false,
        }
    }

    pub fn app_version_provider(mut self, versions: Arc<dyn AppVersionProvider>) -> Self {
        self.versions = Some(versions);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn request_to_rate_presenter(
        mut self,
        presenter: Arc<dyn RequestToRatePromptPresenter>,
    ) -> Self {
        self.request_presenter = Some(presenter);
        self
    }

    pub fn rate_presenter(mut self, presenter: Arc<dyn RatePromptPresenter>) -> Self {
        self.rate_presenter = Some(presenter);
        self
    }

    /// Replaces the policy-derived condition set with an explicit one. An empty list makes
    /// every evaluation pass.
    pub fn conditions(mut self, conditions: Vec<Box<dyn RatingCondition>>) -> Self {
        self.conditions = Some(conditions);
        self
    }

    pub fn policy(mut self, policy: RatingPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn reset_policy(mut self, reset_policy: ResetPolicy) -> Self {
        self.reset_policy = reset_policy;
        self
    }

    pub fn on_agreed_to_rate<F>(mut self, hook: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.hooks.on_agreed_to_rate = Some(Arc::new(hook));
        self
    }

    pub fn on_opted_in_for_reminder<F>(mut self, hook: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.hooks.on_opted_in_for_reminder = Some(Arc::new(hook));
        self
    }

    pub fn on_declined_to_rate<F>(mut self, hook: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.hooks.on_declined_to_rate = Some(Arc::new(hook));
        self
    }

    pub fn app_name(mut self, app_name: impl Into<String>) -> Self {
        self.details.app_name = Some(app_name.into());
        self
    }

    pub fn can_opt_in_for_reminder(mut self, enabled: bool) -> Self {
        self.details.can_opt_in_for_reminder = enabled;
        self
    }

    pub fn prompt_on_launch(mut self, enabled: bool) -> Self {
        self.prompt_on_launch = enabled;
        self
    }

    pub fn debug_enabled(mut self, enabled: bool) -> Self {
        self.debug_enabled = enabled;
        self
    }

    pub fn build(self) -> RatingService<S> {
        let versions = self
            .versions
            .unwrap_or_else(|| Arc::new(StaticVersionProvider::default()));
        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        let conditions = self
            .conditions
            .unwrap_or_else(|| self.policy.conditions());

        let orchestrator = PromptOrchestrator::new(PromptCollaborators {
            store: self.store.clone(),
            versions: versions.clone(),
            clock: clock.clone(),
            request_presenter: self
                .request_presenter
                .unwrap_or_else(|| Arc::new(UnattendedPromptPresenter)),
            rate_presenter: self
                .rate_presenter
                .unwrap_or_else(|| Arc::new(LoggingRatePresenter)),
            hooks: self.hooks,
            details: self.details,
        });

        RatingService {
            store: self.store,
            versions,
            clock,
            conditions,
            tracker: UsageTracker::new(self.reset_policy),
            orchestrator,
            prompt_on_launch: self.prompt_on_launch,
            debug_enabled: self.debug_enabled,
        }
    }
}
