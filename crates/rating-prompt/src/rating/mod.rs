//! Store rating prompt engine.
//!
//! Usage signals update a persisted [`UsageRecord`]; an ordered set of [`RatingCondition`]s
//! decides whether the request-to-rate prompt may be shown; the user's answer is appended to
//! the record and feeds the next evaluation.

pub mod clock;
pub mod conditions;
pub mod evaluator;
pub mod handle;
pub mod orchestrator;
pub mod policy;
pub mod presenter;
pub mod record;
pub mod router;
pub mod service;
pub mod store;
pub mod tracker;
pub mod version;

#[cfg(test)]
mod tests;

pub use clock::{Clock, FixedClock, SystemClock};
pub use conditions::{
    calendar_days_between, effective_wait_days, ConditionContext, EnoughAppSessions,
    EnoughDaysUsed, EnoughSignificantEvents, NotDeclinedToRateAnyVersion,
    NotDeclinedToRateCurrentVersion, NotPostponedDueToReminder, NotRatedAnyVersion,
    NotRatedCurrentVersion, RatingCondition, UNLIMITED_RECURRING_PROMPTS,
};
pub use evaluator::{ConditionEvaluator, EvaluationReport};
pub use handle::{HandleError, SharedRatingService};
pub use orchestrator::{OutcomeHook, PromptOrchestrator, PromptRequest, RatingHooks};
pub use policy::RatingPolicy;
pub use presenter::{
    LoggingRatePresenter, PendingPromptPresenter, PromptDetails, PromptOutcome, PromptResponder,
    RatePromptPresenter, RequestToRatePromptPresenter, UnattendedPromptPresenter,
};
pub use record::{UsageRecord, UserAction};
pub use router::{rating_router, RatingRouterState};
pub use service::{
    RatingService, RatingServiceBuilder, RatingServiceError, RatingStatus, ResetScope,
    TrackOutcome,
};
pub use store::{InMemoryRecordStore, JsonFileRecordStore, RecordStore, StoreError};
pub use tracker::{ResetPolicy, TrackedEvent, UsageTracker};
pub use version::{AppVersionProvider, StaticVersionProvider};
