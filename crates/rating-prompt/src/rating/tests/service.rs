use super::common::*;
use crate::rating::conditions::{EnoughSignificantEvents, RatingCondition};
use crate::rating::orchestrator::PromptRequest;
use crate::rating::policy::RatingPolicy;
use crate::rating::presenter::PromptOutcome;
use crate::rating::record::UsageRecord;
use crate::rating::service::{RatingServiceError, ResetScope};
use crate::rating::store::StoreError;
use crate::rating::tracker::{ResetPolicy, TrackedEvent};
use chrono::Duration;
use std::sync::Arc;

#[test]
fn fifth_significant_event_requests_the_prompt() {
    let fixtures = Fixtures::new();
    let conditions: Vec<Box<dyn RatingCondition>> = vec![Box::new(EnoughSignificantEvents::new(5))];
    let service = fixtures.builder().conditions(conditions).build();

    for _ in 0..4 {
        let outcome = service.track_significant_event(true).expect("tracked");
        assert_eq!(outcome.prompt, Some(PromptRequest::ConditionsNotMet));
    }
    assert_eq!(fixtures.presenter.shown_count(), 0);

    let outcome = service.track_significant_event(true).expect("tracked");
    assert_eq!(outcome.event, TrackedEvent::SignificantEvent);
    assert_eq!(outcome.record.significant_event_count, 5);
    assert_eq!(outcome.prompt, Some(PromptRequest::Shown));
    assert_eq!(fixtures.presenter.shown_count(), 1);
}

#[test]
fn default_policy_waits_for_days_sessions_and_events() {
    let fixtures = Fixtures::new();
    let service = fixtures.builder().build();

    for _ in 0..15 {
        let outcome = service.track_app_launch().expect("launch tracked");
        assert_eq!(outcome.prompt, None);
    }
    for _ in 0..20 {
        service.track_significant_event(true).expect("tracked");
    }
    assert_eq!(fixtures.presenter.shown_count(), 0);

    let status = service.status().expect("status");
    assert!(!status.evaluation.satisfied);
    assert_eq!(status.evaluation.unmet, vec!["enough_days_used"]);

    fixtures.clock.advance(Duration::days(30));
    let outcome = service.track_significant_event(true).expect("tracked");
    assert_eq!(outcome.prompt, Some(PromptRequest::Shown));
}

#[test]
fn declined_user_is_asked_again_after_the_cooldown() {
    let fixtures = Fixtures::new();
    let policy = RatingPolicy {
        min_days_used: 0,
        min_app_sessions: 0,
        min_significant_events: 1,
        ..RatingPolicy::default()
    };
    let service = fixtures.builder().policy(policy).build();

    service.track_significant_event(true).expect("tracked");
    fixtures
        .presenter
        .answer(PromptOutcome::Decline)
        .expect("decline recorded");

    fixtures.clock.advance(Duration::days(29));
    let outcome = service.track_significant_event(true).expect("tracked");
    assert_eq!(outcome.prompt, Some(PromptRequest::ConditionsNotMet));

    fixtures.clock.advance(Duration::days(1));
    let outcome = service.track_significant_event(true).expect("tracked");
    assert_eq!(outcome.prompt, Some(PromptRequest::Shown));
}

#[test]
fn rated_version_is_never_asked_again() {
    let fixtures = Fixtures::new();
    let policy = RatingPolicy {
        min_days_used: 0,
        min_app_sessions: 0,
        min_significant_events: 0,
        ..RatingPolicy::default()
    };
    let service = fixtures.builder().policy(policy).build();

    let outcome = service.track_significant_event(true).expect("tracked");
    assert_eq!(outcome.prompt, Some(PromptRequest::Shown));
    fixtures
        .presenter
        .answer(PromptOutcome::AgreeToRate)
        .expect("rating recorded");

    fixtures.clock.advance(Duration::days(400));
    assert!(!service.conditions_met().expect("evaluated"));

    fixtures.versions.set("2.0.0");
    assert!(service.conditions_met().expect("evaluated"));
}

#[test]
fn app_launch_prompts_only_when_enabled() {
    let fixtures = Fixtures::new();
    let quiet = fixtures.unconditional();
    let outcome = quiet.track_app_launch().expect("launch tracked");
    assert_eq!(outcome.record.app_sessions_count, 1);
    assert_eq!(outcome.prompt, None);
    assert_eq!(fixtures.presenter.shown_count(), 0);

    let eager = fixtures
        .builder()
        .conditions(Vec::new())
        .prompt_on_launch(true)
        .build();
    let outcome = eager.track_app_launch().expect("launch tracked");
    assert_eq!(outcome.record.app_sessions_count, 2);
    assert_eq!(outcome.prompt, Some(PromptRequest::Shown));
}

#[test]
fn event_without_permission_only_counts() {
    let fixtures = Fixtures::new();
    let service = fixtures.unconditional();

    let outcome = service.track_significant_event(false).expect("tracked");

    assert_eq!(outcome.prompt, None);
    assert_eq!(outcome.record.significant_event_count, 1);
    assert_eq!(outcome.record.first_use_date, Some(start()));
    assert_eq!(outcome.record.previous_or_current_app_version.as_deref(), Some(APP_VERSION));
    assert_eq!(fixtures.presenter.shown_count(), 0);
}

#[test]
fn reset_all_behaves_like_a_fresh_record() {
    let fixtures = Fixtures::new();
    let service = fixtures.unconditional();

    service.track_app_launch().expect("launch tracked");
    service.track_significant_event(true).expect("tracked");
    fixtures
        .presenter
        .answer(PromptOutcome::Decline)
        .expect("decline recorded");

    let record = service.reset_all().expect("reset");
    assert_eq!(record, UsageRecord::default());

    fixtures.clock.advance(Duration::days(2));
    let outcome = service.track_significant_event(false).expect("tracked");
    assert_eq!(outcome.record.first_use_date, Some(start() + Duration::days(2)));
    assert_eq!(outcome.record.significant_event_count, 1);
    assert_eq!(outcome.record.app_sessions_count, 0);
}

#[test]
fn scoped_resets_leave_the_other_group() {
    let fixtures = Fixtures::new();
    let service = fixtures.unconditional();

    service.track_significant_event(true).expect("tracked");
    fixtures
        .presenter
        .answer(PromptOutcome::RemindLater)
        .expect("reminder recorded");

    let record = service.reset(ResetScope::Usage).expect("usage reset");
    assert_eq!(record.significant_event_count, 0);
    assert_eq!(record.first_use_date, None);
    assert_eq!(record.opted_in_for_reminder_actions.len(), 1);
    assert_eq!(record.previous_or_current_app_version.as_deref(), Some(APP_VERSION));

    service.track_significant_event(false).expect("tracked");
    let record = service.reset_user_actions().expect("actions reset");
    assert!(record.opted_in_for_reminder_actions.is_empty());
    assert_eq!(record.significant_event_count, 1);
}

#[test]
fn version_change_policy_starts_counting_again() {
    let fixtures = Fixtures::new();
    let service = fixtures
        .builder()
        .reset_policy(ResetPolicy::OnVersionChange)
        .build();

    for _ in 0..3 {
        let outcome = service.track_significant_event(false).expect("tracked");
        assert!(!outcome.reset);
    }

    fixtures.versions.set("1.1.0");
    fixtures.clock.advance(Duration::days(10));
    let outcome = service.track_significant_event(false).expect("tracked");

    assert!(outcome.reset);
    assert_eq!(outcome.record.significant_event_count, 1);
    assert_eq!(outcome.record.first_use_date, Some(start() + Duration::days(10)));
    assert_eq!(outcome.record.previous_or_current_app_version.as_deref(), Some("1.1.0"));
}

#[test]
fn status_lists_every_unmet_condition() {
    let fixtures = Fixtures::new();
    let service = fixtures.builder().build();

    let status = service.status().expect("status");

    assert_eq!(status.app_version, APP_VERSION);
    assert!(!status.prompt_outstanding);
    assert_eq!(status.evaluation.evaluated, 7);
    assert_eq!(
        status.evaluation.unmet,
        vec!["enough_days_used", "enough_app_sessions", "enough_significant_events"]
    );
}

#[test]
fn store_failures_surface_as_errors() {
    let fixtures = Fixtures::new();
    let service = fixtures.builder_for(Arc::new(UnavailableStore)).build();

    match service.track_significant_event(true) {
        Err(RatingServiceError::Store(StoreError::Unavailable(message))) => {
            assert_eq!(message, "store offline")
        }
        other => panic!("expected store failure, got {other:?}"),
    }
    assert!(service.status().is_err());
    assert!(service.reset_all().is_err());
    assert_eq!(fixtures.presenter.shown_count(), 0);
}
