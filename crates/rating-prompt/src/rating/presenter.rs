use std::fmt;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::store::StoreError;

/// The user's answer to the request-to-rate prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PromptOutcome {
    AgreeToRate,
    RemindLater,
    Decline,
}

impl PromptOutcome {
    pub const fn label(self) -> &'static str {
        match self {
            Self::AgreeToRate => "agreed to rate",
            Self::RemindLater => "opted in for reminder",
            Self::Decline => "declined to rate",
        }
    }
}

/// Presentation hints handed to the request-to-rate presenter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptDetails {
    pub app_name: Option<String>,
    /// Whether a "remind me later" choice should be offered at all.
    pub can_opt_in_for_reminder: bool,
}

impl Default for PromptDetails {
    fn default() -> Self {
        Self {
            app_name: None,
            can_opt_in_for_reminder: true,
        }
    }
}

type Completion = Box<dyn FnOnce(Option<PromptOutcome>) -> Result<(), StoreError> + Send>;

/// One-shot continuation for a displayed prompt.
///
/// `respond` consumes the responder, so a display yields at most one outcome. Dropping it
/// without responding counts as a dismissal: nothing is recorded and the prompt slot frees up.
pub struct PromptResponder {
    completion: Option<Completion>,
}

impl PromptResponder {
    pub(crate) fn new<F>(completion: F) -> Self
    where
        F: FnOnce(Option<PromptOutcome>) -> Result<(), StoreError> + Send + 'static,
    {
        Self {
            completion: Some(Box::new(completion)),
        }
    }

    /// Records the user's choice.
    pub fn respond(mut self, outcome: PromptOutcome) -> Result<(), StoreError> {
        match self.completion.take() {
            Some(completion) => completion(Some(outcome)),
            None => Ok(()),
        }
    }

    /// Closes the prompt without an answer.
    pub fn dismiss(self) {
        drop(self);
    }
}

impl Drop for PromptResponder {
    fn drop(&mut self) {
        if let Some(completion) = self.completion.take() {
            // Dismissal never touches the store.
            let _ = completion(None);
        }
    }
}

impl fmt::Debug for PromptResponder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PromptResponder")
            .field("answered", &self.completion.is_none())
            .finish()
    }
}

/// Displays the "would you like to rate us?" prompt.
///
/// Display may be deferred; the presenter answers through the responder whenever the user
/// chooses, or drops it if the prompt can no longer be shown.
pub trait RequestToRatePromptPresenter: Send + Sync {
    fn show(&self, details: &PromptDetails, responder: PromptResponder);
}

/// Starts the platform's native store review flow. Fire-and-forget.
pub trait RatePromptPresenter: Send + Sync {
    fn show(&self);
}

/// Presenter for hosts with nobody to ask; every prompt is dismissed immediately.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnattendedPromptPresenter;

impl RequestToRatePromptPresenter for UnattendedPromptPresenter {
    fn show(&self, _details: &PromptDetails, responder: PromptResponder) {
        debug!("no request-to-rate presenter configured, dismissing prompt");
        responder.dismiss();
    }
}

/// Native flow stand-in that only logs the request.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingRatePresenter;

impl RatePromptPresenter for LoggingRatePresenter {
    fn show(&self) {
        info!("native store rating flow requested");
    }
}

/// Parks the responder until an out-of-band answer arrives, e.g. from an HTTP client.
///
/// A parked responder only holds a weak link to the service, so dropping the service while a
/// prompt is pending releases it. Answering afterwards returns [`StoreError::Unavailable`].
#[derive(Debug, Default)]
pub struct PendingPromptPresenter {
    pending: Mutex<Option<(PromptDetails, PromptResponder)>>,
}

impl PendingPromptPresenter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending_details(&self) -> Option<PromptDetails> {
        self.pending
            .lock()
            .expect("pending prompt mutex poisoned")
            .as_ref()
            .map(|(details, _)| details.clone())
    }

    pub fn is_pending(&self) -> bool {
        self.pending
            .lock()
            .expect("pending prompt mutex poisoned")
            .is_some()
    }

    /// Takes the parked responder, leaving the slot empty.
    pub fn take(&self) -> Option<PromptResponder> {
        self.pending
            .lock()
            .expect("pending prompt mutex poisoned")
            .take()
            .map(|(_, responder)| responder)
    }
}

impl RequestToRatePromptPresenter for PendingPromptPresenter {
    fn show(&self, details: &PromptDetails, responder: PromptResponder) {
        let mut guard = self.pending.lock().expect("pending prompt mutex poisoned");
        // A stale responder is dismissed when replaced.
        *guard = Some((details.clone(), responder));
        info!(app_name = ?details.app_name, "request-to-rate prompt awaiting response");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn tracking_responder() -> (PromptResponder, Arc<Mutex<Vec<Option<PromptOutcome>>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let responder = PromptResponder::new(move |outcome| {
            sink.lock().expect("sink mutex").push(outcome);
            Ok(())
        });
        (responder, seen)
    }

    #[test]
    fn respond_fires_exactly_once() {
        let (responder, seen) = tracking_responder();
        responder.respond(PromptOutcome::Decline).expect("recorded");
        assert_eq!(*seen.lock().unwrap(), vec![Some(PromptOutcome::Decline)]);
    }

    #[test]
    fn dropping_counts_as_dismissal() {
        let (responder, seen) = tracking_responder();
        drop(responder);
        assert_eq!(*seen.lock().unwrap(), vec![None]);
    }

    #[test]
    fn pending_presenter_hands_back_the_responder() {
        let presenter = PendingPromptPresenter::new();
        let (responder, seen) = tracking_responder();
        let details = PromptDetails {
            app_name: Some("Notes".to_string()),
            can_opt_in_for_reminder: false,
        };

        presenter.show(&details, responder);
        assert!(presenter.is_pending());
        assert_eq!(presenter.pending_details(), Some(details));

        let parked = presenter.take().expect("responder parked");
        assert!(!presenter.is_pending());
        parked.respond(PromptOutcome::RemindLater).expect("recorded");
        assert_eq!(*seen.lock().unwrap(), vec![Some(PromptOutcome::RemindLater)]);
    }

    #[test]
    fn outcome_serializes_in_snake_case() {
        let json = serde_json::to_string(&PromptOutcome::AgreeToRate).expect("serializes");
        assert_eq!(json, "\"agree_to_rate\"");
    }
}
