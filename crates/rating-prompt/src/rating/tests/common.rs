use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;

use crate::rating::clock::FixedClock;
use crate::rating::presenter::{
    PromptDetails, PromptOutcome, PromptResponder, RatePromptPresenter,
    RequestToRatePromptPresenter,
};
use crate::rating::record::UsageRecord;
use crate::rating::service::{RatingService, RatingServiceBuilder};
use crate::rating::store::{InMemoryRecordStore, RecordStore, StoreError};
use crate::rating::version::AppVersionProvider;

pub(super) const APP_VERSION: &str = "1.0.0";

pub(super) fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 6, 9, 0, 0).unwrap()
}

/// Keeps every responder it is handed so tests can answer later.
#[derive(Default)]
pub(super) struct RecordingPresenter {
    shown: Mutex<Vec<PromptDetails>>,
    parked: Mutex<Vec<PromptResponder>>,
}

impl RecordingPresenter {
    pub(super) fn shown_count(&self) -> usize {
        self.shown.lock().unwrap().len()
    }

    pub(super) fn last_details(&self) -> Option<PromptDetails> {
        self.shown.lock().unwrap().last().cloned()
    }

    pub(super) fn answer(&self, outcome: PromptOutcome) -> Result<(), StoreError> {
        let responder = self
            .parked
            .lock()
            .unwrap()
            .pop()
            .expect("a prompt is parked");
        responder.respond(outcome)
    }

    pub(super) fn dismiss(&self) {
        let responder = self
            .parked
            .lock()
            .unwrap()
            .pop()
            .expect("a prompt is parked");
        responder.dismiss();
    }
}

impl RequestToRatePromptPresenter for RecordingPresenter {
    fn show(&self, details: &PromptDetails, responder: PromptResponder) {
        self.shown.lock().unwrap().push(details.clone());
        self.parked.lock().unwrap().push(responder);
    }
}

#[derive(Default)]
pub(super) struct CountingRatePresenter {
    shown: AtomicUsize,
}

impl CountingRatePresenter {
    pub(super) fn count(&self) -> usize {
        self.shown.load(Ordering::SeqCst)
    }
}

impl RatePromptPresenter for CountingRatePresenter {
    fn show(&self) {
        self.shown.fetch_add(1, Ordering::SeqCst);
    }
}

pub(super) struct SwitchableVersion {
    version: Mutex<String>,
}

impl SwitchableVersion {
    pub(super) fn set(&self, version: &str) {
        *self.version.lock().unwrap() = version.to_string();
    }
}

impl Default for SwitchableVersion {
    fn default() -> Self {
        Self {
            version: Mutex::new(APP_VERSION.to_string()),
        }
    }
}

impl AppVersionProvider for SwitchableVersion {
    fn app_version(&self) -> String {
        self.version.lock().unwrap().clone()
    }
}

/// In-memory store whose writes can be switched off.
#[derive(Default)]
pub(super) struct FlakyStore {
    inner: InMemoryRecordStore,
    failing: AtomicBool,
}

impl FlakyStore {
    pub(super) fn fail_writes(&self) {
        self.failing.store(true, Ordering::SeqCst);
    }

    pub(super) fn snapshot(&self) -> UsageRecord {
        self.inner.snapshot()
    }
}

impl RecordStore for FlakyStore {
    fn load(&self) -> Result<UsageRecord, StoreError> {
        self.inner.load()
    }

    fn update(
        &self,
        mutate: &mut dyn FnMut(&mut UsageRecord),
    ) -> Result<UsageRecord, StoreError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("writes disabled".to_string()));
        }
        self.inner.update(mutate)
    }
}

pub(super) struct UnavailableStore;

impl RecordStore for UnavailableStore {
    fn load(&self) -> Result<UsageRecord, StoreError> {
        Err(StoreError::Unavailable("store offline".to_string()))
    }

    fn update(
        &self,
        _mutate: &mut dyn FnMut(&mut UsageRecord),
    ) -> Result<UsageRecord, StoreError> {
        Err(StoreError::Unavailable("store offline".to_string()))
    }
}

/// Shared collaborators for a service under test.
pub(super) struct Fixtures {
    pub(super) store: Arc<InMemoryRecordStore>,
    pub(super) clock: Arc<FixedClock>,
    pub(super) versions: Arc<SwitchableVersion>,
    pub(super) presenter: Arc<RecordingPresenter>,
    pub(super) native: Arc<CountingRatePresenter>,
}

impl Fixtures {
    pub(super) fn new() -> Self {
        Self {
            store: Arc::new(InMemoryRecordStore::default()),
            clock: Arc::new(FixedClock::new(start())),
            versions: Arc::new(SwitchableVersion::default()),
            presenter: Arc::new(RecordingPresenter::default()),
            native: Arc::new(CountingRatePresenter::default()),
        }
    }

    pub(super) fn builder(&self) -> RatingServiceBuilder<InMemoryRecordStore> {
        self.builder_for(self.store.clone())
    }

    pub(super) fn builder_for<S>(&self, store: Arc<S>) -> RatingServiceBuilder<S>
    where
        S: RecordStore + ?Sized + 'static,
    {
        RatingService::builder(store)
            .clock(self.clock.clone())
            .app_version_provider(self.versions.clone())
            .request_to_rate_presenter(self.presenter.clone())
            .rate_presenter(self.native.clone())
    }

    /// Service that prompts on every allowed event.
    pub(super) fn unconditional(&self) -> RatingService<InMemoryRecordStore> {
        self.builder().conditions(Vec::new()).build()
    }
}

pub(super) fn counter() -> (Arc<AtomicUsize>, impl Fn() + Send + Sync + 'static) {
    let count = Arc::new(AtomicUsize::new(0));
    let hook_count = count.clone();
    (count, move || {
        hook_count.fetch_add(1, Ordering::SeqCst);
    })
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
