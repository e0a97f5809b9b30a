use std::sync::Arc;

use rating_prompt::rating::handle::{self, HandleError, SharedRatingService};
use rating_prompt::rating::{InMemoryRecordStore, RatingService, RecordStore};

fn shared_service() -> Arc<SharedRatingService> {
    let store: Arc<dyn RecordStore> = Arc::new(InMemoryRecordStore::default());
    Arc::new(RatingService::builder(store).build())
}

#[test]
fn handle_is_installed_once_per_process() {
    assert_eq!(handle::instance().err(), Some(HandleError::NotInitialized));

    let installed = handle::install(shared_service()).expect("first install");
    assert_eq!(
        handle::install(shared_service()).err(),
        Some(HandleError::AlreadyInitialized)
    );

    let current = handle::instance().expect("installed");
    assert!(Arc::ptr_eq(&installed, &current));

    current.track_significant_event(false).expect("tracked");
    let record = installed.record().expect("record");
    assert_eq!(record.significant_event_count, 1);
}
