//! Optional process-wide access to one rating service.
//!
//! Hosts that can pass the service around explicitly should do so; this exists for
//! integrations (lifecycle callbacks, plugin entry points) that have no other way in.

use std::sync::{Arc, OnceLock};

use tracing::warn;

use super::service::RatingService;
use super::store::RecordStore;

/// Rating service over a type-erased store, the shape kept in the global handle.
pub type SharedRatingService = RatingService<dyn RecordStore>;

static HANDLE: OnceLock<Arc<SharedRatingService>> = OnceLock::new();

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum HandleError {
    #[error("the rating service handle can only be installed once")]
    AlreadyInitialized,
    #[error("the rating service handle has not been installed yet")]
    NotInitialized,
}

/// Installs the process-wide service. Fails if one is already installed.
pub fn install(service: Arc<SharedRatingService>) -> Result<Arc<SharedRatingService>, HandleError> {
    install_into(&HANDLE, service)
}

/// The installed service.
pub fn instance() -> Result<Arc<SharedRatingService>, HandleError> {
    instance_from(&HANDLE)
}

fn install_into(
    cell: &OnceLock<Arc<SharedRatingService>>,
    service: Arc<SharedRatingService>,
) -> Result<Arc<SharedRatingService>, HandleError> {
    cell.set(service).map_err(|_| {
        warn!("rating service handle installed twice, keeping the first instance");
        HandleError::AlreadyInitialized
    })?;
    instance_from(cell)
}

fn instance_from(
    cell: &OnceLock<Arc<SharedRatingService>>,
) -> Result<Arc<SharedRatingService>, HandleError> {
    cell.get().cloned().ok_or(HandleError::NotInitialized)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rating::store::InMemoryRecordStore;

    fn service() -> Arc<SharedRatingService> {
        let store: Arc<dyn RecordStore> = Arc::new(InMemoryRecordStore::default());
        Arc::new(RatingService::builder(store).build())
    }

    #[test]
    fn second_install_is_rejected() {
        let cell = OnceLock::new();
        assert_eq!(
            instance_from(&cell).err(),
            Some(HandleError::NotInitialized)
        );

        let first = install_into(&cell, service()).expect("first install succeeds");
        assert_eq!(
            install_into(&cell, service()).err(),
            Some(HandleError::AlreadyInitialized)
        );

        let current = instance_from(&cell).expect("installed");
        assert!(Arc::ptr_eq(&first, &current));
    }
}
