//! Storage client that plans volumes without contacting the provider.

use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use crate::backend::{
    BackendFuture, BlockStorageClient, CloudError, CreateVolumeDetails, VolumeHandle,
};

/// Identifier prefix given to planned volumes.
pub const DRY_RUN_VOLUME_PREFIX: &str = "ocid1.volume.dryrun.";

/// Records create requests and answers with a synthetic identifier.
#[derive(Debug)]
pub struct DryRunBlockStorage {
    compartment_id: String,
    requests: Mutex<Vec<CreateVolumeDetails>>,
}

impl DryRunBlockStorage {
    /// Creates a dry-run client that reports `compartment_id`.
    #[must_use]
    pub fn new(compartment_id: impl Into<String>) -> Self {
        Self {
            compartment_id: compartment_id.into(),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Takes the create requests recorded so far.
    #[must_use]
    pub fn take_requests(&self) -> Vec<CreateVolumeDetails> {
        std::mem::take(&mut *self.requests.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

impl BlockStorageClient for DryRunBlockStorage {
    fn compartment_id(&self) -> &str {
        &self.compartment_id
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(1)
    }

    fn create_volume<'a>(
        &'a self,
        details: &'a CreateVolumeDetails,
    ) -> BackendFuture<'a, VolumeHandle, CloudError> {
        Box::pin(async move {
            self.requests
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(details.clone());
            Ok(VolumeHandle {
                id: format!("{DRY_RUN_VOLUME_PREFIX}{}", details.display_name),
            })
        })
    }

    fn delete_volume<'a>(&'a self, volume_id: &'a str) -> BackendFuture<'a, (), CloudError> {
        Box::pin(async move {
            tracing::info!("dry run: would delete volume {volume_id}");
            Ok(())
        })
    }
}
