//! Block storage client abstraction consumed by the provisioner.
//!
//! The provisioner never talks to the provider directly. It builds a
//! [`CreateVolumeDetails`] payload and hands it to a [`BlockStorageClient`],
//! which owns authentication, transport, and any retry policy.

use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use reqwest::StatusCode;
use serde::Serialize;
use thiserror::Error;

/// Future returned by collaborator operations.
pub type BackendFuture<'a, T, E> = Pin<Box<dyn Future<Output = Result<T, E>> + Send + 'a>>;

/// Defined tags keyed by namespace, then by tag key.
pub type DefinedTags = BTreeMap<String, BTreeMap<String, String>>;

/// Free-form tags keyed by tag key.
pub type FreeformTags = BTreeMap<String, String>;

/// Where the contents of a new volume come from.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum VolumeSource {
    /// Restore the volume from an existing volume backup.
    VolumeBackup {
        /// Backup identifier.
        id: String,
    },
}

/// Payload for a create-volume call.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateVolumeDetails {
    /// Availability domain name the volume is placed in.
    pub availability_domain: String,
    /// Compartment that owns the volume.
    pub compartment_id: String,
    /// Human readable name shown by the provider console.
    pub display_name: String,
    /// Billable size in MiB allocation units.
    #[serde(rename = "sizeInMBs")]
    pub size_in_mbs: u64,
    /// Namespaced tags.
    pub defined_tags: DefinedTags,
    /// Unnamespaced tags.
    pub freeform_tags: FreeformTags,
    /// Optional content source; `None` creates an empty volume.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_details: Option<VolumeSource>,
}

/// Handle returned once the provider has accepted a create-volume call.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct VolumeHandle {
    /// Provider assigned volume identifier.
    pub id: String,
}

/// Errors surfaced by block storage clients.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum CloudError {
    /// The provider answered with a non-success status.
    #[error("provider returned {status}: {message}")]
    Api {
        /// HTTP status code of the response.
        status: StatusCode,
        /// Error body or message returned by the provider.
        message: String,
    },
    /// The request never produced a provider response.
    #[error("transport error: {message}")]
    Transport {
        /// Description of the transport failure.
        message: String,
    },
    /// The call exceeded the client's deadline and was cancelled.
    #[error("{operation} timed out after {timeout:?}")]
    Timeout {
        /// Operation that was cancelled.
        operation: String,
        /// Deadline that elapsed.
        timeout: Duration,
    },
}

impl CloudError {
    /// Returns `true` when the provider reported the resource as missing.
    ///
    /// Only an explicit 404 counts. An authorisation failure the provider
    /// disguises as something else is indistinguishable and stays an error.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Api { status, .. } if *status == StatusCode::NOT_FOUND)
    }
}

/// Operations the provisioner needs from the provider's block storage API.
pub trait BlockStorageClient: Send + Sync {
    /// Compartment that new volumes are created in.
    fn compartment_id(&self) -> &str;

    /// Deadline applied to each outbound call.
    fn timeout(&self) -> Duration;

    /// Creates a volume and returns its identifier.
    fn create_volume<'a>(
        &'a self,
        details: &'a CreateVolumeDetails,
    ) -> BackendFuture<'a, VolumeHandle, CloudError>;

    /// Deletes the volume with the given identifier.
    fn delete_volume<'a>(&'a self, volume_id: &'a str) -> BackendFuture<'a, (), CloudError>;
}

/// Runs a client call under the client's deadline.
///
/// # Errors
///
/// Returns [`CloudError::Timeout`] when the deadline elapses first, and the
/// call's own error otherwise.
pub async fn with_deadline<T>(
    operation: &str,
    timeout: Duration,
    call: BackendFuture<'_, T, CloudError>,
) -> Result<T, CloudError> {
    tokio::time::timeout(timeout, call)
        .await
        .map_err(|_| CloudError::Timeout {
            operation: operation.to_owned(),
            timeout,
        })?
}
