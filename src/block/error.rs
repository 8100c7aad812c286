//! Error types for the block volume provisioner.

use thiserror::Error;

use crate::backend::CloudError;
use crate::metadata::MetadataError;
use crate::tags::TagError;
use crate::volume::AccessMode;

/// Errors raised while provisioning or deleting block volumes.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum ProvisionerError {
    /// Raised when the claim asks for an access mode block volumes lack.
    #[error("invalid access mode {mode} specified. Only {supported} is supported")]
    UnsupportedAccessMode {
        /// Mode requested by the claim.
        mode: AccessMode,
        /// The single supported mode.
        supported: AccessMode,
    },
    /// Raised when the claim declares no storage request.
    #[error("could not determine volume size for claim {claim}")]
    MissingCapacity {
        /// Claim name.
        claim: String,
    },
    /// Raised when the claim requests zero bytes.
    #[error("claim {claim} requested an empty volume")]
    InvalidCapacity {
        /// Claim name.
        claim: String,
    },
    /// Raised when the default or claim tags are malformed.
    #[error(transparent)]
    Tags(#[from] TagError),
    /// Provider failure, passed through unchanged.
    #[error(transparent)]
    Cloud(#[from] CloudError),
    /// Raised when no region override exists and metadata lookup fails.
    #[error("failed to resolve region: {0}")]
    Region(#[source] MetadataError),
    /// Raised when a descriptor lacks the volume identifier annotation.
    #[error("ociVolumeID annotation not found on volume {volume}")]
    MissingVolumeId {
        /// Descriptor name.
        volume: String,
    },
}

impl From<MetadataError> for ProvisionerError {
    fn from(value: MetadataError) -> Self {
        Self::Region(value)
    }
}
