//! Claim and descriptor types exchanged with the orchestrator.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use bytesize::ByteSize;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::backend::BackendFuture;

/// Name the orchestrator uses for this provisioner and its volume driver.
pub const PROVISIONER_NAME: &str = "oracle.com/oci";

/// Descriptor annotation holding the provider volume identifier.
pub const VOLUME_ID_ANNOTATION: &str = "ociVolumeID";

/// Claim annotation holding additional tags for the volume.
pub const TAGS_ANNOTATION: &str = "oraclecloud.com/additional-tags";

/// Claim annotation holding a backup identifier to restore from.
pub const BACKUP_SOURCE_ANNOTATION: &str = "volume.beta.kubernetes.io/oci-volume-source";

/// Storage-class parameter overriding the filesystem type.
pub const FS_TYPE_PARAMETER: &str = "fsType";

/// Filesystem used when the storage class does not choose one.
pub const DEFAULT_FS_TYPE: &str = "ext4";

/// Descriptor label carrying the region.
pub const LABEL_ZONE_REGION: &str = "failure-domain.beta.kubernetes.io/region";

/// Descriptor label carrying the availability domain.
pub const LABEL_ZONE_FAILURE_DOMAIN: &str = "failure-domain.beta.kubernetes.io/zone";

/// Access modes a claim may request.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum AccessMode {
    /// Mounted read-write by a single node.
    ReadWriteOnce,
    /// Mounted read-only by many nodes.
    ReadOnlyMany,
    /// Mounted read-write by many nodes.
    ReadWriteMany,
}

impl AccessMode {
    /// Canonical orchestrator spelling of the mode.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ReadWriteOnce => "ReadWriteOnce",
            Self::ReadOnlyMany => "ReadOnlyMany",
            Self::ReadWriteMany => "ReadWriteMany",
        }
    }
}

impl fmt::Display for AccessMode {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl FromStr for AccessMode {
    type Err = UnknownValueError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "ReadWriteOnce" => Ok(Self::ReadWriteOnce),
            "ReadOnlyMany" => Ok(Self::ReadOnlyMany),
            "ReadWriteMany" => Ok(Self::ReadWriteMany),
            other => Err(UnknownValueError {
                kind: "access mode",
                value: other.to_owned(),
            }),
        }
    }
}

/// What happens to the volume when its claim is released.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub enum ReclaimPolicy {
    /// Destroy the cloud volume.
    #[default]
    Delete,
    /// Keep the cloud volume for manual recovery.
    Retain,
}

impl FromStr for ReclaimPolicy {
    type Err = UnknownValueError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "Delete" => Ok(Self::Delete),
            "Retain" => Ok(Self::Retain),
            other => Err(UnknownValueError {
                kind: "reclaim policy",
                value: other.to_owned(),
            }),
        }
    }
}

/// Raised when a string does not name a known access mode or reclaim policy.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
#[error("unknown {kind}: {value}")]
pub struct UnknownValueError {
    /// Kind of value being parsed.
    pub kind: &'static str,
    /// The rejected input.
    pub value: String,
}

/// Availability domain chosen by the orchestrator for a claim.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AvailabilityDomain {
    /// Provider identifier, when known.
    pub id: Option<String>,
    /// Provider name, for example `PHX-AD-1`.
    pub name: String,
}

impl AvailabilityDomain {
    /// Creates an availability domain from its name.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
        }
    }
}

/// Claim-derived inputs for a single provision call.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ClaimOptions {
    /// Claim name, used for the volume display name.
    pub claim_name: String,
    /// Requested storage capacity, if the claim declares one.
    pub capacity: Option<ByteSize>,
    /// Requested access modes.
    pub access_modes: Vec<AccessMode>,
    /// Claim annotations.
    pub annotations: BTreeMap<String, String>,
    /// Storage-class parameters.
    pub parameters: BTreeMap<String, String>,
    /// Reclaim policy copied onto the descriptor.
    pub reclaim_policy: ReclaimPolicy,
}

impl ClaimOptions {
    /// Starts options for the named claim requesting `capacity`.
    #[must_use]
    pub fn new(claim_name: impl Into<String>, capacity: ByteSize) -> Self {
        Self {
            claim_name: claim_name.into(),
            capacity: Some(capacity),
            access_modes: vec![AccessMode::ReadWriteOnce],
            ..Self::default()
        }
    }

    /// Adds a claim annotation.
    #[must_use]
    pub fn annotation(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.annotations.insert(key.into(), value.into());
        self
    }

    /// Adds a storage-class parameter.
    #[must_use]
    pub fn parameter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.insert(key.into(), value.into());
        self
    }

    /// Replaces the requested access modes.
    #[must_use]
    pub fn access_modes(mut self, modes: impl IntoIterator<Item = AccessMode>) -> Self {
        self.access_modes = modes.into_iter().collect();
        self
    }

    /// Per-claim tag specification, or an empty string.
    #[must_use]
    pub fn tag_spec(&self) -> &str {
        self.annotations
            .get(TAGS_ANNOTATION)
            .map_or("", String::as_str)
    }

    /// Backup to restore the volume from, if requested.
    #[must_use]
    pub fn backup_source(&self) -> Option<&str> {
        self.annotations
            .get(BACKUP_SOURCE_ANNOTATION)
            .map(String::as_str)
    }

    /// Filesystem type for the volume, defaulting to [`DEFAULT_FS_TYPE`].
    #[must_use]
    pub fn fs_type(&self) -> &str {
        self.parameters
            .get(FS_TYPE_PARAMETER)
            .map_or(DEFAULT_FS_TYPE, String::as_str)
    }
}

/// Driver-specific source block of a descriptor.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumeSourceSpec {
    /// Volume driver that attaches the volume.
    pub driver: String,
    /// Filesystem the driver formats the device with.
    pub fs_type: String,
}

/// Descriptor returned by provision and handed back to delete.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumeDescriptor {
    /// Descriptor name; the provider volume identifier.
    pub name: String,
    /// Annotations; [`VOLUME_ID_ANNOTATION`] links back to the cloud volume.
    pub annotations: BTreeMap<String, String>,
    /// Region and availability-domain labels.
    pub labels: BTreeMap<String, String>,
    /// Capacity reported to the orchestrator.
    #[serde(with = "crate::bytesize_serde")]
    pub capacity: ByteSize,
    /// Access modes copied from the claim.
    pub access_modes: Vec<AccessMode>,
    /// Reclaim policy copied from the claim.
    pub reclaim_policy: ReclaimPolicy,
    /// Driver and filesystem details.
    pub source: VolumeSourceSpec,
}

impl VolumeDescriptor {
    /// Provider volume identifier recorded on the descriptor.
    #[must_use]
    pub fn volume_id(&self) -> Option<&str> {
        self.annotations
            .get(VOLUME_ID_ANNOTATION)
            .map(String::as_str)
    }
}

/// Capability interface the orchestrator drives for a provisioner kind.
pub trait ProvisionerPlugin {
    /// Error type returned by the plugin.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Creates a volume for the claim in the given availability domain.
    fn provision<'a>(
        &'a self,
        options: &'a ClaimOptions,
        availability_domain: &'a AvailabilityDomain,
    ) -> BackendFuture<'a, VolumeDescriptor, Self::Error>;

    /// Destroys the volume behind a descriptor returned by provision.
    fn delete<'a>(&'a self, volume: &'a VolumeDescriptor) -> BackendFuture<'a, (), Self::Error>;
}
