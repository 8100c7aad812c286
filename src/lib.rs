//! Dynamic provisioner for provider block volumes.
//!
//! The crate turns persistent volume claims into cloud block volumes and
//! destroys them again when the claim is released. It owns the decision
//! logic (sizing, tag resolution, request assembly, idempotent deletion)
//! and delegates the provider API and instance metadata to collaborators
//! behind [`BlockStorageClient`] and [`MetadataSource`].

pub mod backend;
pub mod block;
mod bytesize_serde;
pub mod config;
pub mod dry_run;
pub mod metadata;
pub mod sizing;
pub mod tags;
pub mod test_support;
pub mod volume;

pub use backend::{
    BackendFuture, BlockStorageClient, CloudError, CreateVolumeDetails, VolumeHandle, VolumeSource,
};
pub use block::{BlockProvisioner, ProvisionerError, SUPPORTED_ACCESS_MODE};
pub use config::{ConfigError, ProvisionerConfig, ProvisionerSettings};
pub use dry_run::DryRunBlockStorage;
pub use metadata::{HttpMetadataClient, InstanceMetadata, MetadataError, MetadataSource};
pub use sizing::{ALLOCATION_UNIT, BillableSize, MinimumSizePolicy, size_in_units};
pub use tags::{TagError, TagSet};
pub use volume::{
    AccessMode, AvailabilityDomain, ClaimOptions, ProvisionerPlugin, ReclaimPolicy,
    VolumeDescriptor,
};
