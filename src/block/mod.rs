//! Block volume provisioner.
//!
//! Turns claims into provider block volumes and tears them down again. The
//! provisioner keeps no state between calls; the descriptor it returns is
//! the only link to the cloud volume.

mod error;
mod request;

use std::collections::BTreeMap;

use bytesize::ByteSize;

use crate::backend::{BackendFuture, BlockStorageClient, with_deadline};
use crate::config::ProvisionerSettings;
use crate::metadata::MetadataSource;
use crate::sizing::BillableSize;
use crate::tags::TagSet;
use crate::volume::{
    AccessMode, AvailabilityDomain, ClaimOptions, LABEL_ZONE_FAILURE_DOMAIN, LABEL_ZONE_REGION,
    PROVISIONER_NAME, ProvisionerPlugin, VOLUME_ID_ANNOTATION, VolumeDescriptor,
    VolumeSourceSpec,
};
use request::VolumePlan;

pub use error::ProvisionerError;

/// The only access mode block volumes support.
pub const SUPPORTED_ACCESS_MODE: AccessMode = AccessMode::ReadWriteOnce;

/// Provisioner for provider block volumes.
#[derive(Clone, Debug)]
pub struct BlockProvisioner<C, M> {
    client: C,
    metadata: M,
    settings: ProvisionerSettings,
}

impl<C, M> BlockProvisioner<C, M>
where
    C: BlockStorageClient,
    M: MetadataSource,
{
    /// Creates a provisioner from its collaborators and frozen settings.
    #[must_use]
    pub const fn new(client: C, metadata: M, settings: ProvisionerSettings) -> Self {
        Self {
            client,
            metadata,
            settings,
        }
    }

    /// Storage client the provisioner calls.
    #[must_use]
    pub const fn client(&self) -> &C {
        &self.client
    }

    /// Settings the provisioner was built with.
    #[must_use]
    pub const fn settings(&self) -> &ProvisionerSettings {
        &self.settings
    }

    fn validate_claim(options: &ClaimOptions) -> Result<ByteSize, ProvisionerError> {
        if let Some(mode) = options
            .access_modes
            .iter()
            .copied()
            .find(|mode| *mode != SUPPORTED_ACCESS_MODE)
        {
            return Err(ProvisionerError::UnsupportedAccessMode {
                mode,
                supported: SUPPORTED_ACCESS_MODE,
            });
        }

        match options.capacity {
            None => Err(ProvisionerError::MissingCapacity {
                claim: options.claim_name.clone(),
            }),
            Some(capacity) if capacity.as_u64() == 0 => Err(ProvisionerError::InvalidCapacity {
                claim: options.claim_name.clone(),
            }),
            Some(capacity) => Ok(capacity),
        }
    }

    async fn resolve_region(&self) -> Result<String, ProvisionerError> {
        if let Some(region) = self.settings.region_override.as_ref() {
            return Ok(region.clone());
        }
        let metadata = self.metadata.get().await?;
        Ok(metadata.region)
    }

    async fn provision_volume(
        &self,
        options: &ClaimOptions,
        availability_domain: &AvailabilityDomain,
    ) -> Result<VolumeDescriptor, ProvisionerError> {
        let requested = Self::validate_claim(options)?;

        let size = self.settings.size_policy.apply(requested);
        tracing::info!("volume size: {}MB", size.units);

        let tags = TagSet::resolve(&self.settings.default_tags, options.tag_spec())?;

        let compartment_id = self.client.compartment_id();
        tracing::info!(
            "creating volume size={} AD={} compartmentOCID={compartment_id:?}",
            size.units,
            availability_domain.name
        );
        let details = VolumePlan {
            options,
            availability_domain,
            compartment_id,
            size,
            tags,
        }
        .into_details(&self.settings);

        let volume = with_deadline(
            "create volume",
            self.client.timeout(),
            self.client.create_volume(&details),
        )
        .await?;

        let region = match self.resolve_region().await {
            Ok(region) => region,
            Err(err) => {
                tracing::warn!(
                    volume_id = %volume.id,
                    "volume created but its region could not be resolved; the volume is orphaned and needs manual cleanup: {err}"
                );
                return Err(err);
            }
        };

        Ok(Self::describe(
            options,
            availability_domain,
            &volume.id,
            region,
            size,
        ))
    }

    fn describe(
        options: &ClaimOptions,
        availability_domain: &AvailabilityDomain,
        volume_id: &str,
        region: String,
        size: BillableSize,
    ) -> VolumeDescriptor {
        VolumeDescriptor {
            name: volume_id.to_owned(),
            annotations: BTreeMap::from([(VOLUME_ID_ANNOTATION.to_owned(), volume_id.to_owned())]),
            labels: BTreeMap::from([
                (LABEL_ZONE_REGION.to_owned(), region),
                (
                    LABEL_ZONE_FAILURE_DOMAIN.to_owned(),
                    availability_domain.name.clone(),
                ),
            ]),
            capacity: size.capacity,
            access_modes: options.access_modes.clone(),
            reclaim_policy: options.reclaim_policy,
            source: VolumeSourceSpec {
                driver: PROVISIONER_NAME.to_owned(),
                fs_type: options.fs_type().to_owned(),
            },
        }
    }

    async fn delete_volume(&self, volume: &VolumeDescriptor) -> Result<(), ProvisionerError> {
        let volume_id = volume
            .volume_id()
            .ok_or_else(|| ProvisionerError::MissingVolumeId {
                volume: volume.name.clone(),
            })?;
        tracing::info!("deleting volume {} with volumeId {volume_id}", volume.name);

        let result = with_deadline(
            "delete volume",
            self.client.timeout(),
            self.client.delete_volume(volume_id),
        )
        .await;

        match result {
            Ok(()) => Ok(()),
            // Deleted out of band or by an earlier attempt. An authorisation
            // failure reported as 404 looks the same and is also accepted.
            Err(err) if err.is_not_found() => {
                tracing::info!("volume {volume_id} already gone: {err}");
                Ok(())
            }
            Err(err) => Err(err.into()),
        }
    }
}

impl<C, M> ProvisionerPlugin for BlockProvisioner<C, M>
where
    C: BlockStorageClient,
    M: MetadataSource,
{
    type Error = ProvisionerError;

    fn provision<'a>(
        &'a self,
        options: &'a ClaimOptions,
        availability_domain: &'a AvailabilityDomain,
    ) -> BackendFuture<'a, VolumeDescriptor, Self::Error> {
        Box::pin(self.provision_volume(options, availability_domain))
    }

    fn delete<'a>(&'a self, volume: &'a VolumeDescriptor) -> BackendFuture<'a, (), Self::Error> {
        Box::pin(self.delete_volume(volume))
    }
}
