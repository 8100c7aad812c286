//! Builds create-volume payloads from claims.

use crate::backend::{CreateVolumeDetails, VolumeSource};
use crate::config::ProvisionerSettings;
use crate::sizing::BillableSize;
use crate::tags::TagSet;
use crate::volume::{AvailabilityDomain, ClaimOptions};

pub(super) struct VolumePlan<'a> {
    pub(super) options: &'a ClaimOptions,
    pub(super) availability_domain: &'a AvailabilityDomain,
    pub(super) compartment_id: &'a str,
    pub(super) size: BillableSize,
    pub(super) tags: TagSet,
}

impl VolumePlan<'_> {
    pub(super) fn into_details(self, settings: &ProvisionerSettings) -> CreateVolumeDetails {
        let source_details = self.options.backup_source().map(|id| {
            tracing::info!("creating volume from backup ID {id}");
            VolumeSource::VolumeBackup { id: id.to_owned() }
        });

        CreateVolumeDetails {
            availability_domain: self.availability_domain.name.clone(),
            compartment_id: self.compartment_id.to_owned(),
            display_name: settings.display_name(&self.options.claim_name),
            size_in_mbs: self.size.units,
            defined_tags: self.tags.defined,
            freeform_tags: self.tags.freeform,
            source_details,
        }
    }
}
