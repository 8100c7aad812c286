//! Shared fixtures for provisioning BDD scenarios.

use std::collections::BTreeMap;

use bytesize::ByteSize;
use oci_volume_provisioner::backend::CreateVolumeDetails;
use oci_volume_provisioner::sizing::MinimumSizePolicy;
use oci_volume_provisioner::test_support::{ScriptedBlockStorage, StaticMetadata};
use oci_volume_provisioner::volume::{PROVISIONER_NAME, VOLUME_ID_ANNOTATION, VolumeSourceSpec};
use oci_volume_provisioner::{
    AccessMode, BlockProvisioner, ClaimOptions, ProvisionerSettings, ReclaimPolicy,
    VolumeDescriptor,
};
use reqwest::StatusCode;
use rstest::fixture;

/// Provisioner wired to the scripted doubles.
pub type ScenarioProvisioner = BlockProvisioner<ScriptedBlockStorage, StaticMetadata>;

/// Scenario state. Holds plain data only; the scripted doubles are built
/// per call from it and their recordings copied back.
#[derive(Clone, Debug)]
pub struct ProvisionContext {
    pub region: String,
    pub settings: ProvisionerSettings,
    pub delete_status: Option<StatusCode>,
    pub claim: Option<ClaimOptions>,
    pub volume: Option<VolumeDescriptor>,
    pub outcome: Option<StepOutcome>,
    pub created: Vec<CreateVolumeDetails>,
    pub deleted: Vec<String>,
}

#[derive(Clone, Debug)]
pub enum StepOutcome {
    Provisioned(VolumeDescriptor),
    Deleted,
    Failure(String),
}

impl ProvisionContext {
    /// Builds a provisioner and the storage double it records into.
    pub fn provisioner(&self) -> (ScenarioProvisioner, ScriptedBlockStorage) {
        let storage = ScriptedBlockStorage::new();
        if let Some(status) = self.delete_status {
            storage.push_delete_status(status);
        }
        let provisioner = BlockProvisioner::new(
            storage.clone(),
            StaticMetadata::region(&self.region),
            self.settings.clone(),
        );
        (provisioner, storage)
    }

    /// Copies the storage double's recordings into the context.
    pub fn record(self, storage: &ScriptedBlockStorage, outcome: StepOutcome) -> Self {
        Self {
            outcome: Some(outcome),
            created: storage.created(),
            deleted: storage.deleted(),
            ..self
        }
    }
}

#[fixture]
pub fn provision_context() -> ProvisionContext {
    ProvisionContext {
        region: String::from("phx"),
        settings: ProvisionerSettings {
            size_policy: MinimumSizePolicy {
                rounding_enabled: false,
                floor: ByteSize::gib(50),
            },
            ..ProvisionerSettings::default()
        },
        delete_status: None,
        claim: None,
        volume: None,
        outcome: None,
        created: Vec::new(),
        deleted: Vec::new(),
    }
}

/// Descriptor for a volume, optionally carrying its identifier annotation.
pub fn descriptor(name: &str, volume_id: Option<&str>) -> VolumeDescriptor {
    let annotations = volume_id
        .map(|id| BTreeMap::from([(VOLUME_ID_ANNOTATION.to_owned(), id.to_owned())]))
        .unwrap_or_default();
    VolumeDescriptor {
        name: name.to_owned(),
        annotations,
        labels: BTreeMap::new(),
        capacity: ByteSize::gib(50),
        access_modes: vec![AccessMode::ReadWriteOnce],
        reclaim_policy: ReclaimPolicy::Delete,
        source: VolumeSourceSpec {
            driver: PROVISIONER_NAME.to_owned(),
            fs_type: String::from("ext4"),
        },
    }
}
