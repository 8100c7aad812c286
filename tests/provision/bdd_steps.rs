//! BDD step definitions for provisioning and deletion.

use bytesize::ByteSize;
use oci_volume_provisioner::backend::CreateVolumeDetails;
use oci_volume_provisioner::volume::{LABEL_ZONE_REGION, TAGS_ANNOTATION};
use oci_volume_provisioner::{AccessMode, AvailabilityDomain, ClaimOptions, ProvisionerPlugin};
use reqwest::StatusCode;
use rstest_bdd_macros::{given, then, when};
use tokio::runtime::Runtime;

use super::test_helpers::{ProvisionContext, StepOutcome, descriptor};

#[derive(Debug, thiserror::Error)]
pub enum StepError {
    #[error("invalid step input: {0}")]
    Input(String),
    #[error("assertion failed: {0}")]
    Assertion(String),
}

fn runtime() -> Result<Runtime, StepError> {
    Runtime::new().map_err(|err| StepError::Assertion(err.to_string()))
}

fn with_claim(
    provision_context: &ProvisionContext,
    update: impl FnOnce(ClaimOptions) -> ClaimOptions,
) -> Result<ProvisionContext, StepError> {
    let mut context = provision_context.clone();
    let claim = context
        .claim
        .take()
        .ok_or_else(|| StepError::Input(String::from("no claim was declared")))?;
    context.claim = Some(update(claim));
    Ok(context)
}

#[given("a provisioner in region \"{region}\"")]
fn provisioner_in_region(provision_context: &ProvisionContext, region: String) -> ProvisionContext {
    ProvisionContext {
        region,
        ..provision_context.clone()
    }
}

#[given("rounding enforces a minimum size of \"{floor}\"")]
fn rounding_enforces_floor(
    provision_context: &ProvisionContext,
    floor: String,
) -> Result<ProvisionContext, StepError> {
    let size = floor.parse::<ByteSize>().map_err(StepError::Input)?;
    let mut context = provision_context.clone();
    context.settings.size_policy.rounding_enabled = true;
    context.settings.size_policy.floor = size;
    Ok(context)
}

#[given("default tags \"{tags}\"")]
fn default_tags(provision_context: &ProvisionContext, tags: String) -> ProvisionContext {
    let mut context = provision_context.clone();
    context.settings.default_tags = tags;
    context
}

#[given("a claim \"{name}\" requesting \"{capacity}\"")]
fn claim_requesting(
    provision_context: &ProvisionContext,
    name: String,
    capacity: String,
) -> Result<ProvisionContext, StepError> {
    let size = capacity.parse::<ByteSize>().map_err(StepError::Input)?;
    let mut context = provision_context.clone();
    context.claim = Some(ClaimOptions::new(name, size));
    Ok(context)
}

#[given("the claim requests access mode \"{mode}\"")]
fn claim_access_mode(
    provision_context: &ProvisionContext,
    mode: String,
) -> Result<ProvisionContext, StepError> {
    let parsed = mode
        .parse::<AccessMode>()
        .map_err(|err| StepError::Input(err.to_string()))?;
    with_claim(provision_context, |claim| claim.access_modes([parsed]))
}

#[given("the claim carries tags \"{tags}\"")]
fn claim_tags(
    provision_context: &ProvisionContext,
    tags: String,
) -> Result<ProvisionContext, StepError> {
    with_claim(provision_context, |claim| {
        claim.annotation(TAGS_ANNOTATION, tags)
    })
}

#[given("a provisioned volume \"{volume_id}\"")]
fn provisioned_volume(provision_context: &ProvisionContext, volume_id: String) -> ProvisionContext {
    ProvisionContext {
        volume: Some(descriptor(&volume_id, Some(&volume_id))),
        ..provision_context.clone()
    }
}

#[given("a volume without an identifier annotation")]
fn volume_without_identifier(provision_context: &ProvisionContext) -> ProvisionContext {
    ProvisionContext {
        volume: Some(descriptor("orphan", None)),
        ..provision_context.clone()
    }
}

#[given("the provider reports the volume missing")]
fn provider_reports_missing(provision_context: &ProvisionContext) -> ProvisionContext {
    ProvisionContext {
        delete_status: Some(StatusCode::NOT_FOUND),
        ..provision_context.clone()
    }
}

#[when("I provision the claim")]
fn provision_claim(provision_context: &ProvisionContext) -> Result<ProvisionContext, StepError> {
    let claim = provision_context
        .claim
        .clone()
        .ok_or_else(|| StepError::Input(String::from("no claim was declared")))?;
    let (provisioner, storage) = provision_context.provisioner();
    let availability_domain = AvailabilityDomain::named("PHX-AD-1");
    let result = runtime()?
        .block_on(async { provisioner.provision(&claim, &availability_domain).await });
    let outcome = match result {
        Ok(volume) => StepOutcome::Provisioned(volume),
        Err(err) => StepOutcome::Failure(err.to_string()),
    };
    Ok(provision_context.clone().record(&storage, outcome))
}

#[when("I delete the volume")]
fn delete_volume(provision_context: &ProvisionContext) -> Result<ProvisionContext, StepError> {
    let volume = provision_context
        .volume
        .clone()
        .ok_or_else(|| StepError::Input(String::from("no volume was declared")))?;
    let (provisioner, storage) = provision_context.provisioner();
    let result = runtime()?.block_on(async { provisioner.delete(&volume).await });
    let outcome = match result {
        Ok(()) => StepOutcome::Deleted,
        Err(err) => StepOutcome::Failure(err.to_string()),
    };
    Ok(provision_context.clone().record(&storage, outcome))
}

fn first_request(provision_context: &ProvisionContext) -> Result<&CreateVolumeDetails, StepError> {
    provision_context
        .created
        .first()
        .ok_or_else(|| StepError::Assertion(String::from("no create request recorded")))
}

fn failure_contains(provision_context: &ProvisionContext, fragment: &str) -> Result<(), StepError> {
    match &provision_context.outcome {
        Some(StepOutcome::Failure(message)) if message.contains(fragment) => Ok(()),
        Some(StepOutcome::Failure(message)) => Err(StepError::Assertion(format!(
            "expected error containing {fragment:?}, got {message:?}"
        ))),
        other => Err(StepError::Assertion(format!(
            "expected failure outcome, got {other:?}"
        ))),
    }
}

#[then("provisioning succeeds")]
fn provisioning_succeeds(provision_context: &ProvisionContext) -> Result<(), StepError> {
    match &provision_context.outcome {
        Some(StepOutcome::Provisioned(_)) => Ok(()),
        other => Err(StepError::Assertion(format!(
            "expected a provisioned volume, got {other:?}"
        ))),
    }
}

#[then("provisioning fails with \"{fragment}\"")]
fn provisioning_fails(
    provision_context: &ProvisionContext,
    fragment: String,
) -> Result<(), StepError> {
    failure_contains(provision_context, &fragment)
}

#[then("the create request asks for \"{units}\" MB")]
fn create_request_size(provision_context: &ProvisionContext, units: u64) -> Result<(), StepError> {
    let request = first_request(provision_context)?;
    if request.size_in_mbs == units {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "expected {units} MB, got {}",
            request.size_in_mbs
        )))
    }
}

#[then("the volume is labelled with region \"{region}\"")]
fn volume_region_label(
    provision_context: &ProvisionContext,
    region: String,
) -> Result<(), StepError> {
    let Some(StepOutcome::Provisioned(volume)) = &provision_context.outcome else {
        return Err(StepError::Assertion(String::from("no volume provisioned")));
    };
    match volume.labels.get(LABEL_ZONE_REGION) {
        Some(label) if *label == region => Ok(()),
        other => Err(StepError::Assertion(format!(
            "expected region label {region:?}, got {other:?}"
        ))),
    }
}

#[then("no volume is created")]
fn no_volume_created(provision_context: &ProvisionContext) -> Result<(), StepError> {
    if provision_context.created.is_empty() {
        Ok(())
    } else {
        Err(StepError::Assertion(String::from(
            "provider should not be asked to create a volume",
        )))
    }
}

#[then("the freeform tag \"{key}\" is \"{value}\"")]
fn freeform_tag(
    provision_context: &ProvisionContext,
    key: String,
    value: String,
) -> Result<(), StepError> {
    let request = first_request(provision_context)?;
    match request.freeform_tags.get(&key) {
        Some(actual) if *actual == value => Ok(()),
        other => Err(StepError::Assertion(format!(
            "expected freeform tag {key}={value}, got {other:?}"
        ))),
    }
}

#[then("the defined tag \"{path}\" is \"{value}\"")]
fn defined_tag(
    provision_context: &ProvisionContext,
    path: String,
    value: String,
) -> Result<(), StepError> {
    let (namespace, key) = path
        .split_once('.')
        .ok_or_else(|| StepError::Input(format!("{path} is not namespaced")))?;
    let request = first_request(provision_context)?;
    let actual = request
        .defined_tags
        .get(namespace)
        .and_then(|tags| tags.get(key));
    match actual {
        Some(found) if *found == value => Ok(()),
        other => Err(StepError::Assertion(format!(
            "expected defined tag {path}={value}, got {other:?}"
        ))),
    }
}

#[then("deletion succeeds")]
fn deletion_succeeds(provision_context: &ProvisionContext) -> Result<(), StepError> {
    match &provision_context.outcome {
        Some(StepOutcome::Deleted) => Ok(()),
        other => Err(StepError::Assertion(format!(
            "expected a successful delete, got {other:?}"
        ))),
    }
}

#[then("deletion fails with \"{fragment}\"")]
fn deletion_fails(provision_context: &ProvisionContext, fragment: String) -> Result<(), StepError> {
    failure_contains(provision_context, &fragment)
}

#[then("the provider was asked to delete \"{volume_id}\"")]
fn provider_deleted(
    provision_context: &ProvisionContext,
    volume_id: String,
) -> Result<(), StepError> {
    let deleted = &provision_context.deleted;
    if *deleted == [volume_id.clone()] {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "expected a single delete of {volume_id}, got {deleted:?}"
        )))
    }
}

#[then("the provider was not asked to delete anything")]
fn provider_not_called(provision_context: &ProvisionContext) -> Result<(), StepError> {
    let deleted = &provision_context.deleted;
    if deleted.is_empty() {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "expected no delete calls, got {deleted:?}"
        )))
    }
}
