//! BDD scenarios for the block volume provisioner.

use rstest_bdd_macros::scenario;

use super::test_helpers::{ProvisionContext, provision_context};

#[scenario(
    path = "tests/features/provision.feature",
    name = "Provision a volume for a claim"
)]
fn scenario_provision_volume(provision_context: ProvisionContext) {
    drop(provision_context);
}

#[scenario(
    path = "tests/features/provision.feature",
    name = "Round small claims up to the minimum size"
)]
fn scenario_round_up(provision_context: ProvisionContext) {
    drop(provision_context);
}

#[scenario(
    path = "tests/features/provision.feature",
    name = "Reject claims for shared access"
)]
fn scenario_reject_shared_access(provision_context: ProvisionContext) {
    drop(provision_context);
}

#[scenario(
    path = "tests/features/provision.feature",
    name = "Claim tags override default tags"
)]
fn scenario_tag_override(provision_context: ProvisionContext) {
    drop(provision_context);
}

#[scenario(
    path = "tests/features/provision.feature",
    name = "Delete a volume that is already gone"
)]
fn scenario_delete_gone(provision_context: ProvisionContext) {
    drop(provision_context);
}

#[scenario(
    path = "tests/features/provision.feature",
    name = "Refuse to delete a volume without an identifier"
)]
fn scenario_delete_without_id(provision_context: ProvisionContext) {
    drop(provision_context);
}
