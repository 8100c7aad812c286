//! Command-line interface definitions for the `oci-volume-provisioner`
//! binary.
//!
//! This module centralises the clap parser structures so both the main binary
//! and the build script can reuse them when generating the manual page.

use clap::Parser;

/// Top-level CLI for the `oci-volume-provisioner` binary.
#[derive(Debug, Parser)]
#[command(
    name = "oci-volume-provisioner",
    about = "Plan block volumes for persistent volume claims",
    arg_required_else_help = true
)]
pub(crate) enum Cli {
    /// Show the create request and descriptor a claim would produce.
    #[command(
        name = "plan",
        about = "Show the create request and descriptor a claim would produce"
    )]
    Plan(PlanCommand),
    /// Resolve claim tags against the configured defaults.
    #[command(
        name = "tags",
        about = "Resolve claim tags against the configured defaults"
    )]
    Tags(TagsCommand),
}

/// Arguments for the `plan` subcommand.
#[derive(Debug, Parser)]
pub(crate) struct PlanCommand {
    /// Name of the claim; used for the volume display name.
    #[arg(long, value_name = "NAME")]
    pub(crate) claim_name: String,
    /// Requested capacity as a quantity such as `1Gi` or `500Mi`.
    #[arg(long, value_name = "QUANTITY")]
    pub(crate) capacity: String,
    /// Availability domain to place the volume in.
    #[arg(long, value_name = "AD")]
    pub(crate) availability_domain: String,
    /// Requested access mode; repeat for several.
    #[arg(long, value_name = "MODE", default_value = "ReadWriteOnce")]
    pub(crate) access_mode: Vec<String>,
    /// Per-claim tag specification, as the tags annotation would carry it.
    #[arg(long, value_name = "SPEC")]
    pub(crate) tags: Option<String>,
    /// Volume backup to restore from.
    #[arg(long, value_name = "OCID")]
    pub(crate) backup_id: Option<String>,
    /// Filesystem type parameter.
    #[arg(long, value_name = "FS")]
    pub(crate) fs_type: Option<String>,
    /// Reclaim policy recorded on the descriptor.
    #[arg(long, value_name = "POLICY", default_value = "Delete")]
    pub(crate) reclaim_policy: String,
}

/// Arguments for the `tags` subcommand.
#[derive(Debug, Parser)]
pub(crate) struct TagsCommand {
    /// Per-claim tag specification.
    #[arg(default_value = "")]
    pub(crate) spec: String,
}
