//! Binary entry point for the `oci-volume-provisioner` operator CLI.

use std::fmt;
use std::io::{self, Write};
use std::process;
use std::str::FromStr;

use bytesize::ByteSize;
use clap::Parser;
use serde_json::json;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

use oci_volume_provisioner::volume::{
    BACKUP_SOURCE_ANNOTATION, FS_TYPE_PARAMETER, TAGS_ANNOTATION,
};
use oci_volume_provisioner::{
    AccessMode, AvailabilityDomain, BlockProvisioner, ClaimOptions, ConfigError,
    DryRunBlockStorage, HttpMetadataClient, MetadataError, MetadataSource, ProvisionerConfig,
    ProvisionerError, ProvisionerPlugin, ReclaimPolicy, TagError, TagSet,
};

mod cli;

use cli::{Cli, PlanCommand, TagsCommand};

#[derive(Debug, Error)]
enum CliError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("invalid argument {flag}: {message}")]
    Argument { flag: &'static str, message: String },
    #[error("instance metadata unavailable: {0}")]
    Metadata(#[from] MetadataError),
    #[error("provisioning failed: {0}")]
    Provision(#[from] ProvisionerError),
    #[error(transparent)]
    Tags(#[from] TagError),
    #[error("failed to render output: {0}")]
    Render(#[from] serde_json::Error),
    #[error("failed to write output: {0}")]
    Io(#[from] io::Error),
}

#[tokio::main]
async fn main() {
    init_logging();
    let cli = Cli::parse();
    let exit_code = match dispatch(cli).await {
        Ok(()) => 0,
        Err(err) => {
            report_error(&err);
            1
        }
    };

    process::exit(exit_code);
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

async fn dispatch(cli: Cli) -> Result<(), CliError> {
    let config = ProvisionerConfig::load_without_cli_args()?;
    match cli {
        Cli::Plan(command) => plan(&config, command).await,
        Cli::Tags(command) => resolve_tags(&config, &command),
    }
}

async fn plan(config: &ProvisionerConfig, args: PlanCommand) -> Result<(), CliError> {
    let settings = config.settings()?;
    let availability_domain = AvailabilityDomain::named(args.availability_domain.clone());
    let options = claim_options(args)?;

    let metadata =
        HttpMetadataClient::new(&config.metadata_endpoint, ProvisionerConfig::METADATA_TIMEOUT)?;
    let compartment_id = match config.compartment_id() {
        Some(id) => id,
        None => metadata.get().await?.compartment_id,
    };

    let provisioner =
        BlockProvisioner::new(DryRunBlockStorage::new(compartment_id), metadata, settings);
    let descriptor = provisioner
        .provision(&options, &availability_domain)
        .await?;
    let requests = provisioner.client().take_requests();

    let rendered = serde_json::to_string_pretty(&json!({
        "request": requests.first(),
        "volume": descriptor,
    }))?;
    writeln!(io::stdout(), "{rendered}")?;
    Ok(())
}

fn resolve_tags(config: &ProvisionerConfig, args: &TagsCommand) -> Result<(), CliError> {
    let defaults = config.default_tags.as_deref().unwrap_or_default();
    let tags = TagSet::resolve(defaults, &args.spec)?;
    let rendered = serde_json::to_string_pretty(&json!({
        "definedTags": tags.defined,
        "freeformTags": tags.freeform,
    }))?;
    writeln!(io::stdout(), "{rendered}")?;
    Ok(())
}

fn parse_argument<T>(flag: &'static str, raw: &str) -> Result<T, CliError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    raw.trim().parse::<T>().map_err(|err| CliError::Argument {
        flag,
        message: err.to_string(),
    })
}

fn claim_options(args: PlanCommand) -> Result<ClaimOptions, CliError> {
    let requested: ByteSize = parse_argument("--capacity", &args.capacity)?;
    let modes = args
        .access_mode
        .iter()
        .map(|mode| parse_argument::<AccessMode>("--access-mode", mode))
        .collect::<Result<Vec<_>, _>>()?;

    let mut options = ClaimOptions::new(args.claim_name, requested).access_modes(modes);
    options.reclaim_policy =
        parse_argument::<ReclaimPolicy>("--reclaim-policy", &args.reclaim_policy)?;
    for (key, value) in [
        (TAGS_ANNOTATION, args.tags),
        (BACKUP_SOURCE_ANNOTATION, args.backup_id),
    ] {
        if let Some(text) = value {
            options = options.annotation(key, text);
        }
    }
    if let Some(fs_type) = args.fs_type {
        options = options.parameter(FS_TYPE_PARAMETER, fs_type);
    }
    Ok(options)
}

fn report_error(err: &CliError) {
    write_error(io::stderr(), err);
}

fn write_error(mut target: impl Write, err: &CliError) {
    writeln!(target, "{err}").ok();
}
