//! Configuration loading via `ortho-config`.

use std::ffi::OsString;
use std::time::Duration;

use bytesize::ByteSize;
use ortho_config::OrthoConfig;
use serde::Deserialize;
use thiserror::Error;

use crate::sizing::MinimumSizePolicy;
use crate::tags::TagSet;

/// Process-wide provisioner configuration derived from environment
/// variables and configuration files.
#[derive(Clone, Debug, Deserialize, OrthoConfig, PartialEq, Eq)]
#[ortho_config(prefix = "OCI")]
pub struct ProvisionerConfig {
    /// Tags applied to every volume, in `(<namespace>.)<key>=<value>` form.
    pub default_tags: Option<String>,
    /// Prefix prepended to every volume display name.
    pub volume_name_prefix: Option<String>,
    /// Region label override. When unset the region comes from instance
    /// metadata.
    pub short_region: Option<String>,
    /// Whether claims smaller than `min_volume_size` are enlarged. Unset
    /// means enabled.
    pub volume_rounding_enabled: Option<bool>,
    /// Smallest volume the provider accepts, as a quantity such as `50Gi`.
    #[ortho_config(default = "50Gi".to_owned())]
    pub min_volume_size: String,
    /// Compartment used when planning volumes without a live client.
    pub compartment_id: Option<String>,
    /// Base URL of the instance metadata service.
    #[ortho_config(default = "http://169.254.169.254".to_owned())]
    pub metadata_endpoint: String,
}

/// Immutable settings handed to the provisioner at construction.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ProvisionerSettings {
    /// Default tag specification merged under every claim's tags.
    pub default_tags: String,
    /// Display-name prefix; `None` when unset or blank.
    pub volume_name_prefix: Option<String>,
    /// Region override; `None` when unset or blank.
    pub region_override: Option<String>,
    /// Minimum-size rounding policy.
    pub size_policy: MinimumSizePolicy,
}

impl Default for ProvisionerSettings {
    fn default() -> Self {
        Self {
            default_tags: String::new(),
            volume_name_prefix: None,
            region_override: None,
            size_policy: MinimumSizePolicy {
                rounding_enabled: true,
                floor: ByteSize::gib(50),
            },
        }
    }
}

impl ProvisionerSettings {
    /// Separator placed between the display-name prefix and the claim name.
    pub const NAME_SEPARATOR: &'static str = "-";

    /// Builds the display name for a claim's volume.
    ///
    /// A prefix that does not already end in [`Self::NAME_SEPARATOR`] gets
    /// one appended.
    #[must_use]
    pub fn display_name(&self, claim_name: &str) -> String {
        match self.volume_name_prefix.as_deref() {
            Some(prefix) if prefix.ends_with(Self::NAME_SEPARATOR) => {
                format!("{prefix}{claim_name}")
            }
            Some(prefix) => format!("{prefix}{}{claim_name}", Self::NAME_SEPARATOR),
            None => claim_name.to_owned(),
        }
    }
}

fn non_blank(value: Option<&String>) -> Option<String> {
    value
        .map(|raw| raw.trim())
        .filter(|trimmed| !trimmed.is_empty())
        .map(str::to_owned)
}

impl ProvisionerConfig {
    /// Timeout applied to instance metadata lookups.
    pub const METADATA_TIMEOUT: Duration = Duration::from_secs(10);

    /// Loads configuration without attempting to parse CLI arguments. Values
    /// merge defaults, configuration files, and environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when the merge fails.
    pub fn load_without_cli_args() -> Result<Self, ConfigError> {
        Self::load_from_iter([OsString::from("oci-volume-provisioner")])
            .map_err(|err| ConfigError::Parse(err.to_string()))
    }

    /// Parses the configured minimum volume size.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidField`] when the quantity cannot be
    /// parsed.
    pub fn min_volume_size(&self) -> Result<ByteSize, ConfigError> {
        self.min_volume_size
            .trim()
            .parse::<ByteSize>()
            .map_err(|err| ConfigError::InvalidField {
                env_var: "OCI_MIN_VOLUME_SIZE",
                message: err,
            })
    }

    /// Performs semantic validation so misconfiguration surfaces at startup
    /// rather than on the first claim.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidField`] when the default tags or the
    /// minimum volume size are malformed.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(tags) = self.default_tags.as_deref() {
            TagSet::parse(tags).map_err(|err| ConfigError::InvalidField {
                env_var: "OCI_DEFAULT_TAGS",
                message: err.to_string(),
            })?;
        }
        self.min_volume_size()?;
        Ok(())
    }

    /// Validates the configuration and freezes it into provisioner settings.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when validation fails.
    pub fn settings(&self) -> Result<ProvisionerSettings, ConfigError> {
        self.validate()?;
        Ok(ProvisionerSettings {
            default_tags: self.default_tags.clone().unwrap_or_default(),
            volume_name_prefix: non_blank(self.volume_name_prefix.as_ref()),
            region_override: non_blank(self.short_region.as_ref()),
            size_policy: MinimumSizePolicy {
                rounding_enabled: self.rounding_enabled(),
                floor: self.min_volume_size()?,
            },
        })
    }

    /// Whether minimum-size rounding applies; enabled unless configured off.
    #[must_use]
    pub fn rounding_enabled(&self) -> bool {
        self.volume_rounding_enabled.unwrap_or(true)
    }

    /// Compartment configured for planning, if any.
    #[must_use]
    pub fn compartment_id(&self) -> Option<String> {
        non_blank(self.compartment_id.as_ref())
    }

}

/// Errors raised during configuration loading and validation.
#[derive(Debug, Error, Eq, PartialEq)]
pub enum ConfigError {
    /// Indicates a configuration value is present but unusable.
    #[error("invalid {env_var}: {message}")]
    InvalidField {
        /// Environment variable that supplies the field.
        env_var: &'static str,
        /// Why the value was rejected.
        message: String,
    },
    /// Surfaces errors from the `ortho-config` loader.
    #[error("configuration parsing failed: {0}")]
    Parse(String),
}

impl From<ortho_config::OrthoError> for ConfigError {
    fn from(value: ortho_config::OrthoError) -> Self {
        Self::Parse(value.to_string())
    }
}
