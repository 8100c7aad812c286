//! Instance metadata lookup used to resolve the region label.

use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::backend::BackendFuture;

const INSTANCE_PATH: &str = "/opc/v1/instance/";

/// Subset of the instance metadata document the provisioner uses.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InstanceMetadata {
    /// Compartment the current instance runs in.
    #[serde(default)]
    pub compartment_id: String,
    /// Short region key, for example `phx`.
    pub region: String,
    /// Canonical region name, for example `us-phoenix-1`.
    #[serde(default)]
    pub canonical_region_name: String,
}

/// Errors raised by metadata lookups.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum MetadataError {
    /// The HTTP client could not be configured.
    #[error("failed to build metadata client: {message}")]
    Client {
        /// Builder error message.
        message: String,
    },
    /// The metadata service could not be reached.
    #[error("metadata request to {url} failed: {message}")]
    Request {
        /// URL that was requested.
        url: String,
        /// Transport error message.
        message: String,
    },
    /// The metadata service answered with a non-success status.
    #[error("metadata service at {url} returned {status}")]
    Status {
        /// URL that was requested.
        url: String,
        /// HTTP status code returned.
        status: u16,
    },
    /// The response body was not a metadata document.
    #[error("failed to decode instance metadata: {message}")]
    Decode {
        /// Decoder error message.
        message: String,
    },
}

/// Source of metadata about the instance the provisioner runs on.
pub trait MetadataSource: Send + Sync {
    /// Fetches the current instance metadata.
    fn get(&self) -> BackendFuture<'_, InstanceMetadata, MetadataError>;
}

/// Metadata source backed by the provider's link-local HTTP endpoint.
#[derive(Clone, Debug)]
pub struct HttpMetadataClient {
    client: reqwest::Client,
    url: String,
}

impl HttpMetadataClient {
    /// Creates a client for the metadata service at `endpoint`.
    ///
    /// # Errors
    ///
    /// Returns [`MetadataError::Client`] when the HTTP client cannot be
    /// built.
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, MetadataError> {
        Self::with_builder(endpoint, reqwest::Client::builder().timeout(timeout))
    }

    fn with_builder(
        endpoint: &str,
        builder: reqwest::ClientBuilder,
    ) -> Result<Self, MetadataError> {
        let client = builder.build().map_err(|err| MetadataError::Client {
            message: err.to_string(),
        })?;
        Ok(Self {
            client,
            url: format!("{}{INSTANCE_PATH}", endpoint.trim_end_matches('/')),
        })
    }

    /// URL the client fetches metadata from.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    async fn fetch(&self) -> Result<InstanceMetadata, MetadataError> {
        let request_error = |err: reqwest::Error| MetadataError::Request {
            url: self.url.clone(),
            message: err.to_string(),
        };
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(request_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(MetadataError::Status {
                url: self.url.clone(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(request_error)?;
        decode(&body)
    }
}

impl MetadataSource for HttpMetadataClient {
    fn get(&self) -> BackendFuture<'_, InstanceMetadata, MetadataError> {
        Box::pin(self.fetch())
    }
}

fn decode(body: &[u8]) -> Result<InstanceMetadata, MetadataError> {
    serde_json::from_slice(body).map_err(|err| MetadataError::Decode {
        message: err.to_string(),
    })
}
