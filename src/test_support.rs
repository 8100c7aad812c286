//! Test support utilities shared across unit and integration tests.

use std::collections::VecDeque;
use std::env;
use std::ffi::OsString;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use reqwest::StatusCode;
use tokio::sync::{Mutex as AsyncMutex, MutexGuard as AsyncMutexGuard};

use crate::backend::{
    BackendFuture, BlockStorageClient, CloudError, CreateVolumeDetails, VolumeHandle,
};
use crate::metadata::{InstanceMetadata, MetadataError, MetadataSource};

/// Volume identifier returned when no create outcome was scripted.
pub const DEFAULT_VOLUME_ID: &str = "ocid1.volume.oc1.phx.scripted";

/// Compartment reported by [`ScriptedBlockStorage::new`].
pub const DEFAULT_COMPARTMENT_ID: &str = "ocid1.compartment.oc1..scripted";

#[derive(Debug, Default)]
struct ScriptState {
    create_outcomes: VecDeque<Result<VolumeHandle, CloudError>>,
    delete_outcomes: VecDeque<Result<(), CloudError>>,
    created: Vec<CreateVolumeDetails>,
    deleted: Vec<String>,
}

/// Block storage client that returns pre-seeded outcomes in FIFO order.
///
/// Unscripted creates succeed with [`DEFAULT_VOLUME_ID`]; unscripted
/// deletes succeed. Every call is recorded.
#[derive(Clone, Debug)]
pub struct ScriptedBlockStorage {
    compartment_id: String,
    timeout: Duration,
    latency: Option<Duration>,
    state: Arc<Mutex<ScriptState>>,
}

impl Default for ScriptedBlockStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedBlockStorage {
    /// Creates a client with no scripted outcomes.
    #[must_use]
    pub fn new() -> Self {
        Self {
            compartment_id: DEFAULT_COMPARTMENT_ID.to_owned(),
            timeout: Duration::from_secs(5),
            latency: None,
            state: Arc::new(Mutex::new(ScriptState::default())),
        }
    }

    /// Overrides the per-call deadline reported to the provisioner.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Delays every call by `latency` before answering.
    #[must_use]
    pub const fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    fn lock(&self) -> MutexGuard<'_, ScriptState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queues a successful create returning `volume_id`.
    pub fn push_created(&self, volume_id: &str) {
        self.lock().create_outcomes.push_back(Ok(VolumeHandle {
            id: volume_id.to_owned(),
        }));
    }

    /// Queues a failing create.
    pub fn push_create_error(&self, error: CloudError) {
        self.lock().create_outcomes.push_back(Err(error));
    }

    /// Queues a successful delete.
    pub fn push_deleted(&self) {
        self.lock().delete_outcomes.push_back(Ok(()));
    }

    /// Queues a failing delete.
    pub fn push_delete_error(&self, error: CloudError) {
        self.lock().delete_outcomes.push_back(Err(error));
    }

    /// Queues a delete answered with `status`.
    pub fn push_delete_status(&self, status: StatusCode) {
        self.push_delete_error(CloudError::Api {
            status,
            message: status.canonical_reason().unwrap_or("error").to_owned(),
        });
    }

    /// Create requests received so far.
    #[must_use]
    pub fn created(&self) -> Vec<CreateVolumeDetails> {
        self.lock().created.clone()
    }

    /// Volume identifiers passed to delete so far.
    #[must_use]
    pub fn deleted(&self) -> Vec<String> {
        self.lock().deleted.clone()
    }

    async fn pause(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }
}

impl BlockStorageClient for ScriptedBlockStorage {
    fn compartment_id(&self) -> &str {
        &self.compartment_id
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }

    fn create_volume<'a>(
        &'a self,
        details: &'a CreateVolumeDetails,
    ) -> BackendFuture<'a, VolumeHandle, CloudError> {
        Box::pin(async move {
            self.pause().await;
            let mut state = self.lock();
            state.created.push(details.clone());
            state.create_outcomes.pop_front().unwrap_or_else(|| {
                Ok(VolumeHandle {
                    id: DEFAULT_VOLUME_ID.to_owned(),
                })
            })
        })
    }

    fn delete_volume<'a>(&'a self, volume_id: &'a str) -> BackendFuture<'a, (), CloudError> {
        Box::pin(async move {
            self.pause().await;
            let mut state = self.lock();
            state.deleted.push(volume_id.to_owned());
            state.delete_outcomes.pop_front().unwrap_or(Ok(()))
        })
    }
}

/// Metadata source returning a fixed answer and counting lookups.
#[derive(Clone, Debug)]
pub struct StaticMetadata {
    outcome: Result<InstanceMetadata, MetadataError>,
    calls: Arc<Mutex<u32>>,
}

impl StaticMetadata {
    /// Metadata reporting the given short region.
    #[must_use]
    pub fn region(region: &str) -> Self {
        Self {
            outcome: Ok(InstanceMetadata {
                compartment_id: DEFAULT_COMPARTMENT_ID.to_owned(),
                region: region.to_owned(),
                canonical_region_name: String::new(),
            }),
            calls: Arc::new(Mutex::new(0)),
        }
    }

    /// Metadata whose every lookup fails.
    #[must_use]
    pub fn unavailable() -> Self {
        Self {
            outcome: Err(MetadataError::Status {
                url: String::from("http://169.254.169.254/opc/v1/instance/"),
                status: 503,
            }),
            calls: Arc::new(Mutex::new(0)),
        }
    }

    /// Number of lookups performed.
    #[must_use]
    pub fn calls(&self) -> u32 {
        *self.calls.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl MetadataSource for StaticMetadata {
    fn get(&self) -> BackendFuture<'_, InstanceMetadata, MetadataError> {
        Box::pin(async move {
            *self.calls.lock().unwrap_or_else(PoisonError::into_inner) += 1;
            self.outcome.clone()
        })
    }
}

/// Serialises environment mutation across tests in one binary.
pub static ENV_LOCK: AsyncMutex<()> = AsyncMutex::const_new(());

/// Guard that holds [`ENV_LOCK`] and restores variables on drop.
pub struct EnvGuard {
    previous: Vec<(String, Option<OsString>)>,
    _guard: AsyncMutexGuard<'static, ()>,
}

impl EnvGuard {
    /// Sets (`Some`) or removes (`None`) environment variables while holding
    /// the global lock.
    pub async fn set_vars(pairs: &[(&str, Option<&str>)]) -> Self {
        let guard = ENV_LOCK.lock().await;
        let mut previous = Vec::with_capacity(pairs.len());
        for (key, value) in pairs {
            previous.push(((*key).to_owned(), env::var_os(key)));
            // SAFETY: Environment mutation is serialised by `ENV_LOCK`.
            unsafe {
                match value {
                    Some(val) => env::set_var(key, val),
                    None => env::remove_var(key),
                }
            }
        }

        Self {
            previous,
            _guard: guard,
        }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for (key, old) in self.previous.iter().rev() {
            // SAFETY: Environment mutation is serialised by holding `_guard`.
            unsafe {
                match old {
                    Some(val) => env::set_var(key, val),
                    None => env::remove_var(key),
                }
            }
        }
    }
}
