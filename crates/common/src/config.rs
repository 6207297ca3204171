//! Provider configuration
//!
//! Everything an action needs to reach the provider lives in
//! [`ProviderConfig`], which is loaded once and passed explicitly.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::types::{ServiceAccount, Target};
use crate::{Error, Result};

/// Zone used when nothing else is configured or entered
pub const DEFAULT_ZONE: &str = "europe-west2-a";

/// Machine type used when nothing else is configured or entered
pub const DEFAULT_MACHINE_TYPE: &str = "n2d-standard-2";

/// Compute REST endpoint
pub const DEFAULT_API_ENDPOINT: &str = "https://compute.googleapis.com/compute/v1";

/// Default operation wait budget, in seconds
pub const DEFAULT_OPERATION_TIMEOUT_SECS: u64 = 300;

/// Scopes granted to the instance's service account by default
pub const DEFAULT_SCOPES: &[&str] = &[
    "https://www.googleapis.com/auth/devstorage.read_only",
    "https://www.googleapis.com/auth/logging.write",
    "https://www.googleapis.com/auth/monitoring.write",
    "https://www.googleapis.com/auth/service.management.readonly",
    "https://www.googleapis.com/auth/servicecontrol",
    "https://www.googleapis.com/auth/trace.append",
];

/// Provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Project ID
    pub project: Option<String>,

    /// Zone for all zonal calls
    pub zone: String,

    /// Service-account key file used to obtain access tokens
    pub credentials: Option<PathBuf>,

    /// Compute REST endpoint
    pub api_endpoint: String,

    /// Upper bound on waiting for a single operation
    pub operation_timeout_secs: u64,

    /// Pause between operation polls
    pub poll_interval_secs: u64,

    /// Service account attached to created instances
    pub service_account: Option<ServiceAccountGrant>,

    /// Values used by fixed-constant mode
    pub fixed: FixedProfile,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            project: None,
            zone: DEFAULT_ZONE.to_string(),
            credentials: None,
            api_endpoint: DEFAULT_API_ENDPOINT.to_string(),
            operation_timeout_secs: DEFAULT_OPERATION_TIMEOUT_SECS,
            poll_interval_secs: 2,
            service_account: None,
            fixed: FixedProfile::default(),
        }
    }
}

impl ProviderConfig {
    /// Load configuration from file, falling back to defaults when absent
    pub fn load(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Self = toml::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Project and zone, failing when no project has been configured
    pub fn target(&self) -> Result<Target> {
        let project = self
            .project
            .as_deref()
            .filter(|p| !p.trim().is_empty())
            .ok_or_else(|| {
                Error::config("no project configured; pass --project or set VMPROV_PROJECT")
            })?;
        Ok(Target::new(project, self.zone.clone()))
    }

    pub fn operation_timeout(&self) -> Duration {
        Duration::from_secs(self.operation_timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

/// Service account granted to created instances.
///
/// The email has no default and must come from configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceAccountGrant {
    pub email: String,
    #[serde(default = "default_scopes")]
    pub scopes: Vec<String>,
}

fn default_scopes() -> Vec<String> {
    DEFAULT_SCOPES.iter().map(|s| s.to_string()).collect()
}

impl From<&ServiceAccountGrant> for ServiceAccount {
    fn from(grant: &ServiceAccountGrant) -> Self {
        ServiceAccount {
            email: grant.email.clone(),
            scopes: grant.scopes.clone(),
        }
    }
}

/// Values for fixed-constant mode
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FixedProfile {
    /// Instance name; generated from the clock when unset
    pub name: Option<String>,
    pub machine_type: String,
    pub image_project: String,
    pub image_family: String,
    pub disk_size_gb: u64,
    pub tags: Vec<String>,
}

impl Default for FixedProfile {
    fn default() -> Self {
        Self {
            name: None,
            machine_type: DEFAULT_MACHINE_TYPE.to_string(),
            image_project: "ubuntu-os-cloud".to_string(),
            image_family: "ubuntu-2404-lts".to_string(),
            disk_size_gb: 100,
            tags: vec!["cloud-systems".to_string()],
        }
    }
}

impl FixedProfile {
    pub fn source_image(&self) -> String {
        format!(
            "projects/{}/global/images/family/{}",
            self.image_project, self.image_family
        )
    }
}
