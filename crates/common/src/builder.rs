//! Instance builder
//!
//! One entry point, three input modes:
//!
//! * [`BuildMode::Fixed`] takes everything from the configured [`FixedProfile`].
//! * [`BuildMode::Interactive`] asks through a [`Prompter`], falling back to
//!   defaults on empty answers.
//! * [`BuildMode::Json`] reads a configuration file, strips unsupported fields
//!   and maps the rest onto the spec.
//!
//! Any bad input aborts the build before a spec exists.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::config::{FixedProfile, ProviderConfig};
use crate::sanitize::{sanitize, SanitizeWarning};
use crate::types::{
    AccessConfig, AttachedDisk, DiskKind, InitializeParams, InstanceSpec, InstanceSpecBuilder,
    NetworkInterface, ServiceAccount, Target,
};
use crate::{Error, Result};

/// Where instance parameters come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildMode {
    Fixed,
    Interactive,
    Json(PathBuf),
}

/// Source of free-text answers for interactive mode.
///
/// Implementations return the raw answer; an empty string means "use the
/// default", which is shown to the user but applied by the builder.
pub trait Prompter {
    fn ask(&mut self, question: &str, default: &str) -> Result<String>;
}

/// A built spec together with where it should be created
#[derive(Debug, Clone)]
pub struct Provisioning {
    pub target: Target,
    pub spec: InstanceSpec,
    /// Fields dropped from a JSON configuration
    pub removed: Vec<SanitizeWarning>,
}

/// Produces [`InstanceSpec`]s from any [`BuildMode`]
pub struct InstanceBuilder<'a> {
    config: &'a ProviderConfig,
    now: DateTime<Utc>,
}

impl<'a> InstanceBuilder<'a> {
    pub fn new(config: &'a ProviderConfig) -> Self {
        Self {
            config,
            now: Utc::now(),
        }
    }

    /// Pin the clock used for generated instance names
    pub fn at(mut self, now: DateTime<Utc>) -> Self {
        self.now = now;
        self
    }

    /// Name used when none is configured or entered, e.g. `instance-20250121-225909`
    pub fn default_name(&self) -> String {
        format!("instance-{}", self.now.format("%Y%m%d-%H%M%S"))
    }

    pub fn build(&self, mode: &BuildMode, prompter: &mut dyn Prompter) -> Result<Provisioning> {
        match mode {
            BuildMode::Fixed => self.fixed(),
            BuildMode::Interactive => self.interactive(prompter),
            BuildMode::Json(path) => self.from_file(path),
        }
    }

    /// Fixed-constant mode
    pub fn fixed(&self) -> Result<Provisioning> {
        let target = self.config.target()?;
        let profile = &self.config.fixed;
        let name = profile
            .name
            .clone()
            .unwrap_or_else(|| self.default_name());

        let spec = self
            .base(&name, &target.machine_type_ref(&profile.machine_type), profile)
            .with_tags(profile.tags.iter().cloned())
            .build()?;

        Ok(Provisioning {
            target,
            spec,
            removed: Vec::new(),
        })
    }

    /// Interactive mode
    pub fn interactive(&self, prompter: &mut dyn Prompter) -> Result<Provisioning> {
        let profile = &self.config.fixed;
        let default_project = self.config.project.clone().unwrap_or_default();

        let project = answer_or(prompter.ask("Project ID", &default_project)?, &default_project);
        if project.is_empty() {
            return Err(Error::config("a project ID is required"));
        }
        let zone = answer_or(prompter.ask("Zone", &self.config.zone)?, &self.config.zone);
        let default_name = profile.name.clone().unwrap_or_else(|| self.default_name());
        let name = answer_or(prompter.ask("Instance name", &default_name)?, &default_name);
        let machine_type = answer_or(
            prompter.ask("Machine type", &profile.machine_type)?,
            &profile.machine_type,
        );
        let extra_disk = prompter.ask("Additional disk size in GB (blank for none)", "")?;
        let extra_disk = parse_size(&extra_disk)?;

        let target = Target::new(project, zone);
        let mut builder = self.base(&name, &target.machine_type_ref(&machine_type), profile);
        if let Some(size_gb) = extra_disk {
            builder = builder.with_disk(AttachedDisk::blank(size_gb));
        }

        Ok(Provisioning {
            target,
            spec: builder.build()?,
            removed: Vec::new(),
        })
    }

    /// JSON-file mode
    pub fn from_file(&self, path: &Path) -> Result<Provisioning> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!("cannot read {}: {}", path.display(), e))
        })?;
        let provisioning = self.from_json(&content)?;
        info!(path = %path.display(), instance = %provisioning.spec.name(), "Loaded instance configuration");
        Ok(provisioning)
    }

    /// JSON mode from an in-memory document
    pub fn from_json(&self, content: &str) -> Result<Provisioning> {
        let value: Value = serde_json::from_str(content)
            .map_err(|e| Error::config(format!("malformed instance configuration: {}", e)))?;
        let Value::Object(raw) = value else {
            return Err(Error::config("instance configuration must be a JSON object"));
        };

        let (filtered, removed) = sanitize(&raw);
        for warning in &removed {
            warn!("{}", warning);
        }
        for key in filtered.keys().filter(|k| !RECOGNIZED_KEYS.contains(&k.as_str())) {
            debug!(key = %key, "Ignoring unrecognized configuration key");
        }

        let raw: RawInstance = serde_json::from_value(Value::Object(filtered))
            .map_err(|e| Error::config(format!("invalid instance configuration: {}", e)))?;

        let target = self.config.target()?;
        let mut builder = InstanceSpec::builder(raw.name, target.machine_type_ref(&raw.machine_type))
            .with_disks(raw.disks.into_iter().map(RawDisk::into_disk))
            .with_network_interfaces(raw.network_interfaces.into_iter().map(RawNic::into_nic));
        if let Some(description) = raw.description {
            builder = builder.with_description(description);
        }
        if let Some(can_ip_forward) = raw.can_ip_forward {
            builder = builder.with_can_ip_forward(can_ip_forward);
        }

        Ok(Provisioning {
            target,
            spec: builder.build()?,
            removed,
        })
    }

    /// Boot disk, default network and service account shared by fixed and
    /// interactive modes
    fn base(
        &self,
        name: &str,
        machine_type: &str,
        profile: &FixedProfile,
    ) -> InstanceSpecBuilder {
        let mut builder = InstanceSpec::builder(name, machine_type)
            .with_disk(AttachedDisk::boot_from_image(
                profile.source_image(),
                profile.disk_size_gb,
            ))
            .with_network_interface(NetworkInterface::default_with_nat());
        if let Some(grant) = &self.config.service_account {
            builder = builder.with_service_account(ServiceAccount::from(grant));
        }
        builder
    }
}

fn answer_or(answer: String, default: &str) -> String {
    let trimmed = answer.trim();
    if trimmed.is_empty() {
        default.to_string()
    } else {
        trimmed.to_string()
    }
}

fn parse_size(answer: &str) -> Result<Option<u64>> {
    let trimmed = answer.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    trimmed
        .parse::<u64>()
        .map(Some)
        .map_err(|_| Error::config(format!("disk size must be a whole number of GB, got '{}'", trimmed)))
}

const RECOGNIZED_KEYS: &[&str] = &[
    "name",
    "machineType",
    "disks",
    "networkInterfaces",
    "canIpForward",
    "description",
];

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawInstance {
    name: String,
    machine_type: String,
    #[serde(default)]
    disks: Vec<RawDisk>,
    #[serde(default)]
    network_interfaces: Vec<RawNic>,
    can_ip_forward: Option<bool>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawDisk {
    #[serde(rename = "type", default)]
    kind: DiskKind,
    #[serde(default)]
    boot: bool,
    #[serde(default)]
    auto_delete: bool,
    device_name: Option<String>,
    #[serde(with = "crate::types::size_gb", default)]
    disk_size_gb: Option<u64>,
    source: Option<String>,
    source_image: Option<String>,
    disk_type: Option<String>,
}

impl RawDisk {
    fn into_disk(self) -> AttachedDisk {
        // An existing disk is attached as-is; initialize params would be rejected.
        let initialize_params = match self.source {
            Some(_) => None,
            None => Some(InitializeParams {
                source_image: self.source_image,
                disk_size_gb: self.disk_size_gb,
                disk_type: self.disk_type,
            }),
        };
        AttachedDisk {
            kind: self.kind,
            boot: self.boot,
            auto_delete: self.auto_delete,
            device_name: self.device_name,
            source: self.source,
            initialize_params,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawNic {
    name: Option<String>,
    network: String,
    subnetwork: Option<String>,
    #[serde(default)]
    access_configs: Vec<AccessConfig>,
}

impl RawNic {
    fn into_nic(self) -> NetworkInterface {
        NetworkInterface {
            name: self.name,
            network: self.network,
            subnetwork: self.subnetwork,
            access_configs: self.access_configs,
        }
    }
}
