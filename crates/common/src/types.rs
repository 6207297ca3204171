//! Core types for vmprov
//!
//! These mirror the provider's REST `Instance` resource closely enough that an
//! [`InstanceSpec`] serializes straight into an insert request body.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Project and zone an action is addressed to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    pub project: String,
    pub zone: String,
}

impl Target {
    pub fn new(project: impl Into<String>, zone: impl Into<String>) -> Self {
        Self {
            project: project.into(),
            zone: zone.into(),
        }
    }

    /// Expand a bare machine type name into a zonal reference.
    /// References that already contain a path are returned untouched.
    pub fn machine_type_ref(&self, machine_type: &str) -> String {
        if machine_type.contains('/') {
            machine_type.to_string()
        } else {
            format!("zones/{}/machineTypes/{}", self.zone, machine_type)
        }
    }
}

impl std::fmt::Display for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.project, self.zone)
    }
}

/// Attached disk type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiskKind {
    Persistent,
    Scratch,
}

impl Default for DiskKind {
    fn default() -> Self {
        Self::Persistent
    }
}

/// Parameters for a disk created alongside the instance
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_image: Option<String>,
    #[serde(
        with = "size_gb",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub disk_size_gb: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disk_type: Option<String>,
}

/// Disk attached to an instance
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachedDisk {
    #[serde(rename = "type", default)]
    pub kind: DiskKind,
    #[serde(default)]
    pub boot: bool,
    #[serde(default)]
    pub auto_delete: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initialize_params: Option<InitializeParams>,
}

impl AttachedDisk {
    /// Auto-deleting boot disk initialized from an image
    pub fn boot_from_image(source_image: impl Into<String>, size_gb: u64) -> Self {
        Self {
            kind: DiskKind::Persistent,
            boot: true,
            auto_delete: true,
            device_name: None,
            source: None,
            initialize_params: Some(InitializeParams {
                source_image: Some(source_image.into()),
                disk_size_gb: Some(size_gb),
                disk_type: None,
            }),
        }
    }

    /// Blank, auto-deleting data disk
    pub fn blank(size_gb: u64) -> Self {
        Self {
            kind: DiskKind::Persistent,
            boot: false,
            auto_delete: true,
            device_name: None,
            source: None,
            initialize_params: Some(InitializeParams {
                source_image: None,
                disk_size_gb: Some(size_gb),
                disk_type: None,
            }),
        }
    }

    pub fn size_gb(&self) -> Option<u64> {
        self.initialize_params.as_ref().and_then(|p| p.disk_size_gb)
    }
}

/// External access configuration for a network interface
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessConfig {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
}

impl AccessConfig {
    /// One-to-one NAT giving the instance an ephemeral external address
    pub fn external_nat() -> Self {
        Self {
            name: "External NAT".to_string(),
            kind: "ONE_TO_ONE_NAT".to_string(),
        }
    }
}

/// Network interface attached to an instance
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkInterface {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub network: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subnetwork: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub access_configs: Vec<AccessConfig>,
}

impl NetworkInterface {
    /// Interface on the project's default network with an external address
    pub fn default_with_nat() -> Self {
        Self {
            name: None,
            network: DEFAULT_NETWORK.to_string(),
            subnetwork: None,
            access_configs: vec![AccessConfig::external_nat()],
        }
    }
}

/// Network tags
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tags {
    pub items: Vec<String>,
}

/// Service account grant attached to an instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceAccount {
    pub email: String,
    #[serde(default)]
    pub scopes: Vec<String>,
}

/// The project's default VPC network
pub const DEFAULT_NETWORK: &str = "global/networks/default";

/// Instance creation request.
///
/// Built once per invocation through [`InstanceSpecBuilder`] and never
/// modified afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceSpec {
    name: String,
    machine_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    can_ip_forward: Option<bool>,
    disks: Vec<AttachedDisk>,
    network_interfaces: Vec<NetworkInterface>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tags: Option<Tags>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    service_accounts: Vec<ServiceAccount>,
}

impl InstanceSpec {
    pub fn builder(name: impl Into<String>, machine_type: impl Into<String>) -> InstanceSpecBuilder {
        InstanceSpecBuilder::new(name, machine_type)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn machine_type(&self) -> &str {
        &self.machine_type
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn can_ip_forward(&self) -> Option<bool> {
        self.can_ip_forward
    }

    pub fn disks(&self) -> &[AttachedDisk] {
        &self.disks
    }

    pub fn boot_disk(&self) -> Option<&AttachedDisk> {
        self.disks.iter().find(|d| d.boot)
    }

    pub fn additional_disks(&self) -> impl Iterator<Item = &AttachedDisk> {
        self.disks.iter().filter(|d| !d.boot)
    }

    pub fn network_interfaces(&self) -> &[NetworkInterface] {
        &self.network_interfaces
    }

    pub fn tags(&self) -> &[String] {
        self.tags.as_ref().map(|t| t.items.as_slice()).unwrap_or(&[])
    }

    pub fn service_accounts(&self) -> &[ServiceAccount] {
        &self.service_accounts
    }
}

/// Consuming builder for [`InstanceSpec`]
#[derive(Debug, Clone)]
pub struct InstanceSpecBuilder {
    name: String,
    machine_type: String,
    description: Option<String>,
    can_ip_forward: Option<bool>,
    disks: Vec<AttachedDisk>,
    network_interfaces: Vec<NetworkInterface>,
    tags: Vec<String>,
    service_accounts: Vec<ServiceAccount>,
}

impl InstanceSpecBuilder {
    pub fn new(name: impl Into<String>, machine_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            machine_type: machine_type.into(),
            description: None,
            can_ip_forward: None,
            disks: Vec::new(),
            network_interfaces: Vec::new(),
            tags: Vec::new(),
            service_accounts: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_can_ip_forward(mut self, can_ip_forward: bool) -> Self {
        self.can_ip_forward = Some(can_ip_forward);
        self
    }

    pub fn with_disk(mut self, disk: AttachedDisk) -> Self {
        self.disks.push(disk);
        self
    }

    pub fn with_disks(mut self, disks: impl IntoIterator<Item = AttachedDisk>) -> Self {
        self.disks.extend(disks);
        self
    }

    pub fn with_network_interface(mut self, nic: NetworkInterface) -> Self {
        self.network_interfaces.push(nic);
        self
    }

    pub fn with_network_interfaces(
        mut self,
        nics: impl IntoIterator<Item = NetworkInterface>,
    ) -> Self {
        self.network_interfaces.extend(nics);
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    pub fn with_service_account(mut self, account: ServiceAccount) -> Self {
        self.service_accounts.push(account);
        self
    }

    /// Validate and freeze the spec
    pub fn build(self) -> Result<InstanceSpec> {
        if self.name.trim().is_empty() {
            return Err(Error::config("instance name must not be empty"));
        }
        if self.machine_type.trim().is_empty() {
            return Err(Error::config("machine type must not be empty"));
        }
        if self.disks.iter().filter(|d| d.boot).count() > 1 {
            return Err(Error::config(format!(
                "instance '{}' declares more than one boot disk",
                self.name
            )));
        }

        Ok(InstanceSpec {
            name: self.name,
            machine_type: self.machine_type,
            description: self.description,
            can_ip_forward: self.can_ip_forward,
            disks: self.disks,
            network_interfaces: self.network_interfaces,
            tags: (!self.tags.is_empty()).then(|| Tags { items: self.tags }),
            service_accounts: self.service_accounts,
        })
    }
}

/// Disk as reported by the provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiskDescriptor {
    pub name: String,
    #[serde(with = "size_gb", default)]
    pub size_gb: Option<u64>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(rename = "type", default)]
    pub disk_type: Option<String>,
}

/// The REST API encodes int64 sizes as strings; accept either form on input.
pub(crate) mod size_gb {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &Option<u64>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(v) => serializer.serialize_str(&v.to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(u64),
            Text(String),
        }

        match Option::<Raw>::deserialize(deserializer)? {
            None => Ok(None),
            Some(Raw::Number(n)) => Ok(Some(n)),
            Some(Raw::Text(s)) => s
                .trim()
                .parse::<u64>()
                .map(Some)
                .map_err(|_| serde::de::Error::custom(format!("invalid disk size '{}'", s))),
        }
    }
}
