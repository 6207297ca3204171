//! Compute API seam
//!
//! The provider is a black box reached through [`ComputeApi`]. The CLI wires
//! in a REST implementation; tests use [`crate::testing::ScriptedApi`].

use async_trait::async_trait;

use crate::operation::Operation;
use crate::types::{DiskDescriptor, InstanceSpec, Target};
use crate::Result;

/// Calls this tool makes against the provider
#[async_trait]
pub trait ComputeApi: Send + Sync {
    /// Submit an instance insert request
    async fn insert_instance(&self, target: &Target, spec: &InstanceSpec) -> Result<Operation>;

    /// Fetch a zonal disk by name
    async fn get_disk(&self, target: &Target, disk: &str) -> Result<DiskDescriptor>;

    /// Request a disk resize to `size_gb`
    async fn resize_disk(&self, target: &Target, disk: &str, size_gb: u64) -> Result<Operation>;

    /// Request suspension of a running instance
    async fn suspend_instance(&self, target: &Target, instance: &str) -> Result<Operation>;

    /// Fetch the current state of an operation, blocking server-side for a
    /// bounded time while it is still running
    async fn wait_operation(&self, target: &Target, operation: &str) -> Result<Operation>;
}
