//! CLI Commands

pub mod create;
pub mod disk;
pub mod instance;

use vmprov_common::{ProviderConfig, Result, Target};

use crate::client::ComputeClient;

/// Resolve the configured target and open a client against it
pub(crate) fn connect(config: &ProviderConfig) -> Result<(ComputeClient, Target)> {
    let target = config.target()?;
    let client = ComputeClient::from_config(config)?;
    Ok((client, target))
}
