//! vmprov Common Library
//!
//! Instance specs, the three-mode instance builder, configuration
//! sanitizing, and operation handling for the vmprov CLI.

pub mod builder;
pub mod compute;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod operation;
pub mod sanitize;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

// Re-export commonly used types
pub use builder::{BuildMode, InstanceBuilder, Prompter, Provisioning};
pub use compute::ComputeApi;
pub use config::ProviderConfig;
pub use error::{Error, Result};
pub use lifecycle::{FollowUp, Lifecycle, ProvisionReport, Step};
pub use operation::{Operation, OperationWaiter, OperationWarning, WaitOutcome};
pub use sanitize::{sanitize, SanitizeWarning};
pub use types::*;

/// vmprov version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default configuration file location
pub fn default_config_path() -> std::path::PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| std::path::PathBuf::from("."))
        .join(".config")
        .join("vmprov")
        .join("config.toml")
}

/// Home directory helper
mod dirs {
    pub fn home_dir() -> Option<std::path::PathBuf> {
        std::env::var_os("HOME").map(std::path::PathBuf::from)
    }
}
