//! vmprov CLI
//!
//! Command-line interface for creating, resizing and suspending
//! compute instances.

pub mod auth;
pub mod client;
pub mod commands;
pub mod output;
pub mod prompt;
