//! Configuration management for the bypass client
//!
//! This module handles loading and validating client settings from
//! configuration files and environment variables.

pub mod loader;
pub mod settings;

pub use loader::{CONFIG_ENV_VAR, ConfigLoader};
pub use settings::{ApiSettings, LoggingSettings, NetworkSettings, PollingSettings, Settings};

// Serializes tests that mutate process environment variables
#[cfg(test)]
pub(crate) static ENV_TEST_MUTEX: std::sync::Mutex<()> = std::sync::Mutex::new(());
