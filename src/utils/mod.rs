//! Utility functions and helpers

pub mod version;

pub use version::{VERSION, get_detailed_version, get_version};
