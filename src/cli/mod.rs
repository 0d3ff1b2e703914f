//! Command-line front end
//!
//! Subcommand runners behind the `voltar` binary.

pub mod commands;

pub use commands::{Action, GlobalArgs, run};
