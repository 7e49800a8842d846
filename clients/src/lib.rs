//! Command-line client for the custom model registry.
//!
//! The `cmm` binary keeps registry state in a JSON snapshot file and
//! offers four subcommands:
//! - `apply` runs operation scripts against the state
//! - `show` prints models, classes and counts
//! - `export` renders one model as Turtle or JSON-LD
//! - `audit` runs the conformance audit over the state file
//!
//! The pieces live here so they can be tested without spawning a process.

#![deny(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    missing_docs,
    clippy::missing_errors_doc
)]

pub mod commands;
pub mod config;
pub mod state;

pub use config::{CliConfig, LoggingConfig};
