//! # sshcert-cli
//!
//! Command-line interface for the `sshcert-pki` certificate authority.
//!
//! Provides commands for:
//! - Issuing SSH host and user certificates
//! - Refreshing the renewal flag of a recorded certificate
//! - Planning and applying configuration changes
//! - Inspecting a recorded certificate
//!
//! # Architecture
//!
//! The CLI reads a JSON configuration, drives the certificate lifecycle in
//! `sshcert-pki`, and keeps the resulting record in a JSON state file.
//!
//! ```text
//! ┌───────────┐                       ┌──────────────┐
//! │ cert.json │──► create / read ────►│  state.json  │
//! └───────────┘    plan / apply       └──────────────┘
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cli;
pub mod commands;
pub mod error;
pub mod files;
pub mod output;

pub use cli::{Cli, Commands, Format, Kind, LifecycleArgs, StateArgs};
pub use error::CliError;
pub use output::OutputFormat;
