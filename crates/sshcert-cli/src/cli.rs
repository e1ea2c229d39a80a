//! Command-line argument parsing with clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use sshcert_pki::CertKind;

/// sshcert - short-lived SSH certificates from a CA key.
#[derive(Parser, Debug, Clone)]
#[command(name = "sshcert")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output format.
    #[arg(short, long, global = true, value_enum, default_value_t = Format::Table)]
    pub format: Format,

    /// Evaluate as if the current time were this RFC 3339 instant.
    #[arg(long, global = true, env = "SSHCERT_NOW", value_name = "RFC3339")]
    pub now: Option<String>,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[derive(Default)]
pub enum Format {
    /// Human-readable table format.
    #[default]
    Table,
    /// JSON output for scripting.
    Json,
}

/// Certificate kind selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Kind {
    /// Host certificate.
    Host,
    /// User certificate.
    User,
}

impl From<Kind> for CertKind {
    fn from(kind: Kind) -> Self {
        match kind {
            Kind::Host => Self::Host,
            Kind::User => Self::User,
        }
    }
}

/// Top-level subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Issue a new certificate and record it.
    Issue(LifecycleArgs),

    /// Re-evaluate renewal of a recorded certificate.
    Refresh(StateArgs),

    /// Show what `apply` would do, without changing anything.
    Plan(LifecycleArgs),

    /// Plan, then issue, update or keep the recorded certificate.
    Apply(LifecycleArgs),

    /// Show the fields of a recorded certificate.
    Inspect(StateArgs),
}

/// Arguments for commands that compare a configuration with a record.
#[derive(Args, Debug, Clone)]
pub struct LifecycleArgs {
    /// Certificate kind.
    #[arg(short, long, value_enum, default_value_t = Kind::User)]
    pub kind: Kind,

    /// Certificate configuration (JSON).
    #[arg(short, long, env = "SSHCERT_CONFIG")]
    pub config: PathBuf,

    /// Certificate record (JSON).
    #[arg(short, long, env = "SSHCERT_STATE", default_value = "sshcert.state.json")]
    pub state: PathBuf,
}

/// Arguments for commands that only read a record.
#[derive(Args, Debug, Clone)]
pub struct StateArgs {
    /// Certificate record (JSON).
    #[arg(short, long, env = "SSHCERT_STATE", default_value = "sshcert.state.json")]
    pub state: PathBuf,
}
