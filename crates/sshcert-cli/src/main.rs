//! sshcert CLI binary entrypoint.
//!
//! This is the main entry point for the `sshcert` command-line tool.

use std::io;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use sshcert_pki::{Clock, FixedClock, SystemClock};
use tracing_subscriber::EnvFilter;

use sshcert_cli::cli::{Cli, Commands};
use sshcert_cli::commands::{
    ApplyCommand, InspectCommand, IssueCommand, PlanCommand, RefreshCommand,
};
use sshcert_cli::output::OutputFormat;

fn main() -> ExitCode {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    // Parse CLI arguments
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let format = OutputFormat::new(cli.format);
    let clock = clock(cli.now.as_deref())?;
    let mut stdout = io::stdout().lock();

    match cli.command {
        Commands::Issue(args) => {
            let cmd = IssueCommand::new(args.kind.into(), &args.config, &args.state);
            cmd.execute(&mut stdout, &format, clock.as_ref())
                .context("failed to issue certificate")?;
        }
        Commands::Refresh(args) => {
            let cmd = RefreshCommand::new(&args.state);
            cmd.execute(&mut stdout, &format, clock.as_ref())
                .context("failed to refresh certificate")?;
        }
        Commands::Plan(args) => {
            let cmd = PlanCommand::new(args.kind.into(), &args.config, &args.state);
            cmd.execute(&mut stdout, &format, clock.as_ref())
                .context("failed to plan certificate")?;
        }
        Commands::Apply(args) => {
            let cmd = ApplyCommand::new(args.kind.into(), &args.config, &args.state);
            cmd.execute(&mut stdout, &format, clock.as_ref())
                .context("failed to apply certificate plan")?;
        }
        Commands::Inspect(args) => {
            let cmd = InspectCommand::new(&args.state);
            cmd.execute(&mut stdout, &format)
                .context("failed to inspect certificate")?;
        }
    }

    Ok(())
}

/// Pins the clock when `--now` is given, otherwise reads the system time.
fn clock(now: Option<&str>) -> anyhow::Result<Box<dyn Clock>> {
    match now {
        Some(at) => {
            let fixed = FixedClock::parse(at).context("invalid --now")?;
            Ok(Box::new(fixed))
        }
        None => Ok(Box::new(SystemClock)),
    }
}
