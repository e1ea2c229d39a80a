//! Plan command implementation.

use std::io::Write;
use std::path::PathBuf;

use sshcert_pki::{CertKind, CertResource, Clock};

use crate::error::CliError;
use crate::files::{load_config, load_state};
use crate::output::{OutputFormat, PlanReport};

/// Plan command executor.
pub struct PlanCommand {
    resource: CertResource,
    config_path: PathBuf,
    state_path: PathBuf,
}

impl PlanCommand {
    /// Create a new plan command.
    #[must_use]
    pub fn new(kind: CertKind, config_path: impl Into<PathBuf>, state_path: impl Into<PathBuf>) -> Self {
        Self {
            resource: CertResource::new(kind),
            config_path: config_path.into(),
            state_path: state_path.into(),
        }
    }

    /// Compute the plan without writing anything.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration or record is unusable.
    pub fn report(&self, clock: &dyn Clock) -> Result<PlanReport, CliError> {
        let config = load_config(&self.config_path)?;
        let prior = load_state(&self.state_path)?;
        let plan = self.resource.plan(prior.as_ref(), &config, clock)?;

        Ok(PlanReport {
            id: prior.map(|state| state.id),
            plan,
        })
    }

    /// Execute the plan command.
    ///
    /// # Errors
    ///
    /// Returns an error if planning or output fails.
    pub fn execute<W: Write>(
        &self,
        writer: &mut W,
        format: &OutputFormat,
        clock: &dyn Clock,
    ) -> Result<(), CliError> {
        let report = self.report(clock)?;
        format.write(writer, &report)
    }
}
