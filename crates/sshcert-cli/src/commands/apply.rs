//! Apply command implementation.

use std::io::Write;
use std::path::PathBuf;

use rand::rngs::OsRng;
use sshcert_pki::{CertKind, CertResource, Clock};
use tracing::info;

use crate::error::CliError;
use crate::files::{load_config, load_state, save_state};
use crate::output::{ApplyReport, CertificateSummary, OutputFormat, PlanReport};

/// Apply command executor.
pub struct ApplyCommand {
    resource: CertResource,
    config_path: PathBuf,
    state_path: PathBuf,
}

impl ApplyCommand {
    /// Create a new apply command.
    #[must_use]
    pub fn new(kind: CertKind, config_path: impl Into<PathBuf>, state_path: impl Into<PathBuf>) -> Self {
        Self {
            resource: CertResource::new(kind),
            config_path: config_path.into(),
            state_path: state_path.into(),
        }
    }

    /// Plan, execute the plan and record the result.
    ///
    /// # Errors
    ///
    /// Returns an error if planning, signing or writing the record fails.
    pub fn execute<W: Write>(
        &self,
        writer: &mut W,
        format: &OutputFormat,
        clock: &dyn Clock,
    ) -> Result<(), CliError> {
        let config = load_config(&self.config_path)?;
        let prior = load_state(&self.state_path)?;

        let plan = self.resource.plan(prior.as_ref(), &config, clock)?;
        let state = self
            .resource
            .apply(&plan, prior.as_ref(), &config, clock, &mut OsRng)?;

        if !plan.is_noop() {
            save_state(&self.state_path, &state)?;
            info!(id = %state.id, action = ?plan.action, "applied certificate plan");
        }

        let report = ApplyReport {
            plan: PlanReport {
                id: prior.map(|p| p.id),
                plan,
            },
            certificate: CertificateSummary::from(&state),
        };
        format.write(writer, &report)
    }
}
