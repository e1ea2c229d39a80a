//! Issue command implementation.

use std::io::Write;
use std::path::PathBuf;

use rand::rngs::OsRng;
use sshcert_pki::{CertKind, CertResource, Clock};
use tracing::info;

use crate::error::CliError;
use crate::files::{load_config, save_state};
use crate::output::{CertificateSummary, OutputFormat};

/// Issue command executor.
pub struct IssueCommand {
    resource: CertResource,
    config_path: PathBuf,
    state_path: PathBuf,
}

impl IssueCommand {
    /// Create a new issue command.
    #[must_use]
    pub fn new(kind: CertKind, config_path: impl Into<PathBuf>, state_path: impl Into<PathBuf>) -> Self {
        Self {
            resource: CertResource::new(kind),
            config_path: config_path.into(),
            state_path: state_path.into(),
        }
    }

    /// Issue a certificate and record it, replacing any previous record.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is unusable or signing fails.
    pub fn execute<W: Write>(
        &self,
        writer: &mut W,
        format: &OutputFormat,
        clock: &dyn Clock,
    ) -> Result<(), CliError> {
        let config = load_config(&self.config_path)?;
        let state = self.resource.create(&config, clock, &mut OsRng)?;
        save_state(&self.state_path, &state)?;

        info!(id = %state.id, kind = %self.resource.kind(), "certificate issued");
        format.write(writer, &CertificateSummary::from(&state))
    }
}
