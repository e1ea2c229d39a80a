//! Inspect command implementation.

use std::io::Write;
use std::path::PathBuf;

use crate::error::CliError;
use crate::files::require_state;
use crate::output::{CertificateDetails, OutputFormat};

/// Inspect command executor.
pub struct InspectCommand {
    state_path: PathBuf,
}

impl InspectCommand {
    /// Create a new inspect command.
    #[must_use]
    pub fn new(state_path: impl Into<PathBuf>) -> Self {
        Self {
            state_path: state_path.into(),
        }
    }

    /// Parse the recorded certificate and show its fields.
    ///
    /// # Errors
    ///
    /// Returns an error if there is no signed certificate on record.
    pub fn execute<W: Write>(&self, writer: &mut W, format: &OutputFormat) -> Result<(), CliError> {
        let state = require_state(&self.state_path)?;
        let issued = state
            .certificate()?
            .ok_or_else(|| CliError::StateNotFound(self.state_path.clone()))?;

        format.write(writer, &CertificateDetails::from(&issued))
    }
}
