//! Refresh command implementation.
//!
//! Re-evaluates renewal of a recorded certificate and writes the updated
//! flag back. Never signs.

use std::io::Write;
use std::path::PathBuf;

use sshcert_pki::{CertResource, Clock};

use crate::error::CliError;
use crate::files::{require_state, save_state};
use crate::output::{CertificateSummary, OutputFormat};

/// Refresh command executor.
pub struct RefreshCommand {
    state_path: PathBuf,
}

impl RefreshCommand {
    /// Create a new refresh command.
    #[must_use]
    pub fn new(state_path: impl Into<PathBuf>) -> Self {
        Self {
            state_path: state_path.into(),
        }
    }

    /// Execute the refresh command.
    ///
    /// # Errors
    ///
    /// Returns an error if there is no record or its end time is malformed.
    pub fn execute<W: Write>(
        &self,
        writer: &mut W,
        format: &OutputFormat,
        clock: &dyn Clock,
    ) -> Result<(), CliError> {
        let state = require_state(&self.state_path)?;
        // The kind does not influence renewal evaluation.
        let refreshed = CertResource::user().read(&state, clock)?;

        if refreshed != state {
            save_state(&self.state_path, &refreshed)?;
        }

        format.write(writer, &CertificateSummary::from(&refreshed))
    }
}
