//! Loading configurations and loading/saving certificate records.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use sshcert_pki::{CertificateConfig, CertificateState};
use tracing::debug;

use crate::error::CliError;

/// Reads a certificate configuration.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed.
pub fn load_config(path: &Path) -> Result<CertificateConfig, CliError> {
    let text = read(path)?;
    Ok(CertificateConfig::from_json(&text)?)
}

/// Reads a certificate record, or `None` if there is none yet.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_state(path: &Path) -> Result<Option<CertificateState>, CliError> {
    match fs::read_to_string(path) {
        Ok(text) => Ok(Some(CertificateState::from_json(&text)?)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(source) => Err(CliError::File {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Reads a certificate record that must exist.
///
/// # Errors
///
/// Returns [`CliError::StateNotFound`] if there is no record.
pub fn require_state(path: &Path) -> Result<CertificateState, CliError> {
    load_state(path)?.ok_or_else(|| CliError::StateNotFound(path.to_path_buf()))
}

/// Writes a certificate record, replacing any previous one.
///
/// The record is written next to the target and renamed over it, so a
/// failed write never leaves a truncated record behind.
///
/// # Errors
///
/// Returns an error if the record cannot be encoded or written.
pub fn save_state(path: &Path, state: &CertificateState) -> Result<(), CliError> {
    let json = state.to_json()?;
    let tmp = path.with_extension("tmp");

    fs::write(&tmp, json + "\n").map_err(|source| CliError::File {
        path: tmp.clone(),
        source,
    })?;
    fs::rename(&tmp, path).map_err(|source| CliError::File {
        path: path.to_path_buf(),
        source,
    })?;

    debug!(path = %path.display(), id = %state.id, "saved certificate record");
    Ok(())
}

fn read(path: &Path) -> Result<String, CliError> {
    fs::read_to_string(path).map_err(|source| CliError::File {
        path: path.to_path_buf(),
        source,
    })
}
