//! CLI error types.

use std::path::PathBuf;

use thiserror::Error;

/// CLI-specific errors.
#[derive(Debug, Error)]
pub enum CliError {
    /// Certificate operation failed.
    #[error(transparent)]
    Pki(#[from] sshcert_pki::Error),

    /// No certificate is recorded at the given path.
    #[error("no certificate recorded at {}", .0.display())]
    StateNotFound(PathBuf),

    /// A file could not be read or written.
    #[error("{}: {source}", path.display())]
    File {
        /// File being accessed.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Output formatting error.
    #[error("format error: {0}")]
    Format(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
