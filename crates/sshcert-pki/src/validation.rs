//! Input validation at the configuration boundary.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::error::{Error, Result};

/// Matches a single PEM document with an alphabetic label.
static PEM_DOCUMENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)^-----BEGIN [[:alpha:] ]+-----\n.+\n-----END [[:alpha:] ]+-----\n?$")
        .unwrap_or_else(|_| unreachable!("PEM document pattern is valid"))
});

/// Checks whether `text` has the shape of a PEM document.
///
/// Only the framing is inspected; the body is not decoded.
#[must_use]
pub fn is_pem_document(text: &str) -> bool {
    PEM_DOCUMENT.is_match(text)
}

/// Decides whether a CA key edit forces reissuance.
///
/// Any textual difference replaces the certificate as long as the prior
/// value was a PEM document. Equivalent keys written differently still
/// count as a change.
///
/// # Arguments
///
/// * `prior` - The CA key currently recorded in state.
/// * `planned` - The CA key in the new configuration.
#[must_use]
pub fn ca_key_change_requires_replace(prior: &str, planned: &str) -> bool {
    let replace = prior != planned && is_pem_document(prior);
    if replace {
        debug!("CA private key changed");
    }
    replace
}

/// Rejects a negative hour count.
///
/// # Errors
///
/// Returns [`Error::Validation`] naming `field` if `hours` is negative.
pub fn non_negative_hours(field: &str, hours: i64) -> Result<u64> {
    u64::try_from(hours)
        .map_err(|_| Error::Validation(format!("{field} must be at least 0, got {hours}")))
}
