//! Renewal evaluation.
//!
//! A certificate is due for reissuance once `now` reaches its validity end
//! minus the early-renewal lead time. The decision is recomputed on every
//! evaluation and never stored.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::clock::Clock;
use crate::error::{Error, Result};

/// Outcome of a renewal evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenewalState {
    /// The early-renewal instant lies in the future.
    Fresh,
    /// The early-renewal instant has been reached.
    ReadyForRenewal,
}

impl RenewalState {
    /// Returns `true` for [`RenewalState::ReadyForRenewal`].
    #[must_use]
    pub const fn is_ready(&self) -> bool {
        matches!(self, Self::ReadyForRenewal)
    }
}

/// Decides whether a certificate ending at `validity_end` is due at `now`.
///
/// The boundary is inclusive: exactly `early_renewal_hours` before the end
/// is already due. A lead time reaching past the representable range means
/// the certificate is due.
#[must_use]
pub fn evaluate(
    validity_end: DateTime<Utc>,
    early_renewal_hours: u64,
    now: DateTime<Utc>,
) -> RenewalState {
    let early_renewal_time = i64::try_from(early_renewal_hours)
        .ok()
        .and_then(Duration::try_hours)
        .and_then(|lead| validity_end.checked_sub_signed(lead));

    match early_renewal_time {
        Some(at) if at > now => RenewalState::Fresh,
        _ => RenewalState::ReadyForRenewal,
    }
}

/// Parses a stored RFC 3339 validity end time.
///
/// # Errors
///
/// Returns [`Error::TimestampParse`] if `value` is not RFC 3339.
pub fn parse_validity_end_time(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|at| at.with_timezone(&Utc))
        .map_err(|e| Error::TimestampParse {
            value: value.to_string(),
            message: e.to_string(),
        })
}

/// Evaluates a stored certificate record.
///
/// Returns `Ok(None)` when no end time is known yet; the evaluator is not
/// invoked in that case.
///
/// # Errors
///
/// Returns [`Error::TimestampParse`] if the stored end time is malformed. A
/// malformed timestamp is never treated as fresh.
pub fn evaluate_stored(
    validity_end_time: Option<&str>,
    early_renewal_hours: u64,
    clock: &dyn Clock,
) -> Result<Option<RenewalState>> {
    let Some(value) = validity_end_time else {
        return Ok(None);
    };

    let end = parse_validity_end_time(value)?;
    let now = clock.now();
    let state = evaluate(end, early_renewal_hours, now);

    if state.is_ready() {
        info!(
            validity_end_time = value,
            early_renewal_hours,
            %now,
            "certificate is ready for renewal"
        );
    }

    Ok(Some(state))
}
