//! Certificate template construction.

use rand::{CryptoRng, RngCore};
use tracing::debug;

use crate::clock::Clock;
use crate::error::{Error, Result};
use crate::types::{CertKind, CertificateRequest, CertificateTemplate, SerialNumber};

/// Draws a serial number uniformly from `[0, 2^128)` and keeps its low 64
/// bits, the width of the SSH certificate serial field.
///
/// # Errors
///
/// Returns [`Error::RandomSourceExhausted`] if the random source fails.
pub fn random_serial<R>(rng: &mut R) -> Result<SerialNumber>
where
    R: RngCore + CryptoRng + ?Sized,
{
    let mut bytes = [0u8; 16];
    rng.try_fill_bytes(&mut bytes)
        .map_err(|e| Error::RandomSourceExhausted(format!("failed to generate serial number: {e}")))?;

    Ok(SerialNumber::new(u128::from_be_bytes(bytes) as u64))
}

/// Builds a certificate template valid from `clock.now()` for the requested
/// number of hours.
///
/// # Errors
///
/// Returns an error if the serial number cannot be drawn or the validity
/// window is not representable.
pub fn build_template<R>(
    request: &CertificateRequest,
    kind: CertKind,
    clock: &dyn Clock,
    rng: &mut R,
) -> Result<CertificateTemplate>
where
    R: RngCore + CryptoRng + ?Sized,
{
    let serial = random_serial(rng)?;
    let template = CertificateTemplate::new(request, kind, clock.now(), serial)?;

    debug!(
        key_id = %template.key_id,
        %kind,
        valid_after = template.valid_after,
        valid_before = template.valid_before,
        principals = template.valid_principals.len(),
        "built certificate template"
    );

    Ok(template)
}
