//! Core types for SSH certificate issuance.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use ssh_key::certificate::CertType;
use ssh_key::{Fingerprint, HashAlg};

use crate::error::{Error, Result};

/// Algorithm of a CA private key.
///
/// Derived from the decoded key, never chosen by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Algorithm {
    /// RSA.
    #[serde(rename = "RSA")]
    Rsa,
    /// ECDSA over a NIST curve.
    #[serde(rename = "ECDSA")]
    Ecdsa,
    /// Ed25519.
    #[serde(rename = "ED25519")]
    Ed25519,
}

impl Algorithm {
    /// Returns the informational label used in certificate records.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Rsa => "RSA",
            Self::Ecdsa => "ECDSA",
            Self::Ed25519 => "ED25519",
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Algorithm {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "RSA" => Ok(Self::Rsa),
            "ECDSA" => Ok(Self::Ecdsa),
            "ED25519" => Ok(Self::Ed25519),
            other => Err(Error::Validation(format!("unknown key algorithm: {other}"))),
        }
    }
}

/// Heading of a PEM document's encapsulation boundaries.
///
/// See RFC 1421 and RFC 7468. Only these labels are recognized; anything
/// else is rejected rather than skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PemPreamble {
    /// `PUBLIC KEY` (SubjectPublicKeyInfo).
    PublicKey,
    /// `PRIVATE KEY` (PKCS#8).
    PrivateKey,
    /// `RSA PRIVATE KEY` (PKCS#1).
    RsaPrivateKey,
    /// `EC PRIVATE KEY` (SEC1).
    EcPrivateKey,
    /// `OPENSSH PRIVATE KEY` (OpenSSH native format).
    OpenSshPrivateKey,
    /// `CERTIFICATE` (X.509).
    Certificate,
    /// `CERTIFICATE REQUEST` (PKCS#10).
    CertificateRequest,
}

impl PemPreamble {
    /// Returns the exact header label.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::PublicKey => "PUBLIC KEY",
            Self::PrivateKey => "PRIVATE KEY",
            Self::RsaPrivateKey => "RSA PRIVATE KEY",
            Self::EcPrivateKey => "EC PRIVATE KEY",
            Self::OpenSshPrivateKey => "OPENSSH PRIVATE KEY",
            Self::Certificate => "CERTIFICATE",
            Self::CertificateRequest => "CERTIFICATE REQUEST",
        }
    }

    /// Classifies a PEM block header.
    ///
    /// Matching is exact: case variants and near-matches are rejected.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedPreamble`] for any unrecognized label.
    pub fn classify(label: &str) -> Result<Self> {
        match label {
            "PUBLIC KEY" => Ok(Self::PublicKey),
            "PRIVATE KEY" => Ok(Self::PrivateKey),
            "RSA PRIVATE KEY" => Ok(Self::RsaPrivateKey),
            "EC PRIVATE KEY" => Ok(Self::EcPrivateKey),
            "OPENSSH PRIVATE KEY" => Ok(Self::OpenSshPrivateKey),
            "CERTIFICATE" => Ok(Self::Certificate),
            "CERTIFICATE REQUEST" => Ok(Self::CertificateRequest),
            other => Err(Error::UnsupportedPreamble(other.to_string())),
        }
    }
}

impl fmt::Display for PemPreamble {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of SSH certificate. Fixed per resource, not user-settable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CertKind {
    /// Host certificate.
    Host,
    /// User certificate.
    User,
}

impl CertKind {
    /// Returns the lowercase name of this kind.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Host => "host",
            Self::User => "user",
        }
    }
}

impl From<CertKind> for CertType {
    fn from(kind: CertKind) -> Self {
        match kind {
            CertKind::Host => Self::Host,
            CertKind::User => Self::User,
        }
    }
}

impl fmt::Display for CertKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Certificate serial number, also the externally visible certificate id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SerialNumber(u64);

impl SerialNumber {
    /// Creates a serial number from its raw value.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Returns the raw value.
    #[must_use]
    pub const fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for SerialNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SerialNumber {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        s.parse::<u64>()
            .map(Self)
            .map_err(|e| Error::Validation(format!("invalid serial number '{s}': {e}")))
    }
}

/// Declarative request for a certificate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificateRequest {
    /// Identifier embedded in the certificate.
    pub key_id: String,
    /// Validity period in hours.
    pub validity_period_hours: u64,
    /// Principals, order preserved.
    pub valid_principals: Vec<String>,
    /// Critical option names.
    pub critical_options: Vec<String>,
    /// Extension names.
    pub extensions: Vec<String>,
}

impl CertificateRequest {
    /// Creates a new certificate request builder.
    #[must_use]
    pub fn builder(key_id: impl Into<String>) -> CertificateRequestBuilder {
        CertificateRequestBuilder {
            key_id: key_id.into(),
            validity_period_hours: 0,
            valid_principals: Vec::new(),
            critical_options: Vec::new(),
            extensions: Vec::new(),
        }
    }

    /// Returns the validity period in seconds.
    ///
    /// # Errors
    ///
    /// Returns an error if the period does not fit a Unix timestamp.
    pub fn validity_seconds(&self) -> Result<u64> {
        self.validity_period_hours
            .checked_mul(3600)
            .filter(|secs| i64::try_from(*secs).is_ok())
            .ok_or_else(|| {
                Error::Validation(format!(
                    "validity_period_hours {} is out of range",
                    self.validity_period_hours
                ))
            })
    }

    /// Validates the certificate request.
    ///
    /// # Errors
    ///
    /// Returns an error if the request is invalid.
    pub fn validate(&self) -> Result<()> {
        self.validity_seconds().map(|_| ())
    }
}

/// Builder for certificate requests.
#[derive(Debug)]
pub struct CertificateRequestBuilder {
    key_id: String,
    validity_period_hours: u64,
    valid_principals: Vec<String>,
    critical_options: Vec<String>,
    extensions: Vec<String>,
}

impl CertificateRequestBuilder {
    /// Sets the validity period in hours.
    #[must_use]
    pub const fn validity_hours(mut self, hours: u64) -> Self {
        self.validity_period_hours = hours;
        self
    }

    /// Adds a principal.
    #[must_use]
    pub fn principal(mut self, principal: impl Into<String>) -> Self {
        self.valid_principals.push(principal.into());
        self
    }

    /// Adds a critical option by name.
    #[must_use]
    pub fn critical_option(mut self, name: impl Into<String>) -> Self {
        self.critical_options.push(name.into());
        self
    }

    /// Adds an extension by name.
    #[must_use]
    pub fn extension(mut self, name: impl Into<String>) -> Self {
        self.extensions.push(name.into());
        self
    }

    /// Builds the certificate request.
    ///
    /// # Errors
    ///
    /// Returns an error if the request is invalid.
    pub fn build(self) -> Result<CertificateRequest> {
        let request = CertificateRequest {
            key_id: self.key_id,
            validity_period_hours: self.validity_period_hours,
            valid_principals: self.valid_principals,
            critical_options: self.critical_options,
            extensions: self.extensions,
        };
        request.validate()?;
        Ok(request)
    }
}

/// In-memory certificate template, created per issuance and discarded after
/// signing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateTemplate {
    /// Identifier embedded in the certificate.
    pub key_id: String,
    /// Start of validity (Unix seconds).
    pub valid_after: u64,
    /// End of validity (Unix seconds).
    pub valid_before: u64,
    /// Random serial number.
    pub serial: SerialNumber,
    /// Principals, order preserved.
    pub valid_principals: Vec<String>,
    /// Critical options; every value is empty.
    pub critical_options: BTreeMap<String, String>,
    /// Extensions; every value is empty.
    pub extensions: BTreeMap<String, String>,
    /// Host or user.
    pub kind: CertKind,
}

impl CertificateTemplate {
    /// Assembles a template from a request, an instant and a serial number.
    ///
    /// Sub-second precision of `now` is dropped.
    ///
    /// # Errors
    ///
    /// Returns an error if `now` predates the Unix epoch or the validity
    /// window overflows.
    pub fn new(
        request: &CertificateRequest,
        kind: CertKind,
        now: DateTime<Utc>,
        serial: SerialNumber,
    ) -> Result<Self> {
        let valid_after = u64::try_from(now.timestamp())
            .map_err(|_| Error::Validation(format!("current time {now} predates the Unix epoch")))?;
        let valid_before = valid_after
            .checked_add(request.validity_seconds()?)
            .ok_or_else(|| Error::Validation("validity window overflows".into()))?;

        Ok(Self {
            key_id: request.key_id.clone(),
            valid_after,
            valid_before,
            serial,
            valid_principals: request.valid_principals.clone(),
            critical_options: option_names(&request.critical_options),
            extensions: option_names(&request.extensions),
            kind,
        })
    }
}

/// Turns a list of option names into a map with empty values.
fn option_names(names: &[String]) -> BTreeMap<String, String> {
    names
        .iter()
        .map(|name| (name.clone(), String::new()))
        .collect()
}

/// A signed SSH certificate with its derived outputs.
#[derive(Debug, Clone)]
pub struct IssuedCertificate {
    /// The signed certificate.
    certificate: ssh_key::Certificate,
    /// Authorized-key encoding, newline terminated.
    authorized_key: String,
    /// Start of validity.
    valid_after: DateTime<Utc>,
    /// End of validity.
    valid_before: DateTime<Utc>,
}

impl IssuedCertificate {
    /// Wraps a signed certificate, serializing it once.
    ///
    /// # Errors
    ///
    /// Returns an error if the certificate cannot be encoded or its validity
    /// window is not representable.
    pub fn from_certificate(certificate: ssh_key::Certificate) -> Result<Self> {
        let mut authorized_key = certificate
            .to_openssh()
            .map_err(|e| Error::Serialization(format!("failed to encode certificate: {e}")))?;
        authorized_key.push('\n');

        let valid_after = unix_to_datetime(certificate.valid_after())?;
        let valid_before = unix_to_datetime(certificate.valid_before())?;

        Ok(Self {
            certificate,
            authorized_key,
            valid_after,
            valid_before,
        })
    }

    /// Parses a certificate from its authorized-key encoding.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not an SSH certificate.
    pub fn from_authorized_key(text: &str) -> Result<Self> {
        let certificate = ssh_key::Certificate::from_openssh(text.trim())
            .map_err(|e| Error::Parse(format!("failed to parse certificate: {e}")))?;
        Self::from_certificate(certificate)
    }

    /// Returns the underlying certificate.
    #[must_use]
    pub const fn certificate(&self) -> &ssh_key::Certificate {
        &self.certificate
    }

    /// Returns the serial number.
    #[must_use]
    pub fn serial(&self) -> SerialNumber {
        SerialNumber(self.certificate.serial())
    }

    /// Returns the key identifier.
    #[must_use]
    pub fn key_id(&self) -> &str {
        self.certificate.key_id()
    }

    /// Returns the certificate kind.
    #[must_use]
    pub fn kind(&self) -> CertKind {
        if self.certificate.cert_type().is_host() {
            CertKind::Host
        } else {
            CertKind::User
        }
    }

    /// Returns the principals.
    #[must_use]
    pub fn valid_principals(&self) -> &[String] {
        self.certificate.valid_principals()
    }

    /// Returns the critical option names, sorted.
    #[must_use]
    pub fn critical_option_names(&self) -> Vec<String> {
        self.certificate.critical_options().keys().cloned().collect()
    }

    /// Returns the extension names, sorted.
    #[must_use]
    pub fn extension_names(&self) -> Vec<String> {
        self.certificate.extensions().keys().cloned().collect()
    }

    /// Returns the SHA-256 fingerprint of the certified key.
    #[must_use]
    pub fn public_key_fingerprint(&self) -> Fingerprint {
        self.certificate.public_key().fingerprint(HashAlg::Sha256)
    }

    /// Returns the SHA-256 fingerprint of the signing CA key.
    #[must_use]
    pub fn signature_key_fingerprint(&self) -> Fingerprint {
        self.certificate.signature_key().fingerprint(HashAlg::Sha256)
    }

    /// Returns the authorized-key line.
    #[must_use]
    pub fn authorized_key(&self) -> &str {
        &self.authorized_key
    }

    /// Returns the start of validity.
    #[must_use]
    pub const fn valid_after(&self) -> DateTime<Utc> {
        self.valid_after
    }

    /// Returns the end of validity.
    #[must_use]
    pub const fn valid_before(&self) -> DateTime<Utc> {
        self.valid_before
    }

    /// Returns the start of validity as RFC 3339.
    #[must_use]
    pub fn validity_start_time(&self) -> String {
        format_rfc3339(self.valid_after)
    }

    /// Returns the end of validity as RFC 3339.
    #[must_use]
    pub fn validity_end_time(&self) -> String {
        format_rfc3339(self.valid_before)
    }
}

/// Formats an instant as RFC 3339 with whole seconds and a `Z` suffix.
#[must_use]
pub fn format_rfc3339(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn unix_to_datetime(secs: u64) -> Result<DateTime<Utc>> {
    i64::try_from(secs)
        .ok()
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .ok_or_else(|| Error::Serialization(format!("timestamp {secs} is out of range")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn noon() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2023-01-01T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test_case("PUBLIC KEY", PemPreamble::PublicKey)]
    #[test_case("PRIVATE KEY", PemPreamble::PrivateKey)]
    #[test_case("RSA PRIVATE KEY", PemPreamble::RsaPrivateKey)]
    #[test_case("EC PRIVATE KEY", PemPreamble::EcPrivateKey)]
    #[test_case("OPENSSH PRIVATE KEY", PemPreamble::OpenSshPrivateKey)]
    #[test_case("CERTIFICATE", PemPreamble::Certificate)]
    #[test_case("CERTIFICATE REQUEST", PemPreamble::CertificateRequest)]
    fn preamble_classifies_known_labels(label: &str, expected: PemPreamble) {
        let preamble = PemPreamble::classify(label).unwrap();
        assert_eq!(preamble, expected);
        assert_eq!(preamble.as_str(), label);
    }

    #[test_case("rsa private key" ; "lowercase")]
    #[test_case("RSA PRIVATE KEY " ; "trailing space")]
    #[test_case("DSA PRIVATE KEY" ; "dsa")]
    #[test_case("ENCRYPTED PRIVATE KEY" ; "encrypted pkcs8")]
    #[test_case("" ; "empty")]
    fn preamble_rejects_unknown_labels(label: &str) {
        let err = PemPreamble::classify(label).unwrap_err();
        assert!(matches!(err, Error::UnsupportedPreamble(l) if l == label));
    }

    #[test]
    fn algorithm_labels() {
        assert_eq!(Algorithm::Rsa.to_string(), "RSA");
        assert_eq!(Algorithm::Ecdsa.to_string(), "ECDSA");
        assert_eq!(Algorithm::Ed25519.to_string(), "ED25519");
        assert_eq!("ECDSA".parse::<Algorithm>().unwrap(), Algorithm::Ecdsa);
        assert!("ecdsa".parse::<Algorithm>().is_err());
    }

    #[test]
    fn algorithm_serializes_as_label() {
        let json = serde_json::to_string(&Algorithm::Ed25519).unwrap();
        assert_eq!(json, "\"ED25519\"");
    }

    #[test]
    fn cert_kind_maps_to_ssh_cert_type() {
        assert_eq!(CertType::from(CertKind::Host), CertType::Host);
        assert_eq!(CertType::from(CertKind::User), CertType::User);
    }

    #[test]
    fn serial_number_round_trips_decimal() {
        let serial = SerialNumber::new(u64::MAX);
        assert_eq!(serial.to_string(), "18446744073709551615");
        assert_eq!(serial.to_string().parse::<SerialNumber>().unwrap(), serial);
        assert!("-1".parse::<SerialNumber>().is_err());
    }

    #[test]
    fn request_builder_defaults_to_empty_collections() {
        let request = CertificateRequest::builder("svc").build().unwrap();
        assert_eq!(request.key_id, "svc");
        assert_eq!(request.validity_period_hours, 0);
        assert!(request.valid_principals.is_empty());
        assert!(request.critical_options.is_empty());
        assert!(request.extensions.is_empty());
    }

    #[test]
    fn request_rejects_overflowing_validity() {
        let result = CertificateRequest::builder("svc")
            .validity_hours(u64::MAX / 1000)
            .build();
        assert!(matches!(result.unwrap_err(), Error::Validation(_)));
    }

    #[test]
    fn template_window_is_hours_after_now() {
        let request = CertificateRequest::builder("testUser")
            .validity_hours(1)
            .build()
            .unwrap();
        let template =
            CertificateTemplate::new(&request, CertKind::User, noon(), SerialNumber::new(7))
                .unwrap();

        assert_eq!(template.valid_after, noon().timestamp() as u64);
        assert_eq!(template.valid_before - template.valid_after, 3600);
        assert_eq!(template.serial, SerialNumber::new(7));
        assert_eq!(template.kind, CertKind::User);
    }

    #[test]
    fn template_zero_hours_is_empty_window() {
        let request = CertificateRequest::builder("svc").build().unwrap();
        let template =
            CertificateTemplate::new(&request, CertKind::Host, noon(), SerialNumber::new(1))
                .unwrap();
        assert_eq!(template.valid_after, template.valid_before);
    }

    #[test]
    fn template_drops_sub_second_precision() {
        let request = CertificateRequest::builder("svc").build().unwrap();
        let now = noon() + chrono::Duration::milliseconds(999);
        let template =
            CertificateTemplate::new(&request, CertKind::Host, now, SerialNumber::new(1)).unwrap();
        assert_eq!(template.valid_after, noon().timestamp() as u64);
    }

    #[test]
    fn template_options_are_names_with_empty_values() {
        let request = CertificateRequest::builder("svc")
            .critical_option("force-command")
            .critical_option("force-command")
            .extension("permit-pty")
            .extension("permit-X11-forwarding")
            .build()
            .unwrap();
        let template =
            CertificateTemplate::new(&request, CertKind::User, noon(), SerialNumber::new(1))
                .unwrap();

        assert_eq!(template.critical_options.len(), 1);
        assert_eq!(template.critical_options["force-command"], "");
        assert_eq!(template.extensions.len(), 2);
        assert!(template.extensions.values().all(String::is_empty));
    }

    #[test]
    fn template_preserves_principal_order_and_duplicates() {
        let request = CertificateRequest::builder("svc")
            .principal("b.local")
            .principal("a.local")
            .principal("b.local")
            .build()
            .unwrap();
        let template =
            CertificateTemplate::new(&request, CertKind::Host, noon(), SerialNumber::new(1))
                .unwrap();
        assert_eq!(template.valid_principals, ["b.local", "a.local", "b.local"]);
    }

    #[test]
    fn template_rejects_pre_epoch_clock() {
        let request = CertificateRequest::builder("svc").build().unwrap();
        let before_epoch = DateTime::from_timestamp(-10, 0).unwrap();
        let result =
            CertificateTemplate::new(&request, CertKind::Host, before_epoch, SerialNumber::new(1));
        assert!(matches!(result.unwrap_err(), Error::Validation(_)));
    }

    #[test]
    fn rfc3339_uses_z_suffix_and_whole_seconds() {
        assert_eq!(format_rfc3339(noon()), "2023-01-01T12:00:00Z");
    }
}
