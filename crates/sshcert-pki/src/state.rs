//! Certificate configuration and the persisted certificate record.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::{Algorithm, CertificateRequest, IssuedCertificate};
use crate::validation;

/// Declarative inputs for one certificate.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificateConfig {
    /// CA private key, PEM encoded. Sensitive.
    pub ca_private_key_pem: String,
    /// Public key to certify, in authorized-key format.
    pub public_key_openssh: String,
    /// Number of hours the certificate stays valid.
    pub validity_period_hours: i64,
    /// Identifier embedded in the certificate.
    pub key_id: String,
    /// Principals, order preserved.
    #[serde(default)]
    pub valid_principals: Vec<String>,
    /// Critical option names.
    #[serde(default)]
    pub critical_options: Vec<String>,
    /// Extension names.
    #[serde(default)]
    pub extensions: Vec<String>,
    /// Hours before expiry at which the certificate is due for renewal.
    #[serde(default)]
    pub early_renewal_hours: i64,
}

impl CertificateConfig {
    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if either hour count is negative.
    pub fn validate(&self) -> Result<()> {
        validation::non_negative_hours("validity_period_hours", self.validity_period_hours)?;
        validation::non_negative_hours("early_renewal_hours", self.early_renewal_hours)?;
        Ok(())
    }

    /// Returns the early-renewal lead time in hours.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if it is negative.
    pub fn early_renewal_hours(&self) -> Result<u64> {
        validation::non_negative_hours("early_renewal_hours", self.early_renewal_hours)
    }

    /// Converts the configuration into a certificate request.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn to_request(&self) -> Result<CertificateRequest> {
        self.validate()?;
        let hours =
            validation::non_negative_hours("validity_period_hours", self.validity_period_hours)?;

        let request = CertificateRequest {
            key_id: self.key_id.clone(),
            validity_period_hours: hours,
            valid_principals: self.valid_principals.clone(),
            critical_options: self.critical_options.clone(),
            extensions: self.extensions.clone(),
        };
        request.validate()?;
        Ok(request)
    }

    /// Parses a configuration from JSON.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Serialization`] if the JSON does not describe a
    /// configuration.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| Error::Serialization(format!("invalid certificate configuration: {e}")))
    }
}

impl fmt::Debug for CertificateConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CertificateConfig")
            .field("ca_private_key_pem", &"[REDACTED]")
            .field("public_key_openssh", &self.public_key_openssh)
            .field("validity_period_hours", &self.validity_period_hours)
            .field("key_id", &self.key_id)
            .field("valid_principals", &self.valid_principals)
            .field("critical_options", &self.critical_options)
            .field("extensions", &self.extensions)
            .field("early_renewal_hours", &self.early_renewal_hours)
            .finish()
    }
}

/// Persisted record of one certificate: its inputs plus computed outputs.
///
/// Output fields are `None` until a certificate has been issued.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificateState {
    /// Inputs the certificate was issued from.
    #[serde(flatten)]
    pub config: CertificateConfig,
    /// Algorithm of the CA key.
    #[serde(default)]
    pub ca_key_algorithm: Option<Algorithm>,
    /// Signed certificate in authorized-key format.
    #[serde(default)]
    pub cert_authorized_key: Option<String>,
    /// Start of validity, RFC 3339.
    #[serde(default)]
    pub validity_start_time: Option<String>,
    /// End of validity, RFC 3339.
    #[serde(default)]
    pub validity_end_time: Option<String>,
    /// Decimal serial number.
    pub id: String,
    /// Whether the certificate is due for renewal.
    #[serde(default)]
    pub ready_for_renewal: Option<bool>,
}

impl CertificateState {
    /// Builds the record of a freshly issued certificate.
    #[must_use]
    pub fn issued(
        config: CertificateConfig,
        algorithm: Algorithm,
        cert: &IssuedCertificate,
    ) -> Self {
        Self {
            config,
            ca_key_algorithm: Some(algorithm),
            cert_authorized_key: Some(cert.authorized_key().to_string()),
            validity_start_time: Some(cert.validity_start_time()),
            validity_end_time: Some(cert.validity_end_time()),
            id: cert.serial().to_string(),
            ready_for_renewal: Some(false),
        }
    }

    /// Builds a record for an imported certificate of which only the id is
    /// known.
    #[must_use]
    pub fn imported(id: impl Into<String>) -> Self {
        Self {
            config: CertificateConfig {
                ca_private_key_pem: String::new(),
                public_key_openssh: String::new(),
                validity_period_hours: 0,
                key_id: String::new(),
                valid_principals: Vec::new(),
                critical_options: Vec::new(),
                extensions: Vec::new(),
                early_renewal_hours: 0,
            },
            ca_key_algorithm: None,
            cert_authorized_key: None,
            validity_start_time: None,
            validity_end_time: None,
            id: id.into(),
            ready_for_renewal: None,
        }
    }

    /// Returns the issued certificate, if any.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Parse`] if the stored certificate is malformed.
    pub fn certificate(&self) -> Result<Option<IssuedCertificate>> {
        self.cert_authorized_key
            .as_deref()
            .map(IssuedCertificate::from_authorized_key)
            .transpose()
    }

    /// Serializes the record as pretty JSON.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Serialization`] if encoding fails.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| Error::Serialization(format!("failed to encode certificate state: {e}")))
    }

    /// Parses a record from JSON.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Serialization`] if the JSON does not describe a
    /// record.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| Error::Serialization(format!("invalid certificate state: {e}")))
    }
}
