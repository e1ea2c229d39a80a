//! Output formatting for CLI commands.
//!
//! Supports table (human-readable) and JSON output formats.

use std::io::Write;

use serde::Serialize;
use sshcert_pki::{CertificateState, IssuedCertificate, Plan, PlanAction};

use crate::cli::Format;
use crate::error::CliError;

/// Output formatter that handles both table and JSON output.
#[derive(Debug, Clone)]
pub struct OutputFormat {
    format: Format,
}

impl OutputFormat {
    /// Create a new output formatter.
    #[must_use]
    pub const fn new(format: Format) -> Self {
        Self { format }
    }

    /// Write a serializable value to the output.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn write<W, T>(&self, writer: &mut W, value: &T) -> Result<(), CliError>
    where
        W: Write,
        T: Serialize + TableDisplay,
    {
        match self.format {
            Format::Json => {
                serde_json::to_writer_pretty(&mut *writer, value)
                    .map_err(|e| CliError::Format(format!("JSON serialization failed: {e}")))?;
                writeln!(writer)?;
            }
            Format::Table => {
                value.write_table(writer)?;
            }
        }
        Ok(())
    }
}

impl Default for OutputFormat {
    fn default() -> Self {
        Self::new(Format::Table)
    }
}

/// Trait for types that can be displayed as a table.
pub trait TableDisplay {
    /// Write the value as a human-readable table.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError>;
}

/// Outputs of a certificate record. Never carries the CA key.
#[derive(Debug, Clone, Serialize)]
pub struct CertificateSummary {
    /// Decimal serial number.
    pub id: String,
    /// Identifier embedded in the certificate.
    pub key_id: String,
    /// Algorithm of the CA key.
    pub ca_key_algorithm: Option<String>,
    /// Start of validity.
    pub validity_start_time: Option<String>,
    /// End of validity.
    pub validity_end_time: Option<String>,
    /// Whether the certificate is due for renewal.
    pub ready_for_renewal: Option<bool>,
    /// Signed certificate in authorized-key format.
    pub cert_authorized_key: Option<String>,
}

impl From<&CertificateState> for CertificateSummary {
    fn from(state: &CertificateState) -> Self {
        Self {
            id: state.id.clone(),
            key_id: state.config.key_id.clone(),
            ca_key_algorithm: state.ca_key_algorithm.map(|a| a.to_string()),
            validity_start_time: state.validity_start_time.clone(),
            validity_end_time: state.validity_end_time.clone(),
            ready_for_renewal: state.ready_for_renewal,
            cert_authorized_key: state.cert_authorized_key.clone(),
        }
    }
}

impl TableDisplay for CertificateSummary {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        writeln!(writer, "Certificate {}", self.id)?;
        writeln!(writer, "══════════════════════════════════")?;
        writeln!(writer, "Key ID:             {}", self.key_id)?;
        writeln!(writer, "CA Key Algorithm:   {}", or_dash(self.ca_key_algorithm.as_deref()))?;
        writeln!(writer, "Valid From:         {}", or_dash(self.validity_start_time.as_deref()))?;
        writeln!(writer, "Valid Until:        {}", or_dash(self.validity_end_time.as_deref()))?;
        writeln!(writer, "Ready For Renewal:  {}", yes_no(self.ready_for_renewal))?;
        if let Some(line) = &self.cert_authorized_key {
            writeln!(writer)?;
            write!(writer, "{line}")?;
        }
        Ok(())
    }
}

/// A plan, as shown to the user.
#[derive(Debug, Clone, Serialize)]
pub struct PlanReport {
    /// Id of the recorded certificate, if any.
    pub id: Option<String>,
    /// The plan.
    #[serde(flatten)]
    pub plan: Plan,
}

impl TableDisplay for PlanReport {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        let subject = self.id.as_deref().unwrap_or("(none)");
        match &self.plan.action {
            PlanAction::Create => writeln!(writer, "+ create certificate")?,
            PlanAction::Replace { reasons } => {
                writeln!(writer, "-/+ replace certificate {subject}")?;
                for reason in reasons {
                    writeln!(writer, "    forced by {reason}")?;
                }
            }
            PlanAction::Update => writeln!(writer, "~ update certificate {subject} in place")?,
            PlanAction::NoOp => writeln!(writer, "No changes. Certificate {subject} is up to date.")?,
        }
        Ok(())
    }
}

/// Result of `apply`.
#[derive(Debug, Clone, Serialize)]
pub struct ApplyReport {
    /// The executed plan.
    pub plan: PlanReport,
    /// Resulting record.
    pub certificate: CertificateSummary,
}

impl TableDisplay for ApplyReport {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        self.plan.write_table(writer)?;
        writeln!(writer)?;
        self.certificate.write_table(writer)
    }
}

/// Fields of a signed certificate.
#[derive(Debug, Clone, Serialize)]
pub struct CertificateDetails {
    /// Decimal serial number.
    pub serial: String,
    /// Identifier embedded in the certificate.
    pub key_id: String,
    /// Host or user.
    pub kind: String,
    /// Principals.
    pub valid_principals: Vec<String>,
    /// Start of validity.
    pub valid_after: String,
    /// End of validity.
    pub valid_before: String,
    /// Critical option names.
    pub critical_options: Vec<String>,
    /// Extension names.
    pub extensions: Vec<String>,
    /// Fingerprint of the certified key.
    pub public_key_fingerprint: String,
    /// Fingerprint of the signing CA key.
    pub signature_key_fingerprint: String,
}

impl From<&IssuedCertificate> for CertificateDetails {
    fn from(issued: &IssuedCertificate) -> Self {
        Self {
            serial: issued.serial().to_string(),
            key_id: issued.key_id().to_string(),
            kind: issued.kind().to_string(),
            valid_principals: issued.valid_principals().to_vec(),
            valid_after: issued.validity_start_time(),
            valid_before: issued.validity_end_time(),
            critical_options: issued.critical_option_names(),
            extensions: issued.extension_names(),
            public_key_fingerprint: issued.public_key_fingerprint().to_string(),
            signature_key_fingerprint: issued.signature_key_fingerprint().to_string(),
        }
    }
}

impl TableDisplay for CertificateDetails {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        writeln!(writer, "Serial:           {}", self.serial)?;
        writeln!(writer, "Key ID:           {}", self.key_id)?;
        writeln!(writer, "Type:             {}", self.kind)?;
        writeln!(writer, "Valid:            {} to {}", self.valid_after, self.valid_before)?;
        writeln!(writer, "Public Key:       {}", self.public_key_fingerprint)?;
        writeln!(writer, "Signing CA:       {}", self.signature_key_fingerprint)?;
        write_list(writer, "Principals", &self.valid_principals)?;
        write_list(writer, "Critical Options", &self.critical_options)?;
        write_list(writer, "Extensions", &self.extensions)?;
        Ok(())
    }
}

fn write_list<W: Write>(writer: &mut W, title: &str, items: &[String]) -> Result<(), CliError> {
    if items.is_empty() {
        writeln!(writer, "{title}: None")?;
        return Ok(());
    }
    writeln!(writer, "{title}:")?;
    for item in items {
        writeln!(writer, "  {item}")?;
    }
    Ok(())
}

fn or_dash(value: Option<&str>) -> &str {
    value.unwrap_or("-")
}

fn yes_no(value: Option<bool>) -> &'static str {
    match value {
        Some(true) => "yes",
        Some(false) => "no",
        None => "unknown",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sshcert_pki::ReplaceReason;

    fn summary() -> CertificateSummary {
        CertificateSummary {
            id: "42".into(),
            key_id: "testUser".into(),
            ca_key_algorithm: Some("ECDSA".into()),
            validity_start_time: Some("2023-01-01T12:00:00Z".into()),
            validity_end_time: Some("2023-01-01T13:00:00Z".into()),
            ready_for_renewal: Some(false),
            cert_authorized_key: Some("ssh-ed25519-cert-v01@openssh.com AAAA\n".into()),
        }
    }

    fn render<T: Serialize + TableDisplay>(fmt: &OutputFormat, value: &T) -> String {
        let mut buf = Vec::new();
        fmt.write(&mut buf, value).expect("should format");
        String::from_utf8(buf).expect("valid UTF-8")
    }

    #[test]
    fn output_format_default_is_table() {
        let output = render(&OutputFormat::default(), &summary());
        assert!(output.starts_with("Certificate 42"));
    }

    #[test]
    fn json_output_ends_with_newline() {
        let output = render(&OutputFormat::new(Format::Json), &summary());
        assert!(output.starts_with('{'));
        assert!(output.ends_with("}\n"));
    }

    #[test]
    fn summary_table_output() {
        let fmt = OutputFormat::new(Format::Table);
        let output = render(&fmt, &summary());

        assert!(output.contains("Certificate 42"));
        assert!(output.contains("CA Key Algorithm:   ECDSA"));
        assert!(output.contains("Valid Until:        2023-01-01T13:00:00Z"));
        assert!(output.contains("Ready For Renewal:  no"));
        assert!(output.ends_with("AAAA\n"));
    }

    #[test]
    fn summary_json_output() {
        let fmt = OutputFormat::new(Format::Json);
        let output = render(&fmt, &summary());
        let value: serde_json::Value = serde_json::from_str(&output).expect("valid JSON");

        assert_eq!(value["id"], "42");
        assert_eq!(value["ready_for_renewal"], false);
        assert!(value.get("ca_private_key_pem").is_none());
    }

    #[test]
    fn summary_of_imported_record() {
        let state = CertificateState::imported("7");
        let fmt = OutputFormat::new(Format::Table);
        let output = render(&fmt, &CertificateSummary::from(&state));

        assert!(output.contains("Valid From:         -"));
        assert!(output.contains("Ready For Renewal:  unknown"));
    }

    #[test]
    fn plan_replace_lists_reasons() {
        let report = PlanReport {
            id: Some("42".into()),
            plan: Plan {
                action: PlanAction::Replace {
                    reasons: vec![ReplaceReason::ReadyForRenewal, ReplaceReason::Extensions],
                },
                ready_for_renewal: None,
            },
        };
        let output = render(&OutputFormat::default(), &report);

        assert!(output.contains("-/+ replace certificate 42"));
        assert!(output.contains("forced by ready_for_renewal"));
        assert!(output.contains("forced by extensions"));
    }

    #[test]
    fn plan_noop_table_output() {
        let report = PlanReport {
            id: Some("42".into()),
            plan: Plan {
                action: PlanAction::NoOp,
                ready_for_renewal: Some(false),
            },
        };
        let output = render(&OutputFormat::default(), &report);
        assert!(output.contains("No changes"));
    }

    #[test]
    fn plan_json_output_is_flat() {
        let report = PlanReport {
            id: None,
            plan: Plan {
                action: PlanAction::Create,
                ready_for_renewal: None,
            },
        };
        let output = render(&OutputFormat::new(Format::Json), &report);
        let value: serde_json::Value = serde_json::from_str(&output).expect("valid JSON");
        assert_eq!(value["action"], "create");
    }

    #[test]
    fn empty_lists_show_none() {
        let mut out = Vec::new();
        write_list(&mut out, "Principals", &[]).expect("should write");
        assert_eq!(String::from_utf8(out).expect("utf-8"), "Principals: None\n");
    }
}
