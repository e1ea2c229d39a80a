//! SSH certificate authority.
#![forbid(unsafe_code)]
//!
//! This crate signs short-lived SSH host and user certificates with a
//! supplied CA private key and decides when an issued certificate is due
//! for reissuance.
//!
//! # Overview
//!
//! The `sshcert-pki` crate provides:
//! - CA private key parsing from PKCS#1, SEC1 and PKCS#8 PEM documents
//! - Certificate templates with a random serial and an hour-based validity window
//! - Signing of a target public key into an authorized-key certificate line
//! - Renewal evaluation against an injected clock
//! - A certificate record and a create / read / plan / apply lifecycle
//!
//! # Example
//!
//! ```
//! use sshcert_pki::{evaluate, FixedClock, Clock, RenewalState};
//!
//! let clock = FixedClock::parse("2023-01-01T12:00:00Z").unwrap();
//! let end = clock.now() + chrono::Duration::hours(10);
//!
//! // Ten hours left, renew two hours early: still fresh.
//! assert_eq!(evaluate(end, 2, clock.now()), RenewalState::Fresh);
//!
//! // Nine hours in, the early-renewal window has opened.
//! let later = clock.now() + chrono::Duration::hours(9);
//! assert!(evaluate(end, 2, later).is_ready());
//! ```
//!
//! # Modules
//!
//! - [`keys`] - CA private key parsing
//! - [`template`] - Certificate template construction
//! - [`ca`] - Certificate Authority signing
//! - [`renewal`] - Renewal evaluation
//! - [`state`] - Configuration and certificate record
//! - [`resource`] - Certificate lifecycle
//! - [`validation`] - Input validation
//! - [`clock`] - Clock capability
//! - [`types`] - Core types (`CertificateTemplate`, `IssuedCertificate`, etc.)
//! - [`error`] - Error types

pub mod ca;
pub mod clock;
pub mod error;
pub mod keys;
pub mod renewal;
pub mod resource;
pub mod state;
pub mod template;
pub mod types;
pub mod validation;

// Re-export commonly used types at crate root
pub use ca::CertificateAuthority;
pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{Error, Result};
pub use keys::{DecodedKey, EcdsaCurve, EcdsaKey, parse_private_key_pem, parse_public_key_openssh};
pub use renewal::{RenewalState, evaluate, evaluate_stored, parse_validity_end_time};
pub use resource::{CertResource, Plan, PlanAction, ReplaceReason};
pub use state::{CertificateConfig, CertificateState};
pub use template::{build_template, random_serial};
pub use types::{
    Algorithm, CertKind, CertificateRequest, CertificateRequestBuilder, CertificateTemplate,
    IssuedCertificate, PemPreamble, SerialNumber, format_rfc3339,
};
pub use validation::{ca_key_change_requires_replace, is_pem_document};
