//! SSH certificate authority error types.

use thiserror::Error;

use crate::types::PemPreamble;

/// Result type for certificate authority operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Certificate authority error variants.
///
/// Every variant is terminal for the operation that produced it; nothing in
/// this crate retries or substitutes a default value.
#[derive(Debug, Error)]
pub enum Error {
    /// No PEM block could be decoded from the supplied key text.
    #[error(
        "failed to decode PEM block: decoded bytes {consumed}, undecoded {remaining}: {message}"
    )]
    MalformedPem {
        /// Bytes consumed before decoding gave up.
        consumed: usize,
        /// Bytes left undecoded.
        remaining: usize,
        /// Underlying decoder message.
        message: String,
    },

    /// PEM header is not one of the recognized preambles.
    #[error("unsupported PEM preamble/type: {0}")]
    UnsupportedPreamble(String),

    /// PEM header is recognized, but it does not carry a private key.
    #[error("unable to determine parser for PEM preamble: {0}")]
    NoParserForPreamble(PemPreamble),

    /// Binary decoding of the key body failed.
    #[error("failed to parse private key given PEM preamble '{preamble}': {message}")]
    KeyDecode {
        /// Preamble of the block being decoded.
        preamble: PemPreamble,
        /// Underlying decoder message.
        message: String,
    },

    /// The decoded key is not RSA, ECDSA or Ed25519.
    #[error("unsupported private key type: {0}")]
    UnsupportedKeyType(String),

    /// The CA key could not be turned into an SSH signing key.
    #[error("failed to create signer with private key: {0}")]
    SignerConstruction(String),

    /// Signing the certificate failed.
    #[error("failed to sign certificate: {0}")]
    Signing(String),

    /// A stored validity timestamp could not be parsed.
    #[error("failed to parse data from string: {value}: {message}")]
    TimestampParse {
        /// The offending stored value.
        value: String,
        /// Underlying parser message.
        message: String,
    },

    /// The secure random source failed.
    #[error("random source exhausted: {0}")]
    RandomSourceExhausted(String),

    /// The public key to certify is not a valid authorized-key line.
    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),

    /// An issued certificate could not be parsed.
    #[error("certificate parsing failed: {0}")]
    Parse(String),

    /// Input rejected at the validation boundary.
    #[error("validation failed: {0}")]
    Validation(String),

    /// The signed certificate could not be serialized.
    #[error("serialization failed: {0}")]
    Serialization(String),
}
