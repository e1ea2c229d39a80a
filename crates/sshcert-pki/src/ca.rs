//! SSH Certificate Authority implementation.

use rand::{CryptoRng, RngCore};
use rsa::RsaPrivateKey;
use rsa::pkcs1v15;
use rsa::signature::{SignatureEncoding, Signer};
use sha2::Sha512;
use ssh_key::certificate::Builder;
use ssh_key::private::{EcdsaKeypair, Ed25519Keypair, KeypairData};
use ssh_key::public::{KeyData, RsaPublicKey};
use ssh_key::{HashAlg, PrivateKey, PublicKey, Signature};
use tracing::{debug, info};
use zeroize::Zeroizing;

use crate::error::{Error, Result};
use crate::keys::{DecodedKey, EcdsaKey, parse_private_key_pem};
use crate::types::{Algorithm, CertificateTemplate, IssuedCertificate};

/// Nonce length written into every certificate.
const NONCE_LEN: usize = 32;

/// Certificate Authority holding a CA key as an SSH signing key.
pub struct CertificateAuthority {
    /// Signing key.
    signer: CaSigner,
    /// CA public key as embedded in issued certificates.
    public_key: PublicKey,
    /// Algorithm of the CA key.
    algorithm: Algorithm,
}

/// Key that produces the CA signature.
enum CaSigner {
    /// ECDSA and Ed25519 keys, signed natively by `ssh-key`.
    Native(PrivateKey),
    /// RSA keys, signed with `rsa-sha2-512`.
    Rsa(RsaSigner),
}

impl CaSigner {
    fn native(keypair: KeypairData) -> Result<Self> {
        PrivateKey::new(keypair, "")
            .map(Self::Native)
            .map_err(|e| Error::SignerConstruction(e.to_string()))
    }
}

/// RSA signing key emitting `rsa-sha2-512` signatures.
struct RsaSigner {
    signing_key: pkcs1v15::SigningKey<Sha512>,
    public: KeyData,
}

impl RsaSigner {
    fn new(key: RsaPrivateKey) -> Result<Self> {
        let public = RsaPublicKey::try_from(&key.to_public_key())
            .map(KeyData::Rsa)
            .map_err(|e| Error::SignerConstruction(e.to_string()))?;

        Ok(Self {
            signing_key: pkcs1v15::SigningKey::new(key),
            public,
        })
    }
}

impl Signer<Signature> for RsaSigner {
    fn try_sign(&self, message: &[u8]) -> rsa::signature::Result<Signature> {
        let data = self.signing_key.try_sign(message)?.to_vec();
        Signature::new(
            ssh_key::Algorithm::Rsa {
                hash: Some(HashAlg::Sha512),
            },
            data,
        )
        .map_err(|_| rsa::signature::Error::new())
    }
}

impl From<&RsaSigner> for KeyData {
    fn from(signer: &RsaSigner) -> Self {
        signer.public.clone()
    }
}

impl CertificateAuthority {
    /// Creates a Certificate Authority from PEM text.
    ///
    /// # Errors
    ///
    /// Returns an error if the key does not parse or cannot sign.
    pub fn from_pem(pem: &str) -> Result<Self> {
        let (key, _) = parse_private_key_pem(pem.as_bytes())?;
        Self::from_key(key)
    }

    /// Creates a Certificate Authority from a decoded key.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SignerConstruction`] if the key cannot be used as an
    /// SSH signing key.
    pub fn from_key(key: DecodedKey) -> Result<Self> {
        let algorithm = key.algorithm();
        let signer = match key {
            DecodedKey::Rsa(rsa_key) => CaSigner::Rsa(RsaSigner::new(*rsa_key)?),
            DecodedKey::Ecdsa(ecdsa_key) => {
                CaSigner::native(KeypairData::Ecdsa(ecdsa_keypair(ecdsa_key)))?
            }
            DecodedKey::Ed25519(signing_key) => {
                let seed = Zeroizing::new(signing_key.to_bytes());
                CaSigner::native(KeypairData::Ed25519(Ed25519Keypair::from_seed(&seed)))?
            }
        };
        let public_key = match &signer {
            CaSigner::Native(key) => key.public_key().clone(),
            CaSigner::Rsa(key) => PublicKey::new(key.public.clone(), ""),
        };

        debug!(
            %algorithm,
            ssh_algorithm = %public_key.algorithm(),
            "CA signing key ready"
        );

        Ok(Self {
            signer,
            public_key,
            algorithm,
        })
    }

    /// Returns the algorithm of the CA key.
    #[must_use]
    pub const fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    /// Returns the CA public key.
    #[must_use]
    pub const fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    /// Returns the SHA-256 fingerprint of the CA public key.
    #[must_use]
    pub fn fingerprint(&self) -> ssh_key::Fingerprint {
        self.public_key.fingerprint(HashAlg::Sha256)
    }

    /// Signs `template` for `target`, drawing the certificate nonce from
    /// `rng`.
    ///
    /// An empty principal list yields a certificate valid for any principal.
    /// A zero-length validity window is signed as is.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RandomSourceExhausted`] if no nonce can be drawn,
    /// [`Error::Signing`] if the certificate cannot be built or signed, and
    /// [`Error::Serialization`] if it cannot be encoded.
    pub fn sign<R>(
        &self,
        template: &CertificateTemplate,
        target: &PublicKey,
        rng: &mut R,
    ) -> Result<IssuedCertificate>
    where
        R: RngCore + CryptoRng + ?Sized,
    {
        let mut nonce = vec![0u8; NONCE_LEN];
        rng.try_fill_bytes(&mut nonce)
            .map_err(|e| Error::RandomSourceExhausted(format!("failed to generate nonce: {e}")))?;

        let mut builder = Builder::new(
            nonce,
            target.key_data().clone(),
            template.valid_after,
            template.valid_before,
        )
        .map_err(signing)?;

        builder.serial(template.serial.value()).map_err(signing)?;
        builder.key_id(template.key_id.as_str()).map_err(signing)?;
        builder.cert_type(template.kind.into()).map_err(signing)?;

        if template.valid_principals.is_empty() {
            builder.all_principals_valid().map_err(signing)?;
        }
        for principal in &template.valid_principals {
            builder.valid_principal(principal.as_str()).map_err(signing)?;
        }
        for (name, data) in &template.critical_options {
            builder
                .critical_option(name.as_str(), data.as_str())
                .map_err(signing)?;
        }
        for (name, data) in &template.extensions {
            builder
                .extension(name.as_str(), data.as_str())
                .map_err(signing)?;
        }

        let certificate = match &self.signer {
            CaSigner::Native(key) => builder.sign(key),
            CaSigner::Rsa(key) => builder.sign(key),
        }
        .map_err(signing)?;
        let issued = IssuedCertificate::from_certificate(certificate)?;

        info!(
            serial = %issued.serial(),
            key_id = %issued.key_id(),
            kind = %template.kind,
            ca_algorithm = %self.algorithm,
            valid_before = %issued.validity_end_time(),
            "issued SSH certificate"
        );

        Ok(issued)
    }
}

impl std::fmt::Debug for CertificateAuthority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CertificateAuthority")
            .field("algorithm", &self.algorithm)
            .field("fingerprint", &self.fingerprint().to_string())
            .field("signing_key", &"[REDACTED]")
            .finish()
    }
}

fn signing(e: ssh_key::Error) -> Error {
    Error::Signing(e.to_string())
}

fn ecdsa_keypair(key: EcdsaKey) -> EcdsaKeypair {
    match key {
        EcdsaKey::P256(secret) => EcdsaKeypair::NistP256 {
            public: secret.public_key().into(),
            private: secret.into(),
        },
        EcdsaKey::P384(secret) => EcdsaKeypair::NistP384 {
            public: secret.public_key().into(),
            private: secret.into(),
        },
        EcdsaKey::P521(secret) => EcdsaKeypair::NistP521 {
            public: secret.public_key().into(),
            private: secret.into(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::keys::parse_public_key_openssh;
    use crate::template::build_template;
    use crate::types::{CertKind, CertificateRequest, SerialNumber};
    use rand::rngs::OsRng;
    use ssh_key::certificate::CertType;
    use std::collections::BTreeMap;
    use test_case::test_case;

    const RSA_PKCS1: &str = include_str!("../tests/fixtures/rsa_pkcs1.pem");
    const RSA_PKCS8: &str = include_str!("../tests/fixtures/rsa_pkcs8.pem");
    const EC_P256_PKCS8: &str = include_str!("../tests/fixtures/ec_p256_pkcs8.pem");
    const EC_P384_SEC1: &str = include_str!("../tests/fixtures/ec_p384_sec1.pem");
    const EC_P521_SEC1: &str = include_str!("../tests/fixtures/scenario_ca_p521.pem");
    const ED25519_PKCS8: &str = include_str!("../tests/fixtures/ed25519_pkcs8.pem");
    const TARGET_ED25519: &str = include_str!("../tests/fixtures/target_ed25519.pub");
    const TARGET_P521: &str = include_str!("../tests/fixtures/scenario_target_p521.pub");

    fn noon() -> FixedClock {
        FixedClock::parse("2023-01-01T12:00:00Z").unwrap()
    }

    fn request() -> CertificateRequest {
        CertificateRequest::builder("testUser")
            .validity_hours(1)
            .principal("test1.local")
            .principal("test2.local")
            .critical_option("force-command")
            .extension("permit-pty")
            .extension("permit-agent-forwarding")
            .build()
            .unwrap()
    }

    #[test_case(RSA_PKCS1, Algorithm::Rsa ; "rsa")]
    #[test_case(RSA_PKCS8, Algorithm::Rsa ; "rsa pkcs8")]
    #[test_case(EC_P256_PKCS8, Algorithm::Ecdsa ; "p256")]
    #[test_case(EC_P384_SEC1, Algorithm::Ecdsa ; "p384")]
    #[test_case(EC_P521_SEC1, Algorithm::Ecdsa ; "p521")]
    #[test_case(ED25519_PKCS8, Algorithm::Ed25519 ; "ed25519")]
    fn signed_certificate_round_trips(pem: &str, algorithm: Algorithm) {
        let ca = CertificateAuthority::from_pem(pem).unwrap();
        assert_eq!(ca.algorithm(), algorithm);

        let target = parse_public_key_openssh(TARGET_ED25519).unwrap();
        let template = build_template(&request(), CertKind::User, &noon(), &mut OsRng).unwrap();
        let issued = ca.sign(&template, &target, &mut OsRng).unwrap();

        let parsed = IssuedCertificate::from_authorized_key(issued.authorized_key()).unwrap();
        let cert = parsed.certificate();

        assert_eq!(cert.key_id(), "testUser");
        assert_eq!(cert.cert_type(), CertType::User);
        assert_eq!(cert.serial(), template.serial.value());
        assert_eq!(cert.valid_after(), template.valid_after);
        assert_eq!(cert.valid_before(), template.valid_before);
        assert_eq!(cert.valid_principals(), ["test1.local", "test2.local"]);
        let critical: BTreeMap<String, String> = cert
            .critical_options()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        let extensions: BTreeMap<String, String> = cert
            .extensions()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        assert_eq!(critical, template.critical_options);
        assert_eq!(extensions, template.extensions);
        assert_eq!(cert.public_key(), target.key_data());
        assert_eq!(cert.signature_key(), ca.public_key().key_data());
    }

    #[test]
    fn signature_verifies_against_ca_fingerprint() {
        let ca = CertificateAuthority::from_pem(ED25519_PKCS8).unwrap();
        let target = parse_public_key_openssh(TARGET_ED25519).unwrap();
        let template = build_template(&request(), CertKind::Host, &noon(), &mut OsRng).unwrap();
        let issued = ca.sign(&template, &target, &mut OsRng).unwrap();

        let fingerprint = ca.fingerprint();
        issued
            .certificate()
            .validate_at(template.valid_after, [&fingerprint])
            .unwrap();
        assert_eq!(issued.kind(), CertKind::Host);
    }

    #[test_case(RSA_PKCS1 ; "rsa")]
    #[test_case(EC_P256_PKCS8 ; "p256")]
    #[test_case(EC_P521_SEC1 ; "p521")]
    #[test_case(ED25519_PKCS8 ; "ed25519")]
    fn every_ca_algorithm_produces_a_verifiable_signature(pem: &str) {
        let ca = CertificateAuthority::from_pem(pem).unwrap();
        let target = parse_public_key_openssh(TARGET_ED25519).unwrap();
        let template = build_template(&request(), CertKind::User, &noon(), &mut OsRng).unwrap();
        let issued = ca.sign(&template, &target, &mut OsRng).unwrap();

        issued
            .certificate()
            .validate_at(template.valid_after, [&ca.fingerprint()])
            .unwrap();
    }

    #[test]
    fn rsa_ca_signs_with_sha512() {
        let ca = CertificateAuthority::from_pem(RSA_PKCS1).unwrap();
        let target = parse_public_key_openssh(TARGET_ED25519).unwrap();
        let template = build_template(&request(), CertKind::Host, &noon(), &mut OsRng).unwrap();
        let issued = ca.sign(&template, &target, &mut OsRng).unwrap();

        assert_eq!(
            issued.certificate().signature().algorithm(),
            ssh_key::Algorithm::Rsa {
                hash: Some(HashAlg::Sha512)
            }
        );
        assert_eq!(ca.public_key().algorithm(), ssh_key::Algorithm::Rsa { hash: None });
    }

    #[test]
    fn zero_hour_certificate_is_signed() {
        let ca = CertificateAuthority::from_pem(ED25519_PKCS8).unwrap();
        let target = parse_public_key_openssh(TARGET_ED25519).unwrap();
        let request = CertificateRequest::builder("testUser")
            .validity_hours(0)
            .principal("test1.local")
            .build()
            .unwrap();
        let template = build_template(&request, CertKind::User, &noon(), &mut OsRng).unwrap();
        let issued = ca.sign(&template, &target, &mut OsRng).unwrap();

        assert_eq!(issued.validity_start_time(), "2023-01-01T12:00:00Z");
        assert_eq!(issued.validity_start_time(), issued.validity_end_time());
        assert_eq!(issued.certificate().valid_after(), issued.certificate().valid_before());
    }

    #[test]
    fn scenario_p521_user_certificate() {
        let ca = CertificateAuthority::from_pem(EC_P521_SEC1).unwrap();
        let target = parse_public_key_openssh(TARGET_P521).unwrap();
        let template = build_template(&request(), CertKind::User, &noon(), &mut OsRng).unwrap();
        let issued = ca.sign(&template, &target, &mut OsRng).unwrap();

        assert_eq!(issued.validity_start_time(), "2023-01-01T12:00:00Z");
        assert_eq!(issued.validity_end_time(), "2023-01-01T13:00:00Z");
        assert!(
            issued
                .authorized_key()
                .starts_with("ecdsa-sha2-nistp521-cert-v01@openssh.com ")
        );
        assert!(issued.authorized_key().ends_with('\n'));
    }

    #[test]
    fn empty_principals_are_valid_for_everyone() {
        let ca = CertificateAuthority::from_pem(ED25519_PKCS8).unwrap();
        let target = parse_public_key_openssh(TARGET_ED25519).unwrap();
        let request = CertificateRequest::builder("anyone")
            .validity_hours(1)
            .build()
            .unwrap();
        let template = build_template(&request, CertKind::User, &noon(), &mut OsRng).unwrap();
        let issued = ca.sign(&template, &target, &mut OsRng).unwrap();

        assert!(issued.valid_principals().is_empty());
        assert!(issued.certificate().critical_options().is_empty());
        assert!(issued.certificate().extensions().is_empty());
    }

    #[test]
    fn serial_is_reported_in_decimal() {
        let ca = CertificateAuthority::from_pem(ED25519_PKCS8).unwrap();
        let target = parse_public_key_openssh(TARGET_ED25519).unwrap();
        let mut template =
            build_template(&request(), CertKind::User, &noon(), &mut OsRng).unwrap();
        template.serial = SerialNumber::new(12_345_678_901_234_567_890);

        let issued = ca.sign(&template, &target, &mut OsRng).unwrap();
        assert_eq!(issued.serial().to_string(), "12345678901234567890");
    }

    #[test]
    fn ca_debug_redacts_key() {
        let ca = CertificateAuthority::from_pem(ED25519_PKCS8).unwrap();
        let debug = format!("{ca:?}");
        assert!(debug.contains("REDACTED"));
        assert!(debug.contains("SHA256:"));
    }

    #[test]
    fn non_key_pem_cannot_become_a_ca() {
        let pem = include_str!("../tests/fixtures/certificate.pem");
        let err = CertificateAuthority::from_pem(pem).unwrap_err();
        assert!(matches!(err, Error::NoParserForPreamble(_)));
    }
}
