//! Certificate lifecycle: create, read, plan and apply.
//!
//! [`CertResource`] drives one certificate record through its lifecycle.
//! Planning only decides; nothing is signed until [`CertResource::apply`]
//! executes the plan.

use std::fmt;

use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::ca::CertificateAuthority;
use crate::clock::Clock;
use crate::error::{Error, Result};
use crate::keys::parse_public_key_openssh;
use crate::renewal::{RenewalState, evaluate_stored};
use crate::state::{CertificateConfig, CertificateState};
use crate::template::build_template;
use crate::types::CertKind;
use crate::validation::ca_key_change_requires_replace;

/// Why a certificate has to be reissued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplaceReason {
    /// The early-renewal instant has been reached.
    ReadyForRenewal,
    /// The CA private key changed.
    CaPrivateKeyPem,
    /// The certified public key changed.
    PublicKeyOpenssh,
    /// The validity period changed.
    ValidityPeriodHours,
    /// The principals changed.
    ValidPrincipals,
    /// The critical options changed.
    CriticalOptions,
    /// The extensions changed.
    Extensions,
}

impl ReplaceReason {
    /// Returns the name of the field that triggered the replacement.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::ReadyForRenewal => "ready_for_renewal",
            Self::CaPrivateKeyPem => "ca_private_key_pem",
            Self::PublicKeyOpenssh => "public_key_openssh",
            Self::ValidityPeriodHours => "validity_period_hours",
            Self::ValidPrincipals => "valid_principals",
            Self::CriticalOptions => "critical_options",
            Self::Extensions => "extensions",
        }
    }
}

impl fmt::Display for ReplaceReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What applying a plan will do.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum PlanAction {
    /// No certificate exists yet; issue one.
    Create,
    /// Discard the certificate and issue a new one.
    Replace {
        /// Fields that forced the replacement.
        reasons: Vec<ReplaceReason>,
    },
    /// Copy the new configuration into the record without signing.
    Update,
    /// Nothing to do.
    NoOp,
}

/// Outcome of planning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    /// Planned action.
    #[serde(flatten)]
    pub action: PlanAction,
    /// Planned renewal flag; `None` when it will be recomputed.
    pub ready_for_renewal: Option<bool>,
}

impl Plan {
    /// Returns `true` if applying the plan signs a new certificate.
    #[must_use]
    pub const fn requires_signing(&self) -> bool {
        matches!(self.action, PlanAction::Create | PlanAction::Replace { .. })
    }

    /// Returns `true` if applying the plan changes nothing.
    #[must_use]
    pub const fn is_noop(&self) -> bool {
        matches!(self.action, PlanAction::NoOp)
    }
}

/// Lifecycle driver for host or user certificates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CertResource {
    kind: CertKind,
}

impl CertResource {
    /// Creates a driver for certificates of `kind`.
    #[must_use]
    pub const fn new(kind: CertKind) -> Self {
        Self { kind }
    }

    /// Creates a host certificate driver.
    #[must_use]
    pub const fn host() -> Self {
        Self::new(CertKind::Host)
    }

    /// Creates a user certificate driver.
    #[must_use]
    pub const fn user() -> Self {
        Self::new(CertKind::User)
    }

    /// Returns the certificate kind.
    #[must_use]
    pub const fn kind(&self) -> CertKind {
        self.kind
    }

    /// Issues a certificate from `config`.
    ///
    /// Issuance either fully succeeds or fails without producing a record.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid, a key does not
    /// parse, or signing fails.
    pub fn create<R>(
        &self,
        config: &CertificateConfig,
        clock: &dyn Clock,
        rng: &mut R,
    ) -> Result<CertificateState>
    where
        R: RngCore + CryptoRng + ?Sized,
    {
        let request = config.to_request()?;
        let ca = CertificateAuthority::from_pem(&config.ca_private_key_pem)?;
        let target = parse_public_key_openssh(&config.public_key_openssh)?;

        let template = build_template(&request, self.kind, clock, rng)?;
        let issued = ca.sign(&template, &target, rng)?;

        Ok(CertificateState::issued(config.clone(), ca.algorithm(), &issued))
    }

    /// Refreshes the renewal flag of a stored record.
    ///
    /// Never signs and never decides replacement.
    ///
    /// # Errors
    ///
    /// Returns an error if the stored end time or lead time is invalid.
    pub fn read(&self, state: &CertificateState, clock: &dyn Clock) -> Result<CertificateState> {
        let hours = state.config.early_renewal_hours()?;
        let mut refreshed = state.clone();

        if let Some(decision) = evaluate_stored(state.validity_end_time.as_deref(), hours, clock)? {
            refreshed.ready_for_renewal = Some(decision.is_ready());
        }

        Ok(refreshed)
    }

    /// Plans the transition from `prior` to `config`.
    ///
    /// The early-renewal lead time comes from `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if `config` is invalid or the stored end time is
    /// malformed.
    pub fn plan(
        &self,
        prior: Option<&CertificateState>,
        config: &CertificateConfig,
        clock: &dyn Clock,
    ) -> Result<Plan> {
        config.validate()?;

        let Some(prior) = prior else {
            return Ok(Plan {
                action: PlanAction::Create,
                ready_for_renewal: None,
            });
        };

        let mut reasons = Vec::new();
        let mut ready_for_renewal = prior.ready_for_renewal;

        let renewal = evaluate_stored(
            prior.validity_end_time.as_deref(),
            config.early_renewal_hours()?,
            clock,
        )?;
        if renewal == Some(RenewalState::ReadyForRenewal) {
            reasons.push(ReplaceReason::ReadyForRenewal);
            ready_for_renewal = None;
        }

        let old = &prior.config;
        if ca_key_change_requires_replace(&old.ca_private_key_pem, &config.ca_private_key_pem) {
            reasons.push(ReplaceReason::CaPrivateKeyPem);
        }
        if old.public_key_openssh != config.public_key_openssh {
            reasons.push(ReplaceReason::PublicKeyOpenssh);
        }
        if old.validity_period_hours != config.validity_period_hours {
            reasons.push(ReplaceReason::ValidityPeriodHours);
        }
        if old.valid_principals != config.valid_principals {
            reasons.push(ReplaceReason::ValidPrincipals);
        }
        if old.critical_options != config.critical_options {
            reasons.push(ReplaceReason::CriticalOptions);
        }
        if old.extensions != config.extensions {
            reasons.push(ReplaceReason::Extensions);
        }

        // An imported record has nothing signed to keep.
        if prior.cert_authorized_key.is_none() && reasons.is_empty() {
            return Ok(Plan {
                action: PlanAction::Create,
                ready_for_renewal: None,
            });
        }

        let action = if reasons.is_empty() {
            if old.key_id == config.key_id && old.early_renewal_hours == config.early_renewal_hours {
                PlanAction::NoOp
            } else {
                PlanAction::Update
            }
        } else {
            PlanAction::Replace { reasons }
        };

        debug!(id = %prior.id, kind = %self.kind, ?action, "planned certificate");

        Ok(Plan {
            action,
            ready_for_renewal,
        })
    }

    /// Executes `plan`, signing a new certificate when it calls for one.
    ///
    /// # Errors
    ///
    /// Returns an error if issuance fails, or if the plan keeps a record
    /// that does not exist.
    pub fn apply<R>(
        &self,
        plan: &Plan,
        prior: Option<&CertificateState>,
        config: &CertificateConfig,
        clock: &dyn Clock,
        rng: &mut R,
    ) -> Result<CertificateState>
    where
        R: RngCore + CryptoRng + ?Sized,
    {
        match (&plan.action, prior) {
            (PlanAction::Create, _) => self.create(config, clock, rng),
            (PlanAction::Replace { reasons }, _) => {
                let state = self.create(config, clock, rng)?;
                info!(
                    previous = prior.map_or("", |p| p.id.as_str()),
                    id = %state.id,
                    reasons = ?reasons,
                    "replaced certificate"
                );
                Ok(state)
            }
            (PlanAction::Update, Some(prior)) => {
                config.validate()?;
                let mut state = prior.clone();
                state.config = config.clone();
                Ok(state)
            }
            (PlanAction::NoOp, Some(prior)) => Ok(prior.clone()),
            (PlanAction::Update | PlanAction::NoOp, None) => Err(Error::Validation(
                "plan keeps a certificate, but no certificate is recorded".into(),
            )),
        }
    }
}
