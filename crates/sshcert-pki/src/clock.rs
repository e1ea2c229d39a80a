//! Clock capability used for issuance and renewal decisions.

use std::fmt;

use chrono::{DateTime, Utc};

use crate::error::{Error, Result};

/// Source of the current instant.
pub trait Clock: fmt::Debug + Send + Sync {
    /// Returns the current instant.
    fn now(&self) -> DateTime<Utc>;
}

/// Reads the real system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Always reports the same instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(DateTime<Utc>);

impl FixedClock {
    /// Pins the clock to `at`.
    #[must_use]
    pub const fn new(at: DateTime<Utc>) -> Self {
        Self(at)
    }

    /// Pins the clock to an RFC 3339 instant.
    ///
    /// # Errors
    ///
    /// Returns an error if `value` is not RFC 3339.
    pub fn parse(value: &str) -> Result<Self> {
        DateTime::parse_from_rfc3339(value)
            .map(|at| Self(at.with_timezone(&Utc)))
            .map_err(|e| Error::TimestampParse {
                value: value.to_string(),
                message: e.to_string(),
            })
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}
