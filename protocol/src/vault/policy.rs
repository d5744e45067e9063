//! Password rules enforced when a user registers.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::{MAX_PASSWORD_LENGTH, MIN_PASSWORD_LENGTH};

static ALPHANUMERIC: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9]+$").expect("static regex"));

/// A single rule a candidate password broke.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyViolation {
    TooShort,
    TooLong,
    NotAlphanumeric,
    MissingUppercase,
    MissingLowercase,
    MissingDigit,
}

impl fmt::Display for PolicyViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::TooShort => "too short",
            Self::TooLong => "too long",
            Self::NotAlphanumeric => "only letters and digits are allowed",
            Self::MissingUppercase => "needs an uppercase letter",
            Self::MissingLowercase => "needs a lowercase letter",
            Self::MissingDigit => "needs a digit",
        };
        f.write_str(s)
    }
}

/// Length bounds plus the character-class rules.
///
/// Length is counted in characters, not bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PasswordPolicy {
    pub min_length: usize,
    pub max_length: usize,
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self {
            min_length: MIN_PASSWORD_LENGTH,
            max_length: MAX_PASSWORD_LENGTH,
        }
    }
}

impl PasswordPolicy {
    /// Every rule `password` breaks, in a stable order. Empty means accepted.
    pub fn violations(&self, password: &str) -> Vec<PolicyViolation> {
        let mut out = Vec::new();
        let len = password.chars().count();
        if len < self.min_length {
            out.push(PolicyViolation::TooShort);
        }
        if len > self.max_length {
            out.push(PolicyViolation::TooLong);
        }
        if !ALPHANUMERIC.is_match(password) {
            out.push(PolicyViolation::NotAlphanumeric);
        }
        if !password.chars().any(|c| c.is_ascii_uppercase()) {
            out.push(PolicyViolation::MissingUppercase);
        }
        if !password.chars().any(|c| c.is_ascii_lowercase()) {
            out.push(PolicyViolation::MissingLowercase);
        }
        if !password.chars().any(|c| c.is_ascii_digit()) {
            out.push(PolicyViolation::MissingDigit);
        }
        out
    }

    pub fn accepts(&self, password: &str) -> bool {
        self.violations(password).is_empty()
    }
}
