//! Currency amounts.
//!
//! [`Hbar`] is a signed count of tinybars. Signed because a transfer leg is
//! a balance change: debits are negative. Everything fee-related is integer
//! tinybar arithmetic; the decimal hbar form exists only at the edges
//! (parsing user input, printing).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, Neg, Sub};
use std::str::FromStr;
use thiserror::Error;

use crate::config::{HBAR_DECIMALS, TINYBARS_PER_HBAR};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AmountError {
    #[error("invalid hbar amount {0:?}")]
    Invalid(String),

    #[error("hbar amount {0:?} has more than 8 fractional digits")]
    TooPrecise(String),

    #[error("hbar amount {0:?} is out of range")]
    OutOfRange(String),
}

/// A signed amount of the ledger's native currency, stored in tinybars.
///
/// The whole hbar supply (50 billion ℏ, 5 × 10^18 tinybars) fits in an
/// `i64`, so real balances never approach the bounds. The operators
/// saturate at `i64::MIN`/`i64::MAX` rather than wrap or panic; use
/// [`checked_add`](Self::checked_add) and [`checked_sub`](Self::checked_sub)
/// where an out-of-range result must be detected.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Hbar(i64);

impl Hbar {
    pub const ZERO: Hbar = Hbar(0);

    pub const fn from_tinybars(tinybars: i64) -> Self {
        Self(tinybars)
    }

    /// Whole hbars. Saturates instead of overflowing.
    pub const fn from_hbar(hbar: i64) -> Self {
        Self(hbar.saturating_mul(TINYBARS_PER_HBAR))
    }

    pub const fn to_tinybars(self) -> i64 {
        self.0
    }

    /// Display value in hbars. Lossy above 2^53 tinybars; never use it for
    /// arithmetic.
    pub fn to_hbar_f64(self) -> f64 {
        self.0 as f64 / TINYBARS_PER_HBAR as f64
    }

    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }

    pub const fn checked_add(self, rhs: Hbar) -> Option<Hbar> {
        match self.0.checked_add(rhs.0) {
            Some(sum) => Some(Hbar(sum)),
            None => None,
        }
    }

    pub const fn checked_sub(self, rhs: Hbar) -> Option<Hbar> {
        match self.0.checked_sub(rhs.0) {
            Some(difference) => Some(Hbar(difference)),
            None => None,
        }
    }
}

impl Add for Hbar {
    type Output = Hbar;

    fn add(self, rhs: Hbar) -> Hbar {
        Hbar(self.0.saturating_add(rhs.0))
    }
}

impl Sub for Hbar {
    type Output = Hbar;

    fn sub(self, rhs: Hbar) -> Hbar {
        Hbar(self.0.saturating_sub(rhs.0))
    }
}

impl Neg for Hbar {
    type Output = Hbar;

    fn neg(self) -> Hbar {
        Hbar(self.0.saturating_neg())
    }
}

impl Sum for Hbar {
    fn sum<I: Iterator<Item = Hbar>>(iter: I) -> Hbar {
        iter.fold(Hbar::ZERO, Add::add)
    }
}

impl<'a> Sum<&'a Hbar> for Hbar {
    fn sum<I: Iterator<Item = &'a Hbar>>(iter: I) -> Hbar {
        iter.copied().sum()
    }
}

impl fmt::Display for Hbar {
    /// Decimal hbars with trailing zeros trimmed: `12.5`, `-0.01`, `1000`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let whole = abs / TINYBARS_PER_HBAR as u64;
        let frac = abs % TINYBARS_PER_HBAR as u64;
        if frac == 0 {
            return write!(f, "{sign}{whole}");
        }
        let digits = format!("{:0width$}", frac, width = HBAR_DECIMALS as usize);
        write!(f, "{sign}{whole}.{}", digits.trim_end_matches('0'))
    }
}

impl FromStr for Hbar {
    type Err = AmountError;

    /// Parses a decimal hbar amount such as `"12.5"` or `"-0.00000001"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || AmountError::Invalid(s.to_string());
        let out_of_range = || AmountError::OutOfRange(s.to_string());

        let trimmed = s.trim();
        let (negative, unsigned) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed),
        };
        let (whole, frac) = unsigned.split_once('.').unwrap_or((unsigned, ""));

        let all_digits = |part: &str| part.chars().all(|c| c.is_ascii_digit());
        if (whole.is_empty() && frac.is_empty()) || !all_digits(whole) || !all_digits(frac) {
            return Err(invalid());
        }
        if frac.len() > HBAR_DECIMALS as usize {
            return Err(AmountError::TooPrecise(s.to_string()));
        }

        let whole: i64 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| out_of_range())?
        };
        let frac: i64 = if frac.is_empty() {
            0
        } else {
            let padded = format!("{:0<width$}", frac, width = HBAR_DECIMALS as usize);
            padded.parse().map_err(|_| invalid())?
        };

        let tinybars = whole
            .checked_mul(TINYBARS_PER_HBAR)
            .and_then(|t| t.checked_add(frac))
            .ok_or_else(out_of_range)?;
        Ok(Hbar(if negative { -tinybars } else { tinybars }))
    }
}
