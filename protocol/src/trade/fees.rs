//! # Trade Fees
//!
//! Three tiers, all in tinybars:
//!
//! ```text
//! amount >= 1000 ℏ   → 10 ℏ flat
//! amount == 0        → 0.01 ℏ flat  (pure token/NFT transfer)
//! otherwise          → 1% of amount, rounded down to the tinybar
//! ```
//!
//! The fixed-tier boundary is inclusive: exactly 1000 ℏ pays the flat fee.

use crate::config::{FIXED_FEE, MINIMUM_FIXED, RELATIVE_FEE_PERCENT, ZERO_FEE};
use crate::ledger::Hbar;

/// The tier parameters. [`FeeSchedule::default`] is the schedule every
/// trader uses; other values only exist for tests and what-if tooling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeSchedule {
    pub minimum_fixed: Hbar,
    pub fixed_fee: Hbar,
    pub zero_fee: Hbar,
    pub relative_percent: i64,
}

impl Default for FeeSchedule {
    fn default() -> Self {
        Self {
            minimum_fixed: MINIMUM_FIXED,
            fixed_fee: FIXED_FEE,
            zero_fee: ZERO_FEE,
            relative_percent: RELATIVE_FEE_PERCENT,
        }
    }
}

impl FeeSchedule {
    /// Defined for non-negative amounts. Negative input is rejected by the
    /// transfer builders before a fee is ever computed.
    pub fn fee(&self, amount: Hbar) -> Hbar {
        if amount >= self.minimum_fixed {
            return self.fixed_fee;
        }
        if amount.is_zero() {
            return self.zero_fee;
        }
        Hbar::from_tinybars(amount.to_tinybars() * self.relative_percent / 100)
    }
}

/// The app's fee for a trade moving `amount`, under the standard schedule.
pub fn calculate_fee(amount: Hbar) -> Hbar {
    FeeSchedule::default().fee(amount)
}
