use thiserror::Error;

use crate::ledger::{Hbar, LedgerError, TokenId};

/// Errors raised while building or submitting a trade.
///
/// These are contract violations or network refusals. Expected lookup
/// misses (unknown schedule, bad share code) never end up here; they come
/// back as `None` or an invalid verdict instead.
#[derive(Debug, Clone, Error)]
pub enum TradeError {
    #[error("hbar amount {0} is negative")]
    NegativeHbarAmount(Hbar),

    #[error("hbar amount {amount} does not cover its own fee of {fee}")]
    HbarAmountDoesNotCoverFee { amount: Hbar, fee: Hbar },

    #[error("token quantity must be positive, got {0}")]
    NonPositiveQuantity(i64),

    #[error("NFT serial must be positive, got {0}")]
    InvalidSerial(i64),

    #[error("token {0} is non-fungible; a serial number is required")]
    MissingSerial(TokenId),

    #[error("sender and receiver are the same account")]
    SenderIsReceiver,

    #[error("token {0} could not be resolved on the mirror")]
    UnknownToken(TokenId),

    #[error("schedule-create receipt carried no schedule id")]
    MissingScheduleId,

    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

impl TradeError {
    /// Stable symbolic code for callers that branch on the failure kind.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NegativeHbarAmount(_) => "NEGATIVE_HBAR_AMOUNT",
            Self::HbarAmountDoesNotCoverFee { .. } => "HBAR_AMOUNT_DOES_NOT_COVER_FEE",
            Self::NonPositiveQuantity(_) => "NON_POSITIVE_TOKEN_QUANTITY",
            Self::InvalidSerial(_) => "INVALID_SERIAL",
            Self::MissingSerial(_) => "MISSING_SERIAL",
            Self::SenderIsReceiver => "SENDER_IS_RECEIVER",
            Self::UnknownToken(_) => "UNKNOWN_TOKEN",
            Self::MissingScheduleId => "MISSING_SCHEDULE_ID",
            Self::Ledger(LedgerError::Rejected { status, .. }) => status.as_str(),
            Self::Ledger(LedgerError::Transport(_)) => "LEDGER_UNREACHABLE",
        }
    }
}
