//! The consensus-network seam.
//!
//! Executing, signing and paying for transactions belongs to the ledger's
//! own SDK, which this crate treats as a remote service with a typed
//! request/response contract. [`LedgerNetwork`] is that contract; the swap
//! engine only ever talks to it through a trait object.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::crypto::keys::Credentials;
use crate::ledger::amount::Hbar;
use crate::ledger::ids::{ScheduleId, TokenId, TransactionId};
use crate::ledger::proto::SchedulableTransactionBody;

/// Final status reported in a receipt or by a failed precheck.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReceiptStatus {
    Success,
    /// The signer's signature was already on the schedule, or isn't required.
    NoNewValidSignatures,
    ScheduleAlreadyExecuted,
    ScheduleAlreadyDeleted,
    InvalidScheduleId,
    InvalidSignature,
    PayerAccountNotFound,
    InsufficientTxFee,
    TokenAlreadyAssociatedToAccount,
    ReceiptNotFound,
}

impl ReceiptStatus {
    /// Statuses a counter-signature may legitimately hit when two parties
    /// race on the same schedule. None of them means the local trade is wrong.
    pub fn is_benign_sign_rejection(&self) -> bool {
        matches!(
            self,
            Self::NoNewValidSignatures | Self::ScheduleAlreadyExecuted
        )
    }

    /// The network's own spelling, e.g. `NO_NEW_VALID_SIGNATURES`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "SUCCESS",
            Self::NoNewValidSignatures => "NO_NEW_VALID_SIGNATURES",
            Self::ScheduleAlreadyExecuted => "SCHEDULE_ALREADY_EXECUTED",
            Self::ScheduleAlreadyDeleted => "SCHEDULE_ALREADY_DELETED",
            Self::InvalidScheduleId => "INVALID_SCHEDULE_ID",
            Self::InvalidSignature => "INVALID_SIGNATURE",
            Self::PayerAccountNotFound => "PAYER_ACCOUNT_NOT_FOUND",
            Self::InsufficientTxFee => "INSUFFICIENT_TX_FEE",
            Self::TokenAlreadyAssociatedToAccount => "TOKEN_ALREADY_ASSOCIATED_TO_ACCOUNT",
            Self::ReceiptNotFound => "RECEIPT_NOT_FOUND",
        }
    }
}

impl fmt::Display for ReceiptStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors surfaced by a [`LedgerNetwork`] implementation.
#[derive(Debug, Clone, Error)]
pub enum LedgerError {
    /// The network refused the transaction with a specific status.
    #[error("transaction rejected: {status}")]
    Rejected {
        status: ReceiptStatus,
        transaction_id: Option<TransactionId>,
    },

    /// The network could not be reached or answered nonsense.
    #[error("ledger transport error: {0}")]
    Transport(String),
}

/// What the first party submits to open a swap.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleCreateRequest {
    /// The transfer to run once every required party has signed.
    pub scheduled: SchedulableTransactionBody,
    /// Memo on the schedule entity itself.
    pub schedule_memo: String,
    /// Fee ceiling for the create transaction.
    pub max_transaction_fee: Hbar,
}

/// Receipt of a transaction that reached consensus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionReceipt {
    pub status: ReceiptStatus,
    pub transaction_id: TransactionId,
    /// Set for schedule-create receipts.
    pub schedule_id: Option<ScheduleId>,
    /// The inner transaction's id, set once a schedule exists.
    pub scheduled_transaction_id: Option<TransactionId>,
}

/// The remote ledger, as far as the swap engine is concerned.
///
/// Every call is an independent submission. None of them are safe to retry
/// blindly: resubmitting a create opens a second, unrelated schedule.
#[async_trait]
pub trait LedgerNetwork: Send + Sync {
    /// Submits a schedule-create signed by `operator`, who also pays for it.
    async fn create_schedule(
        &self,
        operator: &Credentials,
        request: ScheduleCreateRequest,
    ) -> Result<TransactionReceipt, LedgerError>;

    /// Adds `signer`'s signature to an existing schedule.
    async fn sign_schedule(
        &self,
        signer: &Credentials,
        schedule: ScheduleId,
    ) -> Result<TransactionReceipt, LedgerError>;

    /// Associates `token` with the signer's account so it can receive it.
    async fn associate_token(
        &self,
        account: &Credentials,
        token: TokenId,
    ) -> Result<TransactionReceipt, LedgerError>;

    /// Looks up the receipt of a previously submitted transaction.
    async fn get_receipt(
        &self,
        operator: &Credentials,
        transaction_id: TransactionId,
    ) -> Result<TransactionReceipt, LedgerError>;
}
