//! # Ledger Vocabulary
//!
//! Types shared by every other module: identifiers, hbar amounts, the
//! protobuf shape of a schedulable transfer, and the trait the swap engine
//! uses to reach the consensus network.
//!
//! ```text
//! ids.rs        — AccountId / TokenId / ScheduleId / TransactionId
//! amount.rs     — Hbar (signed tinybars)
//! proto.rs      — prost messages for SchedulableTransactionBody
//! network.rs    — LedgerNetwork trait, requests and receipts
//! simulated.rs  — in-memory LedgerNetwork
//! ```

pub mod amount;
pub mod ids;
pub mod network;
pub mod proto;
pub mod simulated;

pub use amount::{AmountError, Hbar};
pub use ids::{
    is_legal_address, url_safe_transaction_id, AccountId, EntityId, IdError, ScheduleId, TokenId,
    TransactionId,
};
pub use network::{
    LedgerError, LedgerNetwork, ReceiptStatus, ScheduleCreateRequest, TransactionReceipt,
};
pub use simulated::SimulatedLedger;
