//! # Trade Engine
//!
//! ```text
//! fees.rs       — three-tier fee schedule
//! transfer.rs   — TransferIntent and the hbar/token/NFT builders
//! engine.rs     — TradeEngine: create, sign, review, associate
//! validation.rs — Verdict-returning input validators
//! error.rs      — TradeError and its symbolic codes
//! ```
//!
//! Two failure styles meet here and stay separate. Building a transfer
//! from bad numbers is a [`TradeError`] the caller must handle. Checking
//! whether user input *looks* acceptable is a [`Verdict`], which never
//! fails.

pub mod engine;
pub mod error;
pub mod fees;
pub mod transfer;
pub mod validation;

pub use engine::{explorer_link, ScheduleHandle, TradeEngine, TradeRequest};
pub use error::TradeError;
pub use fees::{calculate_fee, FeeSchedule};
pub use transfer::{
    build_hbar_transfers, build_nft_transfer, build_token_transfer, split_amount,
    split_amount_with, HbarSplit, HbarTransfer, NftTransferLeg, TokenTransfer, TransferIntent,
};
pub use validation::{parse_positive_serial, Validator, Verdict};
