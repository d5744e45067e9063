// Copyright (c) 2026 Token Trader Developers. MIT License.
// See LICENSE for details.

//! # Token Trader — Core Library
//!
//! Peer-to-peer token swaps on the Hedera ledger, with no escrow contract
//! and no custody. The seller proposes a transfer as a *scheduled
//! transaction*; the buyer reviews it and adds their signature; the ledger
//! runs it only once both have signed. Either both legs move or neither
//! does.
//!
//! ## Architecture
//!
//! - **config** — fee tiers, crypto defaults, network selection.
//! - **crypto** — PBKDF2 + AES-CBC key sealing, salted password hashes,
//!   Ed25519 ledger keys.
//! - **vault** — registered users, unlock, login state.
//! - **ledger** — ids, hbar amounts, the protobuf transfer body, and the
//!   trait the engine submits through.
//! - **mirror** — read-only queries against the public mirror node.
//! - **schedule** — decoding a pending schedule back into something a
//!   human can check.
//! - **trade** — fees, transfer construction, the swap engine, validators.
//!
//! ## Two kinds of failure
//!
//! Lookups and decodes *degrade*: a dead mirror or a mangled share code
//! gives `false`, `None` or an empty list. Money-moving calls *refuse*: a
//! negative amount or an amount below its own fee is a typed error with a
//! fixed code. The two are never folded into one another.

pub mod config;
pub mod crypto;
pub mod ledger;
pub mod mirror;
pub mod schedule;
pub mod trade;
pub mod vault;

/// Crate version, as printed by `token-trader version`.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use config::{NetworkChoice, TraderConfig};
pub use crypto::keys::{Credentials, LedgerPrivateKey};
pub use ledger::{AccountId, Hbar, ScheduleId, TokenId, TransactionId};
pub use mirror::MirrorClient;
pub use trade::{TradeEngine, TradeError, TradeRequest};
