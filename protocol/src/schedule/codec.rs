//! # Schedule Body Codec
//!
//! The mirror hands out a schedule's inner transaction as base64 protobuf.
//! This module turns that blob back into a [`SchedulableTransactionBody`]
//! and pulls out the parts a counterparty needs to see before signing:
//! which token moves, which serial, and how many hbars each account gains
//! or loses.
//!
//! Decoding follows the crate's sentinel convention: malformed input gives
//! `None` or an empty value, never an error.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use prost::Message;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::crypto::encoding::{decode_base64_to_string, encode_string_to_base64};
use crate::ledger::proto::{self, SchedulableTransactionBody};
use crate::ledger::{AccountId, Hbar, ScheduleId, TokenId};

// ---------------------------------------------------------------------------
// Body <-> base64
// ---------------------------------------------------------------------------

/// Base64 → protobuf body. `None` for bad base64 or bytes that don't parse.
pub fn decode_schedule_body(base64: &str) -> Option<SchedulableTransactionBody> {
    let bytes = match STANDARD.decode(base64.trim()) {
        Ok(bytes) => bytes,
        Err(e) => {
            debug!(error = %e, "schedule body is not base64");
            return None;
        }
    };
    match SchedulableTransactionBody::decode(bytes.as_slice()) {
        Ok(body) => Some(body),
        Err(e) => {
            debug!(error = %e, "schedule body is not a SchedulableTransactionBody");
            None
        }
    }
}

pub fn encode_schedule_body(body: &SchedulableTransactionBody) -> String {
    STANDARD.encode(body.encode_to_vec())
}

// ---------------------------------------------------------------------------
// Share codes
// ---------------------------------------------------------------------------

/// The code a schedule's creator hands the counterparty: base64 of the
/// schedule id text.
pub fn schedule_share_code(schedule: ScheduleId) -> String {
    encode_string_to_base64(&schedule.to_string())
}

pub fn schedule_id_from_share_code(code: &str) -> Option<ScheduleId> {
    decode_base64_to_string(code).parse().ok()
}

// ---------------------------------------------------------------------------
// Extraction
// ---------------------------------------------------------------------------

/// Which token a schedule moves, and for NFTs which serial.
///
/// `serial == None` with `token == Some(_)` means a fungible transfer.
/// Both `None` means the body moves no token at all.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenSerial {
    pub token: Option<TokenId>,
    pub serial: Option<i64>,
}

impl TokenSerial {
    pub const NONE: TokenSerial = TokenSerial {
        token: None,
        serial: None,
    };

    pub fn is_nft(&self) -> bool {
        self.serial.is_some()
    }
}

/// Reads the first token-transfer list; the serial comes from its first
/// NFT leg. Serial 0 is not a valid NFT serial and reads as absent.
pub fn extract_token_serial(body: &SchedulableTransactionBody) -> TokenSerial {
    let Some(first) = body
        .crypto_transfer
        .as_ref()
        .and_then(|ct| ct.token_transfers.first())
    else {
        return TokenSerial::NONE;
    };
    TokenSerial {
        token: first.token.as_ref().map(TokenId::from_proto),
        serial: first
            .nft_transfers
            .first()
            .map(|nft| nft.serial_number)
            .filter(|&serial| serial != 0),
    }
}

/// One hbar leg read back from a schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountAmount {
    /// `None` for alias-addressed or missing accounts.
    pub account: Option<AccountId>,
    pub amount: Hbar,
}

impl AccountAmount {
    /// Amount in hbars, for display.
    pub fn hbars(&self) -> f64 {
        self.amount.to_hbar_f64()
    }
}

fn account_of(id: &Option<proto::AccountId>) -> Option<AccountId> {
    id.as_ref().and_then(AccountId::from_proto)
}

/// The body's hbar legs in wire order. Empty if there are none.
pub fn extract_account_amounts(body: &SchedulableTransactionBody) -> Vec<AccountAmount> {
    body.crypto_transfer
        .as_ref()
        .and_then(|ct| ct.transfers.as_ref())
        .map(|list| {
            list.account_amounts
                .iter()
                .map(|leg| AccountAmount {
                    account: account_of(&leg.account_id),
                    amount: Hbar::from_tinybars(leg.amount),
                })
                .collect()
        })
        .unwrap_or_default()
}

/// A fungible-token leg.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenLeg {
    pub token: TokenId,
    pub account: Option<AccountId>,
    pub amount: i64,
}

/// An NFT ownership move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NftLeg {
    pub token: TokenId,
    pub sender: Option<AccountId>,
    pub receiver: Option<AccountId>,
    pub serial: i64,
}

/// Everything a counterparty reviews before signing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferSummary {
    pub memo: String,
    pub max_fee: Hbar,
    pub hbar: Vec<AccountAmount>,
    pub tokens: Vec<TokenLeg>,
    pub nfts: Vec<NftLeg>,
}

impl TransferSummary {
    pub fn from_body(body: &SchedulableTransactionBody) -> Self {
        let mut tokens = Vec::new();
        let mut nfts = Vec::new();
        let lists = body
            .crypto_transfer
            .as_ref()
            .map(|ct| ct.token_transfers.as_slice())
            .unwrap_or_default();
        for list in lists {
            let Some(token) = list.token.as_ref().map(TokenId::from_proto) else {
                continue;
            };
            tokens.extend(list.transfers.iter().map(|leg| TokenLeg {
                token,
                account: account_of(&leg.account_id),
                amount: leg.amount,
            }));
            nfts.extend(list.nft_transfers.iter().map(|nft| NftLeg {
                token,
                sender: account_of(&nft.sender_account_id),
                receiver: account_of(&nft.receiver_account_id),
                serial: nft.serial_number,
            }));
        }
        Self {
            memo: body.memo.clone(),
            max_fee: Hbar::from_tinybars(i64::try_from(body.transaction_fee).unwrap_or(i64::MAX)),
            hbar: extract_account_amounts(body),
            tokens,
            nfts,
        }
    }

    /// What `account` gains (positive) or pays (negative) in hbar.
    pub fn hbar_delta(&self, account: AccountId) -> Hbar {
        self.hbar
            .iter()
            .filter(|leg| leg.account == Some(account))
            .map(|leg| leg.amount)
            .sum()
    }
}
