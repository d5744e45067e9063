//! # Transfer Construction
//!
//! A swap is one crypto-transfer with three kinds of legs:
//!
//! - **hbar legs**: the counterparty pays, the seller and the app collect;
//! - **fungible legs**: `quantity` units move seller → counterparty;
//! - **NFT legs**: one serial moves seller → counterparty.
//!
//! In this engine the *sender* is the one giving up the token and the
//! *receiver* is the one paying hbar for it. The app account collects the
//! fee.
//!
//! ## Hbar split
//!
//! ```text
//! fee   = calculate_fee(amount)
//! trade = amount == 0 ? 0 : amount - fee
//!
//!                         sender        receiver        app
//! neither is app          +trade        -(trade+fee)    +fee
//! receiver is app         +trade        -trade          (absorbed)
//! sender is app           +(trade+fee)  -(trade+fee)    (same as sender)
//! ```
//!
//! Every row nets to zero. The intent merges repeated accounts, so the
//! body never lists an account twice.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::config::MAX_TRANSACTION_FEE;
use crate::ledger::proto::{
    self, CryptoTransferTransactionBody, NftTransfer, SchedulableTransactionBody,
    TokenTransferList, TransferList,
};
use crate::ledger::{AccountId, Hbar, TokenId};
use crate::trade::error::TradeError;
use crate::trade::fees::FeeSchedule;

// ---------------------------------------------------------------------------
// Legs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HbarTransfer {
    pub account: AccountId,
    pub amount: Hbar,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenTransfer {
    pub token: TokenId,
    pub account: AccountId,
    pub amount: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NftTransferLeg {
    pub token: TokenId,
    pub serial: i64,
    pub sender: AccountId,
    pub receiver: AccountId,
}

// ---------------------------------------------------------------------------
// TransferIntent
// ---------------------------------------------------------------------------

/// A transfer being assembled for a schedule. Built fresh per trade and
/// consumed by the schedule-create call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferIntent {
    hbar: Vec<HbarTransfer>,
    tokens: Vec<TokenTransfer>,
    nfts: Vec<NftTransferLeg>,
    memo: Option<String>,
    max_transaction_fee: Hbar,
}

impl Default for TransferIntent {
    fn default() -> Self {
        Self {
            hbar: Vec::new(),
            tokens: Vec::new(),
            nfts: Vec::new(),
            memo: None,
            max_transaction_fee: MAX_TRANSACTION_FEE,
        }
    }
}

impl TransferIntent {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `amount` to `account`'s hbar leg, creating it if needed.
    pub fn add_hbar_transfer(&mut self, account: AccountId, amount: Hbar) -> &mut Self {
        match self.hbar.iter_mut().find(|leg| leg.account == account) {
            Some(leg) => leg.amount = leg.amount + amount,
            None => self.hbar.push(HbarTransfer { account, amount }),
        }
        self
    }

    pub fn add_token_transfer(&mut self, token: TokenId, account: AccountId, amount: i64) -> &mut Self {
        match self
            .tokens
            .iter_mut()
            .find(|leg| leg.token == token && leg.account == account)
        {
            Some(leg) => leg.amount = leg.amount.saturating_add(amount),
            None => self.tokens.push(TokenTransfer {
                token,
                account,
                amount,
            }),
        }
        self
    }

    pub fn add_nft_transfer(
        &mut self,
        token: TokenId,
        serial: i64,
        sender: AccountId,
        receiver: AccountId,
    ) -> &mut Self {
        self.nfts.push(NftTransferLeg {
            token,
            serial,
            sender,
            receiver,
        });
        self
    }

    pub fn set_memo(&mut self, memo: impl Into<String>) -> &mut Self {
        self.memo = Some(memo.into());
        self
    }

    pub fn set_max_transaction_fee(&mut self, fee: Hbar) -> &mut Self {
        self.max_transaction_fee = fee;
        self
    }

    pub fn hbar_transfers(&self) -> &[HbarTransfer] {
        &self.hbar
    }

    pub fn token_transfers(&self) -> &[TokenTransfer] {
        &self.tokens
    }

    pub fn nft_transfers(&self) -> &[NftTransferLeg] {
        &self.nfts
    }

    pub fn memo(&self) -> Option<&str> {
        self.memo.as_deref()
    }

    pub fn max_transaction_fee(&self) -> Hbar {
        self.max_transaction_fee
    }

    /// `account`'s net hbar change, zero if it has no leg.
    pub fn hbar_for(&self, account: AccountId) -> Hbar {
        self.hbar
            .iter()
            .filter(|leg| leg.account == account)
            .map(|leg| leg.amount)
            .sum()
    }

    pub fn hbar_sum(&self) -> Hbar {
        self.hbar.iter().map(|leg| leg.amount).sum()
    }

    pub fn token_sums(&self) -> BTreeMap<TokenId, i64> {
        let mut sums = BTreeMap::new();
        for leg in &self.tokens {
            let sum = sums.entry(leg.token).or_insert(0i64);
            *sum = sum.saturating_add(leg.amount);
        }
        sums
    }

    /// Hbar legs and every token's legs each net to zero.
    pub fn is_balanced(&self) -> bool {
        self.hbar_sum().is_zero() && self.token_sums().values().all(|&sum| sum == 0)
    }

    /// Wire form for a schedule-create.
    ///
    /// Zero-amount legs are dropped; they move nothing and the network
    /// rejects them. Token legs are grouped per token in first-seen order.
    pub fn to_schedulable_body(&self) -> SchedulableTransactionBody {
        let account_amounts = self
            .hbar
            .iter()
            .filter(|leg| !leg.amount.is_zero())
            .map(|leg| wire_amount(leg.account, leg.amount.to_tinybars()))
            .collect::<Vec<_>>();

        let mut lists: Vec<TokenTransferList> = Vec::new();
        for leg in self.tokens.iter().filter(|leg| leg.amount != 0) {
            let idx = token_list_index(&mut lists, leg.token);
            lists[idx].transfers.push(wire_amount(leg.account, leg.amount));
        }
        for nft in &self.nfts {
            let idx = token_list_index(&mut lists, nft.token);
            lists[idx].nft_transfers.push(NftTransfer {
                sender_account_id: Some(nft.sender.to_proto()),
                receiver_account_id: Some(nft.receiver.to_proto()),
                serial_number: nft.serial,
                is_approval: false,
            });
        }

        SchedulableTransactionBody {
            transaction_fee: u64::try_from(self.max_transaction_fee.to_tinybars()).unwrap_or(0),
            memo: self.memo.clone().unwrap_or_default(),
            crypto_transfer: Some(CryptoTransferTransactionBody {
                transfers: (!account_amounts.is_empty()).then_some(TransferList { account_amounts }),
                token_transfers: lists,
            }),
        }
    }
}

fn token_list_index(lists: &mut Vec<TokenTransferList>, token: TokenId) -> usize {
    let wire = token.to_proto();
    if let Some(idx) = lists.iter().position(|l| l.token.as_ref() == Some(&wire)) {
        return idx;
    }
    lists.push(TokenTransferList {
        token: Some(wire),
        ..Default::default()
    });
    lists.len() - 1
}

fn wire_amount(account: AccountId, amount: i64) -> proto::AccountAmount {
    proto::AccountAmount {
        account_id: Some(account.to_proto()),
        amount,
        is_approval: false,
    }
}

// ---------------------------------------------------------------------------
// Builders
// ---------------------------------------------------------------------------

/// How an hbar amount divides between the seller and the app.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HbarSplit {
    pub fee: Hbar,
    pub trade_amount: Hbar,
}

/// Applies the fee rules to `amount`.
///
/// # Errors
///
/// - [`TradeError::NegativeHbarAmount`] if `amount < 0`.
/// - [`TradeError::HbarAmountDoesNotCoverFee`] if `0 < amount < fee`.
pub fn split_amount(amount: Hbar) -> Result<HbarSplit, TradeError> {
    split_amount_with(amount, &FeeSchedule::default())
}

/// [`split_amount`] under a non-standard fee schedule.
pub fn split_amount_with(amount: Hbar, schedule: &FeeSchedule) -> Result<HbarSplit, TradeError> {
    if amount.is_negative() {
        return Err(TradeError::NegativeHbarAmount(amount));
    }
    let fee = schedule.fee(amount);
    if !amount.is_zero() && amount < fee {
        return Err(TradeError::HbarAmountDoesNotCoverFee { amount, fee });
    }
    let trade_amount = if amount.is_zero() {
        Hbar::ZERO
    } else {
        amount - fee
    };
    Ok(HbarSplit { fee, trade_amount })
}

/// The hbar legs of a swap where `receiver` pays `amount` to `sender`.
pub fn build_hbar_transfers(
    sender: AccountId,
    receiver: AccountId,
    amount: Hbar,
    app: AccountId,
) -> Result<TransferIntent, TradeError> {
    let HbarSplit { fee, trade_amount } = split_amount(amount)?;
    let mut intent = TransferIntent::new();

    if receiver == app {
        intent
            .add_hbar_transfer(sender, trade_amount)
            .add_hbar_transfer(receiver, -trade_amount);
    } else if sender == app {
        intent
            .add_hbar_transfer(sender, trade_amount + fee)
            .add_hbar_transfer(receiver, -(trade_amount + fee));
    } else {
        intent
            .add_hbar_transfer(sender, trade_amount)
            .add_hbar_transfer(receiver, -(trade_amount + fee))
            .add_hbar_transfer(app, fee);
    }
    Ok(intent)
}

/// `quantity` units of a fungible `token` for `amount` hbar.
pub fn build_token_transfer(
    token: TokenId,
    sender: AccountId,
    receiver: AccountId,
    amount: Hbar,
    quantity: i64,
    app: AccountId,
) -> Result<TransferIntent, TradeError> {
    if quantity <= 0 {
        return Err(TradeError::NonPositiveQuantity(quantity));
    }
    let mut intent = build_hbar_transfers(sender, receiver, amount, app)?;
    intent
        .add_token_transfer(token, sender, -quantity)
        .add_token_transfer(token, receiver, quantity)
        .set_memo(format!("Transfer {token} via Token Trader"));
    Ok(intent)
}

/// NFT `serial` of `token` for `amount` hbar.
pub fn build_nft_transfer(
    token: TokenId,
    sender: AccountId,
    receiver: AccountId,
    amount: Hbar,
    serial: i64,
    app: AccountId,
) -> Result<TransferIntent, TradeError> {
    if serial <= 0 {
        return Err(TradeError::InvalidSerial(serial));
    }
    let mut intent = build_hbar_transfers(sender, receiver, amount, app)?;
    intent
        .add_nft_transfer(token, serial, sender, receiver)
        .set_memo(format!("Transfer {serial}@{token} via Token Trader"));
    Ok(intent)
}
