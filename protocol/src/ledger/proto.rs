//! Wire types for the schedulable transaction body.
//!
//! Hand-derived `prost` messages covering the subset of the ledger's
//! protobuf schema a token swap touches. Field tags match the public
//! `schedulable_transaction_body.proto` / `basic_types.proto` definitions;
//! any field not declared here is skipped on decode, so bodies carrying
//! other transaction kinds still parse (they just have no `crypto_transfer`).

/// `SchedulableTransactionBody`: the inner transaction of a schedule.
#[derive(Clone, PartialEq, prost::Message)]
pub struct SchedulableTransactionBody {
    /// Maximum network fee in tinybars.
    #[prost(uint64, tag = "1")]
    pub transaction_fee: u64,

    #[prost(string, tag = "2")]
    pub memo: String,

    #[prost(message, optional, tag = "9")]
    pub crypto_transfer: Option<CryptoTransferTransactionBody>,
}

/// `CryptoTransferTransactionBody`: hbar legs plus per-token legs.
#[derive(Clone, PartialEq, prost::Message)]
pub struct CryptoTransferTransactionBody {
    #[prost(message, optional, tag = "1")]
    pub transfers: Option<TransferList>,

    #[prost(message, repeated, tag = "2")]
    pub token_transfers: Vec<TokenTransferList>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct TransferList {
    #[prost(message, repeated, tag = "1")]
    pub account_amounts: Vec<AccountAmount>,
}

/// One signed balance change. `amount` is tinybars for hbar legs and the
/// token's smallest unit for fungible legs.
#[derive(Clone, PartialEq, prost::Message)]
pub struct AccountAmount {
    #[prost(message, optional, tag = "1")]
    pub account_id: Option<AccountId>,

    #[prost(sint64, tag = "2")]
    pub amount: i64,

    #[prost(bool, tag = "3")]
    pub is_approval: bool,
}

/// All legs for a single token: fungible amounts or NFT ownership moves.
#[derive(Clone, PartialEq, prost::Message)]
pub struct TokenTransferList {
    #[prost(message, optional, tag = "1")]
    pub token: Option<TokenId>,

    #[prost(message, repeated, tag = "2")]
    pub transfers: Vec<AccountAmount>,

    #[prost(message, repeated, tag = "3")]
    pub nft_transfers: Vec<NftTransfer>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct NftTransfer {
    #[prost(message, optional, tag = "1")]
    pub sender_account_id: Option<AccountId>,

    #[prost(message, optional, tag = "2")]
    pub receiver_account_id: Option<AccountId>,

    #[prost(int64, tag = "3")]
    pub serial_number: i64,

    #[prost(bool, tag = "4")]
    pub is_approval: bool,
}

/// `AccountID`. On the wire `account_num` and `alias` are a oneof; at most
/// one is populated.
#[derive(Clone, PartialEq, prost::Message)]
pub struct AccountId {
    #[prost(int64, tag = "1")]
    pub shard_num: i64,

    #[prost(int64, tag = "2")]
    pub realm_num: i64,

    #[prost(int64, tag = "3")]
    pub account_num: i64,

    #[prost(bytes = "vec", tag = "4")]
    pub alias: Vec<u8>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct TokenId {
    #[prost(int64, tag = "1")]
    pub shard_num: i64,

    #[prost(int64, tag = "2")]
    pub realm_num: i64,

    #[prost(int64, tag = "3")]
    pub token_num: i64,
}
