//! # Schedule Codec
//!
//! ```text
//! codec.rs   — base64 <-> SchedulableTransactionBody, extraction, share codes
//! inspect.rs — mirror fetch + decode helpers on MirrorClient
//! ```

pub mod codec;
pub mod inspect;

pub use codec::{
    decode_schedule_body, encode_schedule_body, extract_account_amounts, extract_token_serial,
    schedule_id_from_share_code, schedule_share_code, AccountAmount, NftLeg, TokenLeg,
    TokenSerial, TransferSummary,
};
