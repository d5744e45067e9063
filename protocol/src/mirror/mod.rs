//! # Mirror Node Access
//!
//! ```text
//! transport.rs — MirrorTransport trait; reqwest and in-memory impls
//! types.rs     — serde views of mirror JSON
//! client.rs    — MirrorClient: sentinel-returning queries
//! ```

pub mod client;
pub mod transport;
pub mod types;

pub use client::MirrorClient;
pub use transport::{HttpTransport, MemoryTransport, MirrorError, MirrorResponse, MirrorTransport};
pub use types::{
    CustomFees, FixedFee, Fraction, NftInfo, Royalty, RoyaltyFee, ScheduleInfo, TokenBalance,
    TokenInfo, TokenType,
};
