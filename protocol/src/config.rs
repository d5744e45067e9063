//! # Protocol Configuration & Constants
//!
//! Every magic number in Token Trader lives here. If you're hardcoding a fee
//! or a key length somewhere else, move it here first.
//!
//! The fee constants are part of the trade contract between users and the
//! app account. Changing them changes what counterparties sign, so treat
//! them as versioned.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

use crate::ledger::amount::Hbar;
use crate::ledger::ids::AccountId;

// ---------------------------------------------------------------------------
// Currency
// ---------------------------------------------------------------------------

/// Tinybars in one hbar. The ledger only ever moves tinybars; hbars are a
/// display unit.
pub const TINYBARS_PER_HBAR: i64 = 100_000_000;

/// Number of fractional digits in the hbar display unit.
pub const HBAR_DECIMALS: u32 = 8;

// ---------------------------------------------------------------------------
// Fee Schedule
// ---------------------------------------------------------------------------

/// Trades at or above this amount pay the flat [`FIXED_FEE`]. Inclusive.
pub const MINIMUM_FIXED: Hbar = Hbar::from_tinybars(1_000 * TINYBARS_PER_HBAR);

/// Flat fee for trades at or above [`MINIMUM_FIXED`].
pub const FIXED_FEE: Hbar = Hbar::from_tinybars(10 * TINYBARS_PER_HBAR);

/// Fee for a pure token transfer with no hbar leg: 0.01 ℏ.
pub const ZERO_FEE: Hbar = Hbar::from_tinybars(TINYBARS_PER_HBAR / 100);

/// Below [`MINIMUM_FIXED`] the app keeps this percentage of the trade.
pub const RELATIVE_FEE_PERCENT: i64 = 1;

/// Ceiling on the network fee for both the transfer and its schedule wrapper.
pub const MAX_TRANSACTION_FEE: Hbar = Hbar::from_tinybars(2 * TINYBARS_PER_HBAR);

/// Exclusive upper bound of the random correlation id in schedule memos.
pub const CORRELATION_ID_RANGE: u32 = 10_000;

/// Prefix of every schedule memo. The correlation id follows it.
pub const SCHEDULE_MEMO_PREFIX: &str = "Token Trader Schedule ID: ";

/// Quantity moved by a fungible trade when the caller doesn't say otherwise.
pub const DEFAULT_FUNGIBLE_QUANTITY: i64 = 1;

// ---------------------------------------------------------------------------
// Credential Vault Parameters
// ---------------------------------------------------------------------------

/// PBKDF2 output length in bits. Selects AES-256.
pub const KEY_LENGTH_BITS: usize = 256;

/// CBC initialization vector length in bits. One AES block.
pub const IV_LENGTH_BITS: usize = 128;

/// Salt length in bits for both key derivation and password hashing.
pub const SALT_LENGTH_BITS: usize = 128;

/// PBKDF2 iteration count for new blobs. Old blobs carry their own count.
pub const KEY_ITERATIONS: u32 = 10_000;

/// Password length bounds enforced at registration.
pub const MIN_PASSWORD_LENGTH: usize = 12;
pub const MAX_PASSWORD_LENGTH: usize = 128;

// ---------------------------------------------------------------------------
// Mirror Node
// ---------------------------------------------------------------------------

/// Default REST path appended to the mirror host.
pub const DEFAULT_API_PATH: &str = "api/v1/";

/// Default per-request timeout against the mirror node.
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// NFT explorer used for share links.
pub const EXPLORER_BASE_URL: &str = "https://gomint.me/explore/NFT/";

// ---------------------------------------------------------------------------
// Network Choice
// ---------------------------------------------------------------------------

/// Which public ledger network the trader talks to.
///
/// The string forms double as the mirror-node subdomain, which is why
/// mainnet is spelled `mainnet-public`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NetworkChoice {
    #[serde(rename = "testnet")]
    Testnet,
    #[serde(rename = "mainnet-public")]
    MainnetPublic,
}

impl NetworkChoice {
    /// Mirror-node subdomain label.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Testnet => "testnet",
            Self::MainnetPublic => "mainnet-public",
        }
    }

    /// Root URL of the public mirror node for this network, with a trailing slash.
    pub fn mirror_url(&self) -> String {
        format!("https://{}.mirrornode.hedera.com/", self.as_str())
    }

    /// Network name as the NFT explorer spells it.
    pub fn explorer_network(&self) -> &'static str {
        match self {
            Self::Testnet => "testnet",
            Self::MainnetPublic => "mainnet",
        }
    }
}

impl fmt::Display for NetworkChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NetworkChoice {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "testnet" => Ok(Self::Testnet),
            "mainnet" | "mainnet-public" => Ok(Self::MainnetPublic),
            other => Err(ConfigError::UnknownNetwork(other.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Runtime Configuration
// ---------------------------------------------------------------------------

/// Errors raised while loading or validating a [`TraderConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unknown network: {0} (expected testnet or mainnet-public)")]
    UnknownNetwork(String),

    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Runtime settings for one trader instance.
///
/// Two instances built from the same config must agree on the app account,
/// otherwise they compute different fee legs for the same trade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraderConfig {
    /// Target network.
    pub network: NetworkChoice,

    /// Account that collects trade fees.
    pub app_account: AccountId,

    /// Mirror root override. `None` uses the public mirror for `network`.
    #[serde(default)]
    pub mirror_url: Option<String>,

    /// REST path below the mirror root.
    #[serde(default = "default_api_path")]
    pub api_path: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub http_timeout_secs: u64,
}

fn default_api_path() -> String {
    DEFAULT_API_PATH.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_HTTP_TIMEOUT.as_secs()
}

impl TraderConfig {
    /// Config for `network` with the public mirror and default API path.
    pub fn new(network: NetworkChoice, app_account: AccountId) -> Self {
        Self {
            network,
            app_account,
            mirror_url: None,
            api_path: default_api_path(),
            http_timeout_secs: default_timeout_secs(),
        }
    }

    /// Reads a JSON config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Effective mirror root, always ending in `/`.
    pub fn mirror_root(&self) -> String {
        let mut root = self
            .mirror_url
            .clone()
            .unwrap_or_else(|| self.network.mirror_url());
        if !root.ends_with('/') {
            root.push('/');
        }
        root
    }

    /// Mirror root joined with the API path, e.g.
    /// `https://testnet.mirrornode.hedera.com/api/v1/`.
    pub fn api_base(&self) -> String {
        let mut api = self.api_path.trim_start_matches('/').to_string();
        if !api.is_empty() && !api.ends_with('/') {
            api.push('/');
        }
        format!("{}{}", self.mirror_root(), api)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}
