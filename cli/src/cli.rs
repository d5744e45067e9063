//! # CLI Interface
//!
//! `clap` derive definitions for `token-trader`. Global flags pick the
//! network, app account and vault file; every one of them can also come
//! from the environment.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use trader_protocol::config::NetworkChoice;

use crate::logging::LogFormat;

/// Peer-to-peer token swaps over scheduled transactions.
#[derive(Parser, Debug)]
#[command(
    name = "token-trader",
    about = "Token Trader: vault, mirror queries and swap previews",
    version,
    propagate_version = true
)]
pub struct TraderCli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// JSON config file. Flags below override its fields.
    #[arg(long, short = 'c', global = true, env = "TRADER_CONFIG")]
    pub config: Option<PathBuf>,

    /// testnet or mainnet-public.
    #[arg(long, global = true, env = "TRADER_NETWORK")]
    pub network: Option<NetworkChoice>,

    /// Account that collects trade fees.
    #[arg(long, global = true, env = "TRADER_APP_ACCOUNT")]
    pub app_account: Option<String>,

    /// Mirror root override, e.g. a local mirror node.
    #[arg(long, global = true, env = "TRADER_MIRROR_URL")]
    pub mirror_url: Option<String>,

    /// Vault file holding registered users.
    #[arg(
        long,
        global = true,
        env = "TRADER_REGISTRY",
        default_value = "token-trader-users.json"
    )]
    pub registry: PathBuf,

    /// pretty or json. Logs always go to stderr.
    #[arg(long, global = true, env = "TRADER_LOG_FORMAT", default_value = "pretty")]
    pub log_format: LogFormat,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Seal a private key under a password and add the account to the vault.
    Register(RegisterArgs),
    /// Check a password and decrypt the account's key.
    Unlock(UnlockArgs),
    /// Show the app fee and the seller's share for an hbar amount.
    Fee(FeeArgs),
    /// Build a swap transfer offline and print it with its encoded body.
    Preview(PreviewArgs),
    /// Decode a pending schedule, by id or share code.
    Inspect(InspectArgs),
    /// Run the input validators against the mirror.
    Validate(ValidateArgs),
    /// List a token's royalty and fixed fees.
    Royalties(TokenArgs),
    /// List the tokens associated with an account.
    Tokens(AccountArgs),
    /// Mirror URL for a transaction id.
    Link(LinkArgs),
    /// Print version information and exit.
    Version,
}

#[derive(Parser, Debug)]
pub struct RegisterArgs {
    /// Account id, `shard.realm.num`.
    pub account: String,

    /// Private key as raw or DER-prefixed hex.
    #[arg(long, env = "TRADER_PRIVATE_KEY", hide_env_values = true)]
    pub private_key: String,

    #[arg(long, env = "TRADER_PASSWORD", hide_env_values = true)]
    pub password: String,
}

#[derive(Parser, Debug)]
pub struct UnlockArgs {
    pub account: String,

    #[arg(long, env = "TRADER_PASSWORD", hide_env_values = true)]
    pub password: String,
}

#[derive(Parser, Debug)]
pub struct FeeArgs {
    /// Amount in hbar, up to 8 decimals.
    pub amount: String,
}

#[derive(Parser, Debug)]
pub struct PreviewArgs {
    /// Seller: gives the token, receives hbar.
    #[arg(long)]
    pub sender: String,

    /// Buyer: receives the token, pays hbar.
    #[arg(long)]
    pub receiver: String,

    /// Price in hbar.
    #[arg(long)]
    pub amount: String,

    #[arg(long)]
    pub token: String,

    /// NFT serial. Without it the token is treated as fungible.
    #[arg(long)]
    pub serial: Option<String>,

    /// Fungible units to move.
    #[arg(long, default_value_t = trader_protocol::config::DEFAULT_FUNGIBLE_QUANTITY)]
    pub quantity: i64,
}

#[derive(Parser, Debug)]
pub struct InspectArgs {
    /// Schedule id (`0.0.123`) or the share code handed out by the seller.
    pub schedule: String,
}

#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Schedule share code to check.
    #[arg(long)]
    pub share_code: Option<String>,

    /// Account that must exist on the mirror.
    #[arg(long)]
    pub account: Option<String>,

    /// Token to check, together with `--serial` for NFTs.
    #[arg(long)]
    pub token: Option<String>,

    #[arg(long, requires = "token")]
    pub serial: Option<String>,
}

#[derive(Parser, Debug)]
pub struct TokenArgs {
    pub token: String,
}

#[derive(Parser, Debug)]
pub struct AccountArgs {
    pub account: String,
}

#[derive(Parser, Debug)]
pub struct LinkArgs {
    /// `account@seconds.nanos`, optionally with `?scheduled`.
    pub transaction_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli_structure() {
        TraderCli::command().debug_assert();
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = TraderCli::try_parse_from([
            "token-trader",
            "fee",
            "12.5",
            "--network",
            "mainnet-public",
            "--log-format",
            "json",
        ])
        .unwrap();
        assert_eq!(cli.global.network, Some(NetworkChoice::MainnetPublic));
        assert_eq!(cli.global.log_format, LogFormat::Json);
        assert!(matches!(cli.command, Commands::Fee(FeeArgs { ref amount }) if amount == "12.5"));
    }

    #[test]
    fn serial_requires_token() {
        assert!(
            TraderCli::try_parse_from(["token-trader", "validate", "--serial", "3"]).is_err()
        );
    }
}
