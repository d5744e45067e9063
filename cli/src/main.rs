// Copyright (c) 2026 Token Trader Developers. MIT License.
// See LICENSE for details.

//! # Token Trader CLI
//!
//! Entry point for the `token-trader` binary. Parses arguments, sets up
//! logging, resolves the config and dispatches to one handler per
//! subcommand.
//!
//! Structured results go to stdout as pretty JSON. Failures surface as an
//! `anyhow` error chain and a non-zero exit.

mod cli;
mod logging;

use anyhow::{bail, Context, Result};
use clap::Parser;
use serde::Serialize;
use serde_json::json;

use trader_protocol::config::{NetworkChoice, TraderConfig};
use trader_protocol::crypto::keys::LedgerPrivateKey;
use trader_protocol::ledger::{AccountId, Hbar, ScheduleId, TokenId, TransactionId};
use trader_protocol::mirror::MirrorClient;
use trader_protocol::schedule::{
    decode_schedule_body, encode_schedule_body, extract_token_serial, schedule_id_from_share_code,
    schedule_share_code, TransferSummary,
};
use trader_protocol::trade::validation::{
    account_validator, schedule_validator, token_serial_validator, token_validator,
};
use trader_protocol::trade::{
    build_nft_transfer, build_token_transfer, explorer_link, parse_positive_serial, split_amount,
    TradeError,
};
use trader_protocol::vault::{LoginState, UserRegistry};

use cli::{Commands, GlobalArgs, TraderCli};

/// Placeholder fee account for commands that only read from the mirror.
const UNSET_APP_ACCOUNT: AccountId = AccountId::new(0, 0, 0);

#[tokio::main]
async fn main() -> Result<()> {
    let cli = TraderCli::parse();
    logging::init_logging(logging::DEFAULT_FILTER, cli.global.log_format);
    let global = cli.global;

    match cli.command {
        Commands::Register(args) => register(&global, args),
        Commands::Unlock(args) => unlock(&global, args),
        Commands::Fee(args) => fee(args),
        Commands::Preview(args) => preview(&global, args),
        Commands::Inspect(args) => inspect(&global, args).await,
        Commands::Validate(args) => validate(&global, args).await,
        Commands::Royalties(args) => royalties(&global, args).await,
        Commands::Tokens(args) => tokens(&global, args).await,
        Commands::Link(args) => link(&global, args),
        Commands::Version => {
            print_version();
            Ok(())
        }
    }
}

// ---------------------------------------------------------------------------
// Setup
// ---------------------------------------------------------------------------

/// Config file first, then flag/env overrides on top.
fn load_config(global: &GlobalArgs) -> Result<TraderConfig> {
    let app_account = global
        .app_account
        .as_deref()
        .map(parse_account)
        .transpose()?;

    let mut config = match &global.config {
        Some(path) => TraderConfig::load(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => TraderConfig::new(
            global.network.unwrap_or(NetworkChoice::Testnet),
            app_account.unwrap_or(UNSET_APP_ACCOUNT),
        ),
    };
    if let Some(network) = global.network {
        config.network = network;
    }
    if let Some(app) = app_account {
        config.app_account = app;
    }
    if let Some(url) = &global.mirror_url {
        config.mirror_url = Some(url.clone());
    }

    tracing::debug!(
        network = %config.network,
        app = %config.app_account,
        api = %config.api_base(),
        "config resolved"
    );
    Ok(config)
}

fn mirror_client(config: &TraderConfig) -> Result<MirrorClient> {
    MirrorClient::new(config).context("failed to build mirror HTTP client")
}

fn load_registry(global: &GlobalArgs) -> Result<UserRegistry> {
    UserRegistry::load(&global.registry)
        .with_context(|| format!("failed to open vault {}", global.registry.display()))
}

fn parse_account(raw: &str) -> Result<AccountId> {
    raw.parse()
        .with_context(|| format!("invalid account id: {raw}"))
}

fn parse_token(raw: &str) -> Result<TokenId> {
    raw.parse().with_context(|| format!("invalid token id: {raw}"))
}

fn parse_hbar(raw: &str) -> Result<Hbar> {
    raw.parse().with_context(|| format!("invalid hbar amount: {raw}"))
}

/// Accepts a plain schedule id or a share code.
fn resolve_schedule(raw: &str) -> Option<ScheduleId> {
    raw.parse::<ScheduleId>()
        .ok()
        .or_else(|| schedule_id_from_share_code(raw))
}

/// Keeps the symbolic code in front so scripts can match on it.
fn refused(err: TradeError) -> anyhow::Error {
    anyhow::anyhow!("{}: {err}", err.code())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

// ---------------------------------------------------------------------------
// Vault
// ---------------------------------------------------------------------------

fn register(global: &GlobalArgs, args: cli::RegisterArgs) -> Result<()> {
    let config = load_config(global)?;
    let account = parse_account(&args.account)?;
    let key: LedgerPrivateKey = args.private_key.parse().context("private key rejected")?;
    let public_key = key.public_key().to_der_hex();

    let mut registry = load_registry(global)?;
    registry
        .register(account, &key, &args.password, config.network)
        .with_context(|| format!("failed to register {account}"))?;
    registry
        .save(&global.registry)
        .with_context(|| format!("failed to write vault {}", global.registry.display()))?;

    print_json(&json!({
        "account": account,
        "network": config.network,
        "publicKey": public_key,
        "vault": global.registry.display().to_string(),
    }))
}

fn unlock(global: &GlobalArgs, args: cli::UnlockArgs) -> Result<()> {
    let account = parse_account(&args.account)?;
    let registry = load_registry(global)?;
    let mut state = LoginState::new();
    let credentials = registry
        .login(&mut state, account, &args.password)
        .with_context(|| format!("failed to unlock {account}"))?;

    let since = state
        .login_timestamp
        .map(|t| t.with_timezone(&chrono::Local).to_rfc2822());
    print_json(&json!({
        "login": state,
        "since": since,
        "publicKey": credentials.key.public_key().to_der_hex(),
    }))
}

// ---------------------------------------------------------------------------
// Trade arithmetic
// ---------------------------------------------------------------------------

fn fee(args: cli::FeeArgs) -> Result<()> {
    let amount = parse_hbar(&args.amount)?;
    let split = split_amount(amount).map_err(refused)?;
    println!("amount        : {amount} ℏ");
    println!("app fee       : {} ℏ", split.fee);
    println!("seller gets   : {} ℏ", split.trade_amount);
    println!("buyer pays    : {} ℏ", split.trade_amount + split.fee);
    Ok(())
}

fn preview(global: &GlobalArgs, args: cli::PreviewArgs) -> Result<()> {
    let config = load_config(global)?;
    if config.app_account == UNSET_APP_ACCOUNT {
        bail!("preview needs the fee account: pass --app-account or set it in --config");
    }
    let sender = parse_account(&args.sender)?;
    let receiver = parse_account(&args.receiver)?;
    if sender == receiver {
        return Err(refused(TradeError::SenderIsReceiver));
    }
    let token = parse_token(&args.token)?;
    let amount = parse_hbar(&args.amount)?;

    let intent = match args.serial.as_deref() {
        Some(raw) => {
            let serial = parse_positive_serial(raw)
                .with_context(|| format!("serial must be a positive integer: {raw}"))?;
            build_nft_transfer(token, sender, receiver, amount, serial, config.app_account)
        }
        None => build_token_transfer(
            token,
            sender,
            receiver,
            amount,
            args.quantity,
            config.app_account,
        ),
    }
    .map_err(refused)?;

    let body = intent.to_schedulable_body();
    print_json(&json!({
        "balanced": intent.is_balanced(),
        "transfer": TransferSummary::from_body(&body),
        "body": encode_schedule_body(&body),
    }))
}

// ---------------------------------------------------------------------------
// Mirror queries
// ---------------------------------------------------------------------------

async fn inspect(global: &GlobalArgs, args: cli::InspectArgs) -> Result<()> {
    let config = load_config(global)?;
    let schedule = resolve_schedule(&args.schedule)
        .with_context(|| format!("not a schedule id or share code: {}", args.schedule))?;
    let mirror = mirror_client(&config)?;

    let info = mirror
        .get_schedule(schedule)
        .await
        .with_context(|| format!("schedule {schedule} not found on {}", mirror.api_base()))?;
    let body = decode_schedule_body(&info.transaction_body)
        .with_context(|| format!("schedule {schedule} has an undecodable body"))?;
    let token_serial = extract_token_serial(&body);
    let explorer = token_serial
        .token
        .map(|token| explorer_link(token, token_serial.serial, config.network));

    print_json(&json!({
        "scheduleId": schedule,
        "shareCode": schedule_share_code(schedule),
        "memo": info.memo,
        "creator": info.creator_account_id,
        "executed": info.is_executed(),
        "pending": info.is_pending(),
        "signatures": info.signatures.len(),
        "transfer": TransferSummary::from_body(&body),
        "explorer": explorer,
    }))
}

async fn validate(global: &GlobalArgs, args: cli::ValidateArgs) -> Result<()> {
    let config = load_config(global)?;
    let mirror = mirror_client(&config)?;

    let mut verdicts = Vec::new();
    if let Some(account) = &args.account {
        verdicts.push(account_validator(&mirror, account).await);
    }
    if let Some(token) = &args.token {
        verdicts.push(token_validator(&mirror, token).await);
        verdicts.push(token_serial_validator(&mirror, token, args.serial.as_deref()).await);
    }
    if let Some(code) = &args.share_code {
        verdicts.push(schedule_validator(&mirror, code).await);
    }
    if verdicts.is_empty() {
        bail!("nothing to validate: pass --share-code, --account or --token");
    }

    print_json(&verdicts)?;
    let failed = verdicts.iter().filter(|v| !v.is_valid()).count();
    if failed > 0 {
        bail!("{failed} of {} checks failed", verdicts.len());
    }
    Ok(())
}

async fn royalties(global: &GlobalArgs, args: cli::TokenArgs) -> Result<()> {
    let config = load_config(global)?;
    let token = parse_token(&args.token)?;
    let mirror = mirror_client(&config)?;

    let royalties = mirror.royalties(token).await;
    let fixed_fees = mirror.fixed_fees(token).await;
    print_json(&json!({
        "token": token,
        "royalties": royalties,
        "fixedFees": fixed_fees,
    }))
}

async fn tokens(global: &GlobalArgs, args: cli::AccountArgs) -> Result<()> {
    let config = load_config(global)?;
    let mirror = mirror_client(&config)?;
    let tokens = mirror.get_account_tokens(&args.account).await;
    tracing::info!(account = %args.account, count = tokens.len(), "account tokens fetched");
    print_json(&tokens)
}

fn link(global: &GlobalArgs, args: cli::LinkArgs) -> Result<()> {
    let config = load_config(global)?;
    let transaction_id: TransactionId = args
        .transaction_id
        .parse()
        .with_context(|| format!("invalid transaction id: {}", args.transaction_id))?;
    let mirror = mirror_client(&config)?;
    println!("{}", mirror.transaction_link(&transaction_id));
    Ok(())
}

fn print_version() {
    println!("token-trader    {}", env!("CARGO_PKG_VERSION"));
    println!("trader-protocol {}", trader_protocol::VERSION);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn global() -> GlobalArgs {
        GlobalArgs {
            config: None,
            network: None,
            app_account: None,
            mirror_url: None,
            registry: PathBuf::from("unused.json"),
            log_format: logging::LogFormat::Pretty,
        }
    }

    #[test]
    fn flags_build_a_config_without_a_file() {
        let mut args = global();
        args.network = Some(NetworkChoice::MainnetPublic);
        args.app_account = Some("0.0.98".into());
        let config = load_config(&args).unwrap();
        assert_eq!(config.network, NetworkChoice::MainnetPublic);
        assert_eq!(config.app_account, AccountId::new(0, 0, 98));
        assert_eq!(
            config.api_base(),
            "https://mainnet-public.mirrornode.hedera.com/api/v1/"
        );
    }

    #[test]
    fn flags_override_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trader.json");
        std::fs::write(
            &path,
            r#"{ "network": "testnet", "app_account": "0.0.5", "mirror_url": "http://localhost:5551" }"#,
        )
        .unwrap();

        let mut args = global();
        args.config = Some(path);
        args.app_account = Some("0.0.6".into());
        let config = load_config(&args).unwrap();
        assert_eq!(config.network, NetworkChoice::Testnet);
        assert_eq!(config.app_account, AccountId::new(0, 0, 6));
        assert_eq!(config.api_base(), "http://localhost:5551/api/v1/");
    }

    #[test]
    fn bad_app_account_is_reported() {
        let mut args = global();
        args.app_account = Some("not-an-account".into());
        let err = load_config(&args).unwrap_err();
        assert!(err.to_string().contains("not-an-account"));
    }

    #[test]
    fn schedules_resolve_from_id_or_share_code() {
        let id = ScheduleId::new(0, 0, 4815162);
        assert_eq!(resolve_schedule("0.0.4815162"), Some(id));
        assert_eq!(resolve_schedule("MC4wLjQ4MTUxNjI="), Some(id));
        assert_eq!(resolve_schedule("nonsense"), None);
    }

    #[test]
    fn refusals_lead_with_their_code() {
        let err = refused(TradeError::NegativeHbarAmount(Hbar::from_tinybars(-5)));
        assert!(err.to_string().starts_with("NEGATIVE_HBAR_AMOUNT: "));
    }
}
