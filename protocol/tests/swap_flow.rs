//! End-to-end swap tests.
//!
//! Each test walks the whole path a real trade takes: both parties sealed
//! into a vault on disk, the seller opening a schedule, the buyer checking
//! the share code and the decoded body against the mirror, then signing.
//! The ledger is the in-process simulation and the mirror is an in-memory
//! transport fed from what the ledger stored, so nothing touches a network.

use std::sync::Arc;

use serde_json::json;
use tempfile::TempDir;

use trader_protocol::config::{NetworkChoice, TraderConfig};
use trader_protocol::crypto::keys::{Credentials, LedgerPrivateKey};
use trader_protocol::crypto::EncryptionParams;
use trader_protocol::ledger::{AccountId, Hbar, ReceiptStatus, ScheduleId, SimulatedLedger, TokenId};
use trader_protocol::mirror::{MemoryTransport, MirrorClient};
use trader_protocol::schedule::{encode_schedule_body, schedule_id_from_share_code};
use trader_protocol::trade::validation::{
    account_validator, auth_password, not_sender_validator, schedule_validator,
};
use trader_protocol::trade::{calculate_fee, TradeEngine, TradeRequest, Validator, Verdict};
use trader_protocol::vault::{LoginState, UserRegistry};

const API: &str = "https://testnet.mirrornode.hedera.com/api/v1/";
const APP: AccountId = AccountId::new(0, 0, 98);
const SELLER: AccountId = AccountId::new(0, 0, 2001);
const BUYER: AccountId = AccountId::new(0, 0, 2002);
const FT: TokenId = TokenId::new(0, 0, 7001);
const NFT: TokenId = TokenId::new(0, 0, 7002);
const PASSWORD: &str = "correctHorse42battery";

// ---------------------------------------------------------------------------
// Test Helpers
// ---------------------------------------------------------------------------

struct World {
    _dir: TempDir,
    engine: TradeEngine,
    ledger: Arc<SimulatedLedger>,
    transport: Arc<MemoryTransport>,
    seller: Credentials,
    buyer: Credentials,
}

fn fast_registry() -> UserRegistry {
    UserRegistry::new().with_params(EncryptionParams {
        iterations: 10,
        ..EncryptionParams::default()
    })
}

/// Registers both parties, persists the vault, reloads it and unlocks
/// their keys from the reloaded copy.
fn world() -> World {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("users.json");

    let seller_key = LedgerPrivateKey::generate();
    let buyer_key = LedgerPrivateKey::generate();
    let ledger = Arc::new(SimulatedLedger::new());
    ledger.register_account(SELLER, seller_key.public_key());
    ledger.register_account(BUYER, buyer_key.public_key());

    let mut registry = fast_registry();
    registry
        .register(SELLER, &seller_key, PASSWORD, NetworkChoice::Testnet)
        .expect("register seller");
    registry
        .register(BUYER, &buyer_key, PASSWORD, NetworkChoice::Testnet)
        .expect("register buyer");
    registry.save(&path).expect("save vault");

    let reloaded = UserRegistry::load(&path).expect("load vault");
    let mut login = LoginState::default();
    let seller = reloaded
        .login(&mut login, SELLER, PASSWORD)
        .expect("seller login");
    assert!(login.is_logged_in());
    let buyer = reloaded.unlock(BUYER, PASSWORD).expect("buyer unlock");

    let transport = Arc::new(MemoryTransport::new());
    transport.insert(
        format!("{API}tokens/{FT}"),
        json!({ "token_id": FT.to_string(), "type": "FUNGIBLE_COMMON", "name": "Gold", "symbol": "AU" }),
    );
    transport.insert(
        format!("{API}tokens/{NFT}"),
        json!({ "token_id": NFT.to_string(), "type": "NON_FUNGIBLE_UNIQUE", "name": "Art", "symbol": "ART" }),
    );
    transport.insert(
        format!("{API}tokens/{NFT}/nfts/7"),
        json!({ "token_id": NFT.to_string(), "serial_number": 7, "account_id": SELLER.to_string() }),
    );
    transport.insert(
        format!("{API}accounts/{BUYER}"),
        json!({ "account": BUYER.to_string() }),
    );

    let config = TraderConfig::new(NetworkChoice::Testnet, APP);
    let mirror = MirrorClient::with_transport(&config, transport.clone());
    World {
        _dir: dir,
        engine: TradeEngine::new(config, mirror, ledger.clone()),
        ledger,
        transport,
        seller,
        buyer,
    }
}

/// Publishes what the ledger stored for `schedule` on the mirror, the way
/// the real mirror node would after consensus.
fn publish(world: &World, schedule: ScheduleId) {
    let body = world
        .ledger
        .schedule_body(schedule)
        .expect("schedule stored on ledger");
    world.transport.insert(
        format!("{API}schedules/{schedule}"),
        json!({
            "schedule_id": schedule.to_string(),
            "creator_account_id": SELLER.to_string(),
            "memo": world.ledger.schedule_memo(schedule).unwrap_or_default(),
            "transaction_body": encode_schedule_body(&body),
        }),
    );
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn nft_swap_end_to_end() {
    let w = world();
    let price = Hbar::from_hbar(50);
    let fee = calculate_fee(price);
    assert_eq!(fee, "0.5".parse::<Hbar>().unwrap());

    assert!(account_validator(w.engine.mirror(), &BUYER.to_string())
        .await
        .is_valid());
    let request = TradeRequest::new(BUYER, price, NFT).with_serial(7);
    let handle = w.engine.trade_token(&w.seller, request).await.unwrap();
    publish(&w, handle.schedule_id);

    // Buyer side: only the share code travels.
    let code = handle.share_code();
    assert_eq!(schedule_id_from_share_code(&code), Some(handle.schedule_id));
    assert_eq!(
        schedule_validator(w.engine.mirror(), &code).await,
        Verdict::Valid(Validator::Schedule)
    );

    let review = w.engine.review_schedule(handle.schedule_id).await.unwrap();
    assert_eq!(review.memo, "Transfer 7@0.0.7002 via Token Trader");
    assert_eq!(review.hbar_delta(BUYER), -price);
    assert_eq!(review.hbar_delta(SELLER), price - fee);
    assert_eq!(review.hbar_delta(APP), fee);
    assert_eq!(review.nfts.len(), 1);
    assert_eq!(review.nfts[0].sender, Some(SELLER));
    assert_eq!(review.nfts[0].receiver, Some(BUYER));

    let receipt = w
        .engine
        .sign_schedule(&w.buyer, handle.schedule_id)
        .await
        .unwrap();
    assert_eq!(receipt.status, ReceiptStatus::Success);
    assert!(w.ledger.is_executed(handle.schedule_id));
    assert_eq!(w.ledger.nft_owner(NFT, 7), Some(BUYER));
    assert_eq!(w.ledger.hbar_delta(SELLER), price - fee);
    assert_eq!(w.ledger.hbar_delta(BUYER), -price);
    assert_eq!(w.ledger.hbar_delta(APP), fee);
}

#[tokio::test]
async fn fungible_swap_conserves_value() {
    let w = world();
    let price = Hbar::from_hbar(2_500);
    let request = TradeRequest::new(BUYER, price, FT).with_quantity(40);
    let handle = w.engine.trade_token(&w.seller, request).await.unwrap();
    publish(&w, handle.schedule_id);

    let review = w.engine.review_schedule(handle.schedule_id).await.unwrap();
    let net: Hbar = review.hbar.iter().map(|leg| leg.amount).sum();
    assert_eq!(net, Hbar::ZERO);
    assert_eq!(review.tokens.iter().map(|leg| leg.amount).sum::<i64>(), 0);

    w.engine
        .sign_schedule(&w.buyer, handle.schedule_id)
        .await
        .unwrap();
    assert_eq!(w.ledger.hbar_delta(APP), Hbar::from_hbar(10));
    assert_eq!(w.ledger.token_delta(BUYER, FT), 40);
    assert_eq!(w.ledger.token_delta(SELLER, FT), -40);
}

#[tokio::test]
async fn buyer_signing_twice_sees_benign_status() {
    let w = world();
    let request = TradeRequest::new(BUYER, Hbar::from_hbar(5), FT);
    let handle = w.engine.trade_token(&w.seller, request).await.unwrap();
    w.engine
        .sign_schedule(&w.buyer, handle.schedule_id)
        .await
        .unwrap();
    let again = w
        .engine
        .sign_schedule(&w.buyer, handle.schedule_id)
        .await
        .unwrap();
    assert_eq!(again.status, ReceiptStatus::ScheduleAlreadyExecuted);
}

#[tokio::test]
async fn unpublished_or_garbled_codes_fail_validation() {
    let w = world();
    let request = TradeRequest::new(BUYER, Hbar::from_hbar(5), NFT).with_serial(7);
    let handle = w.engine.trade_token(&w.seller, request).await.unwrap();

    // Not on the mirror yet.
    assert_eq!(
        schedule_validator(w.engine.mirror(), &handle.share_code()).await,
        Verdict::Invalid(Validator::Schedule)
    );
    assert!(w.engine.review_schedule(handle.schedule_id).await.is_none());

    assert_eq!(
        schedule_validator(w.engine.mirror(), "not a code").await,
        Verdict::Invalid(Validator::Schedule)
    );
}

#[test]
fn local_validators_against_reloaded_vault() {
    let w = world();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("users.json");
    let mut registry = fast_registry();
    registry
        .register(SELLER, &w.seller.key, PASSWORD, NetworkChoice::Testnet)
        .unwrap();
    registry.save(&path).unwrap();
    let registry = UserRegistry::load(&path).unwrap();

    assert!(auth_password(&registry, &SELLER.to_string(), PASSWORD).is_valid());
    assert!(!auth_password(&registry, &SELLER.to_string(), "wrongHorse42battery").is_valid());
    assert!(!auth_password(&registry, &BUYER.to_string(), PASSWORD).is_valid());
    assert!(!not_sender_validator("0.0.2001", "0.0.2001").is_valid());
}
