//! # Swap Engine
//!
//! Two-party atomic swaps on top of the ledger's scheduled transactions.
//!
//! ```text
//!   seller                         ledger                       buyer
//!     │  trade_token ─────────────► create schedule               │
//!     │  ◄──────── ScheduleHandle (id, share code)                │
//!     │  ─────────── share code, out of band ───────────────────► │
//!     │                                  ◄──── review_schedule ── │
//!     │                                  ◄──── sign_schedule ──── │
//!     │                          executes once every debited      │
//!     │                          account has signed               │
//! ```
//!
//! The seller's signature lands with the create (they submit it), so the
//! schedule usually executes on the buyer's counter-signature.
//!
//! ## Retry semantics
//!
//! Nothing here retries. A second `create_schedule` opens a second,
//! independent schedule, so a failed create is reported and left for the
//! caller to decide on.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::{
    NetworkChoice, TraderConfig, CORRELATION_ID_RANGE, DEFAULT_FUNGIBLE_QUANTITY,
    EXPLORER_BASE_URL, MAX_TRANSACTION_FEE, SCHEDULE_MEMO_PREFIX,
};
use crate::crypto::keys::Credentials;
use crate::ledger::{
    AccountId, Hbar, LedgerError, LedgerNetwork, ScheduleCreateRequest, ScheduleId, TokenId,
    TransactionId, TransactionReceipt,
};
use crate::mirror::{MirrorClient, TokenType};
use crate::schedule::codec::{decode_schedule_body, schedule_share_code, TransferSummary};
use crate::trade::error::TradeError;
use crate::trade::fees::calculate_fee;
use crate::trade::transfer::{build_nft_transfer, build_token_transfer, TransferIntent};

// ---------------------------------------------------------------------------
// Requests and handles
// ---------------------------------------------------------------------------

/// What the seller asks for: `token` (and `serial`, for an NFT) to
/// `receiver` in exchange for `amount` hbar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeRequest {
    pub receiver: AccountId,
    pub amount: Hbar,
    pub token: TokenId,
    pub serial: Option<i64>,
    /// Units of a fungible token. Ignored for NFTs.
    pub quantity: i64,
}

impl TradeRequest {
    pub fn new(receiver: AccountId, amount: Hbar, token: TokenId) -> Self {
        Self {
            receiver,
            amount,
            token,
            serial: None,
            quantity: DEFAULT_FUNGIBLE_QUANTITY,
        }
    }

    pub fn with_serial(mut self, serial: i64) -> Self {
        self.serial = Some(serial);
        self
    }

    pub fn with_quantity(mut self, quantity: i64) -> Self {
        self.quantity = quantity;
        self
    }
}

/// A schedule that now exists on the ledger, waiting for signatures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleHandle {
    pub schedule_id: ScheduleId,
    /// The schedule-create transaction.
    pub transaction_id: TransactionId,
    /// The inner transfer, once it runs.
    pub scheduled_transaction_id: Option<TransactionId>,
    pub memo: String,
    pub correlation_id: u32,
}

impl ScheduleHandle {
    /// Code to hand the counterparty.
    pub fn share_code(&self) -> String {
        schedule_share_code(self.schedule_id)
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

pub struct TradeEngine {
    config: TraderConfig,
    mirror: MirrorClient,
    ledger: Arc<dyn LedgerNetwork>,
}

impl TradeEngine {
    pub fn new(config: TraderConfig, mirror: MirrorClient, ledger: Arc<dyn LedgerNetwork>) -> Self {
        Self {
            config,
            mirror,
            ledger,
        }
    }

    pub fn config(&self) -> &TraderConfig {
        &self.config
    }

    pub fn mirror(&self) -> &MirrorClient {
        &self.mirror
    }

    pub fn app_account(&self) -> AccountId {
        self.config.app_account
    }

    pub fn calculate_fee(&self, amount: Hbar) -> Hbar {
        calculate_fee(amount)
    }

    /// Builds the transfer for `request` without submitting anything.
    ///
    /// The token type, looked up on the mirror, decides between the
    /// fungible and NFT shapes.
    pub async fn prepare_trade(
        &self,
        sender: AccountId,
        request: &TradeRequest,
    ) -> Result<TransferIntent, TradeError> {
        if request.amount.is_negative() {
            return Err(TradeError::NegativeHbarAmount(request.amount));
        }
        if sender == request.receiver {
            return Err(TradeError::SenderIsReceiver);
        }

        let token_type = self
            .mirror
            .get_token_type(&request.token.to_string())
            .await
            .ok_or(TradeError::UnknownToken(request.token))?;

        let app = self.app_account();
        match token_type {
            TokenType::FungibleCommon => build_token_transfer(
                request.token,
                sender,
                request.receiver,
                request.amount,
                request.quantity,
                app,
            ),
            TokenType::NonFungibleUnique => {
                let serial = request
                    .serial
                    .ok_or(TradeError::MissingSerial(request.token))?;
                build_nft_transfer(
                    request.token,
                    sender,
                    request.receiver,
                    request.amount,
                    serial,
                    app,
                )
            }
        }
    }

    /// Builds the transfer for `request` and opens a schedule for it,
    /// signed and paid for by `sender`.
    pub async fn trade_token(
        &self,
        sender: &Credentials,
        request: TradeRequest,
    ) -> Result<ScheduleHandle, TradeError> {
        let intent = self.prepare_trade(sender.account, &request).await?;
        self.create_schedule(sender, &intent).await
    }

    /// Wraps `intent` in a schedule-create with a random correlation id in
    /// its memo.
    pub async fn create_schedule(
        &self,
        creator: &Credentials,
        intent: &TransferIntent,
    ) -> Result<ScheduleHandle, TradeError> {
        let correlation_id = rand::thread_rng().gen_range(0..CORRELATION_ID_RANGE);
        let memo = format!("{SCHEDULE_MEMO_PREFIX}{correlation_id}");
        let request = ScheduleCreateRequest {
            scheduled: intent.to_schedulable_body(),
            schedule_memo: memo.clone(),
            max_transaction_fee: MAX_TRANSACTION_FEE,
        };

        let receipt = self
            .ledger
            .create_schedule(creator, request)
            .await
            .map_err(|e| {
                warn!(creator = %creator.account, error = %e, "schedule create failed");
                e
            })?;
        let schedule_id = receipt.schedule_id.ok_or(TradeError::MissingScheduleId)?;

        info!(
            schedule = %schedule_id,
            creator = %creator.account,
            correlation_id,
            "schedule created"
        );
        Ok(ScheduleHandle {
            schedule_id,
            transaction_id: receipt.transaction_id,
            scheduled_transaction_id: receipt.scheduled_transaction_id,
            memo,
            correlation_id,
        })
    }

    /// Adds `signer`'s signature to `schedule`.
    ///
    /// "Already signed" and "already executed" are what a second,
    /// concurrent signer sees; they come back as a receipt carrying that
    /// status rather than as an error.
    pub async fn sign_schedule(
        &self,
        signer: &Credentials,
        schedule: ScheduleId,
    ) -> Result<TransactionReceipt, TradeError> {
        match self.ledger.sign_schedule(signer, schedule).await {
            Ok(receipt) => {
                info!(schedule = %schedule, signer = %signer.account, "schedule signed");
                Ok(receipt)
            }
            Err(LedgerError::Rejected {
                status,
                transaction_id,
            }) if status.is_benign_sign_rejection() => {
                debug!(schedule = %schedule, signer = %signer.account, %status, "sign was a no-op");
                Ok(TransactionReceipt {
                    status,
                    transaction_id: transaction_id
                        .unwrap_or_else(|| TransactionId::generate(signer.account)),
                    schedule_id: Some(schedule),
                    scheduled_transaction_id: None,
                })
            }
            Err(e) => {
                warn!(schedule = %schedule, signer = %signer.account, error = %e, "sign failed");
                Err(e.into())
            }
        }
    }

    /// Decodes the pending transfer behind `schedule` so the counterparty
    /// can check it before signing. `None` if it can't be fetched or decoded.
    pub async fn review_schedule(&self, schedule: ScheduleId) -> Option<TransferSummary> {
        let base64 = self.mirror.schedule_transaction_body(schedule).await?;
        let body = decode_schedule_body(&base64)?;
        Some(TransferSummary::from_body(&body))
    }

    pub async fn associate_token(
        &self,
        account: &Credentials,
        token: TokenId,
    ) -> Result<TransactionReceipt, TradeError> {
        let receipt = self.ledger.associate_token(account, token).await?;
        info!(account = %account.account, %token, "token associated");
        Ok(receipt)
    }

    pub async fn get_receipt(
        &self,
        operator: &Credentials,
        transaction_id: TransactionId,
    ) -> Result<TransactionReceipt, TradeError> {
        Ok(self.ledger.get_receipt(operator, transaction_id).await?)
    }

    /// Explorer page for `token` on the configured network.
    pub fn explorer_link(&self, token: TokenId, serial: Option<i64>) -> String {
        explorer_link(token, serial, self.config.network)
    }

    pub fn mirror_transaction_link(&self, transaction_id: &TransactionId) -> String {
        self.mirror.transaction_link(transaction_id)
    }
}

/// Explorer page for `token`. Fungible tokens have no serial; the explorer
/// expects `1` for them.
pub fn explorer_link(token: TokenId, serial: Option<i64>, network: NetworkChoice) -> String {
    let serial = serial.filter(|&s| s != 0).unwrap_or(1);
    format!(
        "{EXPLORER_BASE_URL}?tokenId={token}-{serial}&network={}",
        network.explorer_network()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::keys::LedgerPrivateKey;
    use crate::ledger::{ReceiptStatus, SimulatedLedger};
    use crate::mirror::MemoryTransport;
    use serde_json::json;

    const API: &str = "https://testnet.mirrornode.hedera.com/api/v1/";
    const APP: AccountId = AccountId::new(0, 0, 9);
    const FT: TokenId = TokenId::new(0, 0, 5000);
    const NFT: TokenId = TokenId::new(0, 0, 6000);

    struct Fixture {
        engine: TradeEngine,
        ledger: Arc<SimulatedLedger>,
        seller: Credentials,
        buyer: Credentials,
    }

    fn fixture() -> Fixture {
        let transport = Arc::new(MemoryTransport::new());
        transport.insert(
            format!("{API}tokens/{FT}"),
            json!({ "token_id": FT.to_string(), "type": "FUNGIBLE_COMMON" }),
        );
        transport.insert(
            format!("{API}tokens/{NFT}"),
            json!({ "token_id": NFT.to_string(), "type": "NON_FUNGIBLE_UNIQUE" }),
        );
        let config = TraderConfig::new(NetworkChoice::Testnet, APP);
        let mirror = MirrorClient::with_transport(&config, transport);
        let ledger = Arc::new(SimulatedLedger::new());

        let register = |num| {
            let key = LedgerPrivateKey::generate();
            let account = AccountId::new(0, 0, num);
            ledger.register_account(account, key.public_key());
            Credentials::new(account, key)
        };
        let seller = register(1001);
        let buyer = register(1002);

        Fixture {
            engine: TradeEngine::new(config, mirror, ledger.clone()),
            ledger,
            seller,
            buyer,
        }
    }

    #[tokio::test]
    async fn fungible_swap_executes_on_counter_signature() {
        let f = fixture();
        let request = TradeRequest::new(f.buyer.account, Hbar::from_hbar(100), FT).with_quantity(5);
        let handle = f.engine.trade_token(&f.seller, request).await.unwrap();
        assert!(handle.memo.starts_with(SCHEDULE_MEMO_PREFIX));
        assert!(handle.correlation_id < CORRELATION_ID_RANGE);
        assert!(!f.ledger.is_executed(handle.schedule_id));

        let receipt = f
            .engine
            .sign_schedule(&f.buyer, handle.schedule_id)
            .await
            .unwrap();
        assert_eq!(receipt.status, ReceiptStatus::Success);
        assert!(f.ledger.is_executed(handle.schedule_id));
        assert_eq!(f.ledger.hbar_delta(f.seller.account), Hbar::from_hbar(99));
        assert_eq!(f.ledger.hbar_delta(f.buyer.account), Hbar::from_hbar(-100));
        assert_eq!(f.ledger.hbar_delta(APP), Hbar::from_hbar(1));
        assert_eq!(f.ledger.token_delta(f.buyer.account, FT), 5);
    }

    #[tokio::test]
    async fn second_signature_is_tolerated() {
        let f = fixture();
        let request = TradeRequest::new(f.buyer.account, Hbar::from_hbar(10), NFT).with_serial(3);
        let handle = f.engine.trade_token(&f.seller, request).await.unwrap();
        f.engine
            .sign_schedule(&f.buyer, handle.schedule_id)
            .await
            .unwrap();
        let again = f
            .engine
            .sign_schedule(&f.buyer, handle.schedule_id)
            .await
            .unwrap();
        assert_eq!(again.status, ReceiptStatus::ScheduleAlreadyExecuted);
        assert_eq!(f.ledger.nft_owner(NFT, 3), Some(f.buyer.account));
    }

    #[tokio::test]
    async fn seller_resigning_is_no_new_signature() {
        let f = fixture();
        let request = TradeRequest::new(f.buyer.account, Hbar::from_hbar(10), FT);
        let handle = f.engine.trade_token(&f.seller, request).await.unwrap();
        let receipt = f
            .engine
            .sign_schedule(&f.seller, handle.schedule_id)
            .await
            .unwrap();
        assert_eq!(receipt.status, ReceiptStatus::NoNewValidSignatures);
        assert!(!f.ledger.is_executed(handle.schedule_id));
    }

    #[tokio::test]
    async fn unknown_schedule_is_an_error() {
        let f = fixture();
        let err = f
            .engine
            .sign_schedule(&f.buyer, ScheduleId::new(0, 0, 1))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "INVALID_SCHEDULE_ID");
    }

    #[tokio::test]
    async fn contract_violations_surface_as_errors() {
        let f = fixture();
        let negative = TradeRequest::new(f.buyer.account, Hbar::from_tinybars(-1), FT);
        assert_eq!(
            f.engine
                .trade_token(&f.seller, negative)
                .await
                .unwrap_err()
                .code(),
            "NEGATIVE_HBAR_AMOUNT"
        );

        let no_serial = TradeRequest::new(f.buyer.account, Hbar::from_hbar(1), NFT);
        assert!(matches!(
            f.engine.trade_token(&f.seller, no_serial).await,
            Err(TradeError::MissingSerial(_))
        ));

        let unknown = TradeRequest::new(f.buyer.account, Hbar::from_hbar(1), TokenId::new(0, 0, 1));
        assert!(matches!(
            f.engine.trade_token(&f.seller, unknown).await,
            Err(TradeError::UnknownToken(_))
        ));

        let to_self = TradeRequest::new(f.seller.account, Hbar::from_hbar(1), FT);
        assert!(matches!(
            f.engine.trade_token(&f.seller, to_self).await,
            Err(TradeError::SenderIsReceiver)
        ));
    }

    #[tokio::test]
    async fn unregistered_creator_is_rejected_by_ledger() {
        let f = fixture();
        let stranger = Credentials::new(AccountId::new(0, 0, 4444), LedgerPrivateKey::generate());
        let request = TradeRequest::new(f.buyer.account, Hbar::from_hbar(1), FT);
        let err = f.engine.trade_token(&stranger, request).await.unwrap_err();
        assert_eq!(err.code(), "PAYER_ACCOUNT_NOT_FOUND");
    }

    #[tokio::test]
    async fn associate_then_receipt() {
        let f = fixture();
        let receipt = f.engine.associate_token(&f.buyer, FT).await.unwrap();
        assert!(f.ledger.is_associated(f.buyer.account, FT));
        let fetched = f
            .engine
            .get_receipt(&f.buyer, receipt.transaction_id)
            .await
            .unwrap();
        assert_eq!(fetched, receipt);

        let again = f.engine.associate_token(&f.buyer, FT).await.unwrap_err();
        assert_eq!(again.code(), "TOKEN_ALREADY_ASSOCIATED_TO_ACCOUNT");
    }

    #[test]
    fn explorer_links() {
        assert_eq!(
            explorer_link(NFT, Some(7), NetworkChoice::MainnetPublic),
            "https://gomint.me/explore/NFT/?tokenId=0.0.6000-7&network=mainnet"
        );
        assert_eq!(
            explorer_link(FT, None, NetworkChoice::Testnet),
            "https://gomint.me/explore/NFT/?tokenId=0.0.5000-1&network=testnet"
        );
    }

    #[test]
    fn share_code_decodes_to_schedule() {
        let handle = ScheduleHandle {
            schedule_id: ScheduleId::new(0, 0, 123),
            transaction_id: TransactionId::generate(AccountId::new(0, 0, 1)),
            scheduled_transaction_id: None,
            memo: String::new(),
            correlation_id: 0,
        };
        assert_eq!(
            crate::schedule::codec::schedule_id_from_share_code(&handle.share_code()),
            Some(handle.schedule_id)
        );
    }
}
