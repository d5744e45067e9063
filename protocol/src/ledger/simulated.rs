//! In-memory ledger.
//!
//! Implements [`LedgerNetwork`] against local state so the swap flow can be
//! exercised end to end without a consensus node: signature checks against
//! registered account keys, schedule signatories, execution once every
//! debited account has signed, and the network's "already signed" /
//! "already executed" rejections.
//!
//! Executed schedules apply their legs to per-account net deltas, which is
//! what tests assert against.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::{BTreeSet, HashMap, HashSet};
use tracing::{debug, info};

use crate::crypto::keys::{Credentials, LedgerPublicKey};
use crate::ledger::amount::Hbar;
use crate::ledger::ids::{AccountId, ScheduleId, TokenId, TransactionId};
use crate::ledger::network::{
    LedgerError, LedgerNetwork, ReceiptStatus, ScheduleCreateRequest, TransactionReceipt,
};
use crate::ledger::proto::SchedulableTransactionBody;

/// Entity numbers handed out by the simulator start here.
const FIRST_ENTITY_NUM: u64 = 100_000;

#[derive(Debug, Clone)]
struct SimulatedSchedule {
    body: SchedulableTransactionBody,
    memo: String,
    required: BTreeSet<AccountId>,
    signatories: BTreeSet<AccountId>,
    scheduled_transaction_id: TransactionId,
    executed: bool,
}

#[derive(Debug, Default)]
struct State {
    next_num: u64,
    keys: HashMap<AccountId, LedgerPublicKey>,
    schedules: HashMap<ScheduleId, SimulatedSchedule>,
    associations: HashSet<(AccountId, TokenId)>,
    receipts: HashMap<TransactionId, TransactionReceipt>,
    hbar_deltas: HashMap<AccountId, Hbar>,
    token_deltas: HashMap<(AccountId, TokenId), i64>,
    nft_owners: HashMap<(TokenId, i64), AccountId>,
}

/// A single-process stand-in for the consensus network.
#[derive(Debug)]
pub struct SimulatedLedger {
    shard: u64,
    realm: u64,
    state: RwLock<State>,
}

impl Default for SimulatedLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedLedger {
    pub fn new() -> Self {
        Self {
            shard: 0,
            realm: 0,
            state: RwLock::new(State {
                next_num: FIRST_ENTITY_NUM,
                ..State::default()
            }),
        }
    }

    /// Makes `account` known with its public key. Unregistered accounts
    /// can't pay for or sign anything.
    pub fn register_account(&self, account: AccountId, key: LedgerPublicKey) {
        self.state.write().keys.insert(account, key);
    }

    /// The inner body of a schedule, as the mirror would serve it.
    pub fn schedule_body(&self, schedule: ScheduleId) -> Option<SchedulableTransactionBody> {
        self.state
            .read()
            .schedules
            .get(&schedule)
            .map(|s| s.body.clone())
    }

    pub fn schedule_memo(&self, schedule: ScheduleId) -> Option<String> {
        self.state
            .read()
            .schedules
            .get(&schedule)
            .map(|s| s.memo.clone())
    }

    pub fn signatories(&self, schedule: ScheduleId) -> Vec<AccountId> {
        self.state
            .read()
            .schedules
            .get(&schedule)
            .map(|s| s.signatories.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn is_executed(&self, schedule: ScheduleId) -> bool {
        self.state
            .read()
            .schedules
            .get(&schedule)
            .map(|s| s.executed)
            .unwrap_or(false)
    }

    /// Net hbar change applied to `account` by executed schedules.
    pub fn hbar_delta(&self, account: AccountId) -> Hbar {
        self.state
            .read()
            .hbar_deltas
            .get(&account)
            .copied()
            .unwrap_or_default()
    }

    /// Net fungible-token change applied to `account` by executed schedules.
    pub fn token_delta(&self, account: AccountId, token: TokenId) -> i64 {
        self.state
            .read()
            .token_deltas
            .get(&(account, token))
            .copied()
            .unwrap_or(0)
    }

    pub fn nft_owner(&self, token: TokenId, serial: i64) -> Option<AccountId> {
        self.state.read().nft_owners.get(&(token, serial)).copied()
    }

    pub fn is_associated(&self, account: AccountId, token: TokenId) -> bool {
        self.state.read().associations.contains(&(account, token))
    }

    fn rejected(status: ReceiptStatus, transaction_id: TransactionId) -> LedgerError {
        LedgerError::Rejected {
            status,
            transaction_id: Some(transaction_id),
        }
    }

    /// Checks that `credentials` actually hold the registered key for their
    /// account by signing the transaction id and verifying it.
    fn authenticate(
        state: &State,
        credentials: &Credentials,
        transaction_id: TransactionId,
    ) -> Result<(), LedgerError> {
        let registered = state
            .keys
            .get(&credentials.account)
            .ok_or_else(|| Self::rejected(ReceiptStatus::PayerAccountNotFound, transaction_id))?;
        let challenge = transaction_id.to_string();
        let signature = credentials.key.sign(challenge.as_bytes());
        if !registered.verify(challenge.as_bytes(), &signature) {
            return Err(Self::rejected(ReceiptStatus::InvalidSignature, transaction_id));
        }
        Ok(())
    }

    fn record(state: &mut State, receipt: TransactionReceipt) -> TransactionReceipt {
        state.receipts.insert(receipt.transaction_id, receipt.clone());
        receipt
    }

    fn execute(state: &mut State, schedule: ScheduleId) {
        let Some(entry) = state.schedules.get_mut(&schedule) else {
            return;
        };
        if entry.executed || !entry.required.is_subset(&entry.signatories) {
            return;
        }
        entry.executed = true;
        let body = entry.body.clone();

        if let Some(transfer) = body.crypto_transfer {
            for leg in transfer.transfers.iter().flat_map(|t| &t.account_amounts) {
                if let Some(account) = leg.account_id.as_ref().and_then(AccountId::from_proto) {
                    let delta = state.hbar_deltas.entry(account).or_default();
                    *delta = *delta + Hbar::from_tinybars(leg.amount);
                }
            }
            for list in &transfer.token_transfers {
                let Some(token) = list.token.as_ref().map(TokenId::from_proto) else {
                    continue;
                };
                for leg in &list.transfers {
                    if let Some(account) = leg.account_id.as_ref().and_then(AccountId::from_proto)
                    {
                        let delta = state.token_deltas.entry((account, token)).or_default();
                        *delta = delta.saturating_add(leg.amount);
                    }
                }
                for nft in &list.nft_transfers {
                    if let Some(receiver) = nft
                        .receiver_account_id
                        .as_ref()
                        .and_then(AccountId::from_proto)
                    {
                        state.nft_owners.insert((token, nft.serial_number), receiver);
                    }
                }
            }
        }
        info!(schedule = %schedule, "simulated schedule executed");
    }
}

/// Accounts whose signature a transfer needs: anyone debited hbar or
/// fungible units, and every NFT sender.
pub fn required_signers(body: &SchedulableTransactionBody) -> BTreeSet<AccountId> {
    let mut required = BTreeSet::new();
    let Some(transfer) = body.crypto_transfer.as_ref() else {
        return required;
    };

    let debited = transfer
        .transfers
        .iter()
        .flat_map(|t| &t.account_amounts)
        .chain(transfer.token_transfers.iter().flat_map(|t| &t.transfers))
        .filter(|leg| leg.amount < 0)
        .filter_map(|leg| leg.account_id.as_ref().and_then(AccountId::from_proto));
    required.extend(debited);

    let nft_senders = transfer
        .token_transfers
        .iter()
        .flat_map(|t| &t.nft_transfers)
        .filter_map(|nft| nft.sender_account_id.as_ref().and_then(AccountId::from_proto));
    required.extend(nft_senders);

    required
}

#[async_trait]
impl LedgerNetwork for SimulatedLedger {
    async fn create_schedule(
        &self,
        operator: &Credentials,
        request: ScheduleCreateRequest,
    ) -> Result<TransactionReceipt, LedgerError> {
        let transaction_id = TransactionId::generate(operator.account);
        let mut state = self.state.write();
        Self::authenticate(&state, operator, transaction_id)?;
        if request.max_transaction_fee.is_negative() || request.max_transaction_fee.is_zero() {
            return Err(Self::rejected(ReceiptStatus::InsufficientTxFee, transaction_id));
        }

        let schedule_id = ScheduleId::new(self.shard, self.realm, state.next_num);
        state.next_num += 1;

        let required = required_signers(&request.scheduled);
        let mut signatories = BTreeSet::new();
        if required.contains(&operator.account) {
            signatories.insert(operator.account);
        }
        let scheduled_transaction_id = transaction_id.as_scheduled();

        state.schedules.insert(
            schedule_id,
            SimulatedSchedule {
                body: request.scheduled,
                memo: request.schedule_memo,
                required,
                signatories,
                scheduled_transaction_id,
                executed: false,
            },
        );
        Self::execute(&mut state, schedule_id);
        debug!(schedule = %schedule_id, creator = %operator.account, "simulated schedule created");

        Ok(Self::record(
            &mut state,
            TransactionReceipt {
                status: ReceiptStatus::Success,
                transaction_id,
                schedule_id: Some(schedule_id),
                scheduled_transaction_id: Some(scheduled_transaction_id),
            },
        ))
    }

    async fn sign_schedule(
        &self,
        signer: &Credentials,
        schedule: ScheduleId,
    ) -> Result<TransactionReceipt, LedgerError> {
        let transaction_id = TransactionId::generate(signer.account);
        let mut state = self.state.write();
        Self::authenticate(&state, signer, transaction_id)?;

        let entry = state
            .schedules
            .get_mut(&schedule)
            .ok_or_else(|| Self::rejected(ReceiptStatus::InvalidScheduleId, transaction_id))?;
        if entry.executed {
            return Err(Self::rejected(
                ReceiptStatus::ScheduleAlreadyExecuted,
                transaction_id,
            ));
        }
        if !entry.required.contains(&signer.account) || !entry.signatories.insert(signer.account)
        {
            return Err(Self::rejected(
                ReceiptStatus::NoNewValidSignatures,
                transaction_id,
            ));
        }
        let scheduled_transaction_id = entry.scheduled_transaction_id;

        Self::execute(&mut state, schedule);
        Ok(Self::record(
            &mut state,
            TransactionReceipt {
                status: ReceiptStatus::Success,
                transaction_id,
                schedule_id: Some(schedule),
                scheduled_transaction_id: Some(scheduled_transaction_id),
            },
        ))
    }

    async fn associate_token(
        &self,
        account: &Credentials,
        token: TokenId,
    ) -> Result<TransactionReceipt, LedgerError> {
        let transaction_id = TransactionId::generate(account.account);
        let mut state = self.state.write();
        Self::authenticate(&state, account, transaction_id)?;
        if !state.associations.insert((account.account, token)) {
            return Err(Self::rejected(
                ReceiptStatus::TokenAlreadyAssociatedToAccount,
                transaction_id,
            ));
        }
        Ok(Self::record(
            &mut state,
            TransactionReceipt {
                status: ReceiptStatus::Success,
                transaction_id,
                schedule_id: None,
                scheduled_transaction_id: None,
            },
        ))
    }

    async fn get_receipt(
        &self,
        _operator: &Credentials,
        transaction_id: TransactionId,
    ) -> Result<TransactionReceipt, LedgerError> {
        self.state
            .read()
            .receipts
            .get(&transaction_id)
            .cloned()
            .ok_or_else(|| Self::rejected(ReceiptStatus::ReceiptNotFound, transaction_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::keys::LedgerPrivateKey;
    use crate::ledger::amount::Hbar;
    use crate::ledger::proto::{
        AccountAmount, CryptoTransferTransactionBody, SchedulableTransactionBody, TransferList,
    };

    fn credentials(ledger: &SimulatedLedger, num: u64) -> Credentials {
        let key = LedgerPrivateKey::generate();
        let account = AccountId::new(0, 0, num);
        ledger.register_account(account, key.public_key());
        Credentials::new(account, key)
    }

    fn leg(account: AccountId, amount: i64) -> AccountAmount {
        AccountAmount {
            account_id: Some(account.to_proto()),
            amount,
            is_approval: false,
        }
    }

    fn two_party_body(payer: AccountId, payee: AccountId) -> SchedulableTransactionBody {
        SchedulableTransactionBody {
            transaction_fee: 200_000_000,
            memo: String::new(),
            crypto_transfer: Some(CryptoTransferTransactionBody {
                transfers: Some(TransferList {
                    account_amounts: vec![leg(payee, 500), leg(payer, -500)],
                }),
                token_transfers: Vec::new(),
            }),
        }
    }

    fn request(body: SchedulableTransactionBody) -> ScheduleCreateRequest {
        ScheduleCreateRequest {
            scheduled: body,
            schedule_memo: "test".to_string(),
            max_transaction_fee: Hbar::from_hbar(2),
        }
    }

    #[tokio::test]
    async fn schedule_executes_after_counter_signature() {
        let ledger = SimulatedLedger::new();
        let alice = credentials(&ledger, 10);
        let bob = credentials(&ledger, 11);

        let receipt = ledger
            .create_schedule(&alice, request(two_party_body(bob.account, alice.account)))
            .await
            .unwrap();
        let schedule = receipt.schedule_id.unwrap();
        assert!(!ledger.is_executed(schedule));
        assert!(ledger.signatories(schedule).is_empty());

        ledger.sign_schedule(&bob, schedule).await.unwrap();
        assert!(ledger.is_executed(schedule));
        assert_eq!(ledger.hbar_delta(alice.account), Hbar::from_tinybars(500));
        assert_eq!(ledger.hbar_delta(bob.account), Hbar::from_tinybars(-500));
    }

    #[tokio::test]
    async fn second_signature_is_rejected_as_no_op() {
        let ledger = SimulatedLedger::new();
        let alice = credentials(&ledger, 10);
        let bob = credentials(&ledger, 11);
        let carol = credentials(&ledger, 12);

        let mut body = two_party_body(bob.account, alice.account);
        if let Some(transfer) = body.crypto_transfer.as_mut() {
            if let Some(list) = transfer.transfers.as_mut() {
                list.account_amounts.push(leg(carol.account, -1));
                list.account_amounts.push(leg(alice.account, 1));
            }
        }
        let schedule = ledger
            .create_schedule(&alice, request(body))
            .await
            .unwrap()
            .schedule_id
            .unwrap();

        ledger.sign_schedule(&bob, schedule).await.unwrap();
        let err = ledger.sign_schedule(&bob, schedule).await.unwrap_err();
        assert!(matches!(
            err,
            LedgerError::Rejected {
                status: ReceiptStatus::NoNewValidSignatures,
                ..
            }
        ));

        ledger.sign_schedule(&carol, schedule).await.unwrap();
        let err = ledger.sign_schedule(&carol, schedule).await.unwrap_err();
        assert!(matches!(
            err,
            LedgerError::Rejected {
                status: ReceiptStatus::ScheduleAlreadyExecuted,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn wrong_key_is_rejected() {
        let ledger = SimulatedLedger::new();
        let alice = credentials(&ledger, 10);
        let impostor = Credentials::new(alice.account, LedgerPrivateKey::generate());

        let err = ledger
            .create_schedule(&impostor, request(SchedulableTransactionBody::default()))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            LedgerError::Rejected {
                status: ReceiptStatus::InvalidSignature,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn unknown_schedule() {
        let ledger = SimulatedLedger::new();
        let alice = credentials(&ledger, 10);
        let err = ledger
            .sign_schedule(&alice, ScheduleId::new(0, 0, 1))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            LedgerError::Rejected {
                status: ReceiptStatus::InvalidScheduleId,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn association_is_recorded_once() {
        let ledger = SimulatedLedger::new();
        let alice = credentials(&ledger, 10);
        let token = TokenId::new(0, 0, 500);

        let receipt = ledger.associate_token(&alice, token).await.unwrap();
        assert!(ledger.is_associated(alice.account, token));

        let fetched = ledger
            .get_receipt(&alice, receipt.transaction_id)
            .await
            .unwrap();
        assert_eq!(fetched, receipt);

        assert!(ledger.associate_token(&alice, token).await.is_err());
    }

    #[test]
    fn required_signers_are_debited_accounts() {
        let payer = AccountId::new(0, 0, 1);
        let payee = AccountId::new(0, 0, 2);
        let required = required_signers(&two_party_body(payer, payee));
        assert_eq!(required.into_iter().collect::<Vec<_>>(), vec![payer]);
    }
}
