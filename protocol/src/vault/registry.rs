//! # User Registry
//!
//! One [`UserRecord`] per registered account: the private key encrypted
//! under the user's password, plus a salted hash of that same password.
//! Records are created once and never edited in place; changing a password
//! means registering a fresh record.
//!
//! ## Unlock flow
//!
//! ```text
//! password ──► check_password(hash, salt) ──✗──► WrongPassword
//!                      │ ✓
//!                      ▼
//!              decrypt_message(blob) ──✗──► CorruptKey
//!                      │ ✓
//!                      ▼
//!              parse DER hex ──► Credentials
//! ```
//!
//! The hash check runs first so a mistyped password costs one SHA-256
//! rather than a full PBKDF2 derivation.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::NetworkChoice;
use crate::crypto::encryption::{
    decrypt_message, encrypt_message_with, EncryptedBlob, EncryptionError, EncryptionParams,
};
use crate::crypto::hash::{check_password, hash_password, PasswordHash};
use crate::crypto::keys::{Credentials, LedgerPrivateKey};
use crate::ledger::AccountId;
use crate::vault::login::LoginState;
use crate::vault::policy::{PasswordPolicy, PolicyViolation};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum VaultError {
    #[error("account {0} is already registered")]
    AccountExists(AccountId),

    #[error("account {0} is not registered")]
    UnknownAccount(AccountId),

    #[error("wrong password")]
    WrongPassword,

    #[error("password rejected: {}", format_violations(.0))]
    WeakPassword(Vec<PolicyViolation>),

    /// The password matched its hash but the key blob didn't decrypt to a
    /// valid key. The record is damaged.
    #[error("stored key could not be recovered")]
    CorruptKey,

    #[error("encryption failed: {0}")]
    Encryption(#[from] EncryptionError),

    #[error("registry I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("registry file is malformed: {0}")]
    Parse(#[from] serde_json::Error),
}

fn format_violations(violations: &[PolicyViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

// ---------------------------------------------------------------------------
// UserRecord
// ---------------------------------------------------------------------------

/// Everything persisted about one registered account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub account: AccountId,
    pub encrypted_key: EncryptedBlob,
    pub hash_record: PasswordHash,
    pub network: NetworkChoice,
}

impl UserRecord {
    /// Encrypts `key` under `password` and hashes the password.
    pub fn seal(
        account: AccountId,
        key: &LedgerPrivateKey,
        password: &str,
        network: NetworkChoice,
        params: EncryptionParams,
    ) -> Result<Self, VaultError> {
        let der = key.to_der_hex();
        let encrypted_key = encrypt_message_with(&der, password, params)?;
        Ok(Self {
            account,
            encrypted_key,
            hash_record: hash_password(password),
            network,
        })
    }

    pub fn check_password(&self, password: &str) -> bool {
        check_password(password, &self.hash_record.hash, &self.hash_record.salt)
    }

    /// Recovers the signing key. Does not consult the password hash.
    pub fn open(&self, password: &str) -> Result<Credentials, VaultError> {
        let der = decrypt_message(&self.encrypted_key, password).ok_or(VaultError::CorruptKey)?;
        let key: LedgerPrivateKey = der.parse().map_err(|_| VaultError::CorruptKey)?;
        Ok(Credentials::new(self.account, key))
    }
}

// ---------------------------------------------------------------------------
// UserRegistry
// ---------------------------------------------------------------------------

/// Registered accounts keyed by account id.
///
/// The JSON form is a plain object from account id to record, so a file
/// written by one version stays readable by the next.
#[derive(Debug, Clone)]
pub struct UserRegistry {
    users: BTreeMap<AccountId, UserRecord>,
    policy: PasswordPolicy,
    params: EncryptionParams,
}

impl Default for UserRegistry {
    fn default() -> Self {
        Self {
            users: BTreeMap::new(),
            policy: PasswordPolicy::default(),
            params: EncryptionParams::default(),
        }
    }
}

impl UserRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the key-encryption parameters for records registered from
    /// now on. Existing records keep the parameters they were sealed with.
    pub fn with_params(mut self, params: EncryptionParams) -> Self {
        self.params = params;
        self
    }

    pub fn with_policy(mut self, policy: PasswordPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> &PasswordPolicy {
        &self.policy
    }

    /// Reads a registry file. A missing file is an empty registry.
    pub fn load(path: &Path) -> Result<Self, VaultError> {
        if !path.exists() {
            debug!(path = %path.display(), "no registry file yet");
            return Ok(Self::new());
        }
        let raw = std::fs::read_to_string(path)?;
        let users: BTreeMap<AccountId, UserRecord> = serde_json::from_str(&raw)?;
        Ok(Self {
            users,
            ..Self::default()
        })
    }

    /// Writes the registry as pretty JSON, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<(), VaultError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(&self.users)?;
        std::fs::write(path, json)?;
        debug!(path = %path.display(), users = self.users.len(), "registry saved");
        Ok(())
    }

    /// Seals `key` under `password` and stores the record.
    ///
    /// Fails if the account is already present or the password breaks the
    /// policy. Nothing is stored on failure.
    pub fn register(
        &mut self,
        account: AccountId,
        key: &LedgerPrivateKey,
        password: &str,
        network: NetworkChoice,
    ) -> Result<&UserRecord, VaultError> {
        if self.users.contains_key(&account) {
            return Err(VaultError::AccountExists(account));
        }
        let violations = self.policy.violations(password);
        if !violations.is_empty() {
            return Err(VaultError::WeakPassword(violations));
        }

        let record = UserRecord::seal(account, key, password, network, self.params)?;
        info!(%account, %network, "account registered");
        Ok(self.users.entry(account).or_insert(record))
    }

    pub fn remove(&mut self, account: AccountId) -> Option<UserRecord> {
        let removed = self.users.remove(&account);
        if removed.is_some() {
            info!(%account, "account removed");
        }
        removed
    }

    pub fn get(&self, account: AccountId) -> Option<&UserRecord> {
        self.users.get(&account)
    }

    pub fn contains(&self, account: AccountId) -> bool {
        self.users.contains_key(&account)
    }

    pub fn accounts(&self) -> impl Iterator<Item = AccountId> + '_ {
        self.users.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    /// `true` only if `account` is registered and `password` matches.
    pub fn authenticate(&self, account: AccountId, password: &str) -> bool {
        self.users
            .get(&account)
            .is_some_and(|record| record.check_password(password))
    }

    /// Authenticates, then decrypts the account's key.
    pub fn unlock(&self, account: AccountId, password: &str) -> Result<Credentials, VaultError> {
        let record = self
            .users
            .get(&account)
            .ok_or(VaultError::UnknownAccount(account))?;
        if !record.check_password(password) {
            warn!(%account, "unlock refused: wrong password");
            return Err(VaultError::WrongPassword);
        }
        let credentials = record.open(password)?;
        debug!(%account, "key unlocked");
        Ok(credentials)
    }

    /// [`unlock`](Self::unlock), then records the login in `state`.
    pub fn login(
        &self,
        state: &mut LoginState,
        account: AccountId,
        password: &str,
    ) -> Result<Credentials, VaultError> {
        let credentials = self.unlock(account, password)?;
        let network = self.users[&account].network;
        state.set_login(account, network);
        info!(%account, %network, "logged in");
        Ok(credentials)
    }
}
