//! Ledger identifiers.
//!
//! Accounts, tokens and schedules all share the `shard.realm.num` textual
//! form. They get distinct newtypes so a token id can't be handed to an
//! account parameter by accident, but they parse and print identically.
//!
//! Transaction ids are `account@seconds.nanos`, optionally followed by
//! `?scheduled` when the id names the inner transaction of a schedule.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::ledger::proto;

static ENTITY_ID_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d+[.]\d+[.]\d+$").expect("static regex"));

/// Errors produced when parsing identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdError {
    #[error("malformed entity id {0:?}: expected shard.realm.num")]
    MalformedEntityId(String),

    #[error("entity id component out of range in {0:?}")]
    ComponentOutOfRange(String),

    #[error("malformed transaction id {0:?}: expected account@seconds.nanos")]
    MalformedTransactionId(String),
}

/// Structural check for `shard.realm.num`. Says nothing about whether the
/// entity exists; that's the mirror client's job.
pub fn is_legal_address(address: &str) -> bool {
    ENTITY_ID_PATTERN.is_match(address)
}

// ---------------------------------------------------------------------------
// EntityId
// ---------------------------------------------------------------------------

/// The `shard.realm.num` triple shared by every ledger entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId {
    pub shard: u64,
    pub realm: u64,
    pub num: u64,
}

impl EntityId {
    pub const fn new(shard: u64, realm: u64, num: u64) -> Self {
        Self { shard, realm, num }
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.shard, self.realm, self.num)
    }
}

impl FromStr for EntityId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if !is_legal_address(s) {
            return Err(IdError::MalformedEntityId(s.to_string()));
        }
        let mut parts = s.split('.').map(|part| {
            part.parse::<u64>()
                .map_err(|_| IdError::ComponentOutOfRange(s.to_string()))
        });
        // The regex guarantees exactly three parts.
        let shard = parts.next().unwrap_or(Ok(0))?;
        let realm = parts.next().unwrap_or(Ok(0))?;
        let num = parts.next().unwrap_or(Ok(0))?;
        Ok(Self { shard, realm, num })
    }
}

macro_rules! entity_newtype {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(pub EntityId);

        impl $name {
            pub const fn new(shard: u64, realm: u64, num: u64) -> Self {
                Self(EntityId::new(shard, realm, num))
            }

            pub fn entity(&self) -> EntityId {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl FromStr for $name {
            type Err = IdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.parse().map(Self)
            }
        }

        impl TryFrom<String> for $name {
            type Error = IdError;

            fn try_from(s: String) -> Result<Self, Self::Error> {
                s.parse()
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> String {
                id.to_string()
            }
        }
    };
}

entity_newtype!(
    /// A ledger account, e.g. `0.0.1234`.
    AccountId
);
entity_newtype!(
    /// A fungible or non-fungible token class, e.g. `0.0.5678`.
    TokenId
);
entity_newtype!(
    /// A pending scheduled transaction. Handed from the creator to the
    /// counterparty, who signs it.
    ScheduleId
);

// Entity numbers on the wire are int64; ids that came from the mirror fit.
fn to_wire(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

fn from_wire(value: i64) -> u64 {
    u64::try_from(value).unwrap_or(0)
}

impl AccountId {
    pub fn to_proto(&self) -> proto::AccountId {
        proto::AccountId {
            shard_num: to_wire(self.0.shard),
            realm_num: to_wire(self.0.realm),
            account_num: to_wire(self.0.num),
            alias: Vec::new(),
        }
    }

    /// Alias-addressed accounts have no `shard.realm.num` form and map to `None`.
    pub fn from_proto(account: &proto::AccountId) -> Option<Self> {
        if !account.alias.is_empty() {
            return None;
        }
        Some(Self::new(
            from_wire(account.shard_num),
            from_wire(account.realm_num),
            from_wire(account.account_num),
        ))
    }
}

impl TokenId {
    pub fn to_proto(&self) -> proto::TokenId {
        proto::TokenId {
            shard_num: to_wire(self.0.shard),
            realm_num: to_wire(self.0.realm),
            token_num: to_wire(self.0.num),
        }
    }

    pub fn from_proto(token: &proto::TokenId) -> Self {
        Self::new(
            from_wire(token.shard_num),
            from_wire(token.realm_num),
            from_wire(token.token_num),
        )
    }
}

// ---------------------------------------------------------------------------
// TransactionId
// ---------------------------------------------------------------------------

const SCHEDULED_SUFFIX: &str = "?scheduled";

/// Identifies a submitted transaction: payer account plus valid-start time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TransactionId {
    pub account: AccountId,
    pub valid_start_seconds: i64,
    pub valid_start_nanos: u32,
    pub scheduled: bool,
}

impl TransactionId {
    /// A fresh id for `account` starting now.
    pub fn generate(account: AccountId) -> Self {
        let now = chrono::Utc::now();
        Self {
            account,
            valid_start_seconds: now.timestamp(),
            valid_start_nanos: now.timestamp_subsec_nanos(),
            scheduled: false,
        }
    }

    /// The same id flagged as the inner transaction of a schedule.
    pub fn as_scheduled(self) -> Self {
        Self {
            scheduled: true,
            ..self
        }
    }

    /// Mirror REST form: `0.0.5-1700000000-000000001`.
    pub fn to_url_form(&self) -> String {
        url_safe_transaction_id(&self.to_string())
    }
}

/// Rewrites a textual transaction id into the form the mirror's
/// `/transactions/{id}` endpoint accepts: the last `.` becomes `-`, the `@`
/// becomes `-`, and a `?scheduled` marker is dropped.
pub fn url_safe_transaction_id(transaction_id: &str) -> String {
    let mut out = transaction_id.to_string();
    if let Some(idx) = out.rfind('.') {
        out.replace_range(idx..idx + 1, "-");
    }
    out.replacen('@', "-", 1).replace(SCHEDULED_SUFFIX, "")
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}@{}.{:09}",
            self.account, self.valid_start_seconds, self.valid_start_nanos
        )?;
        if self.scheduled {
            f.write_str(SCHEDULED_SUFFIX)?;
        }
        Ok(())
    }
}

impl FromStr for TransactionId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || IdError::MalformedTransactionId(s.to_string());

        let (body, scheduled) = match s.strip_suffix(SCHEDULED_SUFFIX) {
            Some(body) => (body, true),
            None => (s, false),
        };
        let (account, timestamp) = body.split_once('@').ok_or_else(malformed)?;
        let (seconds, nanos) = timestamp.split_once('.').ok_or_else(malformed)?;

        Ok(Self {
            account: account.parse().map_err(|_| malformed())?,
            valid_start_seconds: seconds.parse().map_err(|_| malformed())?,
            valid_start_nanos: nanos.parse().map_err(|_| malformed())?,
            scheduled,
        })
    }
}

impl TryFrom<String> for TransactionId {
    type Error = IdError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<TransactionId> for String {
    fn from(id: TransactionId) -> String {
        id.to_string()
    }
}
