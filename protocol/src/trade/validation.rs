//! # Input Validators
//!
//! Each validator answers one yes/no question about user input and says
//! which question it answered, so a caller can run several and report the
//! failing ones by name.
//!
//! Like the mirror client underneath, validators never error. A network
//! failure during a check is an `Invalid` verdict.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::ledger::{is_legal_address, AccountId, TokenId};
use crate::mirror::{MirrorClient, TokenType};
use crate::schedule::codec::schedule_id_from_share_code;
use crate::vault::{PasswordPolicy, UserRegistry};

/// Which check produced a [`Verdict`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Validator {
    Account,
    Token,
    TokenSerial,
    Schedule,
    NotSender,
    AccountDoesNotExist,
    AuthPassword,
    PasswordPolicy,
}

impl fmt::Display for Validator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Account => "account",
            Self::Token => "token",
            Self::TokenSerial => "token_serial",
            Self::Schedule => "schedule",
            Self::NotSender => "not_sender",
            Self::AccountDoesNotExist => "account_does_not_exist",
            Self::AuthPassword => "auth_password",
            Self::PasswordPolicy => "password_policy",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "verdict", content = "validator", rename_all = "snake_case")]
pub enum Verdict {
    Valid(Validator),
    Invalid(Validator),
}

impl Verdict {
    pub fn new(validator: Validator, valid: bool) -> Self {
        if valid {
            Self::Valid(validator)
        } else {
            Self::Invalid(validator)
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid(_))
    }

    pub fn validator(&self) -> Validator {
        match *self {
            Self::Valid(v) | Self::Invalid(v) => v,
        }
    }
}

/// A serial as typed by a user: ASCII digits only, greater than zero, and
/// small enough for the ledger's int64. Signs, whitespace, decimals and
/// exponents are all rejected.
pub fn parse_positive_serial(serial: &str) -> Option<i64> {
    if serial.is_empty() || !serial.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    serial.parse::<i64>().ok().filter(|&n| n > 0)
}

pub async fn account_validator(mirror: &MirrorClient, account: &str) -> Verdict {
    Verdict::new(Validator::Account, mirror.is_valid_account(account).await)
}

pub async fn token_validator(mirror: &MirrorClient, token: &str) -> Verdict {
    Verdict::new(Validator::Token, mirror.is_valid_token(token).await)
}

/// Fungible tokens pass whatever the serial. NFTs pass only with a
/// positive serial that the mirror confirms exists.
pub async fn token_serial_validator(
    mirror: &MirrorClient,
    token: &str,
    serial: Option<&str>,
) -> Verdict {
    let valid = match mirror.get_token_type(token).await {
        None => false,
        Some(TokenType::FungibleCommon) => true,
        Some(TokenType::NonFungibleUnique) => {
            match (token.parse::<TokenId>(), serial.and_then(parse_positive_serial)) {
                (Ok(token), Some(serial)) => mirror.does_serial_exist(token, serial).await,
                _ => false,
            }
        }
    };
    Verdict::new(Validator::TokenSerial, valid)
}

/// A share code is acceptable when it names a schedule whose body decodes,
/// moves a token, and passes [`token_serial_validator`].
pub async fn schedule_validator(mirror: &MirrorClient, share_code: &str) -> Verdict {
    let Some(schedule) = schedule_id_from_share_code(share_code) else {
        return Verdict::Invalid(Validator::Schedule);
    };
    let token_serial = mirror.token_from_schedule(&schedule.to_string()).await;
    let Some(token) = token_serial.token else {
        return Verdict::Invalid(Validator::Schedule);
    };
    let serial = token_serial.serial.map(|s| s.to_string());
    let inner = token_serial_validator(mirror, &token.to_string(), serial.as_deref()).await;
    Verdict::new(Validator::Schedule, inner.is_valid())
}

pub fn not_sender_validator(sender: &str, receiver: &str) -> Verdict {
    Verdict::new(Validator::NotSender, sender != receiver)
}

/// Passes when `account` is not yet registered locally. Malformed ids
/// can't be registered, so they pass too; the account validator rejects
/// them.
pub fn account_does_not_exist(registry: &UserRegistry, account: &str) -> Verdict {
    let exists = account
        .parse::<AccountId>()
        .is_ok_and(|id| registry.contains(id));
    Verdict::new(Validator::AccountDoesNotExist, !exists)
}

pub fn auth_password(registry: &UserRegistry, account: &str, password: &str) -> Verdict {
    let valid = is_legal_address(account)
        && account
            .parse::<AccountId>()
            .is_ok_and(|id| registry.authenticate(id, password));
    Verdict::new(Validator::AuthPassword, valid)
}

pub fn password_policy_validator(policy: &PasswordPolicy, password: &str) -> Verdict {
    Verdict::new(Validator::PasswordPolicy, policy.accepts(password))
}
