//! Who is logged in, on which network, since when.
//!
//! The state is a plain value owned by the caller. Nothing in the crate
//! keeps a global session.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::NetworkChoice;
use crate::ledger::AccountId;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LoginStatus {
    LoggedIn,
    #[default]
    LoggedOut,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginState {
    pub status: LoginStatus,
    pub account: Option<AccountId>,
    pub login_timestamp: Option<DateTime<Utc>>,
    pub network: Option<NetworkChoice>,
}

impl LoginState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks `account` as logged in on `network`, stamped with the current time.
    pub fn set_login(&mut self, account: AccountId, network: NetworkChoice) -> &mut Self {
        self.status = LoginStatus::LoggedIn;
        self.account = Some(account);
        self.login_timestamp = Some(Utc::now());
        self.network = Some(network);
        self
    }

    pub fn logout(&mut self) -> &mut Self {
        *self = Self::default();
        self
    }

    pub fn is_logged_in(&self) -> bool {
        self.status == LoginStatus::LoggedIn && self.account.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_logged_out() {
        let state = LoginState::new();
        assert_eq!(state.status, LoginStatus::LoggedOut);
        assert!(!state.is_logged_in());
    }

    #[test]
    fn login_then_logout() {
        let mut state = LoginState::new();
        let before = Utc::now();
        state.set_login(AccountId::new(0, 0, 42), NetworkChoice::Testnet);
        assert!(state.is_logged_in());
        assert_eq!(state.account, Some(AccountId::new(0, 0, 42)));
        assert!(state.login_timestamp.unwrap() >= before);

        state.logout();
        assert_eq!(state, LoginState::default());
    }

    #[test]
    fn persisted_shape() {
        let mut state = LoginState::new();
        state.set_login(AccountId::new(0, 0, 7), NetworkChoice::MainnetPublic);
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["status"], "LOGGED_IN");
        assert_eq!(json["account"], "0.0.7");
        assert_eq!(json["network"], "mainnet-public");
        assert!(json.get("loginTimestamp").is_some());
    }
}
