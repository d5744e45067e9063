//! # Mirror Client
//!
//! Read-only queries against the ledger's public mirror REST API.
//!
//! ## Failure contract
//!
//! Nothing here returns an error except [`MirrorClient::fetch_json`]. Every
//! query degrades to a safe default when the mirror is unreachable, answers
//! non-JSON, or answers JSON without the expected key:
//!
//! | Query                 | On failure |
//! |-----------------------|------------|
//! | `is_valid_*`          | `false`    |
//! | `is_associated`       | `false`    |
//! | `does_serial_exist`   | `false`    |
//! | `get_token_type`      | `None`     |
//! | `get_schedule`        | `None`     |
//! | `get_account_tokens`  | `vec![]`   |
//! | `royalties`           | `vec![]`   |
//!
//! Failures are logged at `warn` with the URL so they're diagnosable, but
//! callers only ever see the sentinel.

use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::config::TraderConfig;
use crate::ledger::{is_legal_address, url_safe_transaction_id, ScheduleId, TokenId, TransactionId};
use crate::mirror::transport::{HttpTransport, MirrorError, MirrorResponse, MirrorTransport};
use crate::mirror::types::{
    CustomFees, FixedFee, NftInfo, Royalty, ScheduleInfo, TokenBalance, TokenInfo, TokenType,
};

#[derive(Clone)]
pub struct MirrorClient {
    api_base: String,
    transport: Arc<dyn MirrorTransport>,
}

impl std::fmt::Debug for MirrorClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MirrorClient")
            .field("api_base", &self.api_base)
            .finish_non_exhaustive()
    }
}

impl MirrorClient {
    /// Client over HTTP for the mirror `config` points at.
    pub fn new(config: &TraderConfig) -> Result<Self, MirrorError> {
        let transport = HttpTransport::new(config.http_timeout())?;
        Ok(Self::with_transport(config, Arc::new(transport)))
    }

    pub fn with_transport(config: &TraderConfig, transport: Arc<dyn MirrorTransport>) -> Self {
        Self {
            api_base: config.api_base(),
            transport,
        }
    }

    /// `https://{mirror}/api/v1/`, with the trailing slash.
    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.api_base, path)
    }

    // -----------------------------------------------------------------------
    // Raw access
    // -----------------------------------------------------------------------

    /// GETs `url` and parses the body. The one call that reports failure
    /// as an error; everything else is built on [`Self::query`].
    pub async fn fetch_json(&self, url: &str) -> Result<MirrorResponse, MirrorError> {
        self.transport.get_json(url).await
    }

    /// Body of `{api_base}{path}`, or `None` (logged) if the request failed.
    async fn query(&self, path: &str) -> Option<Value> {
        let url = self.endpoint(path);
        match self.fetch_json(&url).await {
            Ok(response) if response.is_success() => {
                debug!(%url, status = response.status, "mirror response");
                Some(response.body)
            }
            Ok(response) => {
                debug!(%url, status = response.status, "mirror reported no such entity");
                None
            }
            Err(e) => {
                warn!(%url, error = %e, "mirror query failed");
                None
            }
        }
    }

    async fn query_as<T: DeserializeOwned>(&self, path: &str) -> Option<T> {
        let body = self.query(path).await?;
        match serde_json::from_value(body) {
            Ok(value) => Some(value),
            Err(e) => {
                debug!(path, error = %e, "mirror body did not match expected shape");
                None
            }
        }
    }

    async fn has_key(&self, path: &str, key: &str) -> bool {
        self.query(path)
            .await
            .is_some_and(|body| body.get(key).is_some_and(|v| !v.is_null()))
    }

    // -----------------------------------------------------------------------
    // Existence checks
    // -----------------------------------------------------------------------

    /// Structural `shard.realm.num` check, then `/accounts/{address}`.
    pub async fn is_valid_account(&self, address: &str) -> bool {
        is_legal_address(address) && self.has_key(&format!("accounts/{address}"), "account").await
    }

    /// Structural `shard.realm.num` check, then `/tokens/{address}`.
    pub async fn is_valid_token(&self, address: &str) -> bool {
        is_legal_address(address) && self.has_key(&format!("tokens/{address}"), "token_id").await
    }

    /// Whether `account` has `token` associated and can therefore receive it.
    pub async fn is_associated(&self, token: TokenId, account: &str) -> bool {
        if !is_legal_address(account) {
            return false;
        }
        let Some(body) = self.query(&format!("tokens?account.id={account}")).await else {
            return false;
        };
        let wanted = token.to_string();
        body.get("tokens")
            .and_then(Value::as_array)
            .is_some_and(|tokens| {
                tokens
                    .iter()
                    .any(|t| t.get("token_id").and_then(Value::as_str) == Some(wanted.as_str()))
            })
    }

    pub async fn does_serial_exist(&self, token: TokenId, serial: i64) -> bool {
        self.query_as::<NftInfo>(&format!("tokens/{token}/nfts/{serial}"))
            .await
            .is_some_and(|nft| nft.serial_number == serial)
    }

    // -----------------------------------------------------------------------
    // Token metadata
    // -----------------------------------------------------------------------

    pub async fn get_token_info(&self, token: TokenId) -> Option<TokenInfo> {
        self.query_as(&format!("tokens/{token}")).await
    }

    /// `None` if `token` is not `shard.realm.num`, doesn't exist, or the
    /// mirror reports a type this client doesn't know.
    pub async fn get_token_type(&self, token: &str) -> Option<TokenType> {
        if !is_legal_address(token) {
            return None;
        }
        let body = self.query(&format!("tokens/{token}")).await?;
        serde_json::from_value(body.get("type")?.clone()).ok()
    }

    pub async fn token_custom_fees(&self, token: TokenId) -> Option<CustomFees> {
        self.get_token_info(token).await?.custom_fees
    }

    /// Royalty schedule of `token`. Entries with a zero denominator are
    /// skipped.
    pub async fn royalties(&self, token: TokenId) -> Vec<Royalty> {
        let Some(fees) = self.token_custom_fees(token).await else {
            return Vec::new();
        };
        fees.royalty_fees
            .into_iter()
            .filter_map(|fee| {
                let percentage = fee.amount.percentage().or_else(|| {
                    warn!(%token, "royalty fee with zero denominator");
                    None
                })?;
                Some(Royalty {
                    percentage,
                    collector_id: fee.collector_account_id.unwrap_or_default(),
                })
            })
            .collect()
    }

    pub async fn fixed_fees(&self, token: TokenId) -> Vec<FixedFee> {
        self.token_custom_fees(token)
            .await
            .map(|fees| fees.fixed_fees)
            .unwrap_or_default()
    }

    // -----------------------------------------------------------------------
    // Accounts
    // -----------------------------------------------------------------------

    /// Tokens `account` holds a nonzero balance of.
    pub async fn get_account_tokens(&self, account: &str) -> Vec<TokenId> {
        if !is_legal_address(account) {
            return Vec::new();
        }
        let Some(body) = self.query(&format!("accounts/{account}")).await else {
            return Vec::new();
        };
        let Some(tokens) = body.pointer("/balance/tokens").cloned() else {
            return Vec::new();
        };
        serde_json::from_value::<Vec<TokenBalance>>(tokens)
            .unwrap_or_default()
            .into_iter()
            .filter(|entry| entry.balance != 0)
            .filter_map(|entry| entry.token())
            .collect()
    }

    // -----------------------------------------------------------------------
    // Schedules and transactions
    // -----------------------------------------------------------------------

    pub async fn get_schedule(&self, schedule: ScheduleId) -> Option<ScheduleInfo> {
        self.query_as(&format!("schedules/{schedule}")).await
    }

    /// Base64 body of the scheduled transaction. `None` if the schedule is
    /// unknown or carries no body.
    pub async fn schedule_transaction_body(&self, schedule: ScheduleId) -> Option<String> {
        let body = self.query(&format!("schedules/{schedule}")).await?;
        body.get("transaction_body")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    }

    /// Mirror URL showing `transaction_id`.
    pub fn transaction_link(&self, transaction_id: &TransactionId) -> String {
        self.endpoint(&format!("transactions/{}", transaction_id.to_url_form()))
    }

    /// [`Self::transaction_link`] for an id already in text form.
    pub fn transaction_link_str(&self, transaction_id: &str) -> String {
        self.endpoint(&format!(
            "transactions/{}",
            url_safe_transaction_id(transaction_id)
        ))
    }
}
