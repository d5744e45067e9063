//! Typed views of the mirror's JSON.
//!
//! Only the fields the trader reads are modelled. Everything else the
//! mirror sends is ignored, and every optional field defaults, so a newer
//! mirror adding or dropping columns doesn't break deserialization.

use serde::{Deserialize, Serialize};

use crate::ledger::{EntityId, TokenId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TokenType {
    FungibleCommon,
    NonFungibleUnique,
}

/// `/tokens/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenInfo {
    pub token_id: String,
    #[serde(rename = "type")]
    pub token_type: TokenType,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub symbol: String,
    /// The mirror sends this as a decimal string.
    #[serde(default)]
    pub decimals: Option<String>,
    #[serde(default)]
    pub custom_fees: Option<CustomFees>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CustomFees {
    #[serde(default)]
    pub created_timestamp: Option<String>,
    #[serde(default)]
    pub fixed_fees: Vec<FixedFee>,
    #[serde(default)]
    pub royalty_fees: Vec<RoyaltyFee>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixedFee {
    pub amount: i64,
    #[serde(default)]
    pub collector_account_id: Option<String>,
    /// `None` means the fee is charged in hbar.
    #[serde(default)]
    pub denominating_token_id: Option<String>,
    #[serde(default)]
    pub all_collectors_are_exempt: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fraction {
    pub numerator: i64,
    pub denominator: i64,
}

impl Fraction {
    /// `numerator / denominator * 100`, or `None` for a zero denominator.
    pub fn percentage(&self) -> Option<f64> {
        if self.denominator == 0 {
            return None;
        }
        Some(self.numerator as f64 / self.denominator as f64 * 100.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoyaltyFee {
    pub amount: Fraction,
    #[serde(default)]
    pub collector_account_id: Option<String>,
    #[serde(default)]
    pub fallback_fee: Option<FallbackFee>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FallbackFee {
    pub amount: i64,
    #[serde(default)]
    pub denominating_token_id: Option<String>,
}

/// A royalty as shown to a trader: what share of each sale goes to whom.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Royalty {
    /// 0 to 100.
    pub percentage: f64,
    pub collector_id: String,
}

/// `/tokens/{id}/nfts/{serial}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NftInfo {
    pub token_id: String,
    pub serial_number: i64,
    #[serde(default)]
    pub account_id: Option<String>,
    #[serde(default)]
    pub deleted: bool,
}

/// One entry of `balance.tokens` on `/accounts/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenBalance {
    pub token_id: String,
    pub balance: i64,
}

impl TokenBalance {
    pub fn token(&self) -> Option<TokenId> {
        self.token_id.parse().ok()
    }
}

/// `/schedules/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleInfo {
    pub schedule_id: String,
    #[serde(default)]
    pub creator_account_id: Option<String>,
    #[serde(default)]
    pub payer_account_id: Option<String>,
    #[serde(default)]
    pub memo: String,
    #[serde(default)]
    pub consensus_timestamp: Option<String>,
    #[serde(default)]
    pub executed_timestamp: Option<String>,
    #[serde(default)]
    pub deleted: bool,
    /// Base64 `SchedulableTransactionBody`.
    #[serde(default)]
    pub transaction_body: String,
    #[serde(default)]
    pub signatures: Vec<ScheduleSignature>,
}

impl ScheduleInfo {
    pub fn is_executed(&self) -> bool {
        self.executed_timestamp.is_some()
    }

    /// Pending means it can still collect signatures.
    pub fn is_pending(&self) -> bool {
        !self.deleted && !self.is_executed()
    }

    pub fn creator(&self) -> Option<EntityId> {
        self.creator_account_id.as_deref()?.parse().ok()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleSignature {
    #[serde(default)]
    pub consensus_timestamp: Option<String>,
    #[serde(default)]
    pub public_key_prefix: Option<String>,
    #[serde(default, rename = "type")]
    pub key_type: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn token_info_from_mirror_json() {
        let info: TokenInfo = serde_json::from_value(json!({
            "token_id": "0.0.3000",
            "type": "NON_FUNGIBLE_UNIQUE",
            "name": "Pebbles",
            "symbol": "PEB",
            "decimals": "0",
            "total_supply": "12",
            "custom_fees": {
                "created_timestamp": "1700000000.000000001",
                "fixed_fees": [],
                "royalty_fees": [{
                    "amount": { "numerator": 5, "denominator": 100 },
                    "collector_account_id": "0.0.42",
                    "fallback_fee": null
                }]
            }
        }))
        .unwrap();
        assert_eq!(info.token_type, TokenType::NonFungibleUnique);
        let fees = info.custom_fees.unwrap();
        assert_eq!(fees.royalty_fees[0].amount.percentage(), Some(5.0));
    }

    #[test]
    fn zero_denominator_has_no_percentage() {
        let f = Fraction {
            numerator: 1,
            denominator: 0,
        };
        assert_eq!(f.percentage(), None);
    }

    #[test]
    fn schedule_state() {
        let s: ScheduleInfo = serde_json::from_value(json!({
            "schedule_id": "0.0.900",
            "creator_account_id": "0.0.5",
            "memo": "Token Trader Schedule ID: 17",
            "executed_timestamp": null,
            "deleted": false,
            "transaction_body": "",
            "signatures": [{ "public_key_prefix": "AAA=", "type": "ED25519" }]
        }))
        .unwrap();
        assert!(s.is_pending());
        assert_eq!(s.creator(), Some(EntityId::new(0, 0, 5)));
        assert_eq!(s.signatures.len(), 1);
    }

    #[test]
    fn royalty_serializes_camel_case() {
        let r = Royalty {
            percentage: 2.5,
            collector_id: "0.0.8".into(),
        };
        assert_eq!(
            serde_json::to_value(r).unwrap(),
            json!({ "percentage": 2.5, "collectorId": "0.0.8" })
        );
    }
}
