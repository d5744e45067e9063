//! Schedule lookups that combine a mirror fetch with a decode.
//!
//! These live on [`MirrorClient`] so callers write
//! `mirror.token_from_schedule(..)`, but they belong with the codec: each
//! one is "fetch the base64 body, decode it, extract something", and each
//! degrades to the same sentinel the extraction would give for an empty
//! body.

use crate::ledger::proto::SchedulableTransactionBody;
use crate::ledger::ScheduleId;
use crate::mirror::MirrorClient;
use crate::schedule::codec::{
    decode_schedule_body, extract_account_amounts, extract_token_serial,
    schedule_id_from_share_code, AccountAmount, TokenSerial,
};

impl MirrorClient {
    /// Fetches `/schedules/{schedule}` and decodes its body. `schedule` is
    /// raw text; anything that isn't a schedule id gives `None` without a
    /// network call.
    pub async fn transaction_body_from_schedule(
        &self,
        schedule: &str,
    ) -> Option<SchedulableTransactionBody> {
        let id: ScheduleId = schedule.parse().ok()?;
        let base64 = self.schedule_transaction_body(id).await?;
        decode_schedule_body(&base64)
    }

    pub async fn token_from_schedule(&self, schedule: &str) -> TokenSerial {
        self.transaction_body_from_schedule(schedule)
            .await
            .map(|body| extract_token_serial(&body))
            .unwrap_or(TokenSerial::NONE)
    }

    /// [`Self::token_from_schedule`] for a share code.
    pub async fn token_from_share_code(&self, code: &str) -> TokenSerial {
        match schedule_id_from_share_code(code) {
            Some(id) => self.token_from_schedule(&id.to_string()).await,
            None => TokenSerial::NONE,
        }
    }

    pub async fn account_amounts_from_schedule(&self, schedule: &str) -> Vec<AccountAmount> {
        self.transaction_body_from_schedule(schedule)
            .await
            .map(|body| extract_account_amounts(&body))
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{NetworkChoice, TraderConfig};
    use crate::ledger::proto::{CryptoTransferTransactionBody, TokenTransferList};
    use crate::ledger::{AccountId, TokenId};
    use crate::mirror::MemoryTransport;
    use crate::schedule::codec::{encode_schedule_body, schedule_share_code};
    use serde_json::json;
    use std::sync::Arc;

    const API: &str = "https://testnet.mirrornode.hedera.com/api/v1/";

    fn mirror_with_schedule(id: &str, body: &str) -> MirrorClient {
        let transport = Arc::new(MemoryTransport::new());
        transport.insert(
            format!("{API}schedules/{id}"),
            json!({ "schedule_id": id, "transaction_body": body }),
        );
        let config = TraderConfig::new(NetworkChoice::Testnet, AccountId::new(0, 0, 2));
        MirrorClient::with_transport(&config, transport)
    }

    fn fungible_body() -> SchedulableTransactionBody {
        SchedulableTransactionBody {
            crypto_transfer: Some(CryptoTransferTransactionBody {
                transfers: None,
                token_transfers: vec![TokenTransferList {
                    token: Some(TokenId::new(0, 0, 77).to_proto()),
                    ..Default::default()
                }],
            }),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn token_from_schedule_and_share_code() {
        let mirror = mirror_with_schedule("0.0.900", &encode_schedule_body(&fungible_body()));
        let ts = mirror.token_from_schedule("0.0.900").await;
        assert_eq!(ts.token, Some(TokenId::new(0, 0, 77)));
        assert_eq!(ts.serial, None);

        let code = schedule_share_code(ScheduleId::new(0, 0, 900));
        assert_eq!(mirror.token_from_share_code(&code).await, ts);
    }

    #[tokio::test]
    async fn failures_collapse_to_sentinels() {
        let mirror = mirror_with_schedule("0.0.901", "%%%");
        assert_eq!(mirror.token_from_schedule("0.0.901").await, TokenSerial::NONE);
        assert_eq!(mirror.token_from_schedule("0.0.902").await, TokenSerial::NONE);
        assert_eq!(mirror.token_from_schedule("garbage").await, TokenSerial::NONE);
        assert_eq!(mirror.token_from_share_code("abc").await, TokenSerial::NONE);
        assert!(mirror
            .account_amounts_from_schedule("0.0.901")
            .await
            .is_empty());
    }
}
