//! HTTP transport behind the mirror client.
//!
//! The client only needs "GET this URL and give me JSON", so that's the
//! whole trait. [`HttpTransport`] does it with `reqwest`;
//! [`MemoryTransport`] serves canned bodies for tests and offline demos.

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::time::Duration;
use thiserror::Error;

/// Why a mirror request produced no JSON.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MirrorError {
    #[error("could not build HTTP client: {0}")]
    Client(String),

    #[error("request to {url} failed: {reason}")]
    Request { url: String, reason: String },

    #[error("request to {url} timed out")]
    Timeout { url: String },

    #[error("response from {url} is not JSON: {reason}")]
    Decode { url: String, reason: String },
}

/// A parsed mirror reply. Non-2xx statuses still carry their JSON body;
/// the mirror reports "not found" as a 404 with an `_status` object.
#[derive(Debug, Clone, PartialEq)]
pub struct MirrorResponse {
    pub status: u16,
    pub body: Value,
}

impl MirrorResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[async_trait]
pub trait MirrorTransport: Send + Sync {
    async fn get_json(&self, url: &str) -> Result<MirrorResponse, MirrorError>;
}

// ---------------------------------------------------------------------------
// reqwest
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Result<Self, MirrorError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("token-trader/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| MirrorError::Client(e.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl MirrorTransport for HttpTransport {
    async fn get_json(&self, url: &str) -> Result<MirrorResponse, MirrorError> {
        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                MirrorError::Timeout {
                    url: url.to_string(),
                }
            } else {
                MirrorError::Request {
                    url: url.to_string(),
                    reason: e.to_string(),
                }
            }
        })?;
        let status = response.status().as_u16();
        let text = response.text().await.map_err(|e| MirrorError::Request {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        let body = serde_json::from_str(&text).map_err(|e| MirrorError::Decode {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        Ok(MirrorResponse { status, body })
    }
}

// ---------------------------------------------------------------------------
// In-memory
// ---------------------------------------------------------------------------

/// Serves JSON bodies registered per exact URL.
///
/// Unregistered URLs answer 404 with the mirror's not-found shape. URLs
/// marked with [`fail`](Self::fail) return a transport error instead.
#[derive(Debug, Default)]
pub struct MemoryTransport {
    routes: RwLock<HashMap<String, MirrorResponse>>,
    failing: RwLock<HashSet<String>>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a 200 reply.
    pub fn insert(&self, url: impl Into<String>, body: Value) {
        self.insert_with_status(url, 200, body);
    }

    pub fn insert_with_status(&self, url: impl Into<String>, status: u16, body: Value) {
        self.routes
            .write()
            .insert(url.into(), MirrorResponse { status, body });
    }

    /// Makes every request to `url` fail as if the network were down.
    pub fn fail(&self, url: impl Into<String>) {
        self.failing.write().insert(url.into());
    }
}

#[async_trait]
impl MirrorTransport for MemoryTransport {
    async fn get_json(&self, url: &str) -> Result<MirrorResponse, MirrorError> {
        if self.failing.read().contains(url) {
            return Err(MirrorError::Request {
                url: url.to_string(),
                reason: "connection refused".to_string(),
            });
        }
        Ok(self.routes.read().get(url).cloned().unwrap_or_else(|| {
            MirrorResponse {
                status: 404,
                body: json!({ "_status": { "messages": [{ "message": "Not found" }] } }),
            }
        }))
    }
}
