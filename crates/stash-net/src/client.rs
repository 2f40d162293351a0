//! Remote cache index client.
//!
//! Single round-trip protocol: `GET {base_url}/restore?cache_keys=...` with
//! the ordered keys comma-joined in one query parameter and a bearer token
//! header. The service is authoritative for key-priority matching; this
//! client only formats the ordered key set and trusts the first-match
//! response.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use stash_core::ports::CacheIndex;
use stash_core::{Error, Result, RestoreResolution, RetryPolicy, SecretValue};

/// Upper bound on keys per restore request.
pub const MAX_KEY_COUNT: usize = 8;
/// Keys longer than this are truncated, not rejected.
pub const MAX_KEY_LENGTH: usize = 512;

pub struct IndexClient {
    http: reqwest::Client,
    base_url: String,
    access_token: SecretValue,
    retry: RetryPolicy,
}

#[derive(Debug, Deserialize)]
struct RestoreResponse {
    url: String,
}

impl IndexClient {
    pub fn new(base_url: impl Into<String>, access_token: SecretValue) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            access_token,
            retry: RetryPolicy::transport(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    async fn restore_once(&self, keys_param: &str) -> Result<RestoreResolution> {
        let url = format!("{}/restore", self.base_url);
        let response = self
            .http
            .get(&url)
            .query(&[("cache_keys", keys_param)])
            .header(
                "Authorization",
                format!("Bearer {}", self.access_token.expose()),
            )
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        match response.status() {
            StatusCode::NOT_FOUND => Err(Error::CacheMiss),
            status if status.is_success() => {
                let body: RestoreResponse = response
                    .json()
                    .await
                    .map_err(|e| Error::Network(format!("malformed restore response: {e}")))?;
                Ok(RestoreResolution { url: body.url })
            }
            status => {
                let body = response.text().await.unwrap_or_default();
                Err(Error::Transport {
                    status: status.as_u16(),
                    body,
                })
            }
        }
    }
}

#[async_trait]
impl CacheIndex for IndexClient {
    async fn restore(&self, keys: &[String]) -> Result<RestoreResolution> {
        let keys_param = join_keys(keys)?;
        tracing::debug!(cache_keys = %keys_param, "resolving keys against remote index");
        self.retry
            .run(|| self.restore_once(&keys_param), Error::is_retryable)
            .await
    }
}

/// Validate and comma-join the ordered key list for the wire query.
///
/// Overlength keys are truncated to [`MAX_KEY_LENGTH`] characters rather
/// than rejected, for compatibility with existing callers.
fn join_keys(keys: &[String]) -> Result<String> {
    if keys.len() > MAX_KEY_COUNT {
        return Err(Error::InvalidRequest(format!(
            "maximum number of keys is {MAX_KEY_COUNT}"
        )));
    }

    let mut truncated = Vec::with_capacity(keys.len());
    for key in keys {
        if key.contains(',') {
            return Err(Error::InvalidRequest(
                "commas are not allowed in keys".to_string(),
            ));
        }
        if key.chars().count() > MAX_KEY_LENGTH {
            tracing::debug!(len = key.chars().count(), "truncating overlength cache key");
            truncated.push(key.chars().take(MAX_KEY_LENGTH).collect());
        } else {
            truncated.push(key.clone());
        }
    }

    Ok(truncated.join(","))
}
