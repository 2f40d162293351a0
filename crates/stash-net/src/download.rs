//! Streamed archive download.

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::StatusCode;
use stash_core::ports::Downloader;
use stash_core::{ArchiveHandle, Error, Result, RetryPolicy};
use std::path::Path;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;

/// Fetches a signed archive URL and streams the body straight to disk, so
/// peak memory stays bounded regardless of archive size.
pub struct HttpDownloader {
    http: reqwest::Client,
    retry: RetryPolicy,
}

impl HttpDownloader {
    pub fn new() -> Self {
        Self {
            http: reqwest::Client::new(),
            retry: RetryPolicy::transport(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    async fn request(&self, url: &str) -> Result<reqwest::Response> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        let status = response.status();
        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Transport {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }
}

impl Default for HttpDownloader {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Downloader for HttpDownloader {
    async fn fetch(&self, url: &str, dest: &Path) -> Result<ArchiveHandle> {
        // Connection-level failures and 5xx responses retry before any byte
        // is written. Once the body has started streaming, an interruption
        // is terminal for this attempt: resuming could silently truncate or
        // duplicate content.
        let response = self
            .retry
            .run(|| self.request(url), Error::is_retryable)
            .await
            .map_err(|e| match e {
                Error::Transport { status, body } => {
                    Error::Download(format!("HTTP {status}: {body}"))
                }
                Error::Network(msg) => Error::Download(msg),
                other => other,
            })?;

        let mut file = File::create(dest).await.map_err(|e| {
            Error::Download(format!(
                "can't open download location {}: {e}",
                dest.display()
            ))
        })?;

        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk =
                chunk.map_err(|e| Error::Download(format!("stream interrupted: {e}")))?;
            file.write_all(&chunk)
                .await
                .map_err(|e| Error::Download(format!("failed to save archive to disk: {e}")))?;
        }
        file.flush()
            .await
            .map_err(|e| Error::Download(format!("failed to save archive to disk: {e}")))?;

        tracing::debug!(path = %dest.display(), "archive downloaded");
        Ok(ArchiveHandle::new(dest.to_path_buf()))
    }
}
