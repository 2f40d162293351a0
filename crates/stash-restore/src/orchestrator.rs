//! Restore pipeline orchestrator.
//!
//! Runs one full evaluate → resolve → download → extract traversal as a
//! single attempt and retries the entire attempt on any failure, up to the
//! configured bound. Individual steps are never retried in isolation here;
//! transport-level retry lives inside the adapters.

use crate::config::{KeyEvalPolicy, RestoreConfig};
use stash_core::ports::{CacheIndex, Downloader, Extractor, Tracker};
use stash_core::{BuildContext, Error, Result, keytemplate};
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;

/// Pipeline step the current attempt is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RestoreState {
    Idle,
    EvaluatingKeys,
    Resolving,
    Downloading,
    Extracting,
    Done,
    Failed,
}

fn transition(state: &mut RestoreState, next: RestoreState) {
    tracing::debug!(from = ?state, to = ?next, "pipeline state");
    *state = next;
}

/// Malformed templates and invalid requests fail identically on every
/// attempt; re-running them only delays the terminal error. Everything else
/// (lookup, download, extraction faults, even a miss) retries as a whole
/// attempt.
fn is_attempt_retryable(err: &Error) -> bool {
    !matches!(
        err,
        Error::TemplateSyntax { .. } | Error::InvalidRequest(_) | Error::Config(_) | Error::Cancelled
    )
}

pub struct RestoreOrchestrator {
    index: Arc<dyn CacheIndex>,
    downloader: Arc<dyn Downloader>,
    extractor: Arc<dyn Extractor>,
    tracker: Arc<dyn Tracker>,
    config: RestoreConfig,
}

impl RestoreOrchestrator {
    pub fn new(
        index: Arc<dyn CacheIndex>,
        downloader: Arc<dyn Downloader>,
        extractor: Arc<dyn Extractor>,
        tracker: Arc<dyn Tracker>,
        config: RestoreConfig,
    ) -> Self {
        Self {
            index,
            downloader,
            extractor,
            tracker,
            config,
        }
    }

    /// Run the restore to completion, retrying failed attempts up to the
    /// configured bound. Returns exactly one terminal error, or nothing:
    /// a multi-key restore yields a single resolved archive, never a
    /// partial result.
    pub async fn run(&self, ctx: &BuildContext) -> Result<()> {
        self.run_with_cancellation(ctx, CancellationToken::new())
            .await
    }

    /// Like [`RestoreOrchestrator::run`], aborting between steps and around
    /// network calls when `cancel` fires. Cancellation is attempt-granular:
    /// extraction already in flight is not interrupted mid-member.
    pub async fn run_with_cancellation(
        &self,
        ctx: &BuildContext,
        cancel: CancellationToken,
    ) -> Result<()> {
        let policy = &self.config.retry;
        let mut attempt = 1u32;
        loop {
            match self.attempt(ctx, &cancel).await {
                Ok(()) => return Ok(()),
                Err(Error::Cancelled) => return Err(Error::Cancelled),
                Err(err) if attempt < policy.max_attempts && is_attempt_retryable(&err) => {
                    tracing::warn!(
                        error = %err,
                        attempt,
                        attempts_remaining = policy.max_attempts - attempt,
                        "restore attempt failed, retrying"
                    );
                    tokio::time::sleep(policy.backoff(attempt)).await;
                    attempt += 1;
                }
                Err(err) => {
                    tracing::error!(error = %err, attempts = attempt, "restore failed, giving up");
                    return Err(err);
                }
            }
        }
    }

    async fn attempt(&self, ctx: &BuildContext, cancel: &CancellationToken) -> Result<()> {
        let mut state = RestoreState::Idle;
        match self.pipeline(&mut state, ctx, cancel).await {
            Ok(()) => Ok(()),
            Err(err) => {
                let failed_in = state;
                transition(&mut state, RestoreState::Failed);
                tracing::debug!(step = ?failed_in, "attempt aborted");
                Err(err)
            }
        }
    }

    async fn pipeline(
        &self,
        state: &mut RestoreState,
        ctx: &BuildContext,
        cancel: &CancellationToken,
    ) -> Result<()> {
        transition(state, RestoreState::EvaluatingKeys);
        let keys = self.evaluate_keys(ctx)?;
        self.tracker.keys_evaluated(keys.len());

        transition(state, RestoreState::Resolving);
        let resolution = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(Error::Cancelled),
            res = self.index.restore(&keys) => res?,
        };

        transition(state, RestoreState::Downloading);
        // Staging directory lives for the rest of the attempt and is removed
        // on drop, partial downloads included.
        let staging = tempfile::Builder::new()
            .prefix("stash-restore")
            .tempdir()
            .map_err(|e| Error::Download(format!("can't create staging directory: {e}")))?;
        let archive_name = format!("cache-{}.tzst", chrono::Utc::now().format("%Y%m%d-%H%M%S"));
        let download_path = staging.path().join(archive_name);

        let download_started = Instant::now();
        let handle = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(Error::Cancelled),
            res = self.downloader.fetch(&resolution.url, &download_path) => res?,
        };
        let size_bytes = tokio::fs::metadata(handle.path())
            .await
            .map(|m| m.len())
            .unwrap_or(0);
        self.tracker
            .archive_downloaded(download_started.elapsed(), size_bytes);
        tracing::info!(
            elapsed_s = download_started.elapsed().as_secs(),
            size_bytes,
            "downloaded archive"
        );

        transition(state, RestoreState::Extracting);
        let extraction_started = Instant::now();
        self.extractor
            .extract(
                handle.path(),
                &self.config.destination,
                &self.config.extract_args,
            )
            .await?;
        self.tracker.archive_extracted(extraction_started.elapsed());
        tracing::info!(
            elapsed_s = extraction_started.elapsed().as_secs(),
            "restored archive"
        );

        transition(state, RestoreState::Done);
        Ok(())
    }

    /// Evaluate the raw key templates in declaration order; position encodes
    /// lookup priority and must survive to the wire request untouched.
    fn evaluate_keys(&self, ctx: &BuildContext) -> Result<Vec<String>> {
        let mut keys = Vec::new();
        for template in self
            .config
            .keys
            .iter()
            .map(|k| k.trim())
            .filter(|k| !k.is_empty())
        {
            match keytemplate::evaluate(template, ctx) {
                Ok(key) => {
                    tracing::info!(template, key = %key, "evaluated cache key");
                    keys.push(key);
                }
                Err(err) => match self.config.key_eval_policy {
                    KeyEvalPolicy::FailFast => return Err(err),
                    KeyEvalPolicy::SkipKey => {
                        tracing::warn!(template, error = %err, "skipping unusable key template");
                    }
                },
            }
        }
        if keys.is_empty() {
            return Err(Error::InvalidRequest(
                "no usable cache keys after evaluation".to_string(),
            ));
        }
        Ok(keys)
    }
}
