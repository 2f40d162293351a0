//! Port traits (hexagonal architecture).
//!
//! These traits define the seams between the restore pipeline and its
//! adapters; the orchestrator only ever sees these interfaces.

use crate::Result;
use crate::types::{ArchiveHandle, RestoreResolution};
use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;

/// Remote cache index lookup.
#[async_trait]
pub trait CacheIndex: Send + Sync {
    /// Resolve the best match for an ordered list of cache keys. The first
    /// key is the highest priority; the remote index is authoritative for
    /// ranking. A miss surfaces as [`crate::Error::CacheMiss`].
    async fn restore(&self, keys: &[String]) -> Result<RestoreResolution>;
}

/// Archive byte transfer.
#[async_trait]
pub trait Downloader: Send + Sync {
    /// Stream the archive behind `url` into `dest`. A partial file may be
    /// left behind on failure; cleaning it up is the caller's job.
    async fn fetch(&self, url: &str, dest: &Path) -> Result<ArchiveHandle>;
}

/// Archive extraction capability.
#[async_trait]
pub trait Extractor: Send + Sync {
    /// Decompress and unpack `archive` into `dest`, preserving relative
    /// paths and directory entries. Re-extracting into a populated
    /// destination overwrites rather than erroring. `extra_args` carries
    /// implementation-specific pass-through flags.
    async fn extract(&self, archive: &Path, dest: &Path, extra_args: &[String]) -> Result<()>;
}

/// Usage analytics sink. Implementations must not fail the pipeline.
pub trait Tracker: Send + Sync {
    fn keys_evaluated(&self, count: usize);
    fn archive_downloaded(&self, elapsed: Duration, size_bytes: u64);
    fn archive_extracted(&self, elapsed: Duration);
}
