//! Shared pipeline types.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Outcome of a successful index lookup: a signed, time-limited URL for the
/// single archive matching the highest-priority key. A miss is reported as
/// [`crate::Error::CacheMiss`], never as a partially populated resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestoreResolution {
    pub url: String,
}

/// A downloaded, not-yet-verified archive on the local filesystem.
///
/// Owned by the download step until handed to extraction; the orchestrator is
/// responsible for removing it once the attempt finishes, whether it
/// succeeded or aborted mid-stream.
#[derive(Debug)]
pub struct ArchiveHandle {
    path: PathBuf,
}

impl ArchiveHandle {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn into_path(self) -> PathBuf {
        self.path
    }
}
