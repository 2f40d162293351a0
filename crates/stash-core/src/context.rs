//! Build metadata injected into key templates.

use serde::{Deserialize, Serialize};

/// Immutable build metadata captured once per restore invocation.
///
/// The core never reads the process environment itself; the caller sources
/// these values and hands them in.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BuildContext {
    pub workflow_id: String,
    pub branch: String,
    pub commit_hash: String,
}

impl BuildContext {
    /// Look up a template field by its placeholder name.
    pub(crate) fn field(&self, name: &str) -> Option<&str> {
        match name {
            "Workflow" => Some(&self.workflow_id),
            "Branch" => Some(&self.branch),
            "CommitHash" => Some(&self.commit_hash),
            _ => None,
        }
    }
}
