//! Environment-backed configuration for the restore binary.
//!
//! This is the only place in the workspace that reads ambient process state;
//! everything below it receives values by injection.

use stash_core::{BuildContext, Error, Result, SecretValue};

#[derive(Debug)]
pub struct ServiceConfig {
    pub api_base_url: SecretValue,
    pub api_access_token: SecretValue,
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            api_base_url: require_secret("STASH_CACHE_SERVICE_URL")?,
            api_access_token: require_secret("STASH_CACHE_ACCESS_TOKEN")?,
        })
    }
}

/// Split the raw newline-separated input into key template lines.
pub fn parse_keys(raw: &str) -> Result<Vec<String>> {
    if raw.trim().is_empty() {
        return Err(Error::Config("required input 'key' is empty".to_string()));
    }
    Ok(raw.lines().map(str::to_string).collect())
}

/// Build metadata captured once, at startup.
pub fn build_context_from_env() -> BuildContext {
    BuildContext {
        workflow_id: env_or_default("STASH_WORKFLOW_ID"),
        branch: env_or_default("STASH_GIT_BRANCH"),
        commit_hash: env_or_default("STASH_GIT_COMMIT"),
    }
}

fn env_or_default(name: &str) -> String {
    std::env::var(name).unwrap_or_default()
}

fn require_secret(name: &str) -> Result<SecretValue> {
    match std::env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(SecretValue::new(value)),
        _ => Err(Error::Config(format!("the secret '{name}' is not defined"))),
    }
}
