//! Restore configuration.

use stash_core::{Error, Result, RetryPolicy};
use std::path::PathBuf;

/// What to do with a key whose template fails to evaluate.
///
/// This is a caller decision, not a property of the pipeline: strict
/// deployments fail the attempt on the first bad template, lenient ones drop
/// the key and keep going with the rest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyEvalPolicy {
    /// A malformed template fails the whole attempt.
    #[default]
    FailFast,
    /// Log and drop the offending key; fail only if no key survives.
    SkipKey,
}

#[derive(Debug, Clone)]
pub struct RestoreConfig {
    /// Raw key template lines, highest priority first.
    pub keys: Vec<String>,
    /// Directory the archive is extracted into.
    pub destination: PathBuf,
    pub key_eval_policy: KeyEvalPolicy,
    /// Whole-attempt retry bound and backoff.
    pub retry: RetryPolicy,
    /// Pass-through flags handed to the extractor.
    pub extract_args: Vec<String>,
}

impl RestoreConfig {
    pub fn new(keys: Vec<String>) -> Result<Self> {
        if keys.iter().all(|k| k.trim().is_empty()) {
            return Err(Error::Config("required input 'key' is empty".to_string()));
        }
        Ok(Self {
            keys,
            destination: PathBuf::from("."),
            key_eval_policy: KeyEvalPolicy::default(),
            retry: RetryPolicy::default(),
            extract_args: Vec::new(),
        })
    }

    pub fn with_destination(mut self, destination: impl Into<PathBuf>) -> Self {
        self.destination = destination.into();
        self
    }

    pub fn with_key_eval_policy(mut self, policy: KeyEvalPolicy) -> Self {
        self.key_eval_policy = policy;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_extract_args(mut self, args: Vec<String>) -> Self {
        self.extract_args = args;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_an_all_blank_key_input() {
        let err = RestoreConfig::new(vec!["  ".to_string(), String::new()]).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn defaults_to_fail_fast_and_five_attempts() {
        let config = RestoreConfig::new(vec!["k".to_string()]).unwrap();
        assert_eq!(config.key_eval_policy, KeyEvalPolicy::FailFast);
        assert_eq!(config.retry.max_attempts, 5);
        assert_eq!(config.destination, PathBuf::from("."));
    }
}
