//! Stash Restore Core
//!
//! Core domain types, traits, and error handling for the Stash cache
//! restoration client. This crate has minimal dependencies and defines the
//! shared vocabulary used across all other crates.

pub mod context;
pub mod error;
pub mod keytemplate;
pub mod ports;
pub mod retry;
pub mod secrets;
pub mod types;

pub use context::BuildContext;
pub use error::{Error, Result};
pub use retry::RetryPolicy;
pub use secrets::SecretValue;
pub use types::{ArchiveHandle, RestoreResolution};
