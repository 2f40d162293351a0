//! Whole-pipeline cache restore orchestration.

pub mod config;
pub mod orchestrator;
pub mod tracker;

pub use config::{KeyEvalPolicy, RestoreConfig};
pub use orchestrator::RestoreOrchestrator;
pub use tracker::{LogTracker, NoopTracker};
