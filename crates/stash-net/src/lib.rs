//! HTTP adapters for the restore pipeline: cache index lookup and streamed
//! archive download.

pub mod client;
pub mod download;

pub use client::{IndexClient, MAX_KEY_COUNT, MAX_KEY_LENGTH};
pub use download::HttpDownloader;
