//! Archive extraction for restored cache entries.

pub mod extract;

pub use extract::TarZstdExtractor;
