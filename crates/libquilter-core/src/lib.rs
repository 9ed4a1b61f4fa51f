//! Core library for quilter: patch metadata parsing, external-reference
//! resolution, configuration, and the on-disk cache store.
//!
//! Everything here is synchronous and I/O happens only where a component's
//! contract says it does: the parser is pure, the cache store touches the
//! state directory, and the tracker clients talk HTTP.

pub mod cache;
pub mod config;
pub mod error;
pub mod parse;
pub mod resolve;
pub mod tracker;
pub mod types;

pub use cache::CacheStore;
pub use config::Config;
pub use error::QuilterError;
