//! Durable value types: plain data, always serializable.
//!
//! Service objects (tracker clients, the git wrapper) are never persisted;
//! they are reconstructed from configuration at process start.

pub mod activity;
pub mod patch;
pub mod reference;
pub mod report;
