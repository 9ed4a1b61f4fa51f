//! Git sync, series loading, activity extraction, and the refresh
//! coordinator for quilter.

pub mod activity;
pub mod error;
pub mod refresh;
pub mod repo;
pub mod series;

pub use error::GitError;
pub use refresh::Refresher;
pub use repo::{GitRepo, PatchSource};
