pub mod activity;
pub mod cache;
pub mod refresh;
pub mod report;
