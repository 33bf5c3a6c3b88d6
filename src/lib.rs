//! subexport exports a subreddit's posts and their full comment trees from a date range to CSV
#![forbid(missing_docs, rustdoc::missing_crate_level_docs)]

mod macros;

#[cfg(feature = "cli")]
pub mod app;
pub mod client;
pub mod config;
pub mod error;
pub mod export;
pub mod forest;
pub mod harvest;
pub mod models;
pub mod rows;
pub mod utils;
pub mod window;
