//! Resumable hashtag harvester for Mastodon servers.
//!
//! Posts are fetched per hashtag in "epochs": slices of the id space that
//! start at a fixed cursor and are written to `<n>.csv` checkpoints. A later
//! run picks up after the highest checkpoint on disk, and
//! [`process::combine_checkpoints`] merges them into one de-duplicated archive.

pub mod config;
pub mod epoch;
mod error;
mod macros;
pub mod post;
pub mod process;
pub mod request;
pub mod table;

pub use error::{Error, Result};

pub const MAX_POSTS_PER_QUERY: u8 = 40;
pub const DEFAULT_POSTS_PER_QUERY: i64 = 20;
/// Starting id of epoch 1.
pub const EPOCH_BASE_ID: u128 = 100_000_000_000_000_000;
/// Width of every epoch after the first.
pub const EPOCH_ID_INCREMENT: u128 = 1_000_000_000_000_000;
pub const DEFAULT_BASE_DIR: &str = "data/posts";
pub const DEFAULT_API_BASE_URL: &str = "https://mastodon.social";
pub const DEFAULT_ID_FIELD: &str = "id";
/// File stem of the merged archive, never treated as a checkpoint.
const COMBINED_STEM: &str = "combined_epochs";
