pub mod config;
pub mod date;
pub mod error;
pub mod feed;
pub mod reading_time;
pub mod types;

pub use config::parse_blog_toml;
pub use error::{Error, FetchError, Result};
pub use feed::{FeedLoader, FeedState, LoadOutcome, PageSource};
pub use types::*;
