//! Crate-wide error type.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// No item, record or playlist entry for the requested key.
    #[error("not found: {0}")]
    NotFound(String),

    /// The item exists but its source is unavailable.
    #[error("validation failed: {0}")]
    ValidationFailed(String),

    /// Index outside the playlist bounds; the playlist is left unchanged.
    #[error("invalid playlist index {index} (length {len})")]
    InvalidMutation { index: usize, len: usize },

    #[error("unknown item type: {0}")]
    UnknownItemType(String),

    #[error("missing field `{field}` for {item_type} item")]
    MissingField {
        item_type: String,
        field: &'static str,
    },

    #[error("invalid url: {0}")]
    InvalidUrl(String),

    #[error("invalid pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    #[error("catalog error: {0}")]
    Store(#[from] rusqlite::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config error: {0}")]
    Config(#[from] ::config::ConfigError),
}
