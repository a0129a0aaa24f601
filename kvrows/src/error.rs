//! Error types for kvrows operations.

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("DuckDB error: {0}")]
    DuckDb(#[from] duckdb::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("exclude and include options are exclusive.")]
    UsageConflict,

    #[error("Missing required option: --{0}")]
    MissingOption(&'static str),

    #[error("Cannot open store {url}: {reason}")]
    Connection { url: String, reason: String },

    #[error("Cannot decode URL {value:?}: {reason}")]
    Decode { value: String, reason: String },

    #[error("Invalid timestamp: {0}")]
    Timestamp(String),

    #[error("Entry stream failed: {0}")]
    Stream(String),

    #[error("Invalid key encoding: {0}")]
    InvalidKey(String),

    #[error("Invalid entry {key}: {reason}")]
    InvalidEntry { key: String, reason: String },
}

pub type Result<T> = std::result::Result<T, Error>;
