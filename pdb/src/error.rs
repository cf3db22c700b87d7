//! Error types for PuppetDB query operations.

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Unsupported operation: {0}")]
    Unsupported(&'static str),

    #[error("'{0}' needs at least one predicate")]
    EmptyConnective(&'static str),

    #[error("Invalid filter: {0}")]
    Parse(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("PuppetDB returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
