use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    // Fetch Errors
    #[error("Error creating request: {0}")]
    RequestBuild(String),

    #[error("Error performing http request: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected status code={0}")]
    UnexpectedStatus(u16),

    #[error("Error reading response body bytes: {0}")]
    Body(String),

    #[error("Error deserializing response {body}: {reason}")]
    Decode {
        body: String,
        reason: String,
    },

    #[error("Api error: {0}")]
    ApiError(String),

    #[error("Crawling cancelled")]
    Cancelled,

    // Updater Errors
    #[error("Duplicate exchange name: {0}")]
    DuplicateExchange(String),

    // Storage Errors
    #[error("Storage error: {0}")]
    StorageError(String),

    // System Errors
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Task failure: {0}")]
    TaskFailure(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl Error {
    /// Cancellation is not a failure and is never reported as one.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
