use thiserror::Error;

/// Application-wide error types for Trawl.
#[derive(Error, Debug)]
pub enum AppError {
    /// HTTP request failed or returned a non-success status.
    #[error("HTTP error: {0}")]
    HttpError(String),

    /// Network/connection error.
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Request timed out.
    #[error("Request timed out after {0} seconds")]
    Timeout(u64),

    /// The compliance policy refused a request.
    #[error("Request blocked by compliance policy: {0}")]
    Blocked(String),

    /// A page, card or API payload could not be interpreted.
    #[error("Parse error: {0}")]
    ParseError(String),

    /// A record was missing a field it cannot exist without.
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    /// Invalid configuration (bad selector, bad env value, bad template).
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// JSON serialization/deserialization failed.
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// The caller cancelled the harvest.
    #[error("Harvest cancelled")]
    Cancelled,
}

impl AppError {
    /// Returns true for fetch-level failures that end a source run softly.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            AppError::HttpError(_)
                | AppError::NetworkError(_)
                | AppError::Timeout(_)
                | AppError::Blocked(_)
        )
    }

    /// Returns true for failures confined to a single card or record.
    pub fn is_parse_failure(&self) -> bool {
        matches!(
            self,
            AppError::ParseError(_) | AppError::MissingField(_) | AppError::SerializationError(_)
        )
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, AppError::Cancelled)
    }
}
