//! Error types for quote-sync

use thiserror::Error;

#[derive(Error, Debug)]
pub enum QuoteError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Storage quota exceeded: {needed} bytes needed, quota is {quota} bytes")]
    QuotaExceeded { needed: u64, quota: u64 },

    #[error("Invalid storage key: {0:?}")]
    InvalidSlotKey(String),

    #[error("Imported JSON must be an array")]
    ImportNotArray,

    #[error("No valid quotes found in imported file")]
    NoValidQuotes,

    #[error("Server request failed with status {status}")]
    RemoteStatus { status: u16 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, QuoteError>;

impl QuoteError {
    /// Message suitable for the status line
    pub fn user_message(&self) -> String {
        match self {
            QuoteError::Validation(message) => message.clone(),
            QuoteError::NoValidQuotes => "No valid quotes found in imported file.".to_string(),
            QuoteError::ImportNotArray | QuoteError::Json(_) | QuoteError::Io(_) => {
                format!("Failed to import JSON: {}", self)
            }
            other => other.to_string(),
        }
    }
}
