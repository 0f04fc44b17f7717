//! Sync-specific error types.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("API error: status {0}")]
    Api(u16),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Channel error: {0}")]
    Channel(String),
}

impl SyncError {
    /// User-friendly error message for display in engine state.
    pub fn user_message(&self) -> String {
        match self {
            Self::Network(_) => "Network error. Check your connection.".to_string(),
            Self::Api(status) => format!("Failed to fetch weather data (status {})", status),
            Self::Decode(_) => "Received an unexpected response from the weather service.".to_string(),
            Self::Channel(_) => "Live updates interrupted.".to_string(),
        }
    }

    /// Whether retrying the same request may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network(_) | Self::Channel(_) => true,
            Self::Api(status) => *status >= 500 || *status == 429,
            Self::Decode(_) => false,
        }
    }
}
