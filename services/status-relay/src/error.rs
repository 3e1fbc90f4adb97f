//! Error types for the status relay

/// Errors that can occur in the status relay
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Status server returned {status}")]
    Upstream { status: u16 },

    #[error("{0}")]
    Unreachable(String),

    #[error("Notification delivery failed: {0}")]
    NotificationDelivery(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Server error: {0}")]
    Server(String),
}

impl RelayError {
    /// HTTP status the `/api/status` endpoint answers with for this error
    pub fn http_status(&self) -> u16 {
        match self {
            RelayError::Upstream { .. } | RelayError::Unreachable(_) => 502,
            _ => 500,
        }
    }
}

/// Result type alias for relay operations
pub type Result<T> = std::result::Result<T, RelayError>;
