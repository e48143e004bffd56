//! Error types for the ScanCode.io client

use thiserror::Error;

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors that can occur when talking to ScanCode.io
#[derive(Debug, Error)]
pub enum ClientError {
    /// Request could not be sent or no response arrived in time
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// API answered with a non-2xx status code
    #[error("API error (status {status}): {message}")]
    ApiError {
        /// HTTP status code
        status: u16,
        /// Response body, truncated
        message: String,
    },

    /// Token cannot be sent as an HTTP header value
    #[error("API token contains characters not allowed in an HTTP header")]
    InvalidToken,

    /// Response body was not a JSON object
    #[error("Failed to parse response: {0}")]
    ParseError(String),
}

/// Longest response body kept in an `ApiError`
const MAX_MESSAGE_LEN: usize = 512;

impl ClientError {
    /// Create an API error from status code and response body
    pub fn api_error(status: u16, message: impl Into<String>) -> Self {
        let mut message = message.into();
        if message.len() > MAX_MESSAGE_LEN {
            let mut cut = MAX_MESSAGE_LEN;
            while !message.is_char_boundary(cut) {
                cut -= 1;
            }
            message.truncate(cut);
            message.push('…');
        }
        Self::ApiError { status, message }
    }

    /// HTTP status code, if the server answered
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::ApiError { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the request timed out
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::RequestFailed(e) if e.is_timeout())
    }
}
