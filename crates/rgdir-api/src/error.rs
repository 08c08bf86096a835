//! Error types for rgdir-api

use thiserror::Error;

/// Result type alias for API calls
pub type Result<T> = std::result::Result<T, ApiError>;

/// Failure of a single API call.
///
/// Payloads are plain strings so the error can be cloned and handed to every
/// caller waiting on a shared request.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// Connection refused, DNS failure, timeout, broken body stream
    #[error("Request failed: {message}")]
    Transport { message: String },

    /// The backend answered with a non-2xx status
    #[error("API error {status}: {message}")]
    Status { status: u16, message: String },

    /// The response body was not the expected JSON
    #[error("Failed to decode response: {message}")]
    Decode { message: String },

    /// A URL could not be built from the configured base
    #[error("Invalid URL: {url}")]
    InvalidUrl { url: String },
}

impl ApiError {
    /// HTTP status for [`ApiError::Status`], `None` otherwise
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ApiError::Decode {
                message: err.to_string(),
            }
        } else {
            ApiError::Transport {
                message: err.to_string(),
            }
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Decode {
            message: err.to_string(),
        }
    }
}

impl From<url::ParseError> for ApiError {
    fn from(err: url::ParseError) -> Self {
        ApiError::InvalidUrl {
            url: err.to_string(),
        }
    }
}
