//! Backend error types

use std::time::Duration;

/// Errors that can occur while talking to the backend.
///
/// Every variant carries enough context to build a user-facing message via
/// [`ApiError::user_message`].
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Non-2xx response from the backend.
    #[error("HTTP {status}: {message}")]
    Server {
        /// HTTP status code.
        status: u16,
        /// Message from the `{"message": ...}` error body, or the raw body.
        message: String,
    },

    /// Network error during the call.
    #[error("Network error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The call did not complete in time.
    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    /// Invalid base URL provided.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// The response was 2xx but did not have the expected shape.
    #[error("Malformed response: {message}")]
    Malformed {
        /// Description of what was missing or wrong.
        message: String,
        /// Raw response body, if available.
        body: Option<String>,
    },

    /// The client stopped accepting requests.
    #[error("Client is shut down")]
    Shutdown,
}

impl ApiError {
    /// Creates a new server error.
    pub fn server(status: u16, message: impl Into<String>) -> Self {
        Self::Server {
            status,
            message: message.into(),
        }
    }

    /// Creates a new malformed-response error.
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed {
            message: message.into(),
            body: None,
        }
    }

    /// Creates a new malformed-response error with the raw response body.
    pub fn malformed_with_body(message: impl Into<String>, body: impl Into<String>) -> Self {
        Self::Malformed {
            message: message.into(),
            body: Some(body.into()),
        }
    }

    /// Returns the HTTP status code if this is a server error.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Server { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns `true` for network failures and timeouts.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Timeout(_))
    }

    /// Returns `true` if the response body could not be decoded.
    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::Malformed { .. })
    }

    /// A short message suitable for showing to the operator.
    pub fn user_message(&self) -> String {
        match self {
            Self::Server { message, .. } if !message.trim().is_empty() => message.clone(),
            Self::Server { status, .. } => format!("The server rejected the request ({status})"),
            Self::Transport(_) => "Could not reach the server".to_string(),
            Self::Timeout(after) => format!("The server did not answer within {after:?}"),
            Self::InvalidUrl(url) => format!("Invalid server address: {url}"),
            Self::Malformed { .. } => "The server sent an unexpected response".to_string(),
            Self::Shutdown => "The connection has been closed".to_string(),
        }
    }
}
