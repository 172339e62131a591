//! HTTP gateways for the catalog backend.
//!
//! - `credentials`: login handshake, every failure normalized to a value
//! - `products`: CRUD against `/productos`, failures propagated as [`ApiError`]

pub mod credentials;
pub mod products;

use std::fmt;

use serde_json::Value;

pub use credentials::{Authenticated, CredentialGateway, LoginError};
pub use products::ProductGateway;

/// Categories of gateway errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorKind {
    /// The server answered with a non-success status
    HttpStatus,
    /// No response at all (refused, reset, DNS, TLS)
    Connection,
    /// The response body could not be decoded
    Parse,
}

impl fmt::Display for ApiErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiErrorKind::HttpStatus => write!(f, "http_status"),
            ApiErrorKind::Connection => write!(f, "connection"),
            ApiErrorKind::Parse => write!(f, "parse"),
        }
    }
}

/// Structured error from a gateway call.
#[derive(Debug, Clone)]
pub struct ApiError {
    pub kind: ApiErrorKind,
    /// HTTP status, when the server answered
    pub status: Option<u16>,
    /// One-line summary suitable for display
    pub message: String,
}

impl ApiError {
    /// Creates an HTTP status error, lifting a `message`/`error` field out of
    /// a JSON body when present.
    pub fn http_status(status: u16, body: &str) -> Self {
        let detail = serde_json::from_str::<Value>(body).ok().and_then(|json| {
            ["message", "error", "mensaje"]
                .iter()
                .find_map(|key| json.get(*key).and_then(Value::as_str).map(str::to_string))
        });
        let message = match detail {
            Some(detail) => format!("HTTP {status}: {detail}"),
            None => format!("HTTP {status}"),
        };
        Self {
            kind: ApiErrorKind::HttpStatus,
            status: Some(status),
            message,
        }
    }

    pub fn connection(message: impl Into<String>) -> Self {
        Self {
            kind: ApiErrorKind::Connection,
            status: None,
            message: message.into(),
        }
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Self {
            kind: ApiErrorKind::Parse,
            status: None,
            message: message.into(),
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ApiError::parse(format!("Failed to decode response: {err}"))
        } else if let Some(status) = err.status() {
            ApiError::http_status(status.as_u16(), "")
        } else {
            ApiError::connection(format!("Request failed: {err}"))
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ApiError {}

/// Result type for gateway operations.
pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// Masks a token for display; never log a token in full.
pub fn mask_token(token: &str) -> String {
    if token.chars().count() <= 16 {
        return "***".to_string();
    }
    let prefix: String = token.chars().take(12).collect();
    format!("{prefix}...")
}
