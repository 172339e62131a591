//! Login handshake against `POST /auth/login`.
//!
//! Every outcome is a value: transport failures, HTTP errors and unusable
//! payloads are all mapped to a [`LoginError`] that carries the message shown
//! to the user.

use std::fmt;

use reqwest::StatusCode;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::models::User;

/// Request body expected by the backend.
#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    clave: &'a str,
}

/// A successful handshake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Authenticated {
    pub user: User,
    /// Bearer token, when the server issued one
    pub token: Option<String>,
    /// Greeting for the user
    pub message: String,
}

/// Normalized login failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginError {
    /// HTTP 401
    WrongCredentials,
    /// No response from the server
    Connection,
    /// Any other non-success status
    Server { status: u16, reason: String },
    /// Success status but the payload carries no usable user record
    InvalidResponse,
}

impl fmt::Display for LoginError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoginError::WrongCredentials => write!(f, "Wrong username or password"),
            LoginError::Connection => {
                write!(f, "Connection error. Check that the API is running.")
            }
            LoginError::Server { status, reason } => {
                write!(f, "Server error: {status} - {reason}")
            }
            LoginError::InvalidResponse => write!(f, "Invalid server response"),
        }
    }
}

impl std::error::Error for LoginError {}

/// Stateless login client.
#[derive(Debug, Clone)]
pub struct CredentialGateway {
    base_url: String,
    http: reqwest::Client,
}

impl CredentialGateway {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, reqwest::Client::new())
    }

    pub fn with_client(base_url: impl Into<String>, http: reqwest::Client) -> Self {
        Self {
            base_url: base_url.into(),
            http,
        }
    }

    /// Performs one login request.
    ///
    /// # Errors
    /// Returns a [`LoginError`] describing why the login was refused.
    pub async fn login(&self, username: &str, secret: &str) -> Result<Authenticated, LoginError> {
        let url = format!("{}/auth/login", self.base_url);
        debug!(%url, username, "login request");

        let response = match self
            .http
            .post(&url)
            .json(&LoginRequest {
                username,
                clave: secret,
            })
            .send()
            .await
        {
            Ok(response) => response,
            Err(err) => {
                warn!(error = %err, "login request failed before a response arrived");
                return Err(LoginError::Connection);
            }
        };

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            debug!(username, "login rejected");
            return Err(LoginError::WrongCredentials);
        }
        if !status.is_success() {
            warn!(status = status.as_u16(), "login failed");
            return Err(LoginError::Server {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
            });
        }

        let body = match response.text().await {
            Ok(body) => body,
            Err(err) => {
                warn!(error = %err, "login response body interrupted");
                return Err(LoginError::Connection);
            }
        };

        parse_login_payload(&body, username)
    }
}

/// Interprets a success body. The payload is either `{ usuario, token }` or
/// the user record itself.
fn parse_login_payload(body: &str, username: &str) -> Result<Authenticated, LoginError> {
    let payload: Value = serde_json::from_str(body).map_err(|err| {
        debug!(error = %err, "login response is not JSON");
        LoginError::InvalidResponse
    })?;

    let record = match payload.get("usuario") {
        Some(nested) if is_truthy(nested) => nested,
        _ => &payload,
    };

    let user = serde_json::from_value::<User>(record.clone())
        .ok()
        .filter(User::is_identified)
        .ok_or(LoginError::InvalidResponse)?;

    let token = payload.get("token").and_then(token_string);
    if token.is_none() {
        warn!("login response carried no token; authenticated calls will be anonymous");
    }

    let message = format!("Welcome, {}!", user.display_name(username));
    Ok(Authenticated {
        user,
        token,
        message,
    })
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::String(s) => !s.is_empty(),
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Tokens are opaque; numeric tokens are kept in their textual form.
fn token_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_usuario_payload() {
        let auth = parse_login_payload(
            r#"{"usuario":{"id":1,"username":"test","nombre":"Test User"},"token":"t"}"#,
            "test",
        )
        .unwrap();
        assert_eq!(auth.user.name.as_deref(), Some("Test User"));
        assert_eq!(auth.token.as_deref(), Some("t"));
        assert!(auth.message.contains("Test User"));
    }

    #[test]
    fn test_top_level_user_payload() {
        let auth = parse_login_payload(r#"{"id":9,"username":"ana"}"#, "ana").unwrap();
        assert_eq!(auth.user.id, Some(9));
        assert_eq!(auth.token, None);
        assert_eq!(auth.message, "Welcome, ana!");
    }

    #[test]
    fn test_null_usuario_falls_back_to_top_level() {
        let auth =
            parse_login_payload(r#"{"usuario":null,"nombre":"Root","token":42}"#, "root").unwrap();
        assert_eq!(auth.user.name.as_deref(), Some("Root"));
        assert_eq!(auth.token.as_deref(), Some("42"));
    }

    #[test]
    fn test_unrecognized_payloads_are_invalid() {
        for body in [
            r#"{"invalid":"x"}"#,
            "[]",
            "null",
            "not json",
            r#"{"usuario":{}}"#,
            r#"{"usuario":{"id":0},"token":"t"}"#,
        ] {
            assert_eq!(
                parse_login_payload(body, "x"),
                Err(LoginError::InvalidResponse),
                "body: {body}"
            );
        }
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            LoginError::WrongCredentials.to_string(),
            "Wrong username or password"
        );
        assert_eq!(
            LoginError::Server {
                status: 500,
                reason: "Internal Server Error".to_string()
            }
            .to_string(),
            "Server error: 500 - Internal Server Error"
        );
        assert!(LoginError::Connection.to_string().contains("Connection error"));
    }
}
