//! Session state: who is logged in, persisted across restarts.
//!
//! The [`SessionStore`] is the single source of truth for the authentication
//! flag and the current user. It is shared (`Arc`) with the view-models,
//! which follow it through replay-latest subscriptions.
//!
//! Invariant: the authentication flag is `true` iff a user record is present.
//! The user stream is always updated before the flag, so a subscriber that
//! sees `true` can read the user synchronously.

pub mod observable;
pub mod storage;

use std::sync::Arc;

use tracing::{info, warn};

use self::observable::{Observable, Subscription};
use self::storage::{SessionStorage, TOKEN_KEY, USER_KEY};
use crate::api::CredentialGateway;
use crate::config::SessionConfig;
use crate::models::User;

/// Outcome of [`SessionStore::login`]. Always a value, never an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginResult {
    pub success: bool,
    pub message: String,
    pub user: Option<User>,
}

/// Authentication state with durable persistence.
pub struct SessionStore {
    storage: Arc<dyn SessionStorage>,
    credentials: CredentialGateway,
    authenticated: Observable<bool>,
    current_user: Observable<Option<User>>,
    keep_token_on_logout: bool,
}

impl SessionStore {
    /// Creates the store and restores a persisted session, if any, before
    /// returning.
    pub fn new(storage: Arc<dyn SessionStorage>, credentials: CredentialGateway) -> Self {
        let restored = restore_user(storage.as_ref());
        if let Some(user) = &restored {
            info!(username = %user.username, "restored persisted session");
        }

        Self {
            authenticated: Observable::new(restored.is_some()),
            current_user: Observable::new(restored),
            storage,
            credentials,
            keep_token_on_logout: false,
        }
    }

    /// Applies the `[session]` config section.
    #[must_use]
    pub fn with_config(mut self, config: &SessionConfig) -> Self {
        self.keep_token_on_logout = config.keep_token_on_logout;
        self
    }

    /// Storage shared with the product gateway.
    pub fn storage(&self) -> Arc<dyn SessionStorage> {
        Arc::clone(&self.storage)
    }

    /// Logs in through the credential gateway and, on success, persists and
    /// publishes the session.
    pub async fn login(&self, username: &str, secret: &str) -> LoginResult {
        match self.credentials.login(username, secret).await {
            Ok(auth) => {
                self.persist(&auth.user, auth.token.as_deref());
                self.publish(Some(auth.user.clone()));
                info!(username, "logged in");
                LoginResult {
                    success: true,
                    message: auth.message,
                    user: Some(auth.user),
                }
            }
            Err(err) => {
                warn!(username, error = %err, "login failed");
                LoginResult {
                    success: false,
                    message: err.to_string(),
                    user: None,
                }
            }
        }
    }

    /// Ends the session locally. No network call.
    pub fn logout(&self) {
        if let Err(err) = self.storage.remove(USER_KEY) {
            warn!(error = %err, "could not remove persisted user");
        }
        if !self.keep_token_on_logout
            && let Err(err) = self.storage.remove(TOKEN_KEY)
        {
            warn!(error = %err, "could not remove persisted token");
        }
        self.publish(None);
        info!("logged out");
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated.get()
    }

    pub fn current_user(&self) -> Option<User> {
        self.current_user.get()
    }

    /// The stored non-empty token, if any.
    pub fn token(&self) -> Option<String> {
        self.storage
            .get(TOKEN_KEY)
            .ok()
            .flatten()
            .filter(|t| !t.is_empty())
    }

    /// Authentication flag stream (replays the current value).
    pub fn subscribe_authenticated(&self) -> Subscription<bool> {
        self.authenticated.subscribe()
    }

    /// Current-user stream (replays the current value).
    pub fn subscribe_user(&self) -> Subscription<Option<User>> {
        self.current_user.subscribe()
    }

    fn publish(&self, user: Option<User>) {
        let present = user.is_some();
        self.current_user.set(user);
        self.authenticated.set(present);
    }

    /// Persistence failures are logged; the in-memory session still stands.
    fn persist(&self, user: &User, token: Option<&str>) {
        match serde_json::to_string(user) {
            Ok(json) => {
                if let Err(err) = self.storage.set(USER_KEY, &json) {
                    warn!(error = %err, "could not persist user record");
                }
            }
            Err(err) => warn!(error = %err, "could not serialize user record"),
        }

        let stored = match token {
            Some(token) => self.storage.set(TOKEN_KEY, token),
            None => self.storage.remove(TOKEN_KEY),
        };
        if let Err(err) = stored {
            warn!(error = %err, "could not persist token");
        }
    }
}

fn restore_user(storage: &dyn SessionStorage) -> Option<User> {
    let raw = match storage.get(USER_KEY) {
        Ok(raw) => raw?,
        Err(err) => {
            warn!(error = %err, "could not read persisted session");
            return None;
        }
    };

    match serde_json::from_str::<User>(&raw) {
        Ok(user) => Some(user),
        Err(err) => {
            warn!(error = %err, "ignoring unreadable persisted user record");
            None
        }
    }
}
