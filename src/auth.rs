//! Login flow: credential validation, token exchange, session persistence.

use crate::client::{ApiClient, Envelope};
use crate::error::{PatsearchError, Result};
use crate::notify::Notification;
use crate::store::{Session, SessionStore};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Which screen the user should be on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Route {
    Login,
    Search,
}

/// Client id/secret pair entered at login
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
}

/// Which credential fields failed validation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CredentialErrors {
    pub client_id: bool,
    pub client_secret: bool,
}

impl CredentialErrors {
    pub fn any(&self) -> bool {
        self.client_id || self.client_secret
    }

    /// Inline messages for each invalid field
    pub fn messages(&self) -> Vec<&'static str> {
        let mut messages = Vec::new();
        if self.client_id {
            messages.push("Client ID must not be empty");
        }
        if self.client_secret {
            messages.push("Client Secret must not be empty");
        }
        messages
    }
}

impl Credentials {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }

    /// Both fields must contain something other than whitespace
    pub fn validate(&self) -> std::result::Result<(), CredentialErrors> {
        let errors = CredentialErrors {
            client_id: self.client_id.trim().is_empty(),
            client_secret: self.client_secret.trim().is_empty(),
        };
        if errors.any() {
            Err(errors)
        } else {
            Ok(())
        }
    }
}

/// Result of a login attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    /// Validation failed; nothing was sent
    Invalid(CredentialErrors),
    /// Token stored, continue to search
    Success {
        session: Session,
        notification: Notification,
    },
    /// API answered `status=false`
    Rejected { notification: Notification },
    /// Transport or storage failure
    Failed { notification: Notification },
}

impl LoginOutcome {
    pub fn route(&self) -> Route {
        match self {
            LoginOutcome::Success { .. } => Route::Search,
            _ => Route::Login,
        }
    }

    pub fn notification(&self) -> Option<&Notification> {
        match self {
            LoginOutcome::Invalid(_) => None,
            LoginOutcome::Success { notification, .. }
            | LoginOutcome::Rejected { notification }
            | LoginOutcome::Failed { notification } => Some(notification),
        }
    }
}

const LOGIN_FAILED: &str = "Login failed";

/// Exchange credentials for a token and persist the session on success.
///
/// The client id doubles as the `apikey` for later search calls.
pub async fn login(
    client: &ApiClient,
    store: &dyn SessionStore,
    credentials: &Credentials,
) -> LoginOutcome {
    let outcome = attempt_login(client, store, credentials).await;
    if let Some(notification) = outcome.notification() {
        notification.emit();
    }
    outcome
}

async fn attempt_login(
    client: &ApiClient,
    store: &dyn SessionStore,
    credentials: &Credentials,
) -> LoginOutcome {
    if let Err(errors) = credentials.validate() {
        return LoginOutcome::Invalid(errors);
    }

    let data = match client
        .request_token(&credentials.client_id, &credentials.client_secret)
        .await
        .and_then(Envelope::into_data)
    {
        Ok(data) => data,
        Err(PatsearchError::Api { code, message }) => {
            warn!(code = code, message = %message, "Login rejected");
            return LoginOutcome::Rejected {
                notification: Notification::error(LOGIN_FAILED, message),
            };
        }
        Err(PatsearchError::AuthExpired { message }) => {
            warn!(message = %message, "Login rejected");
            return LoginOutcome::Rejected {
                notification: Notification::error(LOGIN_FAILED, message),
            };
        }
        Err(e) => {
            warn!(error = %e, "Token request failed");
            return LoginOutcome::Failed {
                notification: Notification::error(LOGIN_FAILED, e.to_string()),
            };
        }
    };

    let session = Session::new(data.token, credentials.client_id.clone());
    if let Err(e) = session.save(store) {
        warn!(error = %e, "Failed to persist session");
        return LoginOutcome::Failed {
            notification: Notification::error(LOGIN_FAILED, e.to_string()),
        };
    }

    info!(apikey = %session.apikey, "Logged in");
    LoginOutcome::Success {
        session,
        notification: Notification::success(
            "Login successful",
            "You are logged in, opening search.",
        ),
    }
}

/// Where to start: straight to search when a session is already stored
pub fn initial_route(store: &dyn SessionStore) -> Route {
    if Session::load(store).is_some() {
        Route::Search
    } else {
        Route::Login
    }
}

/// Forget the stored session
pub fn logout(store: &dyn SessionStore) -> Result<()> {
    Session::clear(store)?;
    info!("Logged out");
    Ok(())
}
