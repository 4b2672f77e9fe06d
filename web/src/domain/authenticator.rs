//! Credential login and token refresh against the backend API.
//!
//! Every backend answer is classified into a [`LoginOutcome`]; nothing here
//! returns `Err`. The UI consumes the numeric [`LoginOutcome::code`], so the
//! mapping 0 = failed, 1 = invalid credentials, 2 = not activated,
//! 3 = authenticated is part of the public contract.

use serde_json::Value;
use tracing::{debug, error, info, warn};

use super::backend_client::BackendClient;
use super::forms::{Email, LoginCredentials};
use super::gateway::GatewayResult;
use super::identity::Identity;
use super::messages;
use super::ports::SessionStore;

const STATUS_UNAUTHORIZED: u16 = 401;
const STATUS_LOCKED: u16 = 423;

/// Result of one login attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    /// Backend unreachable, malformed answer, or an unexpected status.
    Failed { message: String },
    /// Email or password rejected.
    InvalidCredentials { message: String },
    /// Account exists but has not confirmed its OTP yet.
    NotActivated { email: Email },
    /// Session created for this identity.
    Authenticated(Identity),
}

impl LoginOutcome {
    /// Numeric code shown to the UI.
    ///
    /// # Examples
    /// ```
    /// use threads_web::domain::LoginOutcome;
    ///
    /// let outcome = LoginOutcome::Failed { message: "down".into() };
    /// assert_eq!(outcome.code(), 0);
    /// ```
    pub fn code(&self) -> u8 {
        match self {
            Self::Failed { .. } => 0,
            Self::InvalidCredentials { .. } => 1,
            Self::NotActivated { .. } => 2,
            Self::Authenticated(_) => 3,
        }
    }

    fn failed(message: impl Into<String>) -> Self {
        Self::Failed {
            message: message.into(),
        }
    }
}

/// Result of a token refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// The session now holds this identity.
    Refreshed(Identity),
    /// No session to refresh.
    NoSession,
    /// The backend refused or the new token was unusable.
    Failed { status: u16, message: String },
}

/// Logs users in and keeps their session token fresh.
#[derive(Clone)]
pub struct Authenticator {
    client: BackendClient,
}

impl Authenticator {
    pub fn new(client: BackendClient) -> Self {
        Self { client }
    }

    /// Exchange credentials for a session.
    ///
    /// A session is written only on [`LoginOutcome::Authenticated`].
    pub async fn authenticate(
        &self,
        credentials: &LoginCredentials,
        session: &dyn SessionStore,
    ) -> LoginOutcome {
        let result = self.client.login(credentials).await;
        if !result.ok {
            return classify_failure(&result, credentials.email());
        }
        let identity = match identity_from(&result) {
            Ok(identity) => identity,
            Err(reason) => {
                error!(%reason, "backend accepted login but returned no usable token");
                return LoginOutcome::failed(messages::LOGIN_FAILED);
            }
        };
        if let Err(err) = session.create_session(&identity) {
            error!(error = %err, "failed to store session after login");
            return LoginOutcome::failed(messages::LOGIN_FAILED);
        }
        info!(user_id = identity.id(), "user signed in");
        LoginOutcome::Authenticated(identity)
    }

    /// Swap the session's token for a fresh one.
    pub async fn refresh(&self, session: &dyn SessionStore) -> RefreshOutcome {
        if session.current_session().is_none() {
            return RefreshOutcome::NoSession;
        }
        let result = self.client.refresh_token(session).await;
        if !result.ok {
            warn!(status = result.status, "token refresh rejected");
            return RefreshOutcome::Failed {
                status: result.status,
                message: result
                    .message()
                    .unwrap_or(messages::REFRESH_FAILED)
                    .to_owned(),
            };
        }
        let identity = match identity_from(&result) {
            Ok(identity) => identity,
            Err(reason) => {
                error!(%reason, "refresh returned no usable token");
                return RefreshOutcome::Failed {
                    status: 500,
                    message: messages::REFRESH_FAILED.to_owned(),
                };
            }
        };
        if let Err(err) = session.create_session(&identity) {
            error!(error = %err, "failed to store refreshed session");
            return RefreshOutcome::Failed {
                status: 500,
                message: messages::REFRESH_FAILED.to_owned(),
            };
        }
        debug!(user_id = identity.id(), "session token refreshed");
        RefreshOutcome::Refreshed(identity)
    }
}

fn classify_failure(result: &GatewayResult, email: &Email) -> LoginOutcome {
    match result.code() {
        STATUS_UNAUTHORIZED => LoginOutcome::InvalidCredentials {
            message: result
                .message()
                .unwrap_or(messages::INVALID_CREDENTIALS)
                .to_owned(),
        },
        STATUS_LOCKED => {
            debug!("login refused for an account awaiting activation");
            LoginOutcome::NotActivated {
                email: email.clone(),
            }
        }
        code => {
            warn!(status = result.status, code, "login failed");
            LoginOutcome::failed(result.message().unwrap_or(messages::LOGIN_FAILED))
        }
    }
}

fn identity_from(result: &GatewayResult) -> Result<Identity, String> {
    let token = result
        .data
        .get("token")
        .and_then(Value::as_str)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| "missing token".to_owned())?;
    let expire = result
        .data
        .get("expire")
        .and_then(Value::as_str)
        .map(str::to_owned);
    Identity::from_token(token, expire).map_err(|err| err.to_string())
}
