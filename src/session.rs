//! Auth session state machine. Holds the in-memory authenticated-user view
//! (never persisted; a reload re-derives it via [`AuthSession::fetch_current_user`])
//! and drives every auth operation through the gateway. `loading` and `error`
//! are orthogonal flags layered over `user`; both success and failure paths
//! reset `loading` as their final step.

use crate::api::users::{
    self, AuthResponse, ChangePasswordRequest, LoginRequest, ProfileUpdate,
    RegisterRequest, User,
};
use crate::api::Ack;
use crate::error::{Error, FailureKind, FieldErrors};
use crate::gateway::Gateway;
use secrecy::SecretString;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::debug;

const LOGIN_FAILED: &str = "Login failed";
const REGISTER_FAILED: &str = "Registration failed";
const LOGOUT_FAILED: &str = "Logout failed";
const FETCH_USER_FAILED: &str = "Could not verify session";
const PROFILE_FAILED: &str = "Profile update failed";
const PASSWORD_FAILED: &str = "Password change failed";

/// Last failed operation, kept for inline display: the failure kind, a
/// user-facing message, and any server-reported field messages.
#[derive(Clone, Debug)]
pub struct SessionError {
    pub kind: FailureKind,
    pub message: String,
    pub fields: FieldErrors,
}

impl SessionError {
    fn from_error(err: &Error, fallback: &str) -> Self {
        Self {
            kind: err.kind(),
            message: err
                .server_message()
                .unwrap_or(fallback)
                .to_string(),
            fields: err.field_errors().cloned().unwrap_or_default(),
        }
    }
}

/// Cloned view of the session for the embedding UI.
#[derive(Clone, Debug, Default)]
pub struct SessionSnapshot {
    pub user: Option<User>,
    pub authenticated: bool,
    pub loading: bool,
    pub error: Option<SessionError>,
}

pub struct AuthSession {
    gateway: Arc<Gateway>,
    state: Mutex<SessionSnapshot>,
}

impl AuthSession {
    #[must_use]
    pub fn new(gateway: Arc<Gateway>) -> Self {
        Self {
            gateway,
            state: Mutex::new(SessionSnapshot::default()),
        }
    }

    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .authenticated
    }

    /// # Errors
    /// Re-raises the gateway failure after recording it on the session.
    pub async fn login(&self, request: &LoginRequest) -> Result<AuthResponse, Error> {
        self.begin();
        match users::login(self.gateway.as_ref(), request).await {
            Ok(response) => {
                self.store_credential(&response);
                self.settle(|state| {
                    state.user = response.user.clone();
                    state.authenticated = state.user.is_some();
                });
                Ok(response)
            }
            Err(err) => {
                self.settle_err(&err, LOGIN_FAILED);
                Err(err)
            }
        }
    }

    /// # Errors
    /// Re-raises the gateway failure after recording it on the session.
    pub async fn register(&self, request: &RegisterRequest) -> Result<AuthResponse, Error> {
        self.begin();
        match users::register(self.gateway.as_ref(), request).await {
            Ok(response) => {
                self.store_credential(&response);
                self.settle(|state| {
                    state.user = response.user.clone();
                    state.authenticated = state.user.is_some();
                });
                Ok(response)
            }
            Err(err) => {
                self.settle_err(&err, REGISTER_FAILED);
                Err(err)
            }
        }
    }

    /// Ends the session. Local state is cleared even when the server call
    /// fails: the client must not keep claiming a session the user asked to
    /// end. The error is still recorded and re-raised.
    ///
    /// # Errors
    /// Re-raises the gateway failure after recording it on the session.
    pub async fn logout(&self) -> Result<Ack, Error> {
        self.begin();
        let result = users::logout(self.gateway.as_ref()).await;
        self.gateway.credentials().clear();
        match result {
            Ok(ack) => {
                self.settle(|state| {
                    state.user = None;
                    state.authenticated = false;
                });
                Ok(ack)
            }
            Err(err) => {
                let recorded = SessionError::from_error(&err, LOGOUT_FAILED);
                self.settle(|state| {
                    state.user = None;
                    state.authenticated = false;
                    state.error = Some(recorded);
                });
                Err(err)
            }
        }
    }

    /// Re-derives the session from the server, the reload path. "Cannot
    /// verify" means "not authenticated": any failure leaves the session
    /// anonymous.
    ///
    /// # Errors
    /// Re-raises the gateway failure after recording it on the session.
    pub async fn fetch_current_user(&self) -> Result<User, Error> {
        self.begin();
        match users::current_user(self.gateway.as_ref()).await {
            Ok(user) => {
                self.settle(|state| {
                    state.user = Some(user.clone());
                    state.authenticated = true;
                });
                Ok(user)
            }
            Err(err) => {
                let recorded = SessionError::from_error(&err, FETCH_USER_FAILED);
                self.settle(|state| {
                    state.user = None;
                    state.authenticated = false;
                    state.error = Some(recorded);
                });
                Err(err)
            }
        }
    }

    /// # Errors
    /// Re-raises the gateway failure after recording it on the session.
    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<AuthResponse, Error> {
        self.begin();
        match users::update_profile(self.gateway.as_ref(), update).await {
            Ok(response) => {
                self.settle(|state| {
                    if response.user.is_some() {
                        state.user = response.user.clone();
                    }
                });
                Ok(response)
            }
            Err(err) => {
                self.settle_err(&err, PROFILE_FAILED);
                Err(err)
            }
        }
    }

    /// # Errors
    /// Re-raises the gateway failure after recording it on the session.
    pub async fn change_password(
        &self,
        request: &ChangePasswordRequest,
    ) -> Result<Ack, Error> {
        self.begin();
        match users::change_password(self.gateway.as_ref(), request).await {
            Ok(ack) => {
                self.settle(|_| {});
                Ok(ack)
            }
            Err(err) => {
                self.settle_err(&err, PASSWORD_FAILED);
                Err(err)
            }
        }
    }

    /// Never raises; any failure reports "unavailable" since the caller gates
    /// form submission on the answer and a false negative is the safe side.
    pub async fn check_username(&self, username: &str) -> bool {
        users::check_username(self.gateway.as_ref(), username)
            .await
            .map(|response| response.available)
            .unwrap_or_else(|err| {
                debug!("username availability check failed closed: {}", err);
                false
            })
    }

    /// Never raises; failures report "unavailable", same as
    /// [`AuthSession::check_username`].
    pub async fn check_email(&self, email: &str) -> bool {
        users::check_email(self.gateway.as_ref(), email)
            .await
            .map(|response| response.available)
            .unwrap_or_else(|err| {
                debug!("email availability check failed closed: {}", err);
                false
            })
    }

    fn begin(&self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.loading = true;
        state.error = None;
    }

    /// Final step of every operation: apply the outcome, then drop `loading`.
    fn settle(&self, apply: impl FnOnce(&mut SessionSnapshot)) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        apply(&mut state);
        state.loading = false;
    }

    fn settle_err(&self, err: &Error, fallback: &str) {
        let recorded = SessionError::from_error(err, fallback);
        self.settle(|state| state.error = Some(recorded));
    }

    fn store_credential(&self, response: &AuthResponse) {
        let Some(token) = &response.token else {
            return;
        };
        let display_name = response
            .user
            .as_ref()
            .map(|user| user.username.clone())
            .unwrap_or_default();
        self.gateway
            .credentials()
            .set(SecretString::from(token.clone()), display_name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ApiFailure, classify};
    use reqwest::StatusCode;

    fn api_error(status: StatusCode, message: Option<&str>, fields: FieldErrors) -> Error {
        Error::Api(ApiFailure {
            status,
            kind: classify(Some(status)),
            message: message.map(str::to_string),
            fields,
        })
    }

    #[test]
    fn session_error_prefers_server_message() {
        let err = api_error(StatusCode::BAD_REQUEST, Some("invalid credentials"), FieldErrors::new());
        let recorded = SessionError::from_error(&err, LOGIN_FAILED);
        assert_eq!(recorded.message, "invalid credentials");
        assert_eq!(recorded.kind, FailureKind::Other);
    }

    #[test]
    fn session_error_falls_back_without_message() {
        let mut fields = FieldErrors::new();
        fields.insert("username".to_string(), vec!["already taken".to_string()]);
        let err = api_error(StatusCode::BAD_REQUEST, None, fields);
        let recorded = SessionError::from_error(&err, REGISTER_FAILED);
        assert_eq!(recorded.message, REGISTER_FAILED);
        assert_eq!(
            recorded.fields.get("username").map(Vec::len),
            Some(1)
        );
    }

    #[test]
    fn snapshot_starts_anonymous() {
        let snapshot = SessionSnapshot::default();
        assert!(snapshot.user.is_none());
        assert!(!snapshot.authenticated);
        assert!(!snapshot.loading);
        assert!(snapshot.error.is_none());
    }
}
