//! Failure taxonomy for the client layer. Classification of an HTTP status into
//! a [`FailureKind`] is a pure function; applying its side effects (notices,
//! credential clearing) belongs to the gateway.

use reqwest::StatusCode;
use serde::Deserialize;
use std::collections::HashMap;
use thiserror::Error;

/// Field name to list of validation messages, as reported by the server.
pub type FieldErrors = HashMap<String, Vec<String>>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("invalid base address: {0}")]
    BaseUrl(String),
    #[error(transparent)]
    Api(ApiFailure),
    #[error("credential store: {0}")]
    Persist(#[from] std::io::Error),
}

impl Error {
    /// Kind of failure for display purposes. Local errors (bad base address,
    /// store IO) report as `Other`; transport errors with no response at all
    /// report as `Connectivity`.
    #[must_use]
    pub fn kind(&self) -> FailureKind {
        match self {
            Error::Transport(_) => FailureKind::Connectivity,
            Error::Api(failure) => failure.kind,
            Error::BaseUrl(_) | Error::Persist(_) => FailureKind::Other,
        }
    }

    /// Server-reported field-level validation messages, if any.
    #[must_use]
    pub fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            Error::Api(failure) if !failure.fields.is_empty() => Some(&failure.fields),
            _ => None,
        }
    }

    /// Server-supplied message, if the error envelope carried one.
    #[must_use]
    pub fn server_message(&self) -> Option<&str> {
        match self {
            Error::Api(failure) => failure.message.as_deref(),
            _ => None,
        }
    }
}

/// A non-success HTTP response, after classification and envelope parsing.
#[derive(Debug, Error)]
#[error("request failed ({status}): {}", message.as_deref().unwrap_or("no message"))]
pub struct ApiFailure {
    pub status: StatusCode,
    pub kind: FailureKind,
    pub message: Option<String>,
    pub fields: FieldErrors,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FailureKind {
    /// 401, clears local session state and redirects to login.
    Unauthorized,
    /// 403, notice only.
    Forbidden,
    /// 404, notice only.
    NotFound,
    /// 5xx, notice only, treated as transient.
    Server,
    /// No response at all, notice only, treated as transient.
    Connectivity,
    /// Any other non-success status.
    Other,
}

/// Classify an HTTP status into a failure kind. `None` means no response was
/// received at all.
#[must_use]
pub fn classify(status: Option<StatusCode>) -> FailureKind {
    match status {
        None => FailureKind::Connectivity,
        Some(StatusCode::UNAUTHORIZED) => FailureKind::Unauthorized,
        Some(StatusCode::FORBIDDEN) => FailureKind::Forbidden,
        Some(StatusCode::NOT_FOUND) => FailureKind::NotFound,
        Some(status) if status.is_server_error() => FailureKind::Server,
        Some(_) => FailureKind::Other,
    }
}

/// Error body consumed from the server, either field-scoped validation
/// messages or a single message string.
#[derive(Debug, Default, Deserialize)]
pub struct ErrorEnvelope {
    #[serde(default)]
    pub errors: FieldErrors,
    #[serde(default)]
    pub message: Option<String>,
}

impl ErrorEnvelope {
    /// Parses the envelope from a raw body, tolerating non-JSON bodies.
    #[must_use]
    pub fn from_body(body: &str) -> Self {
        serde_json::from_str(body).unwrap_or_default()
    }

    /// Folds the envelope into an [`ApiFailure`] for the given status.
    #[must_use]
    pub fn into_failure(self, status: StatusCode) -> ApiFailure {
        ApiFailure {
            status,
            kind: classify(Some(status)),
            message: self.message,
            fields: self.errors,
        }
    }
}
