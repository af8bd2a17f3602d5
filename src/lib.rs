//! # Kantaro Client
//!
//! `kantaro-client` is the embeddable client runtime for the Kantaro song
//! competition platform. It owns everything between a UI shell and the
//! platform API: the credential slot, the CSRF handshake, the HTTP gateway
//! with its failure pipeline, the auth session state machine, the phase
//! access cache, navigation gating, and the debounced availability prober
//! used by the signup form.
//!
//! ## Session model
//!
//! The server runs cookie sessions with CSRF double-submit protection and
//! may additionally issue a bearer token at login. [`CredentialStore`] holds
//! that token (plus a display name) in memory, optionally mirrored to a
//! small JSON file; the cookie jar lives inside the [`Gateway`]. The
//! authenticated-user record itself is never persisted. A fresh embedder
//! calls [`AuthSession::fetch_current_user`] once at startup to re-derive it
//! from whatever credentials survived.
//!
//! ## Failure pipeline
//!
//! Every request funnels through one classification path: transport errors
//! and non-success statuses become an [`Error`] whose [`FailureKind`] drives
//! uniform side effects. A 401 clears the credential slot exactly once and
//! emits a redirect-to-login event; other kinds surface as user-facing
//! notices on the [`UiEvent`] channel. Callers still receive the error and
//! decide what their own surface does with it.
//!
//! ## Phase gating
//!
//! Competition phases open and close feature areas. [`PhaseCache`] serves
//! the current phase descriptor with a short TTL and degrades to a stale
//! descriptor, then to a conservative fallback, when the server is
//! unreachable. [`NavigationGuard`] combines that descriptor with the
//! credential slot to admit, redirect, or deny a route change. The guard is
//! a UX affordance; real access control stays on the API.

pub mod api;
pub mod config;
pub mod credentials;
pub mod csrf;
pub mod error;
pub mod gateway;
pub mod guard;
pub mod notify;
pub mod phase;
pub mod probe;
pub mod session;

pub use config::ApiConfig;
pub use credentials::{Credential, CredentialStore};
pub use error::{ApiFailure, Error, FailureKind, FieldErrors};
pub use gateway::Gateway;
pub use guard::{NavigationGuard, Outcome, Route, Transition};
pub use notify::{Notice, Notifier, Severity, UiEvent};
pub use phase::{PhaseCache, PhaseDescriptor, PhaseStatus};
pub use probe::{AvailabilityProber, ProbeField, ProbeOutcome, ProbeUpdate};
pub use session::{AuthSession, SessionError, SessionSnapshot};
