//! Navigation guard, run before a destination renders. Produces a
//! [`Transition`] the embedding router applies: the document title plus an
//! admit, redirect-to-login, or deny outcome. Access control here is UX only;
//! the API enforces the real thing.

use crate::credentials::CredentialStore;
use crate::notify::Notifier;
use crate::phase::PhaseCache;
use std::sync::Arc;
use tracing::debug;

const SITE_TITLE: &str = "Kantaro";
/// Pages admitted without consulting the access matrix.
const PUBLIC_PAGES: [&str; 3] = ["home", "login", "register"];

/// Route metadata supplied by the embedding router.
#[derive(Clone, Debug)]
pub struct Route {
    /// Logical page name, the key into the phase access matrix.
    pub name: String,
    /// Full destination path, preserved for post-login return.
    pub path: String,
    pub title: Option<String>,
    pub requires_auth: bool,
}

impl Route {
    #[must_use]
    pub fn new(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            title: None,
            requires_auth: false,
        }
    }
}

/// What the router should do with the transition.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Outcome {
    Admit,
    /// Go to the login page instead; `redirect` is the intended destination
    /// to return to after signing in.
    RedirectToLogin { redirect: String },
    /// Cancel the transition and stay at the previous location.
    Deny,
}

#[derive(Clone, Debug)]
pub struct Transition {
    pub title: String,
    pub outcome: Outcome,
}

/// Stateless across transitions; the only shared state is the phase cache.
pub struct NavigationGuard {
    credentials: Arc<CredentialStore>,
    phases: Arc<PhaseCache>,
    notifier: Notifier,
}

impl NavigationGuard {
    #[must_use]
    pub fn new(credentials: Arc<CredentialStore>, phases: Arc<PhaseCache>, notifier: Notifier) -> Self {
        Self {
            credentials,
            phases,
            notifier,
        }
    }

    pub async fn check(&self, destination: &Route) -> Transition {
        let title = page_title(destination);

        if destination.requires_auth && !self.credentials.is_present() {
            debug!("{} requires auth, redirecting to login", destination.name);
            return Transition {
                title,
                outcome: Outcome::RedirectToLogin {
                    redirect: destination.path.clone(),
                },
            };
        }

        if PUBLIC_PAGES.contains(&destination.name.as_str()) {
            return Transition {
                title,
                outcome: Outcome::Admit,
            };
        }

        let phase = self.phases.current().await;
        if phase.allows(&destination.name) {
            Transition {
                title,
                outcome: Outcome::Admit,
            }
        } else {
            debug!("{} disabled in phase {}", destination.name, phase.phase_key);
            self.notifier.warn(format!(
                "This feature opens in a later phase. Current phase: {} ({})",
                phase.name,
                phase.time_remaining.as_deref().unwrap_or("")
            ));
            Transition {
                title,
                outcome: Outcome::Deny,
            }
        }
    }
}

fn page_title(destination: &Route) -> String {
    match &destination.title {
        Some(title) => format!("{title} - {SITE_TITLE}"),
        None => SITE_TITLE.to_string(),
    }
}
