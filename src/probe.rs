//! Debounced uniqueness probes for registration input. Each keystroke bumps a
//! per-field generation counter; a probe result is applied only if its
//! captured generation is still current, so a stale response can never
//! overwrite the status for a newer candidate. Aborting the superseded timer
//! task is an efficiency optimization layered on top, not the correctness
//! mechanism.

use crate::session::AuthSession;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

/// Quiet interval before a candidate is probed.
const PROBE_DELAY: Duration = Duration::from_millis(500);
/// Usernames shorter than this clear the status without a network call.
const MIN_USERNAME_CHARS: usize = 3;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ProbeField {
    Username,
    Email,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ProbeOutcome {
    /// Local precondition failed; the displayed status should be cleared.
    Cleared,
    Available,
    Unavailable,
}

/// Status update for the form layer, at most one applied per debounce window.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ProbeUpdate {
    pub field: ProbeField,
    pub value: String,
    pub outcome: ProbeOutcome,
}

struct FieldLane {
    generation: Arc<AtomicU64>,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl FieldLane {
    fn new() -> Self {
        Self {
            generation: Arc::new(AtomicU64::new(0)),
            pending: Mutex::new(None),
        }
    }
}

/// Username and email run independent debounce timelines; observing one field
/// never delays or cancels the other.
pub struct AvailabilityProber {
    session: Arc<AuthSession>,
    updates: mpsc::UnboundedSender<ProbeUpdate>,
    username: FieldLane,
    email: FieldLane,
}

impl AvailabilityProber {
    #[must_use]
    pub fn new(session: Arc<AuthSession>) -> (Self, mpsc::UnboundedReceiver<ProbeUpdate>) {
        let (updates, receiver) = mpsc::unbounded_channel();
        (
            Self {
                session,
                updates,
                username: FieldLane::new(),
                email: FieldLane::new(),
            },
            receiver,
        )
    }

    /// Feeds one keystroke's worth of candidate value for a field.
    pub fn observe(&self, field: ProbeField, value: impl Into<String>) {
        let value = value.into();
        let lane = self.lane(field);

        let generation = lane.generation.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(pending) = lane
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            pending.abort();
        }

        if !passes_precondition(field, &value) {
            let _ = self.updates.send(ProbeUpdate {
                field,
                value,
                outcome: ProbeOutcome::Cleared,
            });
            return;
        }

        let session = Arc::clone(&self.session);
        let updates = self.updates.clone();
        let lane_generation = Arc::clone(&lane.generation);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(PROBE_DELAY).await;
            if lane_generation.load(Ordering::SeqCst) != generation {
                return;
            }

            let available = match field {
                ProbeField::Username => session.check_username(&value).await,
                ProbeField::Email => session.check_email(&value).await,
            };

            if lane_generation.load(Ordering::SeqCst) != generation {
                debug!("discarding stale {:?} probe result", field);
                return;
            }
            let outcome = if available {
                ProbeOutcome::Available
            } else {
                ProbeOutcome::Unavailable
            };
            let _ = updates.send(ProbeUpdate {
                field,
                value,
                outcome,
            });
        });

        *lane
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(handle);
    }

    fn lane(&self, field: ProbeField) -> &FieldLane {
        match field {
            ProbeField::Username => &self.username,
            ProbeField::Email => &self.email,
        }
    }
}

fn passes_precondition(field: ProbeField, value: &str) -> bool {
    let value = value.trim();
    match field {
        ProbeField::Username => value.chars().count() >= MIN_USERNAME_CHARS,
        ProbeField::Email => !value.is_empty() && value.contains('@'),
    }
}
