//! Time-bounded cache of the server's current competition phase. The cache is
//! replaced wholesale on refresh, never merged; a failed refresh serves the
//! previous descriptor if one exists, else the canonical conservative
//! fallback. The TTL timestamp, not a lock held across the fetch, is what
//! gates refreshes.

use crate::gateway::Gateway;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Fixed lifetime of a cached phase descriptor.
const PHASE_TTL: Duration = Duration::from_secs(10);

const CURRENT_PHASE_PATH: &str = "/songs/phase/current/";

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PhaseStatus {
    Upcoming,
    Active,
    Ended,
    #[default]
    #[serde(other)]
    Unknown,
}

/// Server-declared competition stage with its per-page access matrix.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct PhaseDescriptor {
    pub id: i64,
    pub name: String,
    pub phase_key: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: PhaseStatus,
    #[serde(default)]
    pub page_access: HashMap<String, bool>,
    #[serde(default)]
    pub time_remaining: Option<String>,
    #[serde(default)]
    pub start_time: Option<String>,
    #[serde(default)]
    pub end_time: Option<String>,
}

impl PhaseDescriptor {
    /// The canonical descriptor for "phase unavailable": permits only the
    /// home and profile pages.
    #[must_use]
    pub fn fallback() -> Self {
        Self {
            id: 0,
            name: "Unknown phase".to_string(),
            phase_key: "unknown".to_string(),
            description: None,
            status: PhaseStatus::Unknown,
            page_access: HashMap::from([
                ("home".to_string(), true),
                ("profile".to_string(), true),
                ("songs".to_string(), false),
                ("charts".to_string(), false),
                ("eval".to_string(), false),
            ]),
            time_remaining: None,
            start_time: None,
            end_time: None,
        }
    }

    /// Page-access lookup; a page absent from the matrix is permitted. Only
    /// pages the server explicitly disables are gated.
    #[must_use]
    pub fn allows(&self, page: &str) -> bool {
        self.page_access.get(page).copied().unwrap_or(true)
    }
}

struct CachedPhase {
    descriptor: PhaseDescriptor,
    fetched_at: Instant,
}

pub struct PhaseCache {
    gateway: Arc<Gateway>,
    slot: Mutex<Option<CachedPhase>>,
}

impl PhaseCache {
    #[must_use]
    pub fn new(gateway: Arc<Gateway>) -> Self {
        Self {
            gateway,
            slot: Mutex::new(None),
        }
    }

    /// Returns the freshest known descriptor, fetching only when the cache is
    /// empty or older than the TTL. Never raises: a failed fetch falls back
    /// to the stale value or [`PhaseDescriptor::fallback`].
    pub async fn current(&self) -> PhaseDescriptor {
        if let Some(descriptor) = self.fresh() {
            debug!("phase cache hit: {}", descriptor.phase_key);
            return descriptor;
        }

        match self.gateway.get::<PhaseDescriptor>(CURRENT_PHASE_PATH).await {
            Ok(descriptor) => {
                self.store(descriptor.clone());
                descriptor
            }
            Err(err) => {
                warn!("current phase fetch failed: {}", err);
                self.stale().unwrap_or_else(PhaseDescriptor::fallback)
            }
        }
    }

    fn fresh(&self) -> Option<PhaseDescriptor> {
        let slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        slot.as_ref()
            .filter(|cached| cached.fetched_at.elapsed() < PHASE_TTL)
            .map(|cached| cached.descriptor.clone())
    }

    fn stale(&self) -> Option<PhaseDescriptor> {
        let slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        slot.as_ref().map(|cached| cached.descriptor.clone())
    }

    fn store(&self, descriptor: PhaseDescriptor) {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        *slot = Some(CachedPhase {
            descriptor,
            fetched_at: Instant::now(),
        });
    }
}
