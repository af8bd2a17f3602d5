//! Landing page content: banners, announcements, the competition status
//! card, and the phase schedule. Status and schedule lookups never fail the
//! caller; a page shell renders before any of this resolves, so both return
//! a neutral placeholder instead of an error.

use crate::error::Error;
use crate::gateway::Gateway;
use crate::phase::PhaseDescriptor;
use serde::Deserialize;
use tracing::warn;

#[derive(Clone, Debug, Deserialize)]
pub struct Banner {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub button_text: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub priority: i64,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Banners {
    pub success: bool,
    #[serde(default)]
    pub banners: Vec<Banner>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Announcement {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Announcements {
    pub success: bool,
    #[serde(default)]
    pub announcements: Vec<Announcement>,
}

/// Competition status card. The wire shape is camelCase.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CompetitionStatus {
    #[serde(default)]
    pub current_round: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub status_text: String,
    #[serde(default)]
    pub participants: i64,
    #[serde(default)]
    pub submissions: i64,
}

impl CompetitionStatus {
    /// Placeholder card shown while the server is unreachable.
    #[must_use]
    pub fn fallback() -> Self {
        Self {
            current_round: "Not started".to_string(),
            status: "pending".to_string(),
            status_text: "Pending start".to_string(),
            participants: 0,
            submissions: 0,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
struct PhasesResponse {
    #[allow(dead_code)]
    success: bool,
    #[serde(default)]
    phases: Vec<PhaseDescriptor>,
}

/// # Errors
/// Propagates the gateway failure.
pub async fn banners(gateway: &Gateway) -> Result<Banners, Error> {
    gateway.get("/songs/banners/").await
}

/// # Errors
/// Propagates the gateway failure.
pub async fn announcements(
    gateway: &Gateway,
    limit: Option<i64>,
) -> Result<Announcements, Error> {
    match limit {
        Some(limit) => {
            gateway
                .get_query("/songs/announcements/", &[("limit", limit.to_string())])
                .await
        }
        None => gateway.get("/songs/announcements/").await,
    }
}

/// Fetches the status card, falling back to [`CompetitionStatus::fallback`]
/// on any failure.
pub async fn competition_status(gateway: &Gateway) -> CompetitionStatus {
    match gateway.get("/songs/status/").await {
        Ok(status) => status,
        Err(err) => {
            warn!("competition status unavailable, using placeholder: {err}");
            CompetitionStatus::fallback()
        }
    }
}

/// Fetches the phase schedule, empty on any failure. `include_inactive`
/// widens the listing to phases not yet opened by an operator.
pub async fn phases(gateway: &Gateway, include_inactive: bool) -> Vec<PhaseDescriptor> {
    let result: Result<PhasesResponse, Error> = if include_inactive {
        gateway
            .get_query("/songs/phases/", &[("include_inactive", "true".to_string())])
            .await
    } else {
        gateway.get("/songs/phases/").await
    };

    match result {
        Ok(response) => response.phases,
        Err(err) => {
            warn!("phase schedule unavailable: {err}");
            Vec::new()
        }
    }
}
