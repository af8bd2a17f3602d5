//! Bidding endpoints: rounds, the caller's bids, and allocation results.
//! A bid targets either a song or a chart; the server resolves the active
//! round when none is named.

use crate::api::Ack;
use crate::api::songs::Song;
use crate::error::Error;
use crate::gateway::Gateway;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Round record from the listing. Creation responses carry a reduced shape,
/// so everything past the identity fields is defaulted.
#[derive(Clone, Debug, Deserialize)]
pub struct Round {
    pub id: i64,
    pub name: String,
    pub status: String,
    #[serde(default)]
    pub status_display: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub started_at: Option<String>,
    #[serde(default)]
    pub completed_at: Option<String>,
    #[serde(default)]
    pub bid_count: i64,
    #[serde(default)]
    pub result_count: i64,
}

/// Round identity attached to bid and result envelopes.
#[derive(Clone, Debug, Deserialize)]
pub struct RoundRef {
    pub id: i64,
    pub name: String,
    pub status: String,
    #[serde(default)]
    pub completed_at: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct RoundsResponse {
    pub success: bool,
    #[serde(default)]
    pub count: i64,
    #[serde(default)]
    pub rounds: Vec<Round>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct RoundResponse {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub round: Option<Round>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Bid {
    pub id: i64,
    pub song: Song,
    pub amount: i64,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub is_dropped: bool,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// The caller's bids in one round. `round` is absent when no round is
/// active, in which case `message` explains and `bids` is empty.
#[derive(Clone, Debug, Deserialize)]
pub struct MyBids {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub round: Option<RoundRef>,
    #[serde(default)]
    pub bid_count: i64,
    #[serde(default)]
    pub max_bids: i64,
    #[serde(default)]
    pub bids: Vec<Bid>,
}

/// New bid. Exactly one of `song_id` and `chart_id` names the target;
/// `round_id` defaults to the active round server-side.
#[derive(Clone, Debug, Serialize)]
pub struct BidRequest {
    pub amount: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub song_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chart_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub round_id: Option<i64>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct BidResponse {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub bid: Option<Bid>,
}

/// Standing bids on one target, for gauging the market before bidding.
#[derive(Clone, Debug, Deserialize)]
pub struct TargetBids {
    pub success: bool,
    #[serde(default)]
    pub count: i64,
    #[serde(default)]
    pub bids: Vec<Bid>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct BidResult {
    pub id: i64,
    pub song: Song,
    pub bid_amount: i64,
    pub allocation_type: String,
    #[serde(default)]
    pub allocation_type_display: Option<String>,
    #[serde(default)]
    pub allocated_at: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct BidResults {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub round: Option<RoundRef>,
    #[serde(default)]
    pub result_count: i64,
    #[serde(default)]
    pub results: Vec<BidResult>,
}

/// Allocation run summary; `statistics` is an operator-facing report whose
/// shape tracks the allocation service, so it stays untyped.
#[derive(Clone, Debug, Deserialize)]
pub struct AllocationResponse {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub round: Option<RoundRef>,
    #[serde(default)]
    pub statistics: Option<Value>,
}

/// # Errors
/// Propagates the gateway failure.
pub async fn rounds(gateway: &Gateway) -> Result<RoundsResponse, Error> {
    gateway.get("/songs/bidding-rounds/").await
}

/// Opens a new round. Requires an operator account.
///
/// # Errors
/// Propagates the gateway failure.
pub async fn create_round(gateway: &Gateway, name: &str) -> Result<RoundResponse, Error> {
    gateway
        .post("/songs/bidding-rounds/", &serde_json::json!({ "name": name }))
        .await
}

/// # Errors
/// Propagates the gateway failure.
pub async fn my_bids(gateway: &Gateway, round_id: Option<i64>) -> Result<MyBids, Error> {
    match round_id {
        Some(id) => {
            gateway
                .get_query("/songs/bids/", &[("round_id", id.to_string())])
                .await
        }
        None => gateway.get("/songs/bids/").await,
    }
}

/// # Errors
/// Propagates the gateway failure.
pub async fn place_bid(gateway: &Gateway, request: &BidRequest) -> Result<BidResponse, Error> {
    gateway.post("/songs/bids/", request).await
}

/// Withdraws one of the caller's bids.
///
/// # Errors
/// Propagates the gateway failure.
pub async fn delete_bid(gateway: &Gateway, bid_id: i64) -> Result<Ack, Error> {
    gateway.delete(&format!("/songs/bids/{bid_id}/")).await
}

/// # Errors
/// Propagates the gateway failure.
pub async fn target_bids(
    gateway: &Gateway,
    song_id: Option<i64>,
    chart_id: Option<i64>,
    round_id: Option<i64>,
) -> Result<TargetBids, Error> {
    let mut params = Vec::new();
    if let Some(id) = song_id {
        params.push(("song_id", id.to_string()));
    }
    if let Some(id) = chart_id {
        params.push(("chart_id", id.to_string()));
    }
    if let Some(id) = round_id {
        params.push(("round_id", id.to_string()));
    }
    gateway.get_query("/songs/bids/target/", &params).await
}

/// Runs the allocation for a round. Requires an operator account.
///
/// # Errors
/// Propagates the gateway failure.
pub async fn allocate(
    gateway: &Gateway,
    round_id: Option<i64>,
) -> Result<AllocationResponse, Error> {
    let body = match round_id {
        Some(id) => serde_json::json!({ "round_id": id }),
        None => serde_json::json!({}),
    };
    gateway.post("/songs/bids/allocate/", &body).await
}

/// # Errors
/// Propagates the gateway failure.
pub async fn bid_results(gateway: &Gateway, round_id: Option<i64>) -> Result<BidResults, Error> {
    match round_id {
        Some(id) => {
            gateway
                .get_query("/songs/bid-results/", &[("round_id", id.to_string())])
                .await
        }
        None => gateway.get("/songs/bid-results/").await,
    }
}
