//! Peer review endpoints: the caller's allocated review tasks and score
//! submission, both for allocated tasks and self-picked extra reviews.
//!
//! The two submission bodies differ on the wire: allocated reviews send
//! `comment`, extra reviews send `comments`. That asymmetry is the server's
//! contract and is kept as is.

use crate::api::charts::Chart;
use crate::api::Ack;
use crate::error::Error;
use crate::gateway::Gateway;
use serde::{Deserialize, Serialize};

/// One allocated review task.
#[derive(Clone, Debug, Deserialize)]
pub struct ReviewTask {
    pub id: i64,
    #[serde(default)]
    pub chart: Option<Chart>,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub allocated_at: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ReviewTasks {
    pub success: bool,
    #[serde(default)]
    pub count: i64,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub tasks: Vec<ReviewTask>,
}

#[derive(Clone, Debug, Serialize)]
pub struct ReviewSubmission {
    pub score: f64,
    pub comment: String,
    pub favorite: bool,
}

#[derive(Clone, Debug, Serialize)]
pub struct ExtraReviewSubmission {
    pub chart_id: i64,
    pub score: f64,
    pub comments: String,
    pub favorite: bool,
}

/// # Errors
/// Propagates the gateway failure.
pub async fn my_tasks(gateway: &Gateway) -> Result<ReviewTasks, Error> {
    gateway.get("/songs/peer-reviews/tasks/").await
}

/// Scores an allocated task.
///
/// # Errors
/// Propagates the gateway failure.
pub async fn submit(
    gateway: &Gateway,
    allocation_id: i64,
    submission: &ReviewSubmission,
) -> Result<Ack, Error> {
    gateway
        .post(
            &format!("/songs/peer-reviews/allocations/{allocation_id}/submit/"),
            submission,
        )
        .await
}

/// Scores a chart outside the caller's allocation.
///
/// # Errors
/// Propagates the gateway failure.
pub async fn submit_extra(
    gateway: &Gateway,
    submission: &ExtraReviewSubmission,
) -> Result<Ack, Error> {
    gateway.post("/songs/peer-reviews/extra/", submission).await
}
