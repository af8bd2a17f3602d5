//! Typed endpoint wrappers over the [`Gateway`](crate::gateway::Gateway),
//! one module per platform feature. These are thin: request/response types
//! plus one function per endpoint; all cross-cutting behavior lives in the
//! gateway pipeline.

use serde::Deserialize;

pub mod bidding;
pub mod charts;
pub mod home;
pub mod reviews;
pub mod songs;
pub mod users;

/// Minimal acknowledgement envelope shared by several endpoints.
#[derive(Clone, Debug, Deserialize)]
pub struct Ack {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}

/// Paginated list envelope used by song and chart listings.
#[derive(Clone, Debug, Deserialize)]
pub struct Page<T> {
    pub success: bool,
    pub count: i64,
    pub page: i64,
    pub page_size: i64,
    pub total_pages: i64,
    #[serde(default = "Vec::new")]
    pub results: Vec<T>,
}
