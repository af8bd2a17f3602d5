//! Chart endpoints: listings, staged submissions against a won bid, review
//! lookups, and the packaged bundle download.

use crate::api::songs::Song;
use crate::api::Page;
use crate::error::Error;
use crate::gateway::Gateway;
use reqwest::multipart::Form;
use serde::Deserialize;

/// Chart record. Charts move through submission stages, so most fields are
/// absent until the matching stage has happened.
#[derive(Clone, Debug, Deserialize)]
pub struct Chart {
    pub id: i64,
    #[serde(default)]
    pub song: Option<Song>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub designer: Option<String>,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub status_display: Option<String>,
    #[serde(default)]
    pub is_part_one: bool,
    #[serde(default)]
    pub review_count: i64,
    #[serde(default)]
    pub average_score: Option<f64>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub submitted_at: Option<String>,
}

/// Paging query for the chart catalogue.
#[derive(Clone, Debug, Default)]
pub struct ChartQuery {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

impl ChartQuery {
    fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(page) = self.page {
            params.push(("page", page.to_string()));
        }
        if let Some(page_size) = self.page_size {
            params.push(("page_size", page_size.to_string()));
        }
        params
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct ChartResponse {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub chart: Option<Chart>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct MyCharts {
    pub success: bool,
    #[serde(default)]
    pub count: i64,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub charts: Vec<Chart>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ChartReview {
    pub id: i64,
    #[serde(default)]
    pub reviewer: Option<String>,
    #[serde(default)]
    pub score: f64,
    #[serde(default)]
    pub comment: String,
    #[serde(default)]
    pub favorite: bool,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ChartReviews {
    pub success: bool,
    #[serde(default)]
    pub count: i64,
    #[serde(default)]
    pub reviews: Vec<ChartReview>,
}

/// # Errors
/// Propagates the gateway failure.
pub async fn list(gateway: &Gateway, query: &ChartQuery) -> Result<Page<Chart>, Error> {
    gateway.get_query("/songs/charts/", &query.params()).await
}

/// # Errors
/// Propagates the gateway failure.
pub async fn my_charts(gateway: &Gateway, round_id: Option<i64>) -> Result<MyCharts, Error> {
    match round_id {
        Some(id) => {
            gateway
                .get_query("/songs/charts/me/", &[("bidding_round_id", id.to_string())])
                .await
        }
        None => gateway.get("/songs/charts/me/").await,
    }
}

/// Submits chart material for a won bid, identified by the allocation
/// result. The same endpoint takes the part-one draft and the finished
/// chart; the form carries `chart_file` plus stage-dependent parts.
///
/// # Errors
/// Propagates the gateway failure.
pub async fn submit(gateway: &Gateway, result_id: i64, form: Form) -> Result<ChartResponse, Error> {
    gateway
        .post_multipart(&format!("/songs/charts/{result_id}/submit/"), form)
        .await
}

/// Downloads the zipped chart bundle assembled server-side.
///
/// # Errors
/// Propagates the gateway failure.
pub async fn download_bundle(gateway: &Gateway, chart_id: i64) -> Result<Vec<u8>, Error> {
    gateway
        .download(&format!("/songs/charts/{chart_id}/bundle/"))
        .await
}

/// # Errors
/// Propagates the gateway failure.
pub async fn reviews(gateway: &Gateway, chart_id: i64) -> Result<ChartReviews, Error> {
    gateway
        .get(&format!("/songs/charts/{chart_id}/reviews/"))
        .await
}
