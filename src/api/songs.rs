//! Song catalogue and submission endpoints. The catalogue listing is public;
//! everything touching the caller's own entries requires an authenticated
//! session, which the gateway enforces by surfacing the server's 401.

use crate::api::Page;
use crate::error::Error;
use crate::gateway::Gateway;
use reqwest::multipart::Form;
use serde::{Deserialize, Serialize};

/// Owner summary nested inside song records.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct SongOwner {
    pub id: i64,
    pub username: String,
}

/// Compact song record used by catalogue listings and bid entries.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Song {
    pub id: i64,
    pub title: String,
    pub user: SongOwner,
    #[serde(default)]
    pub cover_url: Option<String>,
    #[serde(default)]
    pub file_size: i64,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Full song record with media links, returned by detail and mutation
/// endpoints.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct SongDetail {
    pub id: i64,
    pub title: String,
    pub user: SongOwner,
    #[serde(default)]
    pub audio_url: Option<String>,
    #[serde(default)]
    pub cover_url: Option<String>,
    #[serde(default)]
    pub netease_url: Option<String>,
    #[serde(default)]
    pub file_size: i64,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// Catalogue paging query; `Default` asks for the server's first page.
#[derive(Clone, Debug, Default)]
pub struct SongQuery {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

impl SongQuery {
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

/// Only the non-file song fields may change after upload.
#[derive(Clone, Debug, Default, Serialize)]
pub struct SongUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub netease_url: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct SongResponse {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub song: Option<SongDetail>,
}

/// The caller's own uploads. `songs` is empty (with an explanatory message)
/// when nothing has been uploaded yet.
#[derive(Clone, Debug, Deserialize)]
pub struct MySongs {
    pub success: bool,
    #[serde(default)]
    pub count: i64,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub songs: Vec<SongDetail>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct DeletedSong {
    pub id: i64,
    pub title: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct DeleteResponse {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub deleted_song: Option<DeletedSong>,
}

/// # Errors
/// Propagates the gateway failure.
pub async fn list(gateway: &Gateway, query: &SongQuery) -> Result<Page<Song>, Error> {
    gateway.get_query("/songs/", &query.params()).await
}

/// Uploads a new song. The form carries `title` and `audio_file`, plus
/// optional `cover_image` and `netease_url` parts.
///
/// # Errors
/// Propagates the gateway failure; validation problems arrive as field
/// messages on the error.
pub async fn upload(gateway: &Gateway, form: Form) -> Result<SongResponse, Error> {
    gateway.post_multipart("/songs/", form).await
}

/// # Errors
/// Propagates the gateway failure.
pub async fn my_songs(gateway: &Gateway) -> Result<MySongs, Error> {
    gateway.get("/songs/me/").await
}

/// # Errors
/// Propagates the gateway failure.
pub async fn update(
    gateway: &Gateway,
    song_id: i64,
    update: &SongUpdate,
) -> Result<SongResponse, Error> {
    gateway.put(&format!("/songs/{song_id}/update/"), update).await
}

/// # Errors
/// Propagates the gateway failure.
pub async fn delete(gateway: &Gateway, song_id: i64) -> Result<DeleteResponse, Error> {
    gateway.delete(&format!("/songs/{song_id}/")).await
}

/// # Errors
/// Propagates the gateway failure.
pub async fn detail(gateway: &Gateway, song_id: i64) -> Result<SongResponse, Error> {
    gateway.get(&format!("/songs/detail/{song_id}/")).await
}
