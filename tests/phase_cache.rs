//! Phase cache behavior: TTL-gated refetching under a controlled clock,
//! stale service when a refresh fails, and the conservative fallback when
//! nothing was ever cached.

use anyhow::{Result, bail};
use kantaro_client::{
    ApiConfig, CredentialStore, Gateway, Notifier, PhaseCache, PhaseDescriptor, PhaseStatus,
    UiEvent,
};
use serde_json::json;
use std::net::TcpListener;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn can_bind_localhost() -> bool {
    TcpListener::bind("127.0.0.1:0").is_ok()
}

fn test_cache(uri: &str) -> Result<(Arc<PhaseCache>, mpsc::UnboundedReceiver<UiEvent>)> {
    let config = Arc::new(ApiConfig::new(uri));
    let credentials = Arc::new(CredentialStore::in_memory());
    let (notifier, events) = Notifier::channel();
    let gateway = Arc::new(Gateway::new(config, credentials, notifier)?);
    Ok((Arc::new(PhaseCache::new(gateway)), events))
}

fn submission_phase() -> serde_json::Value {
    json!({
        "id": 2,
        "name": "Song submission",
        "phase_key": "submission",
        "description": "Upload entries",
        "status": "active",
        "page_access": { "home": true, "songs": true, "charts": false },
        "time_remaining": "3 days",
        "start_time": "2025-03-01T00:00:00Z",
        "end_time": "2025-03-10T00:00:00Z"
    })
}

async fn phase_fetches(server: &MockServer) -> Result<usize> {
    let Some(requests) = server.received_requests().await else {
        bail!("wiremock request recording is disabled");
    };
    Ok(requests
        .iter()
        .filter(|request| request.url.path() == "/api/songs/phase/current/")
        .count())
}

#[tokio::test(start_paused = true)]
async fn repeated_lookups_within_ttl_fetch_once() -> Result<()> {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind localhost");
        return Ok(());
    }
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/songs/phase/current/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(submission_phase()))
        .mount(&server)
        .await;

    let (cache, _events) = test_cache(&server.uri())?;
    let first = cache.current().await;
    let second = cache.current().await;

    assert_eq!(first.phase_key, "submission");
    assert_eq!(first, second);
    assert_eq!(phase_fetches(&server).await?, 1);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn expired_cache_triggers_a_second_fetch() -> Result<()> {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind localhost");
        return Ok(());
    }
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/songs/phase/current/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(submission_phase()))
        .mount(&server)
        .await;

    let (cache, _events) = test_cache(&server.uri())?;
    cache.current().await;

    tokio::time::advance(Duration::from_secs(11)).await;
    cache.current().await;

    assert_eq!(phase_fetches(&server).await?, 2);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn failed_refresh_serves_the_stale_descriptor() -> Result<()> {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind localhost");
        return Ok(());
    }
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/songs/phase/current/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(submission_phase()))
        .up_to_n_times(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/songs/phase/current/"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({ "message": "boom" })))
        .mount(&server)
        .await;

    let (cache, _events) = test_cache(&server.uri())?;
    let fresh = cache.current().await;
    assert_eq!(fresh.phase_key, "submission");

    tokio::time::advance(Duration::from_secs(11)).await;
    let stale = cache.current().await;

    assert_eq!(stale, fresh, "stale descriptor should survive a failed refresh");
    assert_eq!(phase_fetches(&server).await?, 2);
    Ok(())
}

#[tokio::test]
async fn empty_cache_with_unreachable_server_falls_back() -> Result<()> {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind localhost");
        return Ok(());
    }
    // No mock mounted: every request gets wiremock's 404.
    let server = MockServer::start().await;

    let (cache, _events) = test_cache(&server.uri())?;
    let descriptor = cache.current().await;

    assert_eq!(descriptor, PhaseDescriptor::fallback());
    assert_eq!(descriptor.status, PhaseStatus::Unknown);
    assert!(descriptor.allows("home"));
    assert!(!descriptor.allows("songs"));
    Ok(())
}
