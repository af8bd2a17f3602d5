//! Auth session flows against a mock server: the login round trip, local
//! teardown on logout even when the server fails, session re-derivation at
//! startup, and the fail-closed availability checks.

use anyhow::{Result, bail};
use kantaro_client::api::users::{ChangePasswordRequest, LoginRequest, ProfileUpdate, RegisterRequest};
use kantaro_client::{
    ApiConfig, AuthSession, CredentialStore, FailureKind, Gateway, Notifier, UiEvent,
};
use secrecy::SecretString;
use serde_json::json;
use std::net::TcpListener;
use std::sync::Arc;
use tokio::sync::mpsc;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn can_bind_localhost() -> bool {
    TcpListener::bind("127.0.0.1:0").is_ok()
}

fn test_session(uri: &str) -> Result<(Arc<AuthSession>, Arc<Gateway>, mpsc::UnboundedReceiver<UiEvent>)> {
    let config = Arc::new(ApiConfig::new(uri));
    let credentials = Arc::new(CredentialStore::in_memory());
    let (notifier, events) = Notifier::channel();
    let gateway = Arc::new(Gateway::new(config, credentials, notifier)?);
    let session = Arc::new(AuthSession::new(Arc::clone(&gateway)));
    Ok((session, gateway, events))
}

async fn mount_csrf(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/api/users/csrf/"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("set-cookie", "csrftoken=test-csrf; Path=/")
                .set_body_json(json!({ "csrfToken": "test-csrf" })),
        )
        .mount(server)
        .await;
}

fn alice() -> serde_json::Value {
    json!({
        "id": 7,
        "username": "alice",
        "email": "alice@example.com",
        "first_name": "",
        "last_name": "",
        "is_active": true,
        "date_joined": "2025-03-01T12:00:00Z"
    })
}

async fn mount_login(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/api/users/login/"))
        .and(body_json(json!({ "username": "alice", "password": "secret" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "message": "Login successful",
            "user": alice(),
            "token": "bearer-1"
        })))
        .mount(server)
        .await;
}

fn login_request() -> LoginRequest {
    LoginRequest {
        username: "alice".to_string(),
        password: "secret".to_string(),
    }
}

#[tokio::test]
async fn login_round_trip_builds_the_session() -> Result<()> {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind localhost");
        return Ok(());
    }
    let server = MockServer::start().await;
    mount_csrf(&server).await;
    mount_login(&server).await;

    let (session, gateway, _events) = test_session(&server.uri())?;
    let response = session.login(&login_request()).await?;
    assert!(response.success);

    let snapshot = session.snapshot();
    assert!(snapshot.authenticated);
    assert!(!snapshot.loading);
    assert!(snapshot.error.is_none());
    assert_eq!(snapshot.user.map(|user| user.username), Some("alice".to_string()));

    assert!(gateway.credentials().is_present());
    assert_eq!(gateway.credentials().display_name(), Some("alice".to_string()));
    Ok(())
}

#[tokio::test]
async fn rejected_login_records_the_server_message() -> Result<()> {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind localhost");
        return Ok(());
    }
    let server = MockServer::start().await;
    mount_csrf(&server).await;

    Mock::given(method("POST"))
        .and(path("/api/users/login/"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({ "message": "invalid credentials" })),
        )
        .mount(&server)
        .await;

    let (session, gateway, _events) = test_session(&server.uri())?;
    let result = session.login(&login_request()).await;
    assert!(result.is_err());

    let snapshot = session.snapshot();
    assert!(!snapshot.authenticated);
    assert!(!snapshot.loading);
    let error = snapshot
        .error
        .ok_or_else(|| anyhow::anyhow!("expected a recorded error"))?;
    assert_eq!(error.message, "invalid credentials");
    assert!(!gateway.credentials().is_present());
    Ok(())
}

#[tokio::test]
async fn logout_clears_local_state_despite_server_failure() -> Result<()> {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind localhost");
        return Ok(());
    }
    let server = MockServer::start().await;
    mount_csrf(&server).await;
    mount_login(&server).await;

    Mock::given(method("POST"))
        .and(path("/api/users/logout/"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({ "message": "boom" })))
        .mount(&server)
        .await;

    let (session, gateway, _events) = test_session(&server.uri())?;
    session.login(&login_request()).await?;
    assert!(session.is_authenticated());

    let result = session.logout().await;
    let Err(err) = result else {
        bail!("expected the logout to fail");
    };
    assert_eq!(err.kind(), FailureKind::Server);

    // The user asked to sign out; the client must not keep the session alive
    // just because the server misbehaved.
    let snapshot = session.snapshot();
    assert!(!snapshot.authenticated);
    assert!(snapshot.user.is_none());
    assert!(!snapshot.loading);
    assert!(snapshot.error.is_some());
    assert!(!gateway.credentials().is_present());
    Ok(())
}

#[tokio::test]
async fn fetch_current_user_rebuilds_the_session() -> Result<()> {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind localhost");
        return Ok(());
    }
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/users/me/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(alice()))
        .mount(&server)
        .await;

    let (session, _gateway, _events) = test_session(&server.uri())?;
    let user = session.fetch_current_user().await?;
    assert_eq!(user.username, "alice");

    let snapshot = session.snapshot();
    assert!(snapshot.authenticated);
    assert!(!snapshot.loading);
    Ok(())
}

#[tokio::test]
async fn failed_user_fetch_leaves_the_session_anonymous() -> Result<()> {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind localhost");
        return Ok(());
    }
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/users/me/"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let (session, gateway, mut events) = test_session(&server.uri())?;
    gateway
        .credentials()
        .set(SecretString::from("stale-tok".to_string()), "alice");

    let result = session.fetch_current_user().await;
    assert!(result.is_err());

    let snapshot = session.snapshot();
    assert!(!snapshot.authenticated);
    assert!(snapshot.user.is_none());
    let error = snapshot
        .error
        .ok_or_else(|| anyhow::anyhow!("expected a recorded error"))?;
    assert_eq!(error.message, "Could not verify session");
    assert_eq!(error.kind, FailureKind::Unauthorized);

    // The stale credential is cleared and the UI told to go to login.
    assert!(!gateway.credentials().is_present());
    let mut seen_redirect = false;
    while let Ok(event) = events.try_recv() {
        if event == UiEvent::RedirectToLogin {
            seen_redirect = true;
        }
    }
    assert!(seen_redirect);
    Ok(())
}

#[tokio::test]
async fn registration_field_errors_are_preserved() -> Result<()> {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind localhost");
        return Ok(());
    }
    let server = MockServer::start().await;
    mount_csrf(&server).await;

    Mock::given(method("POST"))
        .and(path("/api/users/register/"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "errors": {
                "username": ["already taken"],
                "password": ["too short"]
            }
        })))
        .mount(&server)
        .await;

    let (session, _gateway, _events) = test_session(&server.uri())?;
    let request = RegisterRequest {
        username: "alice".to_string(),
        qqid: "12345".to_string(),
        email: "alice@example.com".to_string(),
        password: "pw".to_string(),
        password_confirm: "pw".to_string(),
    };
    let result = session.register(&request).await;
    assert!(result.is_err());

    let snapshot = session.snapshot();
    let error = snapshot
        .error
        .ok_or_else(|| anyhow::anyhow!("expected a recorded error"))?;
    assert_eq!(error.message, "Registration failed");
    assert_eq!(
        error.fields.get("username").map(Vec::as_slice),
        Some(["already taken".to_string()].as_slice())
    );
    assert_eq!(
        error.fields.get("password").map(Vec::as_slice),
        Some(["too short".to_string()].as_slice())
    );
    Ok(())
}

#[tokio::test]
async fn profile_update_replaces_the_user_record() -> Result<()> {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind localhost");
        return Ok(());
    }
    let server = MockServer::start().await;
    mount_csrf(&server).await;
    mount_login(&server).await;

    Mock::given(method("PUT"))
        .and(path("/api/users/profile/"))
        .and(body_json(json!({ "email": "new@example.com" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "message": "updated",
            "user": {
                "id": 7,
                "username": "alice",
                "email": "new@example.com",
                "first_name": "",
                "last_name": "",
                "is_active": true,
                "date_joined": "2025-03-01T12:00:00Z"
            }
        })))
        .mount(&server)
        .await;

    let (session, _gateway, _events) = test_session(&server.uri())?;
    session.login(&login_request()).await?;

    let update = ProfileUpdate {
        email: Some("new@example.com".to_string()),
        ..ProfileUpdate::default()
    };
    session.update_profile(&update).await?;

    let snapshot = session.snapshot();
    assert_eq!(
        snapshot.user.map(|user| user.email),
        Some("new@example.com".to_string())
    );
    Ok(())
}

#[tokio::test]
async fn password_change_acknowledges_without_touching_the_user() -> Result<()> {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind localhost");
        return Ok(());
    }
    let server = MockServer::start().await;
    mount_csrf(&server).await;
    mount_login(&server).await;

    Mock::given(method("POST"))
        .and(path("/api/users/change-password/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "success": true, "message": "changed" })),
        )
        .mount(&server)
        .await;

    let (session, _gateway, _events) = test_session(&server.uri())?;
    session.login(&login_request()).await?;

    let request = ChangePasswordRequest {
        old_password: "secret".to_string(),
        new_password: "stronger".to_string(),
        new_password_confirm: "stronger".to_string(),
    };
    let ack = session.change_password(&request).await?;
    assert!(ack.success);

    let snapshot = session.snapshot();
    assert!(snapshot.authenticated);
    assert_eq!(snapshot.user.map(|user| user.username), Some("alice".to_string()));
    Ok(())
}

#[tokio::test]
async fn availability_checks_fail_closed() -> Result<()> {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind localhost");
        return Ok(());
    }
    let server = MockServer::start().await;
    mount_csrf(&server).await;

    Mock::given(method("POST"))
        .and(path("/api/users/check-username/"))
        .and(body_json(json!({ "username": "bob" })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "success": true, "available": true })),
        )
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/users/check-username/"))
        .and(body_json(json!({ "username": "alice" })))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({ "message": "boom" })))
        .mount(&server)
        .await;

    let (session, _gateway, _events) = test_session(&server.uri())?;
    assert!(session.check_username("bob").await);
    // A server failure answers "unavailable" rather than raising.
    assert!(!session.check_username("alice").await);
    Ok(())
}
