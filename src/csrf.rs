//! CSRF handshake: guarantee the anti-forgery cookie exists before any
//! state-changing request goes out. The cookie is server-managed; this layer
//! only reads it and fetches it when absent. Duplicate handshakes from
//! concurrent callers are tolerated, the endpoint is idempotent.

use crate::error::Error;
use crate::gateway::Gateway;
use reqwest::Method;
use reqwest::cookie::CookieStore;
use secrecy::ExposeSecret;
use tracing::{Instrument, debug, info_span};
use url::Url;

/// Cookie name the server issues the anti-forgery token under.
pub const CSRF_COOKIE: &str = "csrftoken";
/// Endpoint whose only meaningful effect is setting the cookie.
const CSRF_PATH: &str = "/users/csrf/";

/// Whether a verb needs the CSRF token. Only the four side-effect-free verbs
/// are exempt.
#[must_use]
pub fn requires_token(method: &Method) -> bool {
    !matches!(
        *method,
        Method::GET | Method::HEAD | Method::OPTIONS | Method::TRACE
    )
}

/// Ensures a CSRF cookie is present when this returns successfully. Present
/// already is the common case and makes no network call; otherwise one
/// dedicated GET asks the server to set it. Failures propagate unmodified,
/// no retry, no suppression.
///
/// # Errors
/// Returns the handshake failure; the caller's domain request never starts.
pub async fn ensure_token(gateway: &Gateway) -> Result<(), Error> {
    if cookie_token(gateway).is_some() {
        return Ok(());
    }

    let url = gateway.config().endpoint(CSRF_PATH)?;
    let span = info_span!(
        "csrf.handshake",
        http.method = "GET",
        url = %url
    );

    let mut builder = gateway.http().get(&url);
    if let Some(token) = gateway.credentials().token() {
        builder = builder.bearer_auth(token.expose_secret());
    }

    let response = match builder.send().instrument(span).await {
        Ok(response) => response,
        Err(err) => return Err(gateway.transport_failure(err)),
    };

    if response.status().is_success() {
        debug!("csrf cookie obtained");
        Ok(())
    } else {
        Err(gateway.api_failure(response).await)
    }
}

/// Reads the CSRF token from the cookie jar, if the server has issued one.
#[must_use]
pub fn cookie_token(gateway: &Gateway) -> Option<String> {
    let endpoint = gateway.config().endpoint("/").ok()?;
    let url = Url::parse(&endpoint).ok()?;
    let header = gateway.cookie_jar().cookies(&url)?;
    let cookies = header.to_str().ok()?;
    cookie_value(cookies, CSRF_COOKIE)
}

fn cookie_value(cookies: &str, name: &str) -> Option<String> {
    cookies.split(';').find_map(|pair| {
        let (key, value) = pair.trim().split_once('=')?;
        (key == name).then(|| value.to_string())
    })
}
