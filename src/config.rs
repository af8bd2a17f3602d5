//! Base-address configuration. The embedder supplies the origin it is served
//! from and may replace it at any time; endpoint URLs are resolved from the
//! current origin on every request, never cached at startup.

use crate::error::Error;
use std::sync::{PoisonError, RwLock};
use tracing::debug;
use url::Url;

/// Path prefix the platform API is mounted under.
const API_PREFIX: &str = "/api";

#[derive(Debug)]
pub struct ApiConfig {
    origin: RwLock<String>,
}

impl ApiConfig {
    #[must_use]
    pub fn new(origin: impl Into<String>) -> Self {
        Self {
            origin: RwLock::new(origin.into()),
        }
    }

    /// Replaces the origin for all subsequent requests.
    pub fn set_origin(&self, origin: impl Into<String>) {
        let mut slot = self.origin.write().unwrap_or_else(PoisonError::into_inner);
        *slot = origin.into();
    }

    #[must_use]
    pub fn origin(&self) -> String {
        self.origin
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Resolves a full endpoint URL for an API path such as `/users/login/`.
    ///
    /// # Errors
    /// Returns an error if the current origin cannot be parsed, has no host,
    /// or uses an unsupported scheme.
    pub fn endpoint(&self, path: &str) -> Result<String, Error> {
        let origin = self.origin();
        let url = Url::parse(origin.trim()).map_err(|err| Error::BaseUrl(err.to_string()))?;

        let scheme = url.scheme();
        let host = url
            .host()
            .ok_or_else(|| Error::BaseUrl(format!("no host in origin {origin}")))?
            .to_owned();
        let port = match url.port() {
            Some(port) => port,
            None => match scheme {
                "http" => 80,
                "https" => 443,
                _ => return Err(Error::BaseUrl(format!("unsupported scheme {scheme}"))),
            },
        };

        let path = path.trim();
        let endpoint = format!(
            "{scheme}://{host}:{port}{API_PREFIX}/{}",
            path.trim_start_matches('/')
        );

        debug!("endpoint URL: {}", endpoint);

        Ok(endpoint)
    }
}
