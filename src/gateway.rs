//! The single request/response pipeline for the platform API. The request
//! stage resolves the base address per call, attaches the bearer token, and
//! runs the CSRF handshake for state-changing verbs; the response stage
//! unwraps successful bodies, classifies failures, applies their user-facing
//! effects, and always re-raises the error to the caller.

use crate::config::ApiConfig;
use crate::credentials::CredentialStore;
use crate::csrf;
use crate::error::{Error, ErrorEnvelope, FailureKind};
use crate::notify::Notifier;
use reqwest::cookie::Jar;
use reqwest::multipart::Form;
use reqwest::{Client, Method, RequestBuilder, Response};
use secrecy::ExposeSecret;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tracing::{Instrument, Span, debug, info_span, warn};

static APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);

/// Bundle downloads carry large artifacts and get their own longer timeout.
const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(120);

/// Header carrying the CSRF token on state-changing requests.
pub const CSRF_HEADER: &str = "X-CSRFToken";

const SESSION_EXPIRED: &str = "Session expired, please sign in again";
const FORBIDDEN: &str = "You do not have permission for this action";
const NOT_FOUND: &str = "The requested resource does not exist";
const SERVER_ERROR: &str = "Server error, please try again later";
const NETWORK_ERROR: &str = "Network error, please check your connection";
const REQUEST_FAILED: &str = "Request failed";

pub struct Gateway {
    http: Client,
    cookies: Arc<Jar>,
    config: Arc<ApiConfig>,
    credentials: Arc<CredentialStore>,
    notifier: Notifier,
}

impl Gateway {
    /// # Errors
    /// Returns an error if the underlying HTTP client cannot be constructed.
    pub fn new(
        config: Arc<ApiConfig>,
        credentials: Arc<CredentialStore>,
        notifier: Notifier,
    ) -> Result<Self, Error> {
        let cookies = Arc::new(Jar::default());
        let http = Client::builder()
            .user_agent(APP_USER_AGENT)
            .cookie_provider(Arc::clone(&cookies))
            .build()?;

        Ok(Self {
            http,
            cookies,
            config,
            credentials,
            notifier,
        })
    }

    /// Cookie jar shared with the HTTP client. The CSRF cookie lives here;
    /// the server manages it, this layer only reads it.
    #[must_use]
    pub fn cookie_jar(&self) -> &Arc<Jar> {
        &self.cookies
    }

    #[must_use]
    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    #[must_use]
    pub fn credentials(&self) -> &CredentialStore {
        &self.credentials
    }

    pub(crate) fn http(&self) -> &Client {
        &self.http
    }

    /// # Errors
    /// Returns the classified failure after its side effects ran.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, Error> {
        let (builder, span) = self.prepare(Method::GET, path).await?;
        self.execute(builder, span).await
    }

    /// # Errors
    /// Returns the classified failure after its side effects ran.
    pub async fn get_query<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, Error> {
        let (builder, span) = self.prepare(Method::GET, path).await?;
        self.execute(builder.query(query), span).await
    }

    /// # Errors
    /// Returns the classified failure after its side effects ran.
    pub async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, Error> {
        let (builder, span) = self.prepare(Method::POST, path).await?;
        self.execute(builder.json(body), span).await
    }

    /// # Errors
    /// Returns the classified failure after its side effects ran.
    pub async fn put<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, Error> {
        let (builder, span) = self.prepare(Method::PUT, path).await?;
        self.execute(builder.json(body), span).await
    }

    /// # Errors
    /// Returns the classified failure after its side effects ran.
    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, Error> {
        let (builder, span) = self.prepare(Method::DELETE, path).await?;
        self.execute(builder, span).await
    }

    /// # Errors
    /// Returns the classified failure after its side effects ran.
    pub async fn post_multipart<T: DeserializeOwned>(
        &self,
        path: &str,
        form: Form,
    ) -> Result<T, Error> {
        let (builder, span) = self.prepare(Method::POST, path).await?;
        self.execute(builder.multipart(form), span).await
    }

    /// Downloads a binary artifact through a bare client: no cookie jar, no
    /// bearer header, and an extended timeout for large bundles. The bundle
    /// endpoint serves published artifacts and takes no credentials.
    ///
    /// # Errors
    /// Returns the classified failure after its side effects ran.
    pub async fn download(&self, path: &str) -> Result<Vec<u8>, Error> {
        let url = self.config.endpoint(path)?;
        let client = Client::builder()
            .user_agent(APP_USER_AGENT)
            .timeout(DOWNLOAD_TIMEOUT)
            .build()?;

        let span = request_span(&Method::GET, &url);
        let response = match client.get(&url).send().instrument(span).await {
            Ok(response) => response,
            Err(err) => return Err(self.transport_failure(err)),
        };

        if response.status().is_success() {
            Ok(response.bytes().await?.to_vec())
        } else {
            Err(self.api_failure(response).await)
        }
    }

    /// Request stage: base address, CSRF handshake for state-changing verbs,
    /// bearer token, CSRF header when a token is present.
    async fn prepare(&self, method: Method, path: &str) -> Result<(RequestBuilder, Span), Error> {
        let url = self.config.endpoint(path)?;
        let needs_csrf = csrf::requires_token(&method);
        if needs_csrf {
            csrf::ensure_token(self).await?;
        }

        let span = request_span(&method, &url);
        let mut builder = self.http.request(method, &url);
        if let Some(token) = self.credentials.token() {
            builder = builder.bearer_auth(token.expose_secret());
        }
        if needs_csrf {
            if let Some(token) = csrf::cookie_token(self) {
                builder = builder.header(CSRF_HEADER, token);
            }
        }

        Ok((builder, span))
    }

    /// Response stage: unwrap the payload on success, otherwise classify,
    /// apply effects, and re-raise.
    async fn execute<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
        span: Span,
    ) -> Result<T, Error> {
        let response = match builder.send().instrument(span).await {
            Ok(response) => response,
            Err(err) => return Err(self.transport_failure(err)),
        };

        if response.status().is_success() {
            Ok(response.json::<T>().await?)
        } else {
            Err(self.api_failure(response).await)
        }
    }

    pub(crate) fn transport_failure(&self, err: reqwest::Error) -> Error {
        warn!("request failed without response: {}", err);
        self.apply_effects(FailureKind::Connectivity, None);
        Error::Transport(err)
    }

    pub(crate) async fn api_failure(&self, response: Response) -> Error {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let failure = ErrorEnvelope::from_body(&body).into_failure(status);
        warn!(
            "request failed: {} ({:?})",
            status,
            failure.message.as_deref().unwrap_or("no message")
        );
        self.apply_effects(failure.kind, failure.message.as_deref());
        Error::Api(failure)
    }

    /// Effect application for a classified failure: notices for every kind,
    /// plus the clear-and-redirect for an expired session. The credential
    /// clear reports whether anything was cleared, so N concurrent 401s
    /// produce exactly one notice and one redirect.
    fn apply_effects(&self, kind: FailureKind, message: Option<&str>) {
        match kind {
            FailureKind::Unauthorized => {
                if self.credentials.clear() {
                    debug!("session expired, clearing credential");
                    self.notifier.error(SESSION_EXPIRED);
                    self.notifier.redirect_to_login();
                }
            }
            FailureKind::Forbidden => self.notifier.error(FORBIDDEN),
            FailureKind::NotFound => self.notifier.error(NOT_FOUND),
            FailureKind::Server => self.notifier.error(SERVER_ERROR),
            FailureKind::Connectivity => self.notifier.error(NETWORK_ERROR),
            FailureKind::Other => self.notifier.error(message.unwrap_or(REQUEST_FAILED)),
        }
    }
}

fn request_span(method: &Method, url: &str) -> Span {
    info_span!(
        "api.request",
        http.method = %method,
        url = %url
    )
}
