//! HTTP request executor for the feed API
//!
//! This module provides the shared client that:
//! - Owns the pooled HTTP connections
//! - Stamps every request with the configured authentication
//! - Retries transport failures, 5xx and 429 responses with linear backoff
//! - Decodes JSON responses and classifies API errors

use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::{Method, Response, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, info_span, warn, Instrument, Span};
use url::Url;

use crate::auth::{AuthConfig, AuthType};
use crate::error::{AttemptError, ClientError, Result};
use crate::models::ErrorResponse;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_MAX_IDLE_CONNS: usize = 100;
pub const DEFAULT_IDLE_CONN_TIMEOUT: Duration = Duration::from_secs(90);
pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_RETRY_WAIT_TIME: Duration = Duration::from_secs(1);

/// Response bodies beyond this size are truncated
pub const MAX_RESPONSE_BODY_BYTES: usize = 1024 * 1024;

const COMPONENT: &str = "gyoka-editor-client";

/// Construction-time settings for [`Client`]
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Per-attempt request timeout
    pub timeout: Duration,
    /// Idle connections kept per host
    pub max_idle_conns: usize,
    /// How long an idle connection stays pooled
    pub idle_conn_timeout: Duration,
    /// Total delivery attempts per call, including the first
    pub max_retries: u32,
    /// Base wait between attempts; attempt `n` waits `n * retry_wait_time`
    pub retry_wait_time: Duration,
    pub auth: AuthConfig,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            max_idle_conns: DEFAULT_MAX_IDLE_CONNS,
            idle_conn_timeout: DEFAULT_IDLE_CONN_TIMEOUT,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_wait_time: DEFAULT_RETRY_WAIT_TIME,
            auth: AuthConfig::None,
        }
    }
}

impl ClientOptions {
    /// Set the auth mode if none is configured yet.
    ///
    /// The first auth mode wins: once set, later calls are ignored and
    /// return `false`.
    pub fn set_auth(&mut self, auth: AuthConfig) -> bool {
        if !self.auth.is_none() {
            return false;
        }
        self.auth = auth;
        true
    }
}

/// Request ready to be sent, kept so each attempt can rebuild it
struct PreparedRequest {
    method: Method,
    url: Url,
    headers: HeaderMap,
    body: Option<Vec<u8>>,
}

impl PreparedRequest {
    fn build(&self, http: &reqwest::Client) -> Result<reqwest::Request> {
        let mut builder = http
            .request(self.method.clone(), self.url.clone())
            .headers(self.headers.clone());
        if let Some(body) = &self.body {
            builder = builder.body(body.clone());
        }
        builder.build().map_err(ClientError::Build)
    }
}

/// Client for the feed API
///
/// Cloning is cheap and clones share the connection pool.
#[derive(Clone)]
pub struct Client {
    pub(crate) inner: Arc<ClientInner>,
}

pub(crate) struct ClientInner {
    base: String,
    pub(crate) base_url: Url,
    http: RwLock<Option<reqwest::Client>>,
    pub(crate) options: ClientOptions,
    span: Span,
}

impl Client {
    /// Create a client with default options
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_options(base_url, ClientOptions::default())
    }

    pub fn builder(base_url: impl Into<String>) -> ClientBuilder {
        ClientBuilder::new(base_url)
    }

    pub fn with_options(base_url: &str, options: ClientOptions) -> Result<Self> {
        let base = base_url.trim_end_matches('/').to_string();
        let parsed = Url::parse(&base)?;

        info!(
            base_url = %base,
            auth_type = %options.auth.auth_type(),
            "Creating new client"
        );

        let http = reqwest::Client::builder()
            .timeout(options.timeout)
            .pool_max_idle_per_host(options.max_idle_conns)
            .pool_idle_timeout(options.idle_conn_timeout)
            .build()
            .map_err(ClientError::Build)?;

        let span = info_span!("gyoka_client", component = COMPONENT, base_url = %base);

        Ok(Self {
            inner: Arc::new(ClientInner {
                base,
                base_url: parsed,
                http: RwLock::new(Some(http)),
                options,
                span,
            }),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.inner.base
    }

    pub fn options(&self) -> &ClientOptions {
        &self.inner.options
    }

    pub fn auth_type(&self) -> AuthType {
        self.inner.options.auth.auth_type()
    }

    /// Release pooled idle connections.
    ///
    /// In-flight calls keep their own handle and complete normally. Calls
    /// made afterwards fail with [`ClientError::Closed`].
    pub async fn close(&self) {
        let mut http = self.inner.http.write().await;
        if http.take().is_some() {
            info!(base_url = %self.inner.base, "Client closed, idle connections released");
        }
    }

    pub async fn is_closed(&self) -> bool {
        self.inner.http.read().await.is_none()
    }

    async fn http(&self) -> Result<reqwest::Client> {
        self.inner.http.read().await.clone().ok_or(ClientError::Closed)
    }

    /// Resolve `path` (which may carry its own query) against the base URL
    /// and append `query` pairs, percent-encoded.
    pub(crate) fn endpoint(&self, path: &str, query: &[(&str, String)]) -> Result<Url> {
        let mut url = Url::parse(&format!("{}{}", self.inner.base, path))?;
        if !query.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(query.iter().map(|(k, v)| (*k, v.as_str())));
        }
        Ok(url)
    }

    /// Send a JSON request to `path` and decode a 200 response into `T`
    pub async fn request_with_response<B, T>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        cancel: &CancellationToken,
    ) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.endpoint(path, &[])?;
        self.execute(method, url, body, cancel).await
    }

    pub(crate) async fn execute<B, T>(
        &self,
        method: Method,
        url: Url,
        body: Option<&B>,
        cancel: &CancellationToken,
    ) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.execute_inner(method, url, body, cancel)
            .instrument(self.inner.span.clone())
            .await
    }

    async fn execute_inner<B, T>(
        &self,
        method: Method,
        url: Url,
        body: Option<&B>,
        cancel: &CancellationToken,
    ) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let payload = body
            .map(serde_json::to_vec)
            .transpose()
            .map_err(ClientError::Encode)?;

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        self.inner.options.auth.apply(&mut headers);

        let path = url.path().to_string();
        let prepared = PreparedRequest {
            method: method.clone(),
            url,
            headers,
            body: payload,
        };

        debug!(%method, %path, "Sending request");

        let response = match self.send_with_retry(&prepared, cancel).await {
            Ok(response) => response,
            Err(e) => {
                error!(%method, %path, error = %e, "Request failed");
                return Err(e);
            }
        };

        let status = response.status();
        let bytes = match read_body_limited(response, MAX_RESPONSE_BODY_BYTES).await {
            Ok(bytes) => bytes,
            Err(e) => {
                error!(%method, %path, %status, error = %e, "Failed to read response body");
                return Err(e);
            }
        };

        if status != StatusCode::OK {
            let err = classify_error(status, &bytes);
            error!(%method, %path, %status, error = %err, "Request failed");
            return Err(err);
        }

        let value = match serde_json::from_slice(&bytes) {
            Ok(value) => value,
            Err(e) => {
                let err = ClientError::Decode(e);
                error!(%method, %path, %status, error = %err, "Failed to decode response");
                return Err(err);
            }
        };

        debug!(%method, %path, %status, "Request successful");

        Ok(value)
    }

    /// Issue a bare GET against the root of the base URL's host, returning
    /// the status and the (size limited) body
    pub(crate) async fn get_root(&self, cancel: &CancellationToken) -> Result<(StatusCode, Vec<u8>)> {
        let url = self.inner.base_url.join("/")?;

        let mut headers = HeaderMap::new();
        self.inner.options.auth.apply(&mut headers);

        let prepared = PreparedRequest {
            method: Method::GET,
            url,
            headers,
            body: None,
        };

        let response = self
            .send_with_retry(&prepared, cancel)
            .instrument(self.inner.span.clone())
            .await?;
        let status = response.status();
        let body = read_body_limited(response, MAX_RESPONSE_BODY_BYTES).await?;
        Ok((status, body))
    }

    /// Deliver the request, retrying transport errors, 5xx and 429.
    ///
    /// Any other response is returned as-is for the caller to classify.
    async fn send_with_retry(
        &self,
        prepared: &PreparedRequest,
        cancel: &CancellationToken,
    ) -> Result<Response> {
        let http = self.http().await?;
        let max_attempts = self.inner.options.max_retries.max(1);
        let mut attempt: u32 = 0;

        loop {
            let request = prepared.build(&http)?;

            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(ClientError::Cancelled),
                result = http.execute(request) => result,
            };

            let attempt_error = match result {
                Ok(response) if is_retryable_status(response.status()) => {
                    AttemptError::ServerStatus(response.status())
                }
                Ok(response) => return Ok(response),
                Err(e) => AttemptError::Transport(e),
            };

            attempt += 1;
            if attempt >= max_attempts {
                return Err(ClientError::MaxRetriesExceeded(attempt_error));
            }

            let wait = self.inner.options.retry_wait_time * attempt;
            warn!(
                attempt = attempt + 1,
                url = %prepared.url,
                wait_ms = wait.as_millis() as u64,
                error = %attempt_error,
                "Retrying request"
            );

            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(ClientError::Cancelled),
                _ = tokio::time::sleep(wait) => {}
            }
        }
    }
}

fn is_retryable_status(status: StatusCode) -> bool {
    status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS
}

fn classify_error(status: StatusCode, body: &[u8]) -> ClientError {
    match serde_json::from_slice::<ErrorResponse>(body) {
        Ok(payload) => ClientError::Api {
            status,
            message: payload.message,
            error: payload.error,
        },
        Err(_) => ClientError::UnexpectedStatus {
            status,
            body: String::from_utf8_lossy(body).into_owned(),
        },
    }
}

/// Read at most `limit` bytes of the body, discarding the rest
async fn read_body_limited(mut response: Response, limit: usize) -> Result<Vec<u8>> {
    let mut body = Vec::new();
    while let Some(chunk) = response.chunk().await.map_err(ClientError::ReadBody)? {
        let remaining = limit - body.len();
        if chunk.len() >= remaining {
            body.extend_from_slice(&chunk[..remaining]);
            break;
        }
        body.extend_from_slice(&chunk);
    }
    Ok(body)
}

/// Builder for [`Client`]
pub struct ClientBuilder {
    base_url: String,
    options: ClientOptions,
}

impl ClientBuilder {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            options: ClientOptions::default(),
        }
    }

    /// Replace every option. An auth mode set earlier on this builder is
    /// kept over `options.auth`.
    pub fn options(mut self, options: ClientOptions) -> Self {
        let previous = std::mem::take(&mut self.options.auth);
        self.options = options;
        if !previous.is_none() {
            self.options.auth = previous;
        }
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.options.timeout = timeout;
        self
    }

    pub fn max_idle_conns(mut self, max: usize) -> Self {
        self.options.max_idle_conns = max;
        self
    }

    pub fn idle_conn_timeout(mut self, timeout: Duration) -> Self {
        self.options.idle_conn_timeout = timeout;
        self
    }

    pub fn max_retries(mut self, retries: u32) -> Self {
        self.options.max_retries = retries;
        self
    }

    pub fn retry_wait_time(mut self, wait: Duration) -> Self {
        self.options.retry_wait_time = wait;
        self
    }

    /// Use bearer token auth. Ignored if an auth mode is already set.
    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.options.set_auth(AuthConfig::BearerToken {
            token: token.into(),
        });
        self
    }

    /// Use Cloudflare Access service token auth. Ignored if an auth mode is
    /// already set.
    pub fn cloudflare_access(
        mut self,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        self.options.set_auth(AuthConfig::CloudflareAccess {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        });
        self
    }

    /// Use HTTP basic auth. Ignored if an auth mode is already set.
    pub fn basic_auth(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.options.set_auth(AuthConfig::BasicAuth {
            username: username.into(),
            password: password.into(),
        });
        self
    }

    /// Use the given auth mode. Ignored if an auth mode is already set.
    pub fn auth(mut self, auth: AuthConfig) -> Self {
        self.options.set_auth(auth);
        self
    }

    pub fn build(self) -> Result<Client> {
        Client::with_options(&self.base_url, self.options)
    }
}
