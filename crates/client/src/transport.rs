//! HTTP transport for the OA backend.
//!
//! Every request goes through [`ApiClient::request`] (URL, bearer token,
//! request id) and [`ApiClient::execute`] (status handling, envelope
//! normalization, DTO decoding).

use std::sync::Arc;

use reqwest::header::{HeaderValue, AUTHORIZATION};
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::cache::QueryCache;
use crate::config::ClientConfig;
use crate::envelope::{decode, Envelope};
use crate::error::{truncate_body, ApiError, ApiResult};
use crate::session::SessionStore;

/// Header carrying a per-request correlation id.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Typed client for the OA REST backend.
///
/// Entity operations are implemented on this type in the [`crate::api`]
/// modules.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    session: Arc<SessionStore>,
    cache: QueryCache,
}

impl ApiClient {
    /// Create a client for the configured backend.
    pub fn new(config: &ClientConfig, session: Arc<SessionStore>) -> ApiResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()?;
        Ok(Self::with_client(
            http,
            config.api_base_url.clone(),
            session,
            QueryCache::new(config.cache_ttl()),
        ))
    }

    /// Create a client reusing an existing [`reqwest::Client`].
    pub fn with_client(
        http: reqwest::Client,
        base_url: String,
        session: Arc<SessionStore>,
        cache: QueryCache,
    ) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            session,
            cache,
        }
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Start a request to `path` with the bearer token (when signed in) and
    /// a fresh request id attached.
    pub async fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let mut builder = self
            .http
            .request(method, format!("{}{}", self.base_url, path))
            .header(REQUEST_ID_HEADER, uuid::Uuid::new_v4().to_string());

        if let Some(token) = self.session.token().await {
            match HeaderValue::from_str(&format!("Bearer {token}")) {
                Ok(value) => builder = builder.header(AUTHORIZATION, value),
                Err(_) => tracing::warn!("Session token is not a valid header value, sending unauthenticated"),
            }
        }
        builder
    }

    /// Send a request and decode its payload into `T`.
    pub async fn execute<T: DeserializeOwned>(&self, request: RequestBuilder) -> ApiResult<T> {
        let body = self.send(request).await?;
        decode(body)
    }

    /// Send a request whose payload is irrelevant, e.g. a delete.
    ///
    /// The envelope code is still checked.
    pub async fn execute_unit(&self, request: RequestBuilder) -> ApiResult<()> {
        let body = self.send(request).await?;
        Envelope::from_value(body).into_data()?;
        Ok(())
    }

    /// Send a request and return its raw JSON body.
    ///
    /// 401/403 expire the session; other non-2xx statuses become
    /// [`ApiError::Http`] with a truncated body.
    async fn send(&self, request: RequestBuilder) -> ApiResult<Value> {
        let request = request.build()?;
        let method = request.method().clone();
        let path = request.url().path().to_string();
        let request_id = request
            .headers()
            .get(REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();

        tracing::debug!(%method, %path, %request_id, "Sending API request");
        let response = self.http.execute(request).await.map_err(|e| {
            tracing::error!(%method, %path, %request_id, error = %e, "API request failed");
            e
        })?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            self.session.expire(status.as_u16()).await;
            self.cache.clear().await;
            return Err(ApiError::Unauthorized {
                status: status.as_u16(),
            });
        }

        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            tracing::warn!(%method, %path, %request_id, status = status.as_u16(), "API returned error status");
            return Err(ApiError::Http {
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }

        let bytes = response.bytes().await?;
        tracing::debug!(%method, %path, %request_id, status = status.as_u16(), len = bytes.len(), "API response received");
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_slice(&bytes)?)
    }
}
