//! Cached upstream fetcher.
//!
//! [`TmdbClient::fetch`] is the single path every catalog call goes through:
//! compute the fingerprint, serve a fresh cached payload if there is one,
//! otherwise issue one authenticated GET and cache the decoded body only when
//! the upstream answered 200.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{self, HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::error::ApiError;
use super::query::{Fingerprint, QueryParams};
use crate::cache::Cache;

pub const DEFAULT_BASE_URL: &str = "https://api.themoviedb.org/3";

/// Per-request deadline for upstream calls.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

pub struct TmdbClientBuilder {
    token: String,
    base_url: String,
    timeout: Duration,
    cache: Option<Arc<Cache>>,
}

impl TmdbClientBuilder {
    /// Points the client at another host, e.g. a local fake in tests.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Shares an existing cache instead of creating a fresh one.
    pub fn cache(mut self, cache: Arc<Cache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn build(self) -> Result<TmdbClient, ApiError> {
        if self.token.trim().is_empty() {
            return Err(ApiError::MissingToken);
        }

        let mut auth = HeaderValue::from_str(&format!("Bearer {}", self.token))
            .map_err(|_| ApiError::InvalidToken)?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, auth);
        headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(self.timeout)
            .build()
            .map_err(ApiError::Client)?;

        Ok(TmdbClient {
            http,
            base_url: self.base_url.trim_end_matches('/').to_owned(),
            cache: self.cache.unwrap_or_default(),
        })
    }
}

/// Authenticated, caching client for the upstream catalog API.
///
/// Cheap to clone; clones share the HTTP connection pool and the cache.
#[derive(Clone)]
pub struct TmdbClient {
    http: reqwest::Client,
    base_url: String,
    cache: Arc<Cache>,
}

impl fmt::Debug for TmdbClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TmdbClient")
            .field("base_url", &self.base_url)
            .field("cached", &self.cache.len())
            .finish_non_exhaustive()
    }
}

impl TmdbClient {
    /// Starts a builder for a client authenticating with the bearer `token`.
    pub fn builder(token: impl Into<String>) -> TmdbClientBuilder {
        TmdbClientBuilder {
            token: token.into(),
            base_url: DEFAULT_BASE_URL.to_owned(),
            timeout: DEFAULT_TIMEOUT,
            cache: None,
        }
    }

    /// Client with default base URL, timeout and a private cache.
    pub fn new(token: impl Into<String>) -> Result<Self, ApiError> {
        Self::builder(token).build()
    }

    /// The cache shared by this client and its clones.
    pub fn cache(&self) -> &Arc<Cache> {
        &self.cache
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns the JSON payload for `endpoint` with `params`, from cache when fresh.
    ///
    /// Failures are never cached: a non-200 answer, a transport error or an
    /// undecodable body leaves the cache untouched, so the next call retries.
    pub async fn fetch(&self, endpoint: &str, params: &QueryParams) -> Result<Value, ApiError> {
        let key = Fingerprint::new(endpoint, params);
        if let Some(hit) = self.cache.get(key.as_str()) {
            tracing::debug!(key = %key, "cache hit");
            return Ok(hit);
        }
        self.fetch_upstream(endpoint, params, key).await
    }

    /// [`fetch`](Self::fetch), then decode into `T`.
    ///
    /// A cached payload that no longer decodes is dropped and fetched again
    /// once; a fresh payload that fails to decode is reported as
    /// [`ApiError::Decode`].
    pub async fn fetch_as<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &QueryParams,
    ) -> Result<T, ApiError> {
        let key = Fingerprint::new(endpoint, params);

        if let Some(hit) = self.cache.get(key.as_str()) {
            match serde_json::from_value(hit) {
                Ok(typed) => return Ok(typed),
                Err(err) => {
                    tracing::warn!(key = %key, error = %err, "cached payload did not decode, refetching");
                    self.cache.remove(key.as_str());
                }
            }
        }

        let payload = self.fetch_upstream(endpoint, params, key).await?;
        serde_json::from_value(payload).map_err(|source| ApiError::Decode {
            endpoint: endpoint.to_owned(),
            source,
        })
    }

    async fn fetch_upstream(
        &self,
        endpoint: &str,
        params: &QueryParams,
        key: Fingerprint,
    ) -> Result<Value, ApiError> {
        let url = if params.is_empty() {
            format!("{}{endpoint}", self.base_url)
        } else {
            format!("{}{endpoint}?{}", self.base_url, params.encode())
        };

        tracing::debug!(key = %key, "cache miss, calling upstream");
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|err| ApiError::from_transport(endpoint, err))?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            tracing::warn!(endpoint, status = status.as_u16(), "upstream returned non-200");
            return Err(ApiError::Status {
                endpoint: endpoint.to_owned(),
                status,
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|err| ApiError::from_transport(endpoint, err))?;
        let payload: Value = serde_json::from_slice(&body).map_err(|source| ApiError::Decode {
            endpoint: endpoint.to_owned(),
            source,
        })?;

        self.cache.set(key.as_str(), payload.clone());
        Ok(payload)
    }
}
