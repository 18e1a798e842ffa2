//! Client for the code-hosting platform.
//!
//! Two request modes share one connection pool, one concurrency gate and one deadline:
//! structured JSON calls against the REST API, and plain HTML page fetches used as a
//! fallback and for data the API does not expose (contributors, bios, preview images).

use super::UpstreamError;
use crate::Result;
use crate::snapshots::throttler::Throttler;
use chrono::{DateTime, Utc};
use core::time::Duration;
use ohno::IntoAppError;
use reqwest::StatusCode;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;
use std::sync::Arc;

const LOG_TARGET: &str = "  upstream";

/// Identifies every request we send.
pub const USER_AGENT: &str = "skypixel-showcase";

pub const DEFAULT_API_BASE_URL: &str = "https://api.github.com";
pub const DEFAULT_WEB_BASE_URL: &str = "https://github.com";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_millis(7000);
pub const DEFAULT_MAX_CONCURRENT_REQUESTS: usize = 5;

const API_ACCEPT: &str = "application/vnd.github+json";
const HTML_ACCEPT: &str = "text/html";

/// Base URLs of the REST API and of the public web pages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub api_base_url: String,
    pub web_base_url: String,
}

impl Endpoints {
    #[must_use]
    pub fn new(api_base_url: impl Into<String>, web_base_url: impl Into<String>) -> Self {
        Self {
            api_base_url: api_base_url.into().trim_end_matches('/').to_string(),
            web_base_url: web_base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

impl Default for Endpoints {
    fn default() -> Self {
        Self::new(DEFAULT_API_BASE_URL, DEFAULT_WEB_BASE_URL)
    }
}

/// Rate limit information from response headers
#[derive(Debug, Clone, Copy)]
pub struct RateLimitInfo {
    pub remaining: usize,
    pub reset_at: DateTime<Utc>,
}

#[derive(Debug)]
pub struct UpstreamClient {
    client: reqwest::Client,
    auth: Option<HeaderValue>,
    endpoints: Endpoints,
    timeout: Duration,
    throttler: Arc<Throttler>,
}

impl UpstreamClient {
    /// Build the client.
    ///
    /// The token, when present, is only attached to API requests. Failing to build the
    /// underlying HTTP client (for example when no TLS backend can be initialized) is
    /// reported as an error; there is no degraded mode without it.
    pub fn new(token: Option<&str>, endpoints: Endpoints, timeout: Duration, max_concurrent: usize) -> Result<Self> {
        let auth = match token.map(str::trim).filter(|t| !t.is_empty()) {
            Some(t) => {
                let mut auth_val = HeaderValue::from_str(&format!("token {t}")).into_app_err("building the authorization header")?;
                auth_val.set_sensitive(true);
                Some(auth_val)
            }
            None => None,
        };

        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .into_app_err("initializing the HTTP client")?;

        Ok(Self {
            client,
            auth,
            endpoints,
            timeout,
            throttler: Throttler::new(max_concurrent),
        })
    }

    #[must_use]
    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    #[must_use]
    pub fn throttler(&self) -> &Throttler {
        &self.throttler
    }

    /// Absolute URL of a public web page.
    #[must_use]
    pub fn web_url(&self, path: &str) -> String {
        format!("{}{path}", self.endpoints.web_base_url)
    }

    /// Issue a REST API request and parse its JSON body.
    ///
    /// An empty body is parsed as `{}`.
    pub async fn fetch_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, UpstreamError> {
        let url = format!("{}{path}", self.endpoints.api_base_url);
        let mut request = self.client.get(&url).header(ACCEPT, API_ACCEPT);
        if let Some(auth) = &self.auth {
            request = request.header(AUTHORIZATION, auth.clone());
        }

        let body = self.send(request, &url).await?;
        parse_json(&url, &body)
    }

    /// Fetch a public HTML page and return its raw text.
    pub async fn fetch_html(&self, path: &str) -> Result<String, UpstreamError> {
        let url = self.web_url(path);
        let request = self.client.get(&url).header(ACCEPT, HTML_ACCEPT);
        self.send(request, &url).await
    }

    async fn send(&self, request: reqwest::RequestBuilder, url: &str) -> Result<String, UpstreamError> {
        if let Some(reset_at) = self.throttler.paused_until() {
            log::debug!(target: LOG_TARGET, "Skipping '{url}', rate limited until {reset_at}");
            return Err(UpstreamError::RateLimited { reset_at });
        }

        let _permit = self.throttler.acquire().await;
        log::debug!(target: LOG_TARGET, "GET {url}");

        let exchange = async {
            let response = request.send().await.map_err(|source| UpstreamError::Network {
                url: url.to_string(),
                source,
            })?;
            let status = response.status();
            let rate_limit = extract_rate_limit_from_headers(response.headers());
            let body = response.text().await.map_err(|source| UpstreamError::Network {
                url: url.to_string(),
                source,
            })?;
            Ok::<_, UpstreamError>((status, rate_limit, body))
        };

        // Dropping the exchange future on expiry cancels the in-progress request.
        let (status, rate_limit, body) = tokio::time::timeout(self.timeout, exchange)
            .await
            .map_err(|_elapsed| UpstreamError::Timeout {
                url: url.to_string(),
                timeout: self.timeout,
            })??;

        if status.is_success() {
            return Ok(body);
        }

        if status == StatusCode::NOT_FOUND {
            return Err(UpstreamError::NotFound { url: url.to_string() });
        }

        if matches!(status, StatusCode::FORBIDDEN | StatusCode::TOO_MANY_REQUESTS)
            && let Some(rl) = rate_limit
            && rl.remaining == 0
            && self.throttler.pause_until(rl.reset_at)
        {
            log::warn!(
                target: LOG_TARGET,
                "Upstream quota exhausted, skipping requests until {}",
                rl.reset_at.with_timezone(&chrono::Local).format("%T")
            );
        }

        Err(UpstreamError::http(status.as_u16(), &body))
    }
}

fn parse_json<T: DeserializeOwned>(url: &str, body: &str) -> Result<T, UpstreamError> {
    let text = match body.trim() {
        "" => "{}",
        text => text,
    };

    serde_json::from_str(text).map_err(|e| UpstreamError::Parse {
        url: url.to_string(),
        reason: e.to_string(),
    })
}

/// Extract rate limit information from API response headers
fn extract_rate_limit_from_headers(headers: &HeaderMap) -> Option<RateLimitInfo> {
    let remaining = headers.get("x-ratelimit-remaining")?.to_str().ok()?.parse::<usize>().ok()?;
    let reset_timestamp = headers.get("x-ratelimit-reset")?.to_str().ok()?.parse::<i64>().ok()?;
    let reset_at = DateTime::from_timestamp(reset_timestamp, 0)?;

    Some(RateLimitInfo { remaining, reset_at })
}
