use chrono::{DateTime, Utc};
use core::time::Duration;
use thiserror::Error;

/// Longest response body kept inside an [`UpstreamError::Http`].
const MAX_BODY_IN_ERROR: usize = 512;

/// Failure of a single request against the code-hosting platform.
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// The upstream answered with a non-success status other than 404.
    #[error("upstream returned HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// The request exceeded its deadline and was cancelled.
    #[error("request to '{url}' timed out after {}ms", .timeout.as_millis())]
    Timeout { url: String, timeout: Duration },

    /// The connection failed before a complete response was received.
    #[error("request to '{url}' failed: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The payload could not be interpreted.
    #[error("could not parse response from '{url}': {reason}")]
    Parse { url: String, reason: String },

    /// The resource does not exist. This is a valid negative answer, not a fault.
    #[error("'{url}' was not found")]
    NotFound { url: String },

    /// An earlier response exhausted the quota; no request was sent.
    #[error("rate limited until {reset_at}")]
    RateLimited { reset_at: DateTime<Utc> },
}

impl UpstreamError {
    pub(crate) fn http(status: u16, body: &str) -> Self {
        let mut body: String = body.trim().chars().take(MAX_BODY_IN_ERROR).collect();
        if body.is_empty() {
            body.push_str("<empty body>");
        }
        Self::Http { status, body }
    }

    /// HTTP status carried by this error, if it came from a response.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            Self::NotFound { .. } => Some(404),
            _ => None,
        }
    }

    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// Permission or quota refusal (HTTP 403, or a request skipped because the quota is exhausted).
    #[must_use]
    pub const fn is_forbidden(&self) -> bool {
        matches!(self, Self::Http { status: 403, .. } | Self::RateLimited { .. })
    }
}
