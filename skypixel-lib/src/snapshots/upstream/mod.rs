mod client;
mod error;

pub use client::{
    DEFAULT_API_BASE_URL, DEFAULT_MAX_CONCURRENT_REQUESTS, DEFAULT_REQUEST_TIMEOUT, DEFAULT_WEB_BASE_URL, Endpoints, RateLimitInfo,
    USER_AGENT, UpstreamClient,
};
pub use error::UpstreamError;
