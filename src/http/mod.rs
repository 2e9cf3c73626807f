//! HTTP module
//!
//! Provides the HTTP client and the transports sources fetch through.
//!
//! # Features
//!
//! - **Single-attempt requests**: Non-200 statuses and empty bodies fail fast
//! - **Rate Limiting**: Optional token bucket rate limiter using governor
//! - **Transports**: Live HTTP requests or fixed bodies behind one trait

mod client;
mod rate_limit;
mod transport;

pub use client::{HttpClient, HttpClientConfig, RequestConfig};
pub use rate_limit::{RateLimiter, RateLimiterConfig};
pub use transport::{HttpTransport, StaticTransport, Transport};
