//! # bulkline-http
//!
//! HTTP plumbing shared by the bulkline crates.
//!
//! This crate provides:
//! - A `reqwest`-backed client with timeouts, compression and an optional proxy
//! - A request builder that carries the bearer token and body kind
//! - A response wrapper that turns non-2xx replies into typed errors
//!   carrying the remote status code
//! - [`ApiClient`], which binds an instance URL, access token and API
//!   version to the HTTP client and builds Bulk API 2.0 URLs
//!
//! Nothing in this crate retries. A failed call is returned to the caller
//! as-is; retry policy belongs to whoever issued the call.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    bulkline-jobs                            │
//! │  (job lifecycle, polling, result artifacts)                 │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      ApiClient                              │
//! │  - Holds instance URL, token, API version                   │
//! │  - Builds /services/data/vXX.X/jobs/... URLs                │
//! │  - Typed JSON helpers (get_json, post_json, patch_json)     │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      HttpClient                             │
//! │  - One request, one response                                │
//! │  - Proxy, compression, timeouts                             │
//! │  - Status-code error mapping                                │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use bulkline_http::ApiClient;
//!
//! let client = ApiClient::new("https://myorg.my.salesforce.com", "token")?;
//! let jobs: serde_json::Value = client.get_json(&client.jobs_url("ingest")).await?;
//! ```

mod api_client;
mod client;
mod config;
mod error;
mod request;
mod response;

pub use api_client::ApiClient;
pub use client::HttpClient;
pub use config::{ClientConfig, ClientConfigBuilder, CompressionConfig, ProxyConfig};
pub use error::{Error, ErrorKind, Result};
pub use request::{RequestBody, RequestBuilder, RequestMethod};
pub use response::{Response, ResponseExt};

/// Default Salesforce API version.
pub const DEFAULT_API_VERSION: &str = "62.0";

/// User-Agent string for the client.
pub const USER_AGENT: &str = concat!("bulkline/", env!("CARGO_PKG_VERSION"));

/// Percent-encode a value for use as a single URL path segment.
///
/// Job ids are opaque server values; they are encoded before being placed
/// in a path so a malformed id can never address a different resource.
pub fn encode_path_segment(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}
