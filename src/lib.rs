//! # bulkline
//!
//! Salesforce Bulk API 2.0 job lifecycle client.
//!
//! ## Security
//!
//! - Access tokens and proxy passwords are redacted in Debug output
//! - Tracing spans skip credentials and upload payloads
//! - Server error messages are scrubbed of token-like strings
//!
//! ## Crates
//!
//! - **bulkline-http** - HTTP plumbing: timeouts, compression, proxy, typed status errors
//! - **bulkline-auth** - Credentials: static or from the environment
//! - **bulkline-jobs** - Job lifecycle: create, upload, close, poll, results, abort, delete, list
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use bulkline::{BulkClient, CreateQueryJobRequest};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // SF_INSTANCE_URL / SF_ACCESS_TOKEN from the environment
//!     let client = BulkClient::builder().build()?;
//!
//!     let outcome = client
//!         .run_query(CreateQueryJobRequest::new("SELECT Id, Name FROM Account"))
//!         .await?;
//!
//!     if let Some(csv) = outcome.csv {
//!         print!("{csv}");
//!     }
//!     Ok(())
//! }
//! ```

#[cfg(feature = "auth")]
pub use bulkline_auth as auth;
#[cfg(feature = "http")]
pub use bulkline_http as http;
#[cfg(feature = "jobs")]
pub use bulkline_jobs as jobs;

#[cfg(feature = "auth")]
pub use bulkline_auth::{CredentialSource, Credentials, SalesforceCredentials};
#[cfg(feature = "http")]
pub use bulkline_http::{ClientConfig, ProxyConfig};
#[cfg(feature = "jobs")]
pub use bulkline_jobs::{
    BulkClient, BulkClientBuilder, BulkOperation, CreateIngestJobRequest, CreateQueryJobRequest,
    IngestJob, JobEvent, JobState, PollConfig, QueryJob, ResultSet,
};
