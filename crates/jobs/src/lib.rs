//! # bulkline-jobs
//!
//! Salesforce Bulk API 2.0 job lifecycle client.
//!
//! A job moves through these states, driven by the server:
//!
//! ```text
//! create ──▶ Open ──upload──▶ Open ──close──▶ UploadComplete ──▶ InProgress
//!                                                                    │
//!                                       JobComplete | Failed ◀───────┘
//! abort (from Open or UploadComplete) ──▶ Aborted
//! delete (from any state) ──▶ gone: later gets fail with 404
//! ```
//!
//! The client keeps no job state of its own. Each operation is one
//! request and returns the server's view at that moment, or a typed
//! [`Error`] carrying the remote status code. Nothing is retried.
//!
//! ## Example
//!
//! ```rust,ignore
//! use bulkline_jobs::{BulkClient, BulkOperation, CreateIngestJobRequest};
//!
//! let client = BulkClient::builder().build()?; // credentials from SF_* env vars
//!
//! let outcome = client
//!     .run_ingest(
//!         CreateIngestJobRequest::new("Contact", BulkOperation::Insert),
//!         "FirstName,LastName\nAda,Lovelace\n",
//!     )
//!     .await?;
//!
//! println!(
//!     "{}: {} ok, {} failed",
//!     outcome.job.state,
//!     outcome.successful_count(),
//!     outcome.failed_count()
//! );
//! ```

mod builder;
mod client;
mod error;
mod poll;
mod results;
mod types;
mod watch;

pub use builder::BulkClientBuilder;
pub use client::BulkClient;
pub use error::{Error, ErrorKind, Result};
pub use poll::{PollConfig, DEFAULT_POLL_INTERVAL};
pub use results::{IngestOutcome, QueryOutcome, QueryResultsPage, ResultSet, ResultStream};
pub use types::{
    parse_timestamp, BulkOperation, ColumnDelimiter, ContentType, CreateIngestJobRequest,
    CreateQueryJobRequest, IngestJob, JobKind, JobList, JobSnapshot, JobState, LineEnding,
    QueryJob,
};
pub use watch::{JobEvent, JobWatch};
