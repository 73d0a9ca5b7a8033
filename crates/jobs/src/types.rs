//! Wire types for Bulk API 2.0 jobs.
//!
//! Field names follow the camelCase JSON the service speaks. Unknown
//! fields in responses are ignored so newer API versions keep parsing.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{Error, Result};

/// `apiVersion` arrives as a number (`62.0`) on some endpoints and as a
/// string on others.
fn api_version_from_wire<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Wire {
        Number(f64),
        Text(String),
    }

    Ok(Option::<Wire>::deserialize(deserializer)?.map(|wire| match wire {
        Wire::Number(n) => format!("{n:.1}"),
        Wire::Text(s) => s,
    }))
}

/// Parse a Salesforce timestamp such as `2024-03-01T17:22:05.000+0000`.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f%z")
        .or_else(|_| DateTime::parse_from_rfc3339(value))
        .ok()
        .map(|ts| ts.with_timezone(&Utc))
}

// =============================================================================
// Enumerations
// =============================================================================

/// Which resource family a job lives under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobKind {
    Ingest,
    Query,
}

impl JobKind {
    /// Path segment below `/jobs`.
    pub fn path(&self) -> &'static str {
        match self {
            JobKind::Ingest => "ingest",
            JobKind::Query => "query",
        }
    }

    /// `jobType` filter that restricts a listing to Bulk API 2.0 jobs.
    pub fn list_job_type(&self) -> &'static str {
        match self {
            JobKind::Ingest => "V2Ingest",
            JobKind::Query => "V2Query",
        }
    }
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// Job state as reported by the server.
///
/// ```text
/// Open ──close──▶ UploadComplete ──▶ InProgress ──▶ JobComplete | Failed
///   │                  │
///   └──────abort───────┴──▶ Aborted
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JobState {
    Open,
    UploadComplete,
    InProgress,
    JobComplete,
    Failed,
    Aborted,
}

impl JobState {
    /// No further transitions happen server-side once a job is here.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobState::JobComplete | JobState::Failed | JobState::Aborted
        )
    }

    pub fn is_success(&self) -> bool {
        *self == JobState::JobComplete
    }

    /// Only an open ingest job takes batch uploads.
    pub fn accepts_uploads(&self) -> bool {
        *self == JobState::Open
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            JobState::Open => "Open",
            JobState::UploadComplete => "UploadComplete",
            JobState::InProgress => "InProgress",
            JobState::JobComplete => "JobComplete",
            JobState::Failed => "Failed",
            JobState::Aborted => "Aborted",
        }
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Operation a job performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BulkOperation {
    Insert,
    Update,
    Upsert,
    Delete,
    /// Permanent delete, bypassing the recycle bin.
    HardDelete,
    Query,
    /// Query including deleted and archived records.
    QueryAll,
}

impl BulkOperation {
    /// Wire name, e.g. `hardDelete`.
    pub fn as_str(&self) -> &'static str {
        match self {
            BulkOperation::Insert => "insert",
            BulkOperation::Update => "update",
            BulkOperation::Upsert => "upsert",
            BulkOperation::Delete => "delete",
            BulkOperation::HardDelete => "hardDelete",
            BulkOperation::Query => "query",
            BulkOperation::QueryAll => "queryAll",
        }
    }

    pub fn is_query(&self) -> bool {
        matches!(self, BulkOperation::Query | BulkOperation::QueryAll)
    }

    pub fn is_ingest(&self) -> bool {
        !self.is_query()
    }
}

impl fmt::Display for BulkOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for BulkOperation {
    type Err = Error;

    /// Accepts wire names case-insensitively (`hardDelete`, `HARDDELETE`).
    fn from_str(s: &str) -> Result<Self> {
        [
            BulkOperation::Insert,
            BulkOperation::Update,
            BulkOperation::Upsert,
            BulkOperation::Delete,
            BulkOperation::HardDelete,
            BulkOperation::Query,
            BulkOperation::QueryAll,
        ]
        .into_iter()
        .find(|op| op.as_str().eq_ignore_ascii_case(s.trim()))
        .ok_or_else(|| Error::invalid_request(format!("unknown bulk operation: {s}")))
    }
}

/// Payload format. Bulk API 2.0 only speaks CSV.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ContentType {
    #[default]
    #[serde(rename = "CSV")]
    Csv,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ColumnDelimiter {
    #[default]
    Comma,
    Tab,
    Semicolon,
    Pipe,
    Backquote,
    Caret,
}

impl ColumnDelimiter {
    /// The separator byte, as handed to the CSV reader.
    pub fn as_byte(&self) -> u8 {
        match self {
            ColumnDelimiter::Comma => b',',
            ColumnDelimiter::Tab => b'\t',
            ColumnDelimiter::Semicolon => b';',
            ColumnDelimiter::Pipe => b'|',
            ColumnDelimiter::Backquote => b'`',
            ColumnDelimiter::Caret => b'^',
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LineEnding {
    #[default]
    Lf,
    Crlf,
}

impl LineEnding {
    pub fn as_str(&self) -> &'static str {
        match self {
            LineEnding::Lf => "\n",
            LineEnding::Crlf => "\r\n",
        }
    }
}

// =============================================================================
// Job creation
// =============================================================================

/// Body of `POST /jobs/ingest`.
///
/// ```rust,ignore
/// let request = CreateIngestJobRequest::new("Contact", BulkOperation::Upsert)
///     .with_external_id_field("Email__c");
/// ```
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateIngestJobRequest {
    pub object: String,
    pub operation: BulkOperation,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_id_field_name: Option<String>,
    pub content_type: ContentType,
    pub column_delimiter: ColumnDelimiter,
    pub line_ending: LineEnding,
}

impl CreateIngestJobRequest {
    pub fn new(object: impl Into<String>, operation: BulkOperation) -> Self {
        Self {
            object: object.into(),
            operation,
            external_id_field_name: None,
            content_type: ContentType::Csv,
            column_delimiter: ColumnDelimiter::default(),
            line_ending: LineEnding::default(),
        }
    }

    pub fn with_external_id_field(mut self, field: impl Into<String>) -> Self {
        self.external_id_field_name = Some(field.into());
        self
    }

    pub fn with_column_delimiter(mut self, delimiter: ColumnDelimiter) -> Self {
        self.column_delimiter = delimiter;
        self
    }

    pub fn with_line_ending(mut self, line_ending: LineEnding) -> Self {
        self.line_ending = line_ending;
        self
    }

    /// Reject specifications the service would refuse anyway.
    pub fn validate(&self) -> Result<()> {
        if self.object.trim().is_empty() {
            return Err(Error::invalid_request("object must not be empty"));
        }
        if self.operation.is_query() {
            return Err(Error::invalid_request(format!(
                "{} is a query operation; create a query job instead",
                self.operation
            )));
        }
        let has_external_id = self
            .external_id_field_name
            .as_deref()
            .is_some_and(|field| !field.trim().is_empty());
        if self.operation == BulkOperation::Upsert && !has_external_id {
            return Err(Error::invalid_request(
                "upsert requires an external id field",
            ));
        }
        Ok(())
    }
}

/// Body of `POST /jobs/query`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateQueryJobRequest {
    pub query: String,
    pub operation: BulkOperation,
    pub column_delimiter: ColumnDelimiter,
    pub line_ending: LineEnding,
}

impl CreateQueryJobRequest {
    pub fn new(soql: impl Into<String>) -> Self {
        Self {
            query: soql.into(),
            operation: BulkOperation::Query,
            column_delimiter: ColumnDelimiter::default(),
            line_ending: LineEnding::default(),
        }
    }

    /// Include deleted and archived records.
    pub fn with_query_all(mut self) -> Self {
        self.operation = BulkOperation::QueryAll;
        self
    }

    pub fn with_column_delimiter(mut self, delimiter: ColumnDelimiter) -> Self {
        self.column_delimiter = delimiter;
        self
    }

    pub fn with_line_ending(mut self, line_ending: LineEnding) -> Self {
        self.line_ending = line_ending;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.query.trim().is_empty() {
            return Err(Error::invalid_request("query must not be empty"));
        }
        if !self.operation.is_query() {
            return Err(Error::invalid_request(format!(
                "{} is not a query operation",
                self.operation
            )));
        }
        Ok(())
    }
}

/// Body of the state-changing `PATCH /jobs/{kind}/{id}`.
#[derive(Debug, Clone, Copy, Serialize)]
pub(crate) struct StateChange {
    pub state: JobState,
}

// =============================================================================
// Job snapshots
// =============================================================================

/// A job as last reported by the server.
///
/// Snapshots are values: nothing updates them in place. Fetch a fresh one
/// with `get_job` to observe progress.
pub trait JobSnapshot: DeserializeOwned + Clone + fmt::Debug + Send + Sync + 'static {
    const KIND: JobKind;

    fn id(&self) -> &str;

    fn state(&self) -> JobState;

    fn error_message(&self) -> Option<&str>;
}

/// Ingest job info.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestJob {
    pub id: String,
    pub state: JobState,
    pub object: String,
    pub operation: BulkOperation,
    #[serde(default)]
    pub external_id_field_name: Option<String>,
    #[serde(default)]
    pub content_type: Option<ContentType>,
    #[serde(default)]
    pub column_delimiter: Option<ColumnDelimiter>,
    #[serde(default)]
    pub line_ending: Option<LineEnding>,
    #[serde(default)]
    pub number_records_processed: u64,
    #[serde(default)]
    pub number_records_failed: u64,
    #[serde(default)]
    pub retries: Option<u32>,
    #[serde(default)]
    pub created_date: Option<String>,
    #[serde(default)]
    pub system_modstamp: Option<String>,
    /// Milliseconds.
    #[serde(default)]
    pub total_processing_time: Option<u64>,
    #[serde(default, deserialize_with = "api_version_from_wire")]
    pub api_version: Option<String>,
    #[serde(default)]
    pub concurrency_mode: Option<String>,
    #[serde(default)]
    pub job_type: Option<String>,
    #[serde(default)]
    pub error_message: Option<String>,
}

impl IngestJob {
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_date.as_deref().and_then(parse_timestamp)
    }

    pub fn delimiter(&self) -> ColumnDelimiter {
        self.column_delimiter.unwrap_or_default()
    }
}

impl JobSnapshot for IngestJob {
    const KIND: JobKind = JobKind::Ingest;

    fn id(&self) -> &str {
        &self.id
    }

    fn state(&self) -> JobState {
        self.state
    }

    fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }
}

/// Query job info.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryJob {
    pub id: String,
    pub state: JobState,
    pub operation: BulkOperation,
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub object: Option<String>,
    #[serde(default)]
    pub column_delimiter: Option<ColumnDelimiter>,
    #[serde(default)]
    pub line_ending: Option<LineEnding>,
    #[serde(default)]
    pub number_records_processed: u64,
    #[serde(default)]
    pub created_date: Option<String>,
    #[serde(default)]
    pub system_modstamp: Option<String>,
    #[serde(default, deserialize_with = "api_version_from_wire")]
    pub api_version: Option<String>,
    #[serde(default)]
    pub error_message: Option<String>,
}

impl QueryJob {
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_date.as_deref().and_then(parse_timestamp)
    }

    pub fn delimiter(&self) -> ColumnDelimiter {
        self.column_delimiter.unwrap_or_default()
    }
}

impl JobSnapshot for QueryJob {
    const KIND: JobKind = JobKind::Query;

    fn id(&self) -> &str {
        &self.id
    }

    fn state(&self) -> JobState {
        self.state
    }

    fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }
}

/// One page of `GET /jobs/{kind}`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobList<J> {
    #[serde(default = "default_done")]
    pub done: bool,
    #[serde(default = "Vec::new")]
    pub records: Vec<J>,
    #[serde(default)]
    pub next_records_url: Option<String>,
}

fn default_done() -> bool {
    true
}
