//! Bulk API 2.0 client.
//!
//! Operations are split by resource family:
//! - [`ingest`]: create, upload, close and result artifacts for ingest jobs
//! - [`query`]: create and paged results for query jobs
//! - [`poll`]: waiting for a job to reach a terminal state
//!
//! The operations shared by both families (get, abort, delete, list) are
//! generic over [`JobSnapshot`] and live here.

mod ingest;
mod poll;
mod query;

use bulkline_http::{encode_path_segment, ApiClient};
use tracing::{debug, info, instrument};

use crate::builder::BulkClientBuilder;
use crate::error::Result;
use crate::poll::PollConfig;
use crate::types::{JobKind, JobList, JobSnapshot, JobState, StateChange};

/// Salesforce Bulk API 2.0 client.
///
/// Holds no job state: every call is one request against the server, which
/// is authoritative. Cloning is cheap and shares the connection pool.
///
/// # Example
///
/// ```rust,ignore
/// use bulkline_jobs::{BulkClient, BulkOperation, CreateIngestJobRequest};
///
/// let client = BulkClient::new("https://myorg.my.salesforce.com", "access_token")?;
///
/// let job = client
///     .create_ingest_job(CreateIngestJobRequest::new("Contact", BulkOperation::Insert))
///     .await?;
/// client.upload_batch(&job.id, "FirstName,LastName\nAda,Lovelace\n").await?;
/// client.close_job(&job.id).await?;
///
/// let done = client.wait_for_ingest_job(&job.id).await?;
/// println!("{} processed", done.number_records_processed);
/// ```
#[derive(Debug, Clone)]
pub struct BulkClient {
    client: ApiClient,
    poll: PollConfig,
}

impl BulkClient {
    /// Create a client for an instance URL and a ready-to-use access token.
    pub fn new(instance_url: impl Into<String>, access_token: impl Into<String>) -> Result<Self> {
        Ok(Self::from_client(ApiClient::new(instance_url, access_token)?))
    }

    /// Wrap an existing [`ApiClient`].
    pub fn from_client(client: ApiClient) -> Self {
        Self {
            client,
            poll: PollConfig::default(),
        }
    }

    pub fn builder() -> BulkClientBuilder {
        BulkClientBuilder::new()
    }

    pub fn with_poll_config(mut self, poll: PollConfig) -> Self {
        self.poll = poll;
        self
    }

    pub fn poll_config(&self) -> &PollConfig {
        &self.poll
    }

    /// The underlying API client.
    pub fn inner(&self) -> &ApiClient {
        &self.client
    }

    // =========================================================================
    // URLs
    // =========================================================================

    fn kind_url(&self, kind: JobKind) -> String {
        self.client.jobs_url(kind.path())
    }

    fn job_url(&self, kind: JobKind, job_id: &str) -> String {
        self.client.jobs_url(&format!(
            "{}/{}",
            kind.path(),
            encode_path_segment(job_id)
        ))
    }

    fn job_resource_url(&self, kind: JobKind, job_id: &str, resource: &str) -> String {
        format!("{}/{}", self.job_url(kind, job_id), resource)
    }

    // =========================================================================
    // Operations shared by ingest and query jobs
    // =========================================================================

    /// Fetch a fresh snapshot of a job.
    ///
    /// A deleted or unknown id fails with a not-found error (status 404).
    #[instrument(skip(self), fields(kind = %J::KIND))]
    pub async fn get_job<J: JobSnapshot>(&self, job_id: &str) -> Result<J> {
        let job: J = self.client.get_json(&self.job_url(J::KIND, job_id)).await?;
        debug!(job_id, state = %job.state(), "Fetched job");
        Ok(job)
    }

    /// Ask the server to abort a job.
    ///
    /// Aborting a job that is already aborted succeeds: when the server
    /// refuses the transition, the job is re-read and returned if its state
    /// is `Aborted`. Any other refusal is returned unchanged.
    #[instrument(skip(self), fields(kind = %J::KIND))]
    pub async fn abort_job<J: JobSnapshot>(&self, job_id: &str) -> Result<J> {
        let url = self.job_url(J::KIND, job_id);
        let body = StateChange {
            state: JobState::Aborted,
        };

        match self.client.patch_json::<J, _>(&url, &body).await {
            Ok(job) => {
                info!(job_id, state = %job.state(), "Abort requested");
                Ok(job)
            }
            Err(err) if matches!(err.status(), Some(400 | 409)) => {
                match self.get_job::<J>(job_id).await {
                    Ok(current) if current.state() == JobState::Aborted => {
                        debug!(job_id, "Job was already aborted");
                        Ok(current)
                    }
                    _ => Err(err.into()),
                }
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Delete a job and its data. Later gets fail with not-found.
    #[instrument(skip(self), fields(kind = %J::KIND))]
    pub async fn delete_job<J: JobSnapshot>(&self, job_id: &str) -> Result<()> {
        self.client
            .delete_request(&self.job_url(J::KIND, job_id))
            .await?;
        info!(job_id, "Job deleted");
        Ok(())
    }

    /// List all jobs of one kind, following `nextRecordsUrl` across pages.
    ///
    /// The listing is filtered to Bulk API 2.0 jobs with `jobType`. Records
    /// that still do not parse as `J` (classic jobs on servers that ignore
    /// the filter) are skipped rather than failing the whole listing.
    #[instrument(skip(self), fields(kind = %J::KIND))]
    pub async fn list_jobs<J: JobSnapshot>(&self) -> Result<Vec<J>> {
        let mut url = self.kind_url(J::KIND);
        let first = self
            .client
            .get(&url)
            .query("jobType", J::KIND.list_job_type());
        let mut page: JobList<serde_json::Value> =
            self.client.execute(first).await?.json().await?;
        let mut jobs = Vec::new();
        let mut skipped = 0usize;

        loop {
            for record in page.records {
                match serde_json::from_value::<J>(record) {
                    Ok(job) => jobs.push(job),
                    Err(e) => {
                        skipped += 1;
                        debug!(error = %e, "Skipping unrecognized job record");
                    }
                }
            }

            match page.next_records_url {
                Some(next) if !page.done => {
                    let next = self.client.url(&next);
                    if next == url {
                        break;
                    }
                    url = next;
                }
                _ => break,
            }
            page = self.client.get_json(&url).await?;
        }

        debug!(count = jobs.len(), skipped, "Listed jobs");
        Ok(jobs)
    }
}
