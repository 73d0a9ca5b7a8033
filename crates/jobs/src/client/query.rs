//! Query jobs: create and paged results.

use tracing::{debug, info, instrument};

use super::BulkClient;
use crate::error::Result;
use crate::results::{append_page, QueryOutcome, QueryResultsPage};
use crate::types::{CreateQueryJobRequest, JobKind, QueryJob};

impl BulkClient {
    /// Create a query job. The server starts processing right away; there
    /// is no upload or close step.
    #[instrument(skip(self, request), fields(operation = %request.operation))]
    pub async fn create_query_job(&self, request: CreateQueryJobRequest) -> Result<QueryJob> {
        request.validate()?;
        let job: QueryJob = self
            .client
            .post_json(&self.kind_url(JobKind::Query), &request)
            .await?;
        info!(job_id = %job.id, state = %job.state, "Created query job");
        Ok(job)
    }

    pub async fn get_query_job(&self, job_id: &str) -> Result<QueryJob> {
        self.get_job(job_id).await
    }

    /// Abort a query job. The server may report such a job as `Failed`
    /// rather than `Aborted` when processing had already started.
    pub async fn abort_query_job(&self, job_id: &str) -> Result<QueryJob> {
        self.abort_job(job_id).await
    }

    pub async fn delete_query_job(&self, job_id: &str) -> Result<()> {
        self.delete_job::<QueryJob>(job_id).await
    }

    pub async fn list_query_jobs(&self) -> Result<Vec<QueryJob>> {
        self.list_jobs().await
    }

    /// Fetch one page of results of a completed query job.
    ///
    /// Pass the previous page's locator to continue; `None` starts at the
    /// first page.
    #[instrument(skip(self))]
    pub async fn query_results(
        &self,
        job_id: &str,
        locator: Option<&str>,
        max_records: Option<u64>,
    ) -> Result<QueryResultsPage> {
        let url = self.job_resource_url(JobKind::Query, job_id, "results");
        let mut request = self.client.get(&url).accept_csv();
        if let Some(locator) = locator {
            request = request.query("locator", locator);
        }
        if let Some(max) = max_records {
            request = request.query("maxRecords", max.to_string());
        }

        let response = self.client.execute(request).await?;
        let locator = response.sforce_locator().map(str::to_string);
        let csv = response.text().await?;

        debug!(job_id, bytes = csv.len(), has_more = locator.is_some(), "Fetched results page");
        Ok(QueryResultsPage { csv, locator })
    }

    /// Fetch every page of results into one CSV document with a single
    /// header row.
    #[instrument(skip(self))]
    pub async fn all_query_results(&self, job_id: &str) -> Result<String> {
        let mut all = String::new();
        let mut locator: Option<String> = None;
        let mut pages = 0usize;

        loop {
            let page = self
                .query_results(job_id, locator.as_deref(), None)
                .await?;
            append_page(&mut all, &page.csv);
            pages += 1;

            match page.locator {
                Some(next) if locator.as_deref() != Some(next.as_str()) => locator = Some(next),
                _ => break,
            }
        }

        debug!(job_id, pages, "Fetched all result pages");
        Ok(all)
    }

    /// Create, wait, then fetch all results if the job completed.
    #[instrument(skip(self, request))]
    pub async fn run_query(&self, request: CreateQueryJobRequest) -> Result<QueryOutcome> {
        let job = self.create_query_job(request).await?;
        let job = self.wait_for_query_job(&job.id).await?;

        let csv = if job.state.is_success() {
            Some(self.all_query_results(&job.id).await?)
        } else {
            info!(job_id = %job.id, state = %job.state, error = ?job.error_message, "Query job did not complete");
            None
        };

        Ok(QueryOutcome { job, csv })
    }
}
