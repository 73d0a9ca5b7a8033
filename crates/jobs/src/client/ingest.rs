//! Ingest jobs: create, upload, close, result artifacts.

use bytes::Bytes;
use tracing::{debug, info, instrument, warn};

use super::BulkClient;
use crate::error::Result;
use crate::results::{IngestOutcome, ResultStream};
use crate::types::{CreateIngestJobRequest, IngestJob, JobKind, JobState, StateChange};

impl BulkClient {
    /// Create an ingest job. The returned job is `Open` and waits for data.
    ///
    /// The request is validated locally first; an invalid one is never sent.
    #[instrument(skip(self, request), fields(object = %request.object, operation = %request.operation))]
    pub async fn create_ingest_job(&self, request: CreateIngestJobRequest) -> Result<IngestJob> {
        request.validate()?;
        let job: IngestJob = self
            .client
            .post_json(&self.kind_url(JobKind::Ingest), &request)
            .await?;
        info!(job_id = %job.id, state = %job.state, "Created ingest job");
        Ok(job)
    }

    pub async fn get_ingest_job(&self, job_id: &str) -> Result<IngestJob> {
        self.get_job(job_id).await
    }

    /// Upload CSV data to an open job.
    ///
    /// Uploading to a job that is no longer `Open` is rejected by the
    /// server and surfaces as an error.
    #[instrument(skip(self, payload))]
    pub async fn upload_batch(&self, job_id: &str, payload: impl Into<Bytes>) -> Result<()> {
        let payload = payload.into();
        let size = payload.len();
        let url = self.job_resource_url(JobKind::Ingest, job_id, "batches");

        self.client
            .execute(self.client.put(&url).csv(payload))
            .await?;
        debug!(job_id, bytes = size, "Uploaded batch");
        Ok(())
    }

    /// Mark upload complete. The server queues the job for processing and
    /// answers with the `UploadComplete` snapshot.
    #[instrument(skip(self))]
    pub async fn close_job(&self, job_id: &str) -> Result<IngestJob> {
        let body = StateChange {
            state: JobState::UploadComplete,
        };
        let job: IngestJob = self
            .client
            .patch_json(&self.job_url(JobKind::Ingest, job_id), &body)
            .await?;
        info!(job_id, state = %job.state, "Closed ingest job");
        Ok(job)
    }

    pub async fn abort_ingest_job(&self, job_id: &str) -> Result<IngestJob> {
        self.abort_job(job_id).await
    }

    pub async fn delete_ingest_job(&self, job_id: &str) -> Result<()> {
        self.delete_job::<IngestJob>(job_id).await
    }

    pub async fn list_ingest_jobs(&self) -> Result<Vec<IngestJob>> {
        self.list_jobs().await
    }

    // =========================================================================
    // Result artifacts
    // =========================================================================

    /// Rows that were processed successfully, with `sf__Id` and
    /// `sf__Created` prepended to the input columns.
    pub async fn successful_results(&self, job_id: &str) -> Result<ResultStream> {
        self.result_artifact(job_id, "successfulResults").await
    }

    /// Rows that failed, with `sf__Id` and `sf__Error` prepended.
    pub async fn failed_results(&self, job_id: &str) -> Result<ResultStream> {
        self.result_artifact(job_id, "failedResults").await
    }

    /// Rows never attempted (e.g. the job was aborted). Header only when
    /// every row was attempted.
    pub async fn unprocessed_records(&self, job_id: &str) -> Result<ResultStream> {
        self.result_artifact(job_id, "unprocessedrecords").await
    }

    #[instrument(skip(self))]
    async fn result_artifact(&self, job_id: &str, artifact: &str) -> Result<ResultStream> {
        let url = self.job_resource_url(JobKind::Ingest, job_id, artifact);
        let response = self.client.execute(self.client.get(&url).accept_csv()).await?;
        Ok(ResultStream::from_response(response))
    }

    // =========================================================================
    // Full lifecycle
    // =========================================================================

    /// Create, upload, close, wait, then fetch the three artifacts.
    ///
    /// If the upload fails the job is aborted before the upload error is
    /// returned, so no `Open` job is left behind.
    #[instrument(skip(self, request, csv), fields(object = %request.object))]
    pub async fn run_ingest(
        &self,
        request: CreateIngestJobRequest,
        csv: impl Into<Bytes>,
    ) -> Result<IngestOutcome> {
        let delimiter = request.column_delimiter;
        let job = self.create_ingest_job(request).await?;

        if let Err(err) = self.upload_batch(&job.id, csv).await {
            if let Err(abort_err) = self.abort_ingest_job(&job.id).await {
                warn!(job_id = %job.id, error = %abort_err, "Could not abort job after failed upload");
            }
            return Err(err);
        }

        self.close_job(&job.id).await?;
        let job = self.wait_for_ingest_job(&job.id).await?;

        if !job.state.is_success() {
            info!(job_id = %job.id, state = %job.state, error = ?job.error_message, "Ingest job did not complete");
            return Ok(IngestOutcome {
                job,
                successful: None,
                failed: None,
                unprocessed: None,
            });
        }

        let successful = self
            .successful_results(&job.id)
            .await?
            .into_result_set(delimiter)
            .await?;
        let failed = self
            .failed_results(&job.id)
            .await?
            .into_result_set(delimiter)
            .await?;
        let unprocessed = self
            .unprocessed_records(&job.id)
            .await?
            .into_result_set(delimiter)
            .await?;

        info!(
            job_id = %job.id,
            successful = successful.row_count(),
            failed = failed.row_count(),
            unprocessed = unprocessed.row_count(),
            "Ingest job finished"
        );

        Ok(IngestOutcome {
            job,
            successful: Some(successful),
            failed: Some(failed),
            unprocessed: Some(unprocessed),
        })
    }
}
