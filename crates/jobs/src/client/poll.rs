//! Waiting for jobs to finish.

use tokio::time::{sleep, Instant};
use tracing::{debug, instrument};

use super::BulkClient;
use crate::error::{Error, ErrorKind, Result};
use crate::types::{IngestJob, JobSnapshot, QueryJob};

impl BulkClient {
    /// Poll a job until it reaches `JobComplete`, `Failed` or `Aborted` and
    /// return that snapshot.
    ///
    /// A terminal state is not an error; check `state().is_success()`.
    /// A failed status check ends the wait with that error. The delay
    /// between checks is [`PollConfig::interval`](crate::PollConfig).
    #[instrument(skip(self), fields(kind = %J::KIND, interval = ?self.poll.interval))]
    pub async fn wait_for_job<J: JobSnapshot>(&self, job_id: &str) -> Result<J> {
        let started = Instant::now();
        let mut attempts = 0u32;

        loop {
            let job: J = self.get_job(job_id).await?;
            attempts += 1;

            if job.state().is_terminal() {
                debug!(job_id, state = %job.state(), attempts, "Job reached terminal state");
                return Ok(job);
            }

            if let Some(timeout) = self.poll.timeout {
                if started.elapsed() + self.poll.interval > timeout {
                    return Err(Error::new(ErrorKind::Timeout(format!(
                        "job {job_id} still {} after {:?}",
                        job.state(),
                        started.elapsed()
                    ))));
                }
            }

            debug!(job_id, state = %job.state(), attempts, "Job not finished, waiting");
            sleep(self.poll.interval).await;
        }
    }

    pub async fn wait_for_ingest_job(&self, job_id: &str) -> Result<IngestJob> {
        self.wait_for_job(job_id).await
    }

    pub async fn wait_for_query_job(&self, job_id: &str) -> Result<QueryJob> {
        self.wait_for_job(job_id).await
    }
}
