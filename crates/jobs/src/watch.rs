//! Background job watching over a channel.
//!
//! [`BulkClient::watch`] polls a job on a spawned task and reports what it
//! sees as [`JobEvent`]s, so a caller can react to progress without
//! holding a polling loop itself.

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Instant};
use tracing::{debug, instrument, Instrument};

use crate::client::BulkClient;
use crate::error::{Error, ErrorKind};
use crate::types::{JobSnapshot, JobState};

const CHANNEL_CAPACITY: usize = 16;

/// Something observed about a watched job.
#[derive(Debug)]
pub enum JobEvent<J> {
    /// The job was seen in a new state. The first observation always
    /// arrives with `previous: None`.
    StateChanged {
        previous: Option<JobState>,
        job: J,
    },
    /// Terminal state reached; no further events follow.
    Finished(J),
    /// A status check failed; no further events follow.
    Error(Error),
}

/// Handle to a running watch.
///
/// Dropping the handle (or the receiver taken from it) stops the polling
/// task before its next status check.
#[derive(Debug)]
pub struct JobWatch<J> {
    receiver: mpsc::Receiver<JobEvent<J>>,
    task: JoinHandle<()>,
}

impl<J> JobWatch<J> {
    /// Next event, or `None` once the watch has ended.
    pub async fn recv(&mut self) -> Option<JobEvent<J>> {
        self.receiver.recv().await
    }

    /// Take the raw channel, e.g. to hand it to another task.
    pub fn into_receiver(self) -> mpsc::Receiver<JobEvent<J>> {
        self.receiver
    }

    /// Stop polling immediately.
    pub fn abort(&self) {
        self.task.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl BulkClient {
    /// Watch a job on a background task until it reaches a terminal state.
    ///
    /// Must be called from within a tokio runtime.
    #[instrument(skip(self, job_id), fields(kind = %J::KIND))]
    pub fn watch<J: JobSnapshot>(&self, job_id: impl Into<String>) -> JobWatch<J> {
        let (sender, receiver) = mpsc::channel(CHANNEL_CAPACITY);
        let client = self.clone();
        let job_id = job_id.into();
        debug!(job_id, "Starting watch");
        let task = tokio::spawn(
            async move { client.run_watch::<J>(job_id, sender).await }.in_current_span(),
        );
        JobWatch { receiver, task }
    }

    async fn run_watch<J: JobSnapshot>(self, job_id: String, sender: mpsc::Sender<JobEvent<J>>) {
        let poll = *self.poll_config();
        let started = Instant::now();
        let mut last: Option<JobState> = None;

        loop {
            if sender.is_closed() {
                debug!(job_id, "Watch receiver dropped");
                return;
            }

            let job: J = match self.get_job(&job_id).await {
                Ok(job) => job,
                Err(err) => {
                    let _ = sender.send(JobEvent::Error(err)).await;
                    return;
                }
            };

            let state = job.state();
            if last != Some(state) {
                let event = JobEvent::StateChanged {
                    previous: last,
                    job: job.clone(),
                };
                if sender.send(event).await.is_err() {
                    return;
                }
                last = Some(state);
            }

            if state.is_terminal() {
                let _ = sender.send(JobEvent::Finished(job)).await;
                return;
            }

            if let Some(timeout) = poll.timeout {
                if started.elapsed() + poll.interval > timeout {
                    let err = Error::new(ErrorKind::Timeout(format!(
                        "job {job_id} still {state} after {:?}",
                        started.elapsed()
                    )));
                    let _ = sender.send(JobEvent::Error(err)).await;
                    return;
                }
            }

            tokio::select! {
                _ = sleep(poll.interval) => {}
                _ = sender.closed() => {
                    debug!(job_id, "Watch receiver dropped");
                    return;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::poll::PollConfig;
    use crate::types::IngestJob;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn job(state: &str) -> serde_json::Value {
        serde_json::json!({
            "id": "750w",
            "state": state,
            "object": "Contact",
            "operation": "insert"
        })
    }

    fn client(server: &MockServer) -> BulkClient {
        BulkClient::new(server.uri(), "test-token")
            .unwrap()
            .with_poll_config(PollConfig::new(Duration::from_millis(5)))
    }

    #[tokio::test]
    async fn test_watch_reports_transitions_once() {
        let server = MockServer::start().await;
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();

        Mock::given(method("GET"))
            .and(path("/services/data/v62.0/jobs/ingest/750w"))
            .respond_with(move |_: &wiremock::Request| {
                let state = match counter.fetch_add(1, Ordering::SeqCst) {
                    0 => "UploadComplete",
                    1 | 2 => "InProgress",
                    _ => "JobComplete",
                };
                ResponseTemplate::new(200).set_body_json(job(state))
            })
            .mount(&server)
            .await;

        let mut watch = client(&server).watch::<IngestJob>("750w");
        let mut seen = Vec::new();
        let mut finished = None;

        while let Some(event) = watch.recv().await {
            match event {
                JobEvent::StateChanged { previous, job } => seen.push((previous, job.state)),
                JobEvent::Finished(job) => finished = Some(job),
                JobEvent::Error(err) => panic!("unexpected error: {err}"),
            }
        }

        assert_eq!(
            seen,
            vec![
                (None, JobState::UploadComplete),
                (Some(JobState::UploadComplete), JobState::InProgress),
                (Some(JobState::InProgress), JobState::JobComplete),
            ]
        );
        assert_eq!(finished.unwrap().state, JobState::JobComplete);
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_watch_reports_error_and_ends() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/services/data/v62.0/jobs/ingest/750w"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let mut receiver = client(&server).watch::<IngestJob>("750w").into_receiver();
        match receiver.recv().await {
            Some(JobEvent::Error(err)) => assert!(err.is_not_found()),
            other => panic!("unexpected event: {other:?}"),
        }
        assert!(receiver.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_watch_reports_timeout_and_ends() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/services/data/v62.0/jobs/ingest/750w"))
            .respond_with(ResponseTemplate::new(200).set_body_json(job("InProgress")))
            .mount(&server)
            .await;

        let client = BulkClient::new(server.uri(), "test-token")
            .unwrap()
            .with_poll_config(
                PollConfig::new(Duration::from_millis(20)).with_timeout(Duration::from_millis(50)),
            );
        let mut watch = client.watch::<IngestJob>("750w");

        assert!(matches!(
            watch.recv().await,
            Some(JobEvent::StateChanged {
                previous: None,
                job: IngestJob {
                    state: JobState::InProgress,
                    ..
                },
            })
        ));
        match watch.recv().await {
            Some(JobEvent::Error(err)) => {
                assert!(matches!(err.kind, ErrorKind::Timeout(_)));
                assert!(err.to_string().contains("750w"));
            }
            other => panic!("unexpected event: {other:?}"),
        }
        assert!(watch.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_dropping_watch_stops_polling() {
        let server = MockServer::start().await;
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();

        Mock::given(method("GET"))
            .and(path("/services/data/v62.0/jobs/ingest/750w"))
            .respond_with(move |_: &wiremock::Request| {
                counter.fetch_add(1, Ordering::SeqCst);
                ResponseTemplate::new(200).set_body_json(job("InProgress"))
            })
            .mount(&server)
            .await;

        let mut watch = client(&server).watch::<IngestJob>("750w");
        assert!(matches!(
            watch.recv().await,
            Some(JobEvent::StateChanged { previous: None, .. })
        ));
        drop(watch);

        tokio::time::sleep(Duration::from_millis(50)).await;
        let after_drop = calls.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(calls.load(Ordering::SeqCst), after_drop);
    }
}
