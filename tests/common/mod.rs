//! In-process stand-in for the Bulk API 2.0 job endpoints.
//!
//! Jobs live in memory and move through states the way the service moves
//! them: close puts an ingest job in `UploadComplete`, then each status
//! check advances it one step (`InProgress`, then `JobComplete`). Rows with
//! an empty field fail; everything else succeeds.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use bulkline::jobs::{BulkClient, PollConfig};
use serde_json::{json, Value};
use wiremock::matchers::path_regex;
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

pub const QUERY_PAGES: &[&str] = &["Id,Name\n001A,Alpha\n001B,Beta\n", "Id,Name\n001C,Gamma\n"];

#[derive(Debug, Clone)]
pub struct FakeJob {
    pub kind: String,
    pub state: String,
    pub object: String,
    pub operation: String,
    pub query: Option<String>,
    pub data: String,
}

#[derive(Clone, Default)]
pub struct FakeBulkApi {
    jobs: Arc<Mutex<BTreeMap<String, FakeJob>>>,
    next_id: Arc<AtomicU32>,
}

impl FakeBulkApi {
    /// Start a server with the fake mounted, and a client pointed at it
    /// that polls every few milliseconds.
    pub async fn start() -> (MockServer, FakeBulkApi, BulkClient) {
        let server = MockServer::start().await;
        let fake = FakeBulkApi::default();

        Mock::given(path_regex(r"^/services/data/v[0-9.]+/jobs/(ingest|query)(/.*)?$"))
            .respond_with(fake.clone())
            .mount(&server)
            .await;

        let client = BulkClient::new(server.uri(), "fake-token")
            .unwrap()
            .with_poll_config(PollConfig::new(std::time::Duration::from_millis(5)));
        (server, fake, client)
    }

    pub fn job(&self, id: &str) -> Option<FakeJob> {
        self.jobs.lock().unwrap().get(id).cloned()
    }

    pub fn set_state(&self, id: &str, state: &str) {
        if let Some(job) = self.jobs.lock().unwrap().get_mut(id) {
            job.state = state.to_string();
        }
    }

    fn job_json(id: &str, job: &FakeJob) -> Value {
        let (ok, failed) = split_rows(&job.data);
        let mut value = json!({
            "id": id,
            "state": job.state,
            "operation": job.operation,
            "object": job.object,
            "contentType": "CSV",
            "columnDelimiter": "COMMA",
            "lineEnding": "LF",
            "apiVersion": 62.0,
            "createdDate": "2024-03-01T17:22:05.000+0000",
            "numberRecordsProcessed": if job.state == "JobComplete" { ok.len() + failed.len() } else { 0 },
            "numberRecordsFailed": if job.state == "JobComplete" { failed.len() } else { 0 },
        });
        if let Some(query) = &job.query {
            value["query"] = json!(query);
        }
        value
    }

    fn create(&self, kind: &str, body: &[u8]) -> ResponseTemplate {
        let Ok(payload) = serde_json::from_slice::<Value>(body) else {
            return error(400, "INVALIDJOB", "Malformed JSON");
        };

        let job = if kind == "ingest" {
            let object = payload["object"].as_str().unwrap_or_default().to_string();
            if object == "Nope__c" {
                return error(400, "INVALIDJOB", "Unable to find object: Nope__c");
            }
            FakeJob {
                kind: kind.into(),
                state: "Open".into(),
                object,
                operation: payload["operation"].as_str().unwrap_or("insert").into(),
                query: None,
                data: String::new(),
            }
        } else {
            FakeJob {
                kind: kind.into(),
                state: "UploadComplete".into(),
                object: "Account".into(),
                operation: payload["operation"].as_str().unwrap_or("query").into(),
                query: payload["query"].as_str().map(str::to_string),
                data: String::new(),
            }
        };

        let id = format!("750FAKE{:011}", self.next_id.fetch_add(1, Ordering::SeqCst));
        let response = Self::job_json(&id, &job);
        self.jobs.lock().unwrap().insert(id, job);
        ResponseTemplate::new(200).set_body_json(response)
    }

    fn list(&self, kind: &str) -> ResponseTemplate {
        let jobs = self.jobs.lock().unwrap();
        let records: Vec<Value> = jobs
            .iter()
            .filter(|(_, job)| job.kind == kind)
            .map(|(id, job)| Self::job_json(id, job))
            .collect();
        ResponseTemplate::new(200).set_body_json(json!({
            "done": true,
            "records": records,
            "nextRecordsUrl": null
        }))
    }

    fn get(&self, kind: &str, id: &str) -> ResponseTemplate {
        let mut jobs = self.jobs.lock().unwrap();
        let Some(job) = jobs.get_mut(id).filter(|job| job.kind == kind) else {
            return not_found();
        };
        job.state = match job.state.as_str() {
            "UploadComplete" => "InProgress".into(),
            "InProgress" => "JobComplete".into(),
            other => other.into(),
        };
        ResponseTemplate::new(200).set_body_json(Self::job_json(id, job))
    }

    fn patch(&self, kind: &str, id: &str, body: &[u8]) -> ResponseTemplate {
        let requested = serde_json::from_slice::<Value>(body)
            .ok()
            .and_then(|v| v["state"].as_str().map(str::to_string))
            .unwrap_or_default();

        let mut jobs = self.jobs.lock().unwrap();
        let Some(job) = jobs.get_mut(id).filter(|job| job.kind == kind) else {
            return not_found();
        };

        let allowed = match requested.as_str() {
            "UploadComplete" => job.state == "Open",
            "Aborted" => matches!(job.state.as_str(), "Open" | "UploadComplete" | "InProgress"),
            _ => false,
        };
        if !allowed {
            return error(
                400,
                "INVALIDJOBSTATE",
                &format!("{requested} is not a valid state transition from {}", job.state),
            );
        }

        job.state = requested;
        ResponseTemplate::new(200).set_body_json(Self::job_json(id, job))
    }

    fn delete(&self, kind: &str, id: &str) -> ResponseTemplate {
        let mut jobs = self.jobs.lock().unwrap();
        if !jobs.get(id).is_some_and(|job| job.kind == kind) {
            return not_found();
        }
        jobs.remove(id);
        ResponseTemplate::new(204)
    }

    fn upload(&self, id: &str, body: &[u8]) -> ResponseTemplate {
        let mut jobs = self.jobs.lock().unwrap();
        let Some(job) = jobs.get_mut(id).filter(|job| job.kind == "ingest") else {
            return not_found();
        };
        if job.state != "Open" {
            return error(409, "INVALIDJOBSTATE", "Job is not open for uploads");
        }
        job.data.push_str(&String::from_utf8_lossy(body));
        ResponseTemplate::new(201)
    }

    fn ingest_results(&self, id: &str, artifact: &str) -> ResponseTemplate {
        let jobs = self.jobs.lock().unwrap();
        let Some(job) = jobs.get(id).filter(|job| job.kind == "ingest") else {
            return not_found();
        };

        let header = job.data.lines().next().unwrap_or_default();
        let (ok, failed) = split_rows(&job.data);
        let mut csv = String::new();

        match artifact {
            "successfulResults" => {
                csv.push_str(&format!("\"sf__Id\",\"sf__Created\",{header}\n"));
                if job.state == "JobComplete" {
                    for (n, row) in ok.iter().enumerate() {
                        csv.push_str(&format!("\"003FAKE{n:011}\",\"true\",{row}\n"));
                    }
                }
            }
            "failedResults" => {
                csv.push_str(&format!("\"sf__Id\",\"sf__Error\",{header}\n"));
                if job.state == "JobComplete" {
                    for row in &failed {
                        csv.push_str(&format!(
                            "\"\",\"REQUIRED_FIELD_MISSING:Required fields are missing\",{row}\n"
                        ));
                    }
                }
            }
            "unprocessedrecords" => {
                csv.push_str(header);
                csv.push('\n');
                if job.state != "JobComplete" {
                    for row in ok.iter().chain(failed.iter()) {
                        csv.push_str(row);
                        csv.push('\n');
                    }
                }
            }
            _ => return not_found(),
        }

        ResponseTemplate::new(200).set_body_string(csv)
    }

    fn query_results(&self, id: &str, request: &Request) -> ResponseTemplate {
        let jobs = self.jobs.lock().unwrap();
        let Some(job) = jobs.get(id).filter(|job| job.kind == "query") else {
            return not_found();
        };
        if job.state != "JobComplete" {
            return error(400, "INVALIDJOBSTATE", "Job is not complete");
        }

        let page = request
            .url
            .query_pairs()
            .find(|(key, _)| key == "locator")
            .and_then(|(_, value)| value.strip_prefix("PAGE").and_then(|n| n.parse().ok()))
            .unwrap_or(0usize);
        let Some(body) = QUERY_PAGES.get(page) else {
            return error(400, "INVALIDLOCATOR", "Unknown locator");
        };
        let locator = if page + 1 < QUERY_PAGES.len() {
            format!("PAGE{}", page + 1)
        } else {
            "null".to_string()
        };

        ResponseTemplate::new(200)
            .insert_header("Sforce-Locator", locator.as_str())
            .set_body_string(*body)
    }
}

impl Respond for FakeBulkApi {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let path = request.url.path();
        let Some((_, rest)) = path.split_once("/jobs/") else {
            return not_found();
        };
        let segments: Vec<&str> = rest.split('/').collect();

        match (request.method.as_str(), segments.as_slice()) {
            ("POST", [kind]) => self.create(kind, &request.body),
            ("GET", [kind]) => self.list(kind),
            ("GET", [kind, id]) => self.get(kind, id),
            ("PATCH", [kind, id]) => self.patch(kind, id, &request.body),
            ("DELETE", [kind, id]) => self.delete(kind, id),
            ("PUT", ["ingest", id, "batches"]) => self.upload(id, &request.body),
            ("GET", ["ingest", id, artifact]) => self.ingest_results(id, artifact),
            ("GET", ["query", id, "results"]) => self.query_results(id, request),
            _ => not_found(),
        }
    }
}

/// Data rows of an uploaded CSV, split into (valid, invalid).
fn split_rows(data: &str) -> (Vec<&str>, Vec<&str>) {
    data.lines()
        .skip(1)
        .filter(|line| !line.trim().is_empty())
        .partition(|line| line.split(',').all(|field| !field.trim().is_empty()))
}

fn error(status: u16, code: &str, message: &str) -> ResponseTemplate {
    ResponseTemplate::new(status).set_body_json(json!([{ "errorCode": code, "message": message }]))
}

fn not_found() -> ResponseTemplate {
    error(404, "NOT_FOUND", "The requested resource does not exist")
}
