//! Command-line driver for Bulk API 2.0 jobs.
//!
//! Credentials come from the environment:
//!
//! ```sh
//! export SF_INSTANCE_URL='https://myorg.my.salesforce.com'
//! export SF_ACCESS_TOKEN='00D...'
//! bulkline ingest Contact contacts.csv
//! bulkline query "SELECT Id, Name FROM Account"
//! ```

use std::process::ExitCode;

use bulkline::jobs::{
    BulkClient, BulkOperation, CreateIngestJobRequest, CreateQueryJobRequest, IngestJob,
    JobSnapshot, QueryJob,
};
use tracing_subscriber::EnvFilter;

const USAGE: &str = "\
usage:
  bulkline ingest <Object> <file.csv> [operation] [externalIdField]
  bulkline query \"<SOQL>\"
  bulkline jobs
  bulkline status <jobId>
  bulkline abort <jobId>
  bulkline delete <jobId>";

type CliResult = Result<(), Box<dyn std::error::Error>>;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some((command, rest)) = args.split_first() else {
        eprintln!("{USAGE}");
        return ExitCode::FAILURE;
    };

    let client = match BulkClient::builder().build() {
        Ok(client) => client,
        Err(e) => {
            eprintln!("Error: {e}");
            eprintln!("Set SF_INSTANCE_URL and SF_ACCESS_TOKEN.");
            return ExitCode::FAILURE;
        }
    };

    let result = match (command.as_str(), rest) {
        ("ingest", [object, file, more @ ..]) => ingest(&client, object, file, more).await,
        ("query", [soql]) => query(&client, soql).await,
        ("jobs", []) => jobs(&client).await,
        ("status", [id]) => status(&client, id).await,
        ("abort", [id]) => abort(&client, id).await,
        ("delete", [id]) => delete(&client, id).await,
        _ => {
            eprintln!("{USAGE}");
            return ExitCode::FAILURE;
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn ingest(client: &BulkClient, object: &str, file: &str, more: &[String]) -> CliResult {
    let operation = match more.first() {
        Some(op) => op.parse()?,
        None => BulkOperation::Insert,
    };
    let mut request = CreateIngestJobRequest::new(object, operation);
    if let Some(field) = more.get(1) {
        request = request.with_external_id_field(field);
    }

    let csv = tokio::fs::read(file).await?;
    let outcome = client.run_ingest(request, csv).await?;

    println!("job {} {}", outcome.job.id, outcome.job.state);
    if let Some(message) = outcome.job.error_message() {
        println!("  error: {message}");
    }
    println!(
        "  successful: {}  failed: {}  unprocessed: {}",
        outcome.successful_count(),
        outcome.failed_count(),
        outcome.unprocessed_count()
    );
    if let Some(failed) = &outcome.failed {
        for row in &failed.rows {
            println!("  {}", row.join(","));
        }
    }

    if !outcome.is_success() {
        return Err(format!("job ended in state {}", outcome.job.state).into());
    }
    Ok(())
}

async fn query(client: &BulkClient, soql: &str) -> CliResult {
    let outcome = client.run_query(CreateQueryJobRequest::new(soql)).await?;
    match outcome.csv {
        Some(csv) => {
            print!("{csv}");
            Ok(())
        }
        None => Err(format!(
            "job {} ended in state {}: {}",
            outcome.job.id,
            outcome.job.state,
            outcome.job.error_message.as_deref().unwrap_or("no message")
        )
        .into()),
    }
}

async fn jobs(client: &BulkClient) -> CliResult {
    let (ingest, query) = list_all(client).await?;
    for job in ingest {
        println!("ingest {} {:<15} {} {}", job.id, job.state, job.operation, job.object);
    }
    for job in query {
        println!(
            "query  {} {:<15} {} {}",
            job.id,
            job.state,
            job.operation,
            job.query.as_deref().unwrap_or_default()
        );
    }
    Ok(())
}

async fn list_all(
    client: &BulkClient,
) -> bulkline::jobs::Result<(Vec<IngestJob>, Vec<QueryJob>)> {
    let (ingest, query) = tokio::join!(client.list_ingest_jobs(), client.list_query_jobs());
    Ok((ingest?, query?))
}

async fn status(client: &BulkClient, id: &str) -> CliResult {
    let job = client.get_ingest_job(id).await?;
    println!(
        "job {} {} ({} processed, {} failed)",
        job.id, job.state, job.number_records_processed, job.number_records_failed
    );
    if let Some(created) = job.created_at() {
        println!("  created {created}");
    }
    Ok(())
}

async fn abort(client: &BulkClient, id: &str) -> CliResult {
    let job = client.abort_ingest_job(id).await?;
    println!("job {} {}", job.id, job.state);
    Ok(())
}

async fn delete(client: &BulkClient, id: &str) -> CliResult {
    client.delete_ingest_job(id).await?;
    println!("job {id} deleted");
    Ok(())
}
