//! Result artifacts: raw byte streams and parsed CSV.

use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use futures::{Stream, TryStreamExt};

use crate::error::{Error, ErrorKind, Result};
use crate::types::{ColumnDelimiter, IngestJob, QueryJob};

/// Body of a result endpoint, delivered chunk by chunk.
///
/// Nothing is buffered until the caller asks for it, so large result sets
/// can be written straight to disk:
///
/// ```rust,ignore
/// let mut stream = client.successful_results(&job.id).await?;
/// while let Some(chunk) = stream.next().await {
///     file.write_all(&chunk?).await?;
/// }
/// ```
pub struct ResultStream {
    inner: Pin<Box<dyn Stream<Item = Result<Bytes>> + Send>>,
}

impl std::fmt::Debug for ResultStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultStream").finish_non_exhaustive()
    }
}

impl ResultStream {
    pub(crate) fn from_response(response: bulkline_http::Response) -> Self {
        Self {
            inner: Box::pin(response.bytes_stream().map_err(Error::from)),
        }
    }

    /// A stream over an in-memory body.
    pub fn from_bytes(body: impl Into<Bytes>) -> Self {
        let body = body.into();
        Self {
            inner: Box::pin(futures::stream::once(async move { Ok(body) })),
        }
    }

    pub async fn into_bytes(self) -> Result<Bytes> {
        let chunks: Vec<Bytes> = self.try_collect().await?;
        if chunks.len() == 1 {
            return Ok(chunks.into_iter().next().unwrap_or_default());
        }
        Ok(chunks.concat().into())
    }

    pub async fn into_text(self) -> Result<String> {
        let body = self.into_bytes().await?;
        String::from_utf8(body.to_vec()).map_err(|e| {
            Error::with_source(ErrorKind::Other("result body is not UTF-8".to_string()), e)
        })
    }

    pub async fn into_result_set(self, delimiter: ColumnDelimiter) -> Result<ResultSet> {
        let body = self.into_bytes().await?;
        ResultSet::parse(&body, delimiter)
    }
}

impl Stream for ResultStream {
    type Item = Result<Bytes>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.as_mut().poll_next(cx)
    }
}

/// A parsed result artifact: the header row plus data rows.
///
/// The header is kept even when no rows follow; a header-only set means
/// "nothing in this category".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultSet {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl ResultSet {
    pub fn parse(data: &[u8], delimiter: ColumnDelimiter) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter.as_byte())
            .has_headers(true)
            .from_reader(data);

        let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
        let rows = reader
            .records()
            .map(|record| record.map(|r| r.iter().map(str::to_string).collect()))
            .collect::<std::result::Result<Vec<Vec<String>>, csv::Error>>()?;

        Ok(Self { headers, rows })
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_header_only(&self) -> bool {
        !self.headers.is_empty() && self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// All values of one column, in row order.
    pub fn column(&self, name: &str) -> Option<Vec<&str>> {
        let index = self.column_index(name)?;
        Some(
            self.rows
                .iter()
                .map(|row| row.get(index).map(String::as_str).unwrap_or_default())
                .collect(),
        )
    }

    pub fn get(&self, row: usize, column: &str) -> Option<&str> {
        let index = self.column_index(column)?;
        self.rows.get(row)?.get(index).map(String::as_str)
    }
}

/// Final state of an ingest run and its three artifacts.
///
/// The artifacts are only fetched for a job that reached `JobComplete`.
#[derive(Debug, Clone)]
pub struct IngestOutcome {
    pub job: IngestJob,
    pub successful: Option<ResultSet>,
    pub failed: Option<ResultSet>,
    pub unprocessed: Option<ResultSet>,
}

impl IngestOutcome {
    pub fn is_success(&self) -> bool {
        self.job.state.is_success()
    }

    pub fn successful_count(&self) -> usize {
        self.successful.as_ref().map_or(0, ResultSet::row_count)
    }

    pub fn failed_count(&self) -> usize {
        self.failed.as_ref().map_or(0, ResultSet::row_count)
    }

    pub fn unprocessed_count(&self) -> usize {
        self.unprocessed.as_ref().map_or(0, ResultSet::row_count)
    }
}

/// Final state of a query run and, on success, every result row as CSV.
#[derive(Debug, Clone)]
pub struct QueryOutcome {
    pub job: QueryJob,
    pub csv: Option<String>,
}

impl QueryOutcome {
    pub fn is_success(&self) -> bool {
        self.job.state.is_success()
    }

    pub fn result_set(&self) -> Result<Option<ResultSet>> {
        self.csv
            .as_deref()
            .map(|csv| ResultSet::parse(csv.as_bytes(), self.job.delimiter()))
            .transpose()
    }
}

/// One page of query results.
#[derive(Debug, Clone)]
pub struct QueryResultsPage {
    pub csv: String,
    /// Locator of the next page; `None` on the last one.
    pub locator: Option<String>,
}

impl QueryResultsPage {
    pub fn is_last(&self) -> bool {
        self.locator.is_none()
    }
}

/// Append a page to accumulated CSV, dropping the header row of every page
/// after the first.
pub(crate) fn append_page(acc: &mut String, page: &str) {
    if acc.is_empty() {
        acc.push_str(page);
        return;
    }
    let body = match page.split_once('\n') {
        Some((_, rest)) => rest,
        None => "",
    };
    if body.is_empty() {
        return;
    }
    if !acc.ends_with('\n') {
        acc.push('\n');
    }
    acc.push_str(body);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_failed_results() {
        let csv = "\"sf__Id\",\"sf__Error\",FirstName,LastName\n\
                   \"\",\"REQUIRED_FIELD_MISSING:Required fields are missing: [LastName]:LastName --\",Jane,\n";
        let set = ResultSet::parse(csv.as_bytes(), ColumnDelimiter::Comma).unwrap();

        assert_eq!(set.headers, vec!["sf__Id", "sf__Error", "FirstName", "LastName"]);
        assert_eq!(set.row_count(), 1);
        assert!(set.get(0, "sf__Error").unwrap().starts_with("REQUIRED_FIELD_MISSING"));
        assert_eq!(set.column("FirstName").unwrap(), vec!["Jane"]);
        assert!(set.column("Email").is_none());
    }

    #[test]
    fn test_header_only_artifact() {
        let set = ResultSet::parse(b"FirstName,LastName\n", ColumnDelimiter::Comma).unwrap();
        assert!(set.is_header_only());
        assert_eq!(set.row_count(), 0);
        assert_eq!(set.headers.len(), 2);

        let empty = ResultSet::parse(b"", ColumnDelimiter::Comma).unwrap();
        assert!(!empty.is_header_only());
        assert!(empty.headers.is_empty());
    }

    #[test]
    fn test_parse_other_delimiter() {
        let set = ResultSet::parse(b"Id|Name\n001|Acme, Inc\n", ColumnDelimiter::Pipe).unwrap();
        assert_eq!(set.get(0, "Name"), Some("Acme, Inc"));
    }

    #[test]
    fn test_ragged_rows_are_csv_errors() {
        let err = ResultSet::parse(b"A,B\n1,2,3\n", ColumnDelimiter::Comma).unwrap_err();
        assert!(matches!(err.kind, ErrorKind::Csv(_)));
    }

    #[tokio::test]
    async fn test_stream_collectors() {
        let stream = ResultStream::from_bytes("Id\n001\n");
        assert_eq!(stream.into_text().await.unwrap(), "Id\n001\n");

        let set = ResultStream::from_bytes("Id\n001\n002\n")
            .into_result_set(ColumnDelimiter::Comma)
            .await
            .unwrap();
        assert_eq!(set.row_count(), 2);
    }

    #[test]
    fn test_append_page_drops_repeated_headers() {
        let mut all = String::new();
        append_page(&mut all, "Id,Name\n001,A\n");
        append_page(&mut all, "Id,Name\n002,B\n");
        append_page(&mut all, "Id,Name\n");
        append_page(&mut all, "Id,Name\r\n003,C\r\n");
        assert_eq!(all, "Id,Name\n001,A\n002,B\n003,C\r\n");
    }
}
