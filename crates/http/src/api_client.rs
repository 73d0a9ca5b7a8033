//! Authenticated client bound to one Salesforce org.
//!
//! ## Security
//!
//! - Access tokens are redacted in Debug output
//! - Request bodies are skipped in tracing spans

use serde::{de::DeserializeOwned, Serialize};
use tracing::instrument;

use crate::client::HttpClient;
use crate::config::ClientConfig;
use crate::error::{Error, ErrorKind, Result};
use crate::request::RequestBuilder;
use crate::response::Response;
use crate::DEFAULT_API_VERSION;

/// Salesforce API client bound to an instance URL, access token and API
/// version.
///
/// # Example
///
/// ```rust,ignore
/// use bulkline_http::ApiClient;
///
/// let client = ApiClient::new("https://na1.salesforce.com", "token")?
///     .with_api_version("59.0");
///
/// assert_eq!(
///     client.jobs_url("ingest"),
///     "https://na1.salesforce.com/services/data/v59.0/jobs/ingest",
/// );
/// ```
#[derive(Clone)]
pub struct ApiClient {
    http: HttpClient,
    instance_url: String,
    access_token: String,
    api_version: String,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("instance_url", &self.instance_url)
            .field("access_token", &"[REDACTED]")
            .field("api_version", &self.api_version)
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Create a new client with the given instance URL and access token.
    pub fn new(instance_url: impl Into<String>, access_token: impl Into<String>) -> Result<Self> {
        Self::with_config(instance_url, access_token, ClientConfig::default())
    }

    /// Create a new client with custom configuration.
    ///
    /// The instance URL must be an absolute http(s) URL.
    pub fn with_config(
        instance_url: impl Into<String>,
        access_token: impl Into<String>,
        config: ClientConfig,
    ) -> Result<Self> {
        let instance_url = instance_url.into().trim_end_matches('/').to_string();
        let parsed = url::Url::parse(&instance_url)?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(Error::new(ErrorKind::InvalidUrl(format!(
                "instance URL must be http or https, got {}",
                parsed.scheme()
            ))));
        }

        let access_token = access_token.into();
        if access_token.trim().is_empty() {
            return Err(Error::new(ErrorKind::Config(
                "access token must not be empty".to_string(),
            )));
        }

        let http = HttpClient::new(config)?;
        Ok(Self {
            http,
            instance_url,
            access_token,
            api_version: DEFAULT_API_VERSION.to_string(),
        })
    }

    /// Set the API version (e.g., "62.0"). A leading `v` is tolerated.
    pub fn with_api_version(mut self, version: impl Into<String>) -> Self {
        let version = version.into();
        self.api_version = version.trim_start_matches(['v', 'V']).to_string();
        self
    }

    /// Get the instance URL.
    pub fn instance_url(&self) -> &str {
        &self.instance_url
    }

    /// Get the access token.
    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    /// Get the API version.
    pub fn api_version(&self) -> &str {
        &self.api_version
    }

    /// Get the underlying HTTP client.
    pub fn http(&self) -> &HttpClient {
        &self.http
    }

    /// Build the full URL for a path.
    ///
    /// Paths are joined to the instance URL. Bulk API list pages return
    /// `nextRecordsUrl` as an instance-relative path, which this resolves.
    /// Absolute URLs on the instance origin pass through; any other origin
    /// has its path and query rebased onto the instance so the bearer token
    /// is only ever sent to the org it belongs to.
    pub fn url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            match url::Url::parse(path) {
                Ok(absolute) if self.is_instance_origin(&absolute) => path.to_string(),
                Ok(absolute) => {
                    let rebased = match absolute.query() {
                        Some(query) => format!("{}?{}", absolute.path(), query),
                        None => absolute.path().to_string(),
                    };
                    format!("{}{}", self.instance_url, rebased)
                }
                Err(_) => format!("{}/{}", self.instance_url, path),
            }
        } else if path.starts_with('/') {
            format!("{}{}", self.instance_url, path)
        } else {
            format!("{}/{}", self.instance_url, path)
        }
    }

    fn is_instance_origin(&self, candidate: &url::Url) -> bool {
        url::Url::parse(&self.instance_url)
            .map(|instance| instance.origin() == candidate.origin())
            .unwrap_or(false)
    }

    /// Build the Bulk API 2.0 URL for a path below `/jobs`.
    ///
    /// Example: `jobs_url("ingest")` -> `/services/data/v62.0/jobs/ingest`
    pub fn jobs_url(&self, path: &str) -> String {
        let path = path.trim_start_matches('/');
        format!(
            "{}/services/data/v{}/jobs/{}",
            self.instance_url, self.api_version, path
        )
    }

    /// Create a GET request builder with authentication.
    pub fn get(&self, url: &str) -> RequestBuilder {
        self.http.get(self.url(url)).bearer_auth(&self.access_token)
    }

    /// Create a POST request builder with authentication.
    pub fn post(&self, url: &str) -> RequestBuilder {
        self.http.post(self.url(url)).bearer_auth(&self.access_token)
    }

    /// Create a PATCH request builder with authentication.
    pub fn patch(&self, url: &str) -> RequestBuilder {
        self.http.patch(self.url(url)).bearer_auth(&self.access_token)
    }

    /// Create a PUT request builder with authentication.
    pub fn put(&self, url: &str) -> RequestBuilder {
        self.http.put(self.url(url)).bearer_auth(&self.access_token)
    }

    /// Create a DELETE request builder with authentication.
    pub fn delete(&self, url: &str) -> RequestBuilder {
        self.http.delete(self.url(url)).bearer_auth(&self.access_token)
    }

    /// Execute a request and return the raw response.
    pub async fn execute(&self, request: RequestBuilder) -> Result<Response> {
        self.http.execute(request).await
    }

    /// GET request with JSON response deserialization.
    #[instrument(skip(self), fields(url = %url))]
    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        self.http.send_json(self.get(url)).await
    }

    /// POST request with JSON body and response.
    #[instrument(skip(self, body), fields(url = %url))]
    pub async fn post_json<T: DeserializeOwned, B: Serialize>(
        &self,
        url: &str,
        body: &B,
    ) -> Result<T> {
        self.http.send_json(self.post(url).json(body)?).await
    }

    /// PATCH request with JSON body and response.
    #[instrument(skip(self, body), fields(url = %url))]
    pub async fn patch_json<T: DeserializeOwned, B: Serialize>(
        &self,
        url: &str,
        body: &B,
    ) -> Result<T> {
        self.http.send_json(self.patch(url).json(body)?).await
    }

    /// DELETE request. Any 2xx (normally 204) is success.
    #[instrument(skip(self), fields(url = %url))]
    pub async fn delete_request(&self, url: &str) -> Result<()> {
        self.http.execute(self.delete(url)).await?;
        Ok(())
    }
}
