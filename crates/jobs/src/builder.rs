//! Step-by-step construction of a [`BulkClient`].

use std::time::Duration;

use bulkline_auth::{CredentialSource, Credentials, SalesforceCredentials};
use bulkline_http::{ApiClient, ClientConfig, ProxyConfig, DEFAULT_API_VERSION};
use tracing::{debug, warn};

use crate::client::BulkClient;
use crate::error::Result;
use crate::poll::PollConfig;

/// Builder for [`BulkClient`].
///
/// Every setting is optional. [`build`](Self::build) resolves them in a
/// fixed order:
///
/// 1. credentials (explicit, or from the environment when none were given)
/// 2. instance URL override
/// 3. API version: explicit, then the credentials' version, then the default
/// 4. proxy, only when both host and port are set
/// 5. HTTP client settings
/// 6. polling settings
///
/// ```rust,ignore
/// let client = BulkClient::builder()
///     .credentials(SalesforceCredentials::new(url, token, "62.0"))
///     .proxy_host("proxy.corp.example")
///     .proxy_port(3128)
///     .poll_interval(Duration::from_secs(5))
///     .build()?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct BulkClientBuilder {
    credentials: CredentialSource,
    instance_url: Option<String>,
    api_version: Option<String>,
    proxy: ProxyConfig,
    http: Option<ClientConfig>,
    timeout: Option<Duration>,
    poll: PollConfig,
}

impl BulkClientBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use these credentials instead of reading the environment.
    pub fn credentials(mut self, credentials: SalesforceCredentials) -> Self {
        self.credentials = CredentialSource::Static(credentials);
        self
    }

    pub fn credential_source(mut self, source: CredentialSource) -> Self {
        self.credentials = source;
        self
    }

    /// Talk to this instance regardless of what the credentials say.
    pub fn instance_url(mut self, url: impl Into<String>) -> Self {
        self.instance_url = Some(url.into());
        self
    }

    pub fn api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = Some(version.into());
        self
    }

    pub fn proxy_host(mut self, host: impl Into<String>) -> Self {
        self.proxy.host = Some(host.into());
        self
    }

    pub fn proxy_port(mut self, port: u16) -> Self {
        self.proxy.port = Some(port);
        self
    }

    pub fn proxy_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.proxy.username = Some(username.into());
        self.proxy.password = Some(password.into());
        self
    }

    /// Base HTTP settings. A proxy set on the builder replaces the one in
    /// this config.
    pub fn http_config(mut self, config: ClientConfig) -> Self {
        self.http = Some(config);
        self
    }

    /// Overall per-request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll.interval = interval;
        self
    }

    pub fn poll_timeout(mut self, timeout: Duration) -> Self {
        self.poll.timeout = Some(timeout);
        self
    }

    pub fn build(self) -> Result<BulkClient> {
        let credentials = self.credentials.resolve()?;

        let instance_url = self
            .instance_url
            .unwrap_or_else(|| credentials.instance_url().to_string());

        let api_version = self
            .api_version
            .filter(|v| !v.trim().is_empty())
            .or_else(|| {
                Some(credentials.api_version().to_string()).filter(|v| !v.trim().is_empty())
            })
            .unwrap_or_else(|| DEFAULT_API_VERSION.to_string());

        let mut config = self.http.unwrap_or_default();
        if self.proxy.endpoint().is_some() {
            config.proxy = Some(self.proxy);
        } else if self.proxy.is_partial() {
            warn!(
                host = ?self.proxy.host,
                port = ?self.proxy.port,
                "Proxy needs both host and port; ignoring partial proxy settings"
            );
        }
        if let Some(timeout) = self.timeout {
            config.timeout = timeout;
        }

        let client = ApiClient::with_config(instance_url, credentials.access_token(), config)?
            .with_api_version(api_version);
        debug!(
            instance_url = %client.instance_url(),
            api_version = %client.api_version(),
            "Built bulk client"
        );

        Ok(BulkClient::from_client(client).with_poll_config(self.poll))
    }
}
