//! Credentials trait and implementations.
//!
//! All credential types implement custom Debug to redact the access token.

use tracing::debug;

use crate::error::{Error, ErrorKind, Result};

/// Environment variables consulted for ambient credentials, in priority
/// order per setting.
pub const INSTANCE_URL_VARS: &[&str] = &["SF_INSTANCE_URL", "SALESFORCE_INSTANCE_URL"];
/// See [`INSTANCE_URL_VARS`].
pub const ACCESS_TOKEN_VARS: &[&str] = &["SF_ACCESS_TOKEN", "SALESFORCE_ACCESS_TOKEN"];
/// See [`INSTANCE_URL_VARS`].
pub const API_VERSION_VARS: &[&str] = &["SF_API_VERSION", "SALESFORCE_API_VERSION"];

/// Trait for Salesforce credentials.
pub trait Credentials: Send + Sync {
    /// Get the Salesforce instance URL.
    fn instance_url(&self) -> &str;

    /// Get the access token.
    fn access_token(&self) -> &str;

    /// Get the API version (e.g., "62.0").
    fn api_version(&self) -> &str;

    /// Returns true if the credentials appear to be valid (non-empty).
    fn is_valid(&self) -> bool {
        !self.instance_url().is_empty() && !self.access_token().is_empty()
    }
}

/// Standard Salesforce credentials: an instance URL, a ready-to-use access
/// token and an API version.
///
/// The access token is redacted in Debug output.
#[derive(Clone)]
pub struct SalesforceCredentials {
    instance_url: String,
    access_token: String,
    api_version: String,
}

impl std::fmt::Debug for SalesforceCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SalesforceCredentials")
            .field("instance_url", &self.instance_url)
            .field("access_token", &"[REDACTED]")
            .field("api_version", &self.api_version)
            .finish()
    }
}

impl SalesforceCredentials {
    /// Create new credentials with the given values.
    pub fn new(
        instance_url: impl Into<String>,
        access_token: impl Into<String>,
        api_version: impl Into<String>,
    ) -> Self {
        Self {
            instance_url: instance_url.into(),
            access_token: access_token.into(),
            api_version: api_version.into(),
        }
    }

    /// Set a new access token (e.g., after the caller refreshed it).
    pub fn set_access_token(&mut self, token: impl Into<String>) {
        self.access_token = token.into();
    }

    /// Load credentials from environment variables.
    ///
    /// Required environment variables:
    /// - `SF_INSTANCE_URL` or `SALESFORCE_INSTANCE_URL`
    /// - `SF_ACCESS_TOKEN` or `SALESFORCE_ACCESS_TOKEN`
    ///
    /// Optional:
    /// - `SF_API_VERSION` or `SALESFORCE_API_VERSION` (default: "62.0")
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load credentials through an arbitrary key lookup, using the same
    /// variable names as [`from_env`](Self::from_env).
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let first = |keys: &[&str]| {
            keys.iter()
                .filter_map(|key| lookup(key))
                .find(|value| !value.trim().is_empty())
        };

        let instance_url = first(INSTANCE_URL_VARS)
            .ok_or_else(|| Error::new(ErrorKind::EnvVar(INSTANCE_URL_VARS[0].to_string())))?;
        let access_token = first(ACCESS_TOKEN_VARS)
            .ok_or_else(|| Error::new(ErrorKind::EnvVar(ACCESS_TOKEN_VARS[0].to_string())))?;
        let api_version = first(API_VERSION_VARS)
            .unwrap_or_else(|| bulkline_http::DEFAULT_API_VERSION.to_string());

        let creds = Self::new(instance_url.trim(), access_token.trim(), api_version.trim());
        creds.validate()?;
        debug!(instance_url = %creds.instance_url, "Loaded credentials from environment");
        Ok(creds)
    }

    /// Check that the credentials are complete and the instance URL parses.
    pub fn validate(&self) -> Result<()> {
        if !self.is_valid() {
            return Err(Error::new(ErrorKind::InvalidCredentials(
                "instance URL and access token are required".to_string(),
            )));
        }
        url::Url::parse(&self.instance_url)?;
        Ok(())
    }
}

impl Credentials for SalesforceCredentials {
    fn instance_url(&self) -> &str {
        &self.instance_url
    }

    fn access_token(&self) -> &str {
        &self.access_token
    }

    fn api_version(&self) -> &str {
        &self.api_version
    }
}

/// Where a client gets its credentials from.
#[derive(Debug, Clone, Default)]
pub enum CredentialSource {
    /// Credentials supplied explicitly by the caller.
    Static(SalesforceCredentials),
    /// Credentials read from the process environment when resolved.
    #[default]
    Ambient,
}

impl CredentialSource {
    /// Resolve to concrete credentials.
    pub fn resolve(&self) -> Result<SalesforceCredentials> {
        match self {
            CredentialSource::Static(creds) => {
                creds.validate()?;
                Ok(creds.clone())
            }
            CredentialSource::Ambient => SalesforceCredentials::from_env(),
        }
    }
}

impl From<SalesforceCredentials> for CredentialSource {
    fn from(creds: SalesforceCredentials) -> Self {
        CredentialSource::Static(creds)
    }
}
