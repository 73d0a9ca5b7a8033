//! # bulkline-auth
//!
//! Credential resolution for the bulkline clients.
//!
//! Credentials are either supplied explicitly ([`CredentialSource::Static`])
//! or picked up from the process environment ([`CredentialSource::Ambient`]).
//! Token acquisition (OAuth flows) is out of scope: the access token is
//! expected to be ready for use.
//!
//! ## Security
//!
//! - Access tokens are redacted in Debug output
//! - Error messages name the missing variable, never its value
//!
//! ## Example
//!
//! ```rust,ignore
//! use bulkline_auth::{CredentialSource, Credentials};
//!
//! let creds = CredentialSource::Ambient.resolve()?;
//! println!("org: {}", creds.instance_url());
//! ```

mod credentials;
mod error;

pub use credentials::{
    CredentialSource, Credentials, SalesforceCredentials, ACCESS_TOKEN_VARS, API_VERSION_VARS,
    INSTANCE_URL_VARS,
};
pub use error::{Error, ErrorKind, Result};
