//! Error types for bulkline-jobs.
//!
//! Every failure that came back from the remote service carries its HTTP
//! status code, available through [`Error::status`].

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
#[error("{kind}")]
pub struct Error {
    pub kind: ErrorKind,
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl Error {
    pub fn new(kind: ErrorKind) -> Self {
        Self { kind, source: None }
    }

    pub fn with_source(
        kind: ErrorKind,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            source: Some(Box::new(source)),
        }
    }

    /// Remote HTTP status code, when the error came from a response.
    pub fn status(&self) -> Option<u16> {
        match &self.kind {
            ErrorKind::NotFound(_) => Some(404),
            ErrorKind::InvalidRequest { status, .. } | ErrorKind::Auth { status, .. } => *status,
            ErrorKind::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns true when the job (or other resource) does not exist,
    /// e.g. after it was deleted.
    pub fn is_not_found(&self) -> bool {
        matches!(self.kind, ErrorKind::NotFound(_))
    }

    pub(crate) fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidRequest {
            status: None,
            message: message.into(),
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ErrorKind {
    /// HTTP 404: the job id does not exist or the job was deleted.
    #[error("Not found: {0}")]
    NotFound(String),
    /// HTTP 400, or a job specification rejected before sending.
    #[error("Invalid request: {message}")]
    InvalidRequest { status: Option<u16>, message: String },
    /// HTTP 401/403.
    #[error("Auth error: {message}")]
    Auth { status: Option<u16>, message: String },
    /// Any other non-success response.
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },
    /// No response was received (connect failure, request timeout).
    #[error("Transport error: {0}")]
    Transport(String),
    #[error("CSV error: {0}")]
    Csv(String),
    /// A caller-configured polling deadline passed.
    #[error("Timeout: {0}")]
    Timeout(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("{0}")]
    Other(String),
}

impl From<bulkline_http::Error> for Error {
    fn from(err: bulkline_http::Error) -> Self {
        use bulkline_http::ErrorKind as Http;

        let message = err.kind.to_string();
        let kind = match (err.status(), &err.kind) {
            (Some(404), _) => ErrorKind::NotFound(message),
            (Some(400), _) => ErrorKind::InvalidRequest {
                status: Some(400),
                message,
            },
            (Some(status @ (401 | 403)), _) => ErrorKind::Auth {
                status: Some(status),
                message,
            },
            (Some(status), _) => ErrorKind::Api { status, message },
            (None, Http::Timeout | Http::Connection(_)) => ErrorKind::Transport(message),
            (None, Http::Config(_) | Http::InvalidUrl(_)) => ErrorKind::Config(message),
            (None, _) => ErrorKind::Other(message),
        };
        Error::with_source(kind, err)
    }
}

impl From<bulkline_auth::Error> for Error {
    fn from(err: bulkline_auth::Error) -> Self {
        Error::with_source(ErrorKind::Config(err.to_string()), err)
    }
}

impl From<csv::Error> for Error {
    fn from(err: csv::Error) -> Self {
        Error::with_source(ErrorKind::Csv(err.to_string()), err)
    }
}
