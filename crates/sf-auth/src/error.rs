//! Error types for sfdc-auth.
//!
//! Error messages are designed to avoid exposing sensitive credential data.

/// Result type alias for sfdc-auth operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for sfdc-auth operations.
///
/// Error messages are sanitized to prevent accidental credential exposure.
#[derive(Debug, thiserror::Error)]
#[error("{kind}")]
pub struct Error {
    /// The kind of error that occurred.
    pub kind: ErrorKind,
    /// Optional source error.
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl Error {
    /// Create a new error with the given kind.
    pub fn new(kind: ErrorKind) -> Self {
        Self { kind, source: None }
    }

    /// Create a new error with the given kind and source.
    pub fn with_source(
        kind: ErrorKind,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            source: Some(Box::new(source)),
        }
    }

    pub(crate) fn invalid_credentials(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidCredentials(message.into()))
    }
}

/// The kind of error that occurred.
///
/// Error messages avoid including credential values.
#[derive(Debug, thiserror::Error)]
pub enum ErrorKind {
    /// OAuth error response from Salesforce.
    #[error("OAuth error: {error} - {description}")]
    OAuth { error: String, description: String },

    /// A required credential field is missing.
    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),

    /// The session has not obtained an access token yet.
    #[error("Not authenticated: {0}")]
    NotAuthenticated(String),

    /// HTTP error during authentication.
    #[error("HTTP error: {0}")]
    Http(String),

    /// JSON error.
    #[error("JSON error: {0}")]
    Json(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Environment variable not set.
    #[error("Environment variable not set: {0}")]
    EnvVar(String),

    /// Other error.
    #[error("{0}")]
    Other(String),
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        // Token endpoints echo form fields in some failures; keep them out of messages.
        let message = err.to_string();
        let sanitized = if message.contains("access_token") || message.contains("token=") {
            "HTTP request failed (details redacted for security)".to_string()
        } else {
            message
        };
        Error::with_source(ErrorKind::Http(sanitized), err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::with_source(ErrorKind::Json(err.to_string()), err)
    }
}

impl From<serde_urlencoded::ser::Error> for Error {
    fn from(err: serde_urlencoded::ser::Error) -> Self {
        Error::with_source(ErrorKind::Serialization(err.to_string()), err)
    }
}

impl From<sfdc_client::Error> for Error {
    fn from(err: sfdc_client::Error) -> Self {
        Error::with_source(ErrorKind::Http(err.kind.to_string()), err)
    }
}

/// Sessions surface auth failures through the client error type.
impl From<Error> for sfdc_client::Error {
    fn from(err: Error) -> Self {
        let kind = match &err.kind {
            ErrorKind::OAuth { .. } | ErrorKind::NotAuthenticated(_) => {
                sfdc_client::ErrorKind::Authentication(err.kind.to_string())
            }
            ErrorKind::InvalidCredentials(_) | ErrorKind::EnvVar(_) => {
                sfdc_client::ErrorKind::Config(err.kind.to_string())
            }
            _ => sfdc_client::ErrorKind::Other(err.kind.to_string()),
        };
        sfdc_client::Error::with_source(kind, err)
    }
}
