//! Error types for sfdc-soql.

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

    pub(crate) fn invalid_query(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidQuery(message.into()))
    }

    /// The transport or API error this wraps, if any.
    pub fn client_error(&self) -> Option<&sfdc_client::Error> {
        self.source.as_ref()?.downcast_ref()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ErrorKind {
    #[error("Client error: {0}")]
    Client(String),
    #[error("Invalid query: {0}")]
    InvalidQuery(String),
}

impl From<sfdc_client::Error> for Error {
    fn from(err: sfdc_client::Error) -> Self {
        Error {
            kind: ErrorKind::Client(err.to_string()),
            source: Some(Box::new(err)),
        }
    }
}
