//! Error types for sfdc-bulk.

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

    pub(crate) fn invalid_options(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidOptions(message.into()))
    }

    /// The transport or API error this wraps, if any.
    pub fn client_error(&self) -> Option<&sfdc_client::Error> {
        self.source.as_ref()?.downcast_ref()
    }

    /// True when the options were rejected before any request was sent.
    pub fn is_validation_error(&self) -> bool {
        matches!(self.kind, ErrorKind::InvalidOptions(_))
    }

    /// True for CSV decode failures, including missing reserved columns.
    pub fn is_decode_error(&self) -> bool {
        matches!(
            self.kind,
            ErrorKind::Csv(_) | ErrorKind::MissingColumn(_) | ErrorKind::InvalidBool(_)
        )
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ErrorKind {
    #[error("Invalid options: {0}")]
    InvalidOptions(String),
    #[error("Client error: {0}")]
    Client(String),
    #[error("CSV error: {0}")]
    Csv(String),
    #[error("CSV header is missing the {0} column")]
    MissingColumn(String),
    #[error("CSV value is not a boolean: {0:?}")]
    InvalidBool(String),
    #[error("Upload error: {0}")]
    Upload(String),
    #[error("Job error: {0}")]
    Job(String),
    #[error("IO error: {0}")]
    Io(String),
}

impl From<sfdc_client::Error> for Error {
    fn from(err: sfdc_client::Error) -> Self {
        Error {
            kind: ErrorKind::Client(err.to_string()),
            source: Some(Box::new(err)),
        }
    }
}

impl From<csv::Error> for Error {
    fn from(err: csv::Error) -> Self {
        Error {
            kind: ErrorKind::Csv(err.to_string()),
            source: Some(Box::new(err)),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error {
            kind: ErrorKind::Io(err.to_string()),
            source: Some(Box::new(err)),
        }
    }
}
