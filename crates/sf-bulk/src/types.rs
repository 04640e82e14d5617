//! Enumerations and list types shared by the Bulk API 1.0 and 2.0 jobs.

use serde::{Deserialize, Deserializer, Serialize};

/// Deserialize API version that can be either a float (59.0) or string ("59.0").
pub(crate) fn deserialize_api_version<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum ApiVersion {
        Float(f64),
        String(String),
    }

    Option::<ApiVersion>::deserialize(deserializer).map(|opt| {
        opt.map(|v| match v {
            ApiVersion::Float(f) => format!("{:.1}", f),
            ApiVersion::String(s) => s,
        })
    })
}

/// Column delimiter of a job's CSV payloads and results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum ColumnDelimiter {
    Backquote,
    Caret,
    #[default]
    Comma,
    Pipe,
    Semicolon,
    Tab,
}

impl ColumnDelimiter {
    /// Resolve a symbolic name such as `PIPE`. Unknown or empty names fall
    /// back to [`ColumnDelimiter::Comma`].
    pub fn from_api_name(name: &str) -> Self {
        match name {
            "BACKQUOTE" => ColumnDelimiter::Backquote,
            "CARET" => ColumnDelimiter::Caret,
            "PIPE" => ColumnDelimiter::Pipe,
            "SEMICOLON" => ColumnDelimiter::Semicolon,
            "TAB" => ColumnDelimiter::Tab,
            _ => ColumnDelimiter::Comma,
        }
    }

    /// Get the API string for this delimiter.
    pub fn api_name(&self) -> &'static str {
        match self {
            ColumnDelimiter::Backquote => "BACKQUOTE",
            ColumnDelimiter::Caret => "CARET",
            ColumnDelimiter::Comma => "COMMA",
            ColumnDelimiter::Pipe => "PIPE",
            ColumnDelimiter::Semicolon => "SEMICOLON",
            ColumnDelimiter::Tab => "TAB",
        }
    }

    /// Get the actual delimiter character.
    pub fn char(&self) -> char {
        match self {
            ColumnDelimiter::Backquote => '`',
            ColumnDelimiter::Caret => '^',
            ColumnDelimiter::Comma => ',',
            ColumnDelimiter::Pipe => '|',
            ColumnDelimiter::Semicolon => ';',
            ColumnDelimiter::Tab => '\t',
        }
    }

    /// The delimiter as the single byte the CSV reader expects.
    pub fn byte(&self) -> u8 {
        // Every delimiter is ASCII.
        self.char() as u8
    }
}

impl<'de> Deserialize<'de> for ColumnDelimiter {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = Option::<String>::deserialize(deserializer)?;
        Ok(name
            .as_deref()
            .map(ColumnDelimiter::from_api_name)
            .unwrap_or_default())
    }
}

/// Line ending style for Bulk API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum LineEnding {
    /// Unix-style (LF)
    #[default]
    #[serde(rename = "LF")]
    Lf,
    /// Windows-style (CRLF)
    #[serde(rename = "CRLF")]
    Crlf,
}

impl LineEnding {
    pub fn api_name(&self) -> &'static str {
        match self {
            LineEnding::Lf => "LF",
            LineEnding::Crlf => "CRLF",
        }
    }
}

/// Content type of Bulk API 2.0 payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ContentType {
    #[default]
    #[serde(rename = "CSV")]
    Csv,
}

/// Ingest operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Operation {
    /// Insert new records
    Insert,
    /// Delete records (soft delete)
    Delete,
    /// Hard delete records (permanent)
    HardDelete,
    /// Update existing records
    Update,
    /// Upsert based on external ID
    Upsert,
}

impl Operation {
    /// Get the API string for this operation.
    pub fn api_name(&self) -> &'static str {
        match self {
            Operation::Insert => "insert",
            Operation::Delete => "delete",
            Operation::HardDelete => "hardDelete",
            Operation::Update => "update",
            Operation::Upsert => "upsert",
        }
    }
}

/// Query job operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum QueryOperation {
    #[default]
    Query,
    /// Includes deleted and archived records.
    QueryAll,
}

/// Bulk API 2.0 job states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobState {
    /// Job is open and accepting data
    Open,
    /// Upload is complete, job is ready for processing
    UploadComplete,
    /// Job is processing
    InProgress,
    /// Job was aborted
    Aborted,
    /// Job completed successfully
    JobComplete,
    /// Job failed
    Failed,
}

impl JobState {
    /// Check if job is in a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobState::Aborted | JobState::JobComplete | JobState::Failed
        )
    }

    /// Check if job completed successfully.
    pub fn is_success(&self) -> bool {
        matches!(self, JobState::JobComplete)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobType {
    BigObjectIngest,
    Classic,
    V2Ingest,
    V2Query,
}

impl JobType {
    pub fn api_name(&self) -> &'static str {
        match self {
            JobType::BigObjectIngest => "BigObjectIngest",
            JobType::Classic => "Classic",
            JobType::V2Ingest => "V2Ingest",
            JobType::V2Query => "V2Query",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConcurrencyMode {
    Parallel,
    Serial,
}

impl ConcurrencyMode {
    pub fn api_name(&self) -> &'static str {
        match self {
            ConcurrencyMode::Parallel => "Parallel",
            ConcurrencyMode::Serial => "Serial",
        }
    }
}

/// Filters for listing jobs. Unset filters are omitted from the request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobListParameters {
    pub is_pk_chunking_enabled: Option<bool>,
    pub job_type: Option<JobType>,
    pub concurrency_mode: Option<ConcurrencyMode>,
    /// Opaque cursor from a previous listing.
    pub query_locator: Option<String>,
}

impl JobListParameters {
    pub(crate) fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(enabled) = self.is_pk_chunking_enabled {
            pairs.push(("isPkChunkingEnabled", enabled.to_string()));
        }
        if let Some(job_type) = self.job_type {
            pairs.push(("jobType", job_type.api_name().to_string()));
        }
        if let Some(mode) = self.concurrency_mode {
            pairs.push(("concurrencyMode", mode.api_name().to_string()));
        }
        if let Some(locator) = &self.query_locator {
            pairs.push(("queryLocator", locator.clone()));
        }
        pairs
    }
}

/// One page of a job listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobList<T> {
    pub done: bool,
    #[serde(default = "Vec::new")]
    pub records: Vec<T>,
    /// Relative URL of the next page, absent on the last one.
    #[serde(default)]
    pub next_records_url: Option<String>,
}
