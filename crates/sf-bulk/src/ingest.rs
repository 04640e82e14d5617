//! Bulk API 2.0 ingest jobs.
//!
//! A job is created with [`IngestResource::create_job`], receives one CSV
//! payload through [`IngestJob::upload`] and is closed to start processing.
//! Nothing polls on its own: call [`IngestJob::info`] at whatever cadence
//! suits the caller until the state is terminal, then fetch the results.

use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use sfdc_client::Session;
use tracing::{info, instrument};

use crate::error::{Error, Result};
use crate::http;
use crate::results::{self, FailedRecord, SuccessfulRecord, UnprocessedRecord};
use crate::types::{
    deserialize_api_version, ColumnDelimiter, ConcurrencyMode, ContentType, JobList,
    JobListParameters, JobState, JobType, LineEnding, Operation,
};

/// Options for a new ingest job.
///
/// `object` and `operation` are required, as is `external_id_field_name`
/// for upserts. Unset format options default to CSV, LF and comma.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignment_rule_id: Option<String>,
    pub column_delimiter: Option<ColumnDelimiter>,
    pub content_type: Option<ContentType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_id_field_name: Option<String>,
    pub line_ending: Option<LineEnding>,
    pub object: String,
    pub operation: Option<Operation>,
}

impl IngestOptions {
    pub fn new(object: impl Into<String>, operation: Operation) -> Self {
        Self {
            object: object.into(),
            operation: Some(operation),
            ..Default::default()
        }
    }

    /// Set the external ID field for upsert operations.
    pub fn with_external_id_field(mut self, field: impl Into<String>) -> Self {
        self.external_id_field_name = Some(field.into());
        self
    }

    pub fn with_column_delimiter(mut self, delimiter: ColumnDelimiter) -> Self {
        self.column_delimiter = Some(delimiter);
        self
    }

    pub fn with_line_ending(mut self, line_ending: LineEnding) -> Self {
        self.line_ending = Some(line_ending);
        self
    }

    pub fn with_assignment_rule(mut self, rule_id: impl Into<String>) -> Self {
        self.assignment_rule_id = Some(rule_id.into());
        self
    }

    /// Check required fields and fill in defaults for the unset ones.
    pub(crate) fn validated(mut self) -> Result<Self> {
        let Some(operation) = self.operation else {
            return Err(Error::invalid_options("bulk job: operation is required"));
        };
        if operation == Operation::Upsert && is_blank(&self.external_id_field_name) {
            return Err(Error::invalid_options(
                "bulk job: external id field name is required for upsert operation",
            ));
        }
        if self.object.trim().is_empty() {
            return Err(Error::invalid_options("bulk job: object is required"));
        }

        self.line_ending.get_or_insert(LineEnding::Lf);
        self.content_type.get_or_insert(ContentType::Csv);
        self.column_delimiter.get_or_insert(ColumnDelimiter::Comma);
        Ok(self)
    }
}

pub(crate) fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().is_none_or(|v| v.trim().is_empty())
}

/// Job record as returned by create, close and abort.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestJobResponse {
    pub id: String,
    pub state: JobState,
    #[serde(default)]
    pub object: Option<String>,
    #[serde(default)]
    pub operation: Option<Operation>,
    #[serde(default)]
    pub column_delimiter: ColumnDelimiter,
    #[serde(default)]
    pub content_type: Option<ContentType>,
    #[serde(default)]
    pub line_ending: Option<LineEnding>,
    #[serde(default)]
    pub external_id_field_name: Option<String>,
    #[serde(default)]
    pub job_type: Option<JobType>,
    #[serde(default)]
    pub concurrency_mode: Option<ConcurrencyMode>,
    /// Relative URL the payload is uploaded to.
    #[serde(default)]
    pub content_url: Option<String>,
    #[serde(default, deserialize_with = "deserialize_api_version")]
    pub api_version: Option<String>,
    #[serde(default)]
    pub created_by_id: Option<String>,
    #[serde(default)]
    pub created_date: Option<String>,
    #[serde(default)]
    pub system_modstamp: Option<String>,
}

/// Job record plus processing counters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestJobInfo {
    #[serde(flatten)]
    pub job: IngestJobResponse,
    #[serde(default)]
    pub number_records_processed: u64,
    #[serde(default)]
    pub number_records_failed: u64,
    #[serde(default)]
    pub retries: u64,
    /// Milliseconds.
    #[serde(default)]
    pub total_processing_time: u64,
    #[serde(default)]
    pub api_active_processing_time: u64,
    #[serde(default)]
    pub apex_processing_time: u64,
    #[serde(default)]
    pub error_message: Option<String>,
}

/// Handle to one ingest job, holding the last job record the server sent.
#[derive(Debug)]
pub struct IngestJob<S> {
    session: Arc<S>,
    response: IngestJobResponse,
}

impl<S: Session> IngestJob<S> {
    fn url(&self) -> String {
        http::join(&ingest_url(self.session.as_ref()), &self.response.id)
    }

    pub fn id(&self) -> &str {
        &self.response.id
    }

    /// Last job record received from the server.
    pub fn response(&self) -> &IngestJobResponse {
        &self.response
    }

    pub fn state(&self) -> JobState {
        self.response.state
    }

    /// Delimiter the job declared, used when parsing its results.
    pub fn delimiter(&self) -> ColumnDelimiter {
        self.response.column_delimiter
    }

    /// Upload the job's CSV payload. The server must answer `201 Created`.
    #[instrument(skip(self, data), fields(job_id = %self.response.id))]
    pub async fn upload(&self, data: impl Into<Bytes>) -> Result<()> {
        let data = data.into();
        let url = format!("{}/batches", self.url());
        let request = self.session.put(&url)?.csv(data);

        let response = self.session.execute(request).await?;
        http::expect_created(&response)
    }

    /// Fetch current state and counters, replacing the stored job record.
    #[instrument(skip(self), fields(job_id = %self.response.id))]
    pub async fn info(&mut self) -> Result<IngestJobInfo> {
        let request = self.session.get(&self.url())?;
        let info: IngestJobInfo = http::fetch_json(self.session.as_ref(), request).await?;
        self.response = info.job.clone();
        Ok(info)
    }

    /// Mark the upload complete so processing can start.
    pub async fn close(&mut self) -> Result<IngestJobResponse> {
        self.set_state("UploadComplete").await
    }

    pub async fn abort(&mut self) -> Result<IngestJobResponse> {
        self.set_state("Aborted").await
    }

    #[instrument(skip(self), fields(job_id = %self.response.id))]
    async fn set_state(&mut self, state: &str) -> Result<IngestJobResponse> {
        let request = self.session.patch(&self.url())?;
        let response: IngestJobResponse =
            http::request_state(self.session.as_ref(), request, state).await?;
        info!(job_id = %response.id, state = ?response.state, "Ingest job state changed");
        self.response = response.clone();
        Ok(response)
    }

    /// Delete the job. Anything but `204 No Content` is an error.
    #[instrument(skip(self), fields(job_id = %self.response.id))]
    pub async fn delete(&self) -> Result<()> {
        http::delete(self.session.as_ref(), &self.url()).await
    }

    async fn results(&self, endpoint: &str) -> Result<sfdc_client::Response> {
        let url = format!("{}/{}/", self.url(), endpoint);
        http::fetch_csv(self.session.as_ref(), self.session.get(&url)?).await
    }

    async fn results_body(&self, endpoint: &str) -> Result<Bytes> {
        Ok(self.results(endpoint).await?.bytes().await?)
    }

    #[instrument(skip(self), fields(job_id = %self.response.id))]
    pub async fn successful_records(&self) -> Result<Vec<SuccessfulRecord>> {
        let body = self.results_body(SUCCESSFUL_RESULTS).await?;
        self.parse_successful_results(body.as_ref())
    }

    #[instrument(skip(self), fields(job_id = %self.response.id))]
    pub async fn failed_records(&self) -> Result<Vec<FailedRecord>> {
        let body = self.results_body(FAILED_RESULTS).await?;
        self.parse_failed_results(body.as_ref())
    }

    #[instrument(skip(self), fields(job_id = %self.response.id))]
    pub async fn unprocessed_records(&self) -> Result<Vec<UnprocessedRecord>> {
        let body = self.results_body(UNPROCESSED_RECORDS).await?;
        self.parse_unprocessed_records(body.as_ref())
    }

    /// Write the raw successful-results CSV to `path`, returning the byte count.
    pub async fn export_successful_results(&self, path: impl AsRef<Path>) -> Result<u64> {
        http::export(self.results(SUCCESSFUL_RESULTS).await?, path.as_ref()).await
    }

    pub async fn export_failed_results(&self, path: impl AsRef<Path>) -> Result<u64> {
        http::export(self.results(FAILED_RESULTS).await?, path.as_ref()).await
    }

    pub async fn export_unprocessed_records(&self, path: impl AsRef<Path>) -> Result<u64> {
        http::export(self.results(UNPROCESSED_RECORDS).await?, path.as_ref()).await
    }

    /// Parse a file written by [`export_successful_results`](Self::export_successful_results).
    pub fn read_successful_results(&self, path: impl AsRef<Path>) -> Result<Vec<SuccessfulRecord>> {
        self.parse_successful_results(File::open(path)?)
    }

    pub fn read_failed_results(&self, path: impl AsRef<Path>) -> Result<Vec<FailedRecord>> {
        self.parse_failed_results(File::open(path)?)
    }

    pub fn read_unprocessed_records(&self, path: impl AsRef<Path>) -> Result<Vec<UnprocessedRecord>> {
        self.parse_unprocessed_records(File::open(path)?)
    }

    pub fn parse_successful_results(&self, reader: impl Read) -> Result<Vec<SuccessfulRecord>> {
        results::parse_successful(reader, self.delimiter())
    }

    pub fn parse_failed_results(&self, reader: impl Read) -> Result<Vec<FailedRecord>> {
        results::parse_failed(reader, self.delimiter())
    }

    pub fn parse_unprocessed_records(&self, reader: impl Read) -> Result<Vec<UnprocessedRecord>> {
        results::parse_unprocessed(reader, self.delimiter())
    }
}

const SUCCESSFUL_RESULTS: &str = "successfulResults";
const FAILED_RESULTS: &str = "failedResults";
const UNPROCESSED_RECORDS: &str = "unprocessedrecords";

fn ingest_url<S: Session + ?Sized>(session: &S) -> String {
    format!("{}/jobs/ingest", session.service_url())
}

/// Entry point for Bulk API 2.0 ingest jobs.
#[derive(Debug)]
pub struct IngestResource<S> {
    session: Arc<S>,
}

impl<S> Clone for IngestResource<S> {
    fn clone(&self) -> Self {
        Self {
            session: Arc::clone(&self.session),
        }
    }
}

impl<S: Session> IngestResource<S> {
    /// Refresh the session once and wrap it.
    #[instrument(skip(session))]
    pub async fn new(session: impl Into<Arc<S>>) -> Result<Self> {
        let session = session.into();
        session.refresh().await?;
        Ok(Self { session })
    }

    pub fn session(&self) -> &Arc<S> {
        &self.session
    }

    /// Validate `options` and create the job.
    #[instrument(skip(self, options), fields(object = %options.object))]
    pub async fn create_job(&self, options: IngestOptions) -> Result<IngestJob<S>> {
        let options = options.validated()?;
        let request = self.session.post(&ingest_url(self.session.as_ref()))?.json(&options)?;
        let response: IngestJobResponse = http::fetch_json(self.session.as_ref(), request).await?;
        info!(job_id = %response.id, "Created ingest job");

        Ok(IngestJob {
            session: Arc::clone(&self.session),
            response,
        })
    }

    /// Build a handle for an existing job from its current info.
    #[instrument(skip(self))]
    pub async fn get_job(&self, id: &str) -> Result<IngestJob<S>> {
        let url = http::join(&ingest_url(self.session.as_ref()), id);
        let info: IngestJobInfo = http::fetch_json(self.session.as_ref(), self.session.get(&url)?).await?;

        Ok(IngestJob {
            session: Arc::clone(&self.session),
            response: info.job,
        })
    }

    /// List ingest jobs matching `parameters`.
    #[instrument(skip(self))]
    pub async fn all_jobs(&self, parameters: &JobListParameters) -> Result<JobList<IngestJobResponse>> {
        let mut request = self.session.get(&ingest_url(self.session.as_ref()))?;
        for (name, value) in parameters.query_pairs() {
            request = request.query(name, value);
        }
        http::fetch_json(self.session.as_ref(), request).await
    }

    /// Follow a listing's `nextRecordsUrl`; `None` on the last page.
    #[instrument(skip(self, list))]
    pub async fn next_jobs(
        &self,
        list: &JobList<IngestJobResponse>,
    ) -> Result<Option<JobList<IngestJobResponse>>> {
        let Some(next) = list.next_records_url.as_deref() else {
            return Ok(None);
        };
        let url = format!("{}{}", self.session.instance_url(), next);
        let request = self.session.get(&url)?;
        http::fetch_json(self.session.as_ref(), request).await.map(Some)
    }
}
