//! Bulk API 2.0 query jobs.
//!
//! Results are paged with an opaque locator. Each page request returns the
//! locator for the next one in the `Sforce-Locator` header; keep passing it
//! back until none is returned.

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use sfdc_client::{RequestBuilder, Session};
use tracing::{debug, info, instrument};

use crate::error::{Error, Result};
use crate::http;
use crate::results::{self, Fields};
use crate::types::{
    deserialize_api_version, ColumnDelimiter, ConcurrencyMode, ContentType, JobList,
    JobListParameters, JobState, JobType, LineEnding, QueryOperation,
};

/// Options for a new query job. Only `query` is required.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryOptions {
    pub column_delimiter: Option<ColumnDelimiter>,
    pub content_type: Option<ContentType>,
    pub line_ending: Option<LineEnding>,
    pub operation: Option<QueryOperation>,
    pub query: String,
}

impl QueryOptions {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Default::default()
        }
    }

    /// Build options from a [`QueryBuilder`](sfdc_soql::QueryBuilder) or any
    /// other formatter.
    #[cfg(feature = "query-builder")]
    pub fn from_formatter<Q>(query: &Q) -> Result<Self>
    where
        Q: sfdc_soql::QueryFormatter + ?Sized,
    {
        let query = query
            .format()
            .map_err(|e| Error::invalid_options(format!("bulk job: {e}")))?;
        Ok(Self::new(query))
    }

    /// Use queryAll instead of query (includes deleted records).
    pub fn with_query_all(mut self) -> Self {
        self.operation = Some(QueryOperation::QueryAll);
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

    pub(crate) fn validated(mut self) -> Result<Self> {
        if self.query.trim().is_empty() {
            return Err(Error::invalid_options("bulk job: query is required"));
        }
        self.operation.get_or_insert(QueryOperation::Query);
        self.content_type.get_or_insert(ContentType::Csv);
        self.line_ending.get_or_insert(LineEnding::Lf);
        self.column_delimiter.get_or_insert(ColumnDelimiter::Comma);
        Ok(self)
    }
}

/// Query job record as returned by create and abort.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryJobResponse {
    pub id: String,
    pub state: JobState,
    #[serde(default)]
    pub operation: Option<QueryOperation>,
    #[serde(default)]
    pub object: Option<String>,
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub column_delimiter: ColumnDelimiter,
    #[serde(default)]
    pub content_type: Option<ContentType>,
    #[serde(default)]
    pub line_ending: Option<LineEnding>,
    #[serde(default)]
    pub job_type: Option<JobType>,
    #[serde(default)]
    pub concurrency_mode: Option<ConcurrencyMode>,
    #[serde(default, deserialize_with = "deserialize_api_version")]
    pub api_version: Option<String>,
    #[serde(default)]
    pub created_by_id: Option<String>,
    #[serde(default)]
    pub created_date: Option<String>,
    #[serde(default)]
    pub system_modstamp: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryJobInfo {
    #[serde(flatten)]
    pub job: QueryJobResponse,
    #[serde(default)]
    pub number_records_processed: u64,
    #[serde(default)]
    pub retries: u64,
    /// Milliseconds.
    #[serde(default)]
    pub total_processing_time: u64,
    #[serde(default)]
    pub error_message: Option<String>,
}

/// One parsed page of query results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryResultsPage {
    pub records: Vec<Fields>,
    /// Pass back to fetch the next page. `None` on the last page.
    pub locator: Option<String>,
}

/// Handle to one query job.
#[derive(Debug)]
pub struct QueryJob<S> {
    session: Arc<S>,
    response: QueryJobResponse,
}

impl<S: Session> QueryJob<S> {
    fn url(&self) -> String {
        http::join(&query_url(self.session.as_ref()), &self.response.id)
    }

    pub fn id(&self) -> &str {
        &self.response.id
    }

    pub fn response(&self) -> &QueryJobResponse {
        &self.response
    }

    pub fn state(&self) -> JobState {
        self.response.state
    }

    pub fn delimiter(&self) -> ColumnDelimiter {
        self.response.column_delimiter
    }

    /// Fetch current state and counters, replacing the stored job record.
    #[instrument(skip(self), fields(job_id = %self.response.id))]
    pub async fn info(&mut self) -> Result<QueryJobInfo> {
        let request = self.session.get(&self.url())?;
        let info: QueryJobInfo = http::fetch_json(self.session.as_ref(), request).await?;
        self.response = info.job.clone();
        Ok(info)
    }

    #[instrument(skip(self), fields(job_id = %self.response.id))]
    pub async fn abort(&mut self) -> Result<QueryJobResponse> {
        let request = self.session.patch(&self.url())?;
        let response: QueryJobResponse =
            http::request_state(self.session.as_ref(), request, "Aborted").await?;
        info!(job_id = %response.id, state = ?response.state, "Query job state changed");
        self.response = response.clone();
        Ok(response)
    }

    #[instrument(skip(self), fields(job_id = %self.response.id))]
    pub async fn delete(&self) -> Result<()> {
        http::delete(self.session.as_ref(), &self.url()).await
    }

    fn results_request(&self, max_records: Option<u64>, locator: Option<&str>) -> Result<RequestBuilder> {
        let url = format!("{}/results", self.url());
        let mut request = self.session.get(&url)?;
        if let Some(locator) = locator.filter(|l| !l.is_empty()) {
            request = request.query("locator", locator);
        }
        if let Some(max) = max_records.filter(|m| *m > 0) {
            request = request.query("maxRecords", max.to_string());
        }
        Ok(request)
    }

    /// Stream one page of raw CSV results to `path`.
    ///
    /// Returns the locator of the next page, or `None` when this was the last.
    #[instrument(skip(self, path), fields(job_id = %self.response.id))]
    pub async fn export_results(
        &self,
        path: impl AsRef<Path>,
        max_records: Option<u64>,
        locator: Option<&str>,
    ) -> Result<Option<String>> {
        let request = self.results_request(max_records, locator)?;
        let response = http::fetch_csv(self.session.as_ref(), request).await?;
        let next = response.sforce_locator().map(str::to_string);

        http::export(response, path.as_ref()).await?;
        debug!(next = ?next, "Exported query results page");
        Ok(next)
    }

    /// Fetch and parse one page of results.
    #[instrument(skip(self), fields(job_id = %self.response.id))]
    pub async fn results(&self, max_records: Option<u64>, locator: Option<&str>) -> Result<QueryResultsPage> {
        let request = self.results_request(max_records, locator)?;
        let response = http::fetch_csv(self.session.as_ref(), request).await?;
        let locator = response.sforce_locator().map(str::to_string);
        let body = response.bytes().await?;

        Ok(QueryResultsPage {
            records: results::parse_rows(body.as_ref(), self.delimiter())?,
            locator,
        })
    }
}

fn query_url<S: Session + ?Sized>(session: &S) -> String {
    format!("{}/jobs/query", session.service_url())
}

/// Entry point for Bulk API 2.0 query jobs.
#[derive(Debug)]
pub struct QueryJobResource<S> {
    session: Arc<S>,
}

impl<S> Clone for QueryJobResource<S> {
    fn clone(&self) -> Self {
        Self {
            session: Arc::clone(&self.session),
        }
    }
}

impl<S: Session> QueryJobResource<S> {
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

    #[instrument(skip(self, options))]
    pub async fn create_job(&self, options: QueryOptions) -> Result<QueryJob<S>> {
        let options = options.validated()?;
        let request = self.session.post(&query_url(self.session.as_ref()))?.json(&options)?;
        let response: QueryJobResponse = http::fetch_json(self.session.as_ref(), request).await?;
        info!(job_id = %response.id, "Created query job");

        Ok(QueryJob {
            session: Arc::clone(&self.session),
            response,
        })
    }

    #[instrument(skip(self))]
    pub async fn get_job(&self, id: &str) -> Result<QueryJob<S>> {
        let url = http::join(&query_url(self.session.as_ref()), id);
        let info: QueryJobInfo = http::fetch_json(self.session.as_ref(), self.session.get(&url)?).await?;

        Ok(QueryJob {
            session: Arc::clone(&self.session),
            response: info.job,
        })
    }

    #[instrument(skip(self))]
    pub async fn all_jobs(&self, parameters: &JobListParameters) -> Result<JobList<QueryJobResponse>> {
        let mut request = self.session.get(&query_url(self.session.as_ref()))?;
        for (name, value) in parameters.query_pairs() {
            request = request.query(name, value);
        }
        http::fetch_json(self.session.as_ref(), request).await
    }

    /// Follow a listing's `nextRecordsUrl`; `None` on the last page.
    #[instrument(skip(self, list))]
    pub async fn next_jobs(
        &self,
        list: &JobList<QueryJobResponse>,
    ) -> Result<Option<JobList<QueryJobResponse>>> {
        let Some(next) = list.next_records_url.as_deref() else {
            return Ok(None);
        };
        let url = format!("{}{}", self.session.instance_url(), next);
        let request = self.session.get(&url)?;
        http::fetch_json(self.session.as_ref(), request).await.map(Some)
    }
}
