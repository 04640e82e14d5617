//! Bulk API 1.0 jobs and batches.
//!
//! A classic job accepts any number of batches, each processed and polled on
//! its own. Every call goes through the session's async service root,
//! `{instance}/services/async/{version}`.

use std::path::Path;
use std::sync::Arc;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use sfdc_client::Session;
use tracing::{info, instrument};

use crate::error::{Error, Result};
use crate::http;
use crate::ingest::is_blank;
use crate::types::{deserialize_api_version, ConcurrencyMode, LineEnding, Operation};

/// Payload format of a classic job's batches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum BatchContentType {
    #[default]
    #[serde(rename = "CSV")]
    Csv,
    #[serde(rename = "JSON")]
    Json,
    #[serde(rename = "XML")]
    Xml,
    #[serde(rename = "ZIP_CSV")]
    ZipCsv,
    #[serde(rename = "ZIP_JSON")]
    ZipJson,
    #[serde(rename = "ZIP_XML")]
    ZipXml,
}

impl BatchContentType {
    /// MIME type batches of this kind are posted with.
    pub fn mime_type(&self) -> &'static str {
        match self {
            BatchContentType::Csv => "text/csv",
            BatchContentType::Json => "application/json",
            BatchContentType::Xml => "application/xml",
            BatchContentType::ZipCsv => "zip/csv",
            BatchContentType::ZipJson => "zip/json",
            BatchContentType::ZipXml => "zip/xml",
        }
    }
}

/// Classic job states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum V1JobState {
    Open,
    Closed,
    Aborted,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BatchState {
    Queued,
    InProgress,
    Completed,
    Failed,
    NotProcessed,
}

impl BatchState {
    /// True once the batch will not change state again.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            BatchState::Completed | BatchState::Failed | BatchState::NotProcessed
        )
    }
}

/// Fields sent as the JSON body of the create call.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct V1Options {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub concurrency_mode: Option<ConcurrencyMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<BatchContentType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_id_field_name: Option<String>,
    pub object: String,
    pub operation: Option<Operation>,
}

impl V1Options {
    pub fn new(object: impl Into<String>, operation: Operation) -> Self {
        Self {
            object: object.into(),
            operation: Some(operation),
            ..Default::default()
        }
    }

    pub fn with_external_id_field(mut self, field: impl Into<String>) -> Self {
        self.external_id_field_name = Some(field.into());
        self
    }

    pub fn with_content_type(mut self, content_type: BatchContentType) -> Self {
        self.content_type = Some(content_type);
        self
    }

    pub fn with_concurrency_mode(mut self, mode: ConcurrencyMode) -> Self {
        self.concurrency_mode = Some(mode);
        self
    }
}

/// Options that travel as request headers on job creation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderOptions {
    pub line_ending: Option<LineEnding>,
    pub content_type: Option<BatchContentType>,
    /// Client name reported through `Sforce-Call-Options`.
    pub client: Option<String>,
    /// Value of `Sforce-Enable-PKChunking`, e.g. `TRUE` or `chunkSize=50000`.
    pub pk_chunking: Option<String>,
}

/// Validate both option sets and fill defaults. The header content type is
/// copied into the body when the body carries none.
fn validate(mut options: V1Options, mut header: HeaderOptions) -> Result<(V1Options, HeaderOptions)> {
    let Some(operation) = options.operation else {
        return Err(Error::invalid_options("bulk job: operation is required"));
    };
    if operation == Operation::Upsert && is_blank(&options.external_id_field_name) {
        return Err(Error::invalid_options(
            "bulk job: external id field name is required for upsert operation",
        ));
    }
    if options.object.trim().is_empty() {
        return Err(Error::invalid_options("bulk job: object is required"));
    }

    header.line_ending.get_or_insert(LineEnding::Lf);
    let content_type = *header.content_type.get_or_insert(BatchContentType::Csv);
    if is_blank(&header.pk_chunking) {
        header.pk_chunking = Some("TRUE".to_string());
    }
    options.content_type.get_or_insert(content_type);

    Ok((options, header))
}

/// Classic job record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobInfo {
    pub id: String,
    pub state: V1JobState,
    #[serde(default)]
    pub object: Option<String>,
    #[serde(default)]
    pub operation: Option<Operation>,
    #[serde(default)]
    pub content_type: Option<BatchContentType>,
    #[serde(default)]
    pub concurrency_mode: Option<ConcurrencyMode>,
    #[serde(default)]
    pub external_id_field_name: Option<String>,
    #[serde(default)]
    pub assignment_rule_id: Option<String>,
    #[serde(default, deserialize_with = "deserialize_api_version")]
    pub api_version: Option<String>,
    #[serde(default)]
    pub created_by_id: Option<String>,
    #[serde(default)]
    pub created_date: Option<String>,
    #[serde(default)]
    pub system_modstamp: Option<String>,
    #[serde(default)]
    pub number_batches_queued: u64,
    #[serde(default)]
    pub number_batches_in_progress: u64,
    #[serde(default)]
    pub number_batches_completed: u64,
    #[serde(default)]
    pub number_batches_failed: u64,
    #[serde(default)]
    pub number_batches_total: u64,
    #[serde(default)]
    pub number_records_processed: u64,
    #[serde(default)]
    pub number_records_failed: u64,
    #[serde(default)]
    pub number_retries: u64,
    #[serde(default)]
    pub total_processing_time: u64,
    #[serde(default)]
    pub api_active_processing_time: u64,
    #[serde(default)]
    pub apex_processing_time: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchInfo {
    pub id: String,
    pub job_id: String,
    pub state: BatchState,
    #[serde(default)]
    pub state_message: Option<String>,
    #[serde(default)]
    pub created_date: Option<String>,
    #[serde(default)]
    pub system_modstamp: Option<String>,
    #[serde(default)]
    pub number_records_processed: u64,
    #[serde(default)]
    pub number_records_failed: u64,
    #[serde(default)]
    pub total_processing_time: u64,
    #[serde(default)]
    pub api_active_processing_time: u64,
    #[serde(default)]
    pub apex_processing_time: u64,
}

#[derive(Deserialize)]
struct BatchInfoList {
    #[serde(rename = "batchInfo", default)]
    batch_info: Vec<BatchInfo>,
}

fn jobs_url<S: Session + ?Sized>(session: &S) -> String {
    format!("{}/job", session.async_service_url())
}

/// Handle to one classic job.
#[derive(Debug)]
pub struct BulkV1Job<S> {
    session: Arc<S>,
    response: JobInfo,
}

impl<S: Session> BulkV1Job<S> {
    fn url(&self) -> String {
        http::join(&jobs_url(self.session.as_ref()), &self.response.id)
    }

    fn batch_url(&self, batch_id: &str) -> String {
        http::join(&format!("{}/batch", self.url()), batch_id)
    }

    pub fn id(&self) -> &str {
        &self.response.id
    }

    /// Last job record received from the server.
    pub fn response(&self) -> &JobInfo {
        &self.response
    }

    pub fn state(&self) -> V1JobState {
        self.response.state
    }

    /// Submit one batch. The MIME type follows the job's content type and the
    /// server must answer `201 Created`.
    #[instrument(skip(self, data), fields(job_id = %self.response.id))]
    pub async fn create_batch(&self, data: impl Into<Bytes>) -> Result<BatchInfo> {
        let content_type = self.response.content_type.unwrap_or_default();
        let url = format!("{}/batch", self.url());
        let request = self
            .session
            .post(&url)?
            .bytes(data, content_type.mime_type())
            .accept("application/json");

        let response = self.session.execute(request).await?;
        http::expect_created(&response)?;
        let batch: BatchInfo = response.json().await?;
        info!(batch_id = %batch.id, "Created batch");
        Ok(batch)
    }

    /// Current state of `batch`.
    pub async fn batch_info(&self, batch: &BatchInfo) -> Result<BatchInfo> {
        self.fetch_batch_info(&batch.id).await
    }

    #[instrument(skip(self), fields(job_id = %self.response.id))]
    pub async fn fetch_batch_info(&self, batch_id: &str) -> Result<BatchInfo> {
        let request = self.session.get(&self.batch_url(batch_id))?;
        http::fetch_json(self.session.as_ref(), request).await
    }

    /// Every batch submitted to this job.
    #[instrument(skip(self), fields(job_id = %self.response.id))]
    pub async fn batches(&self) -> Result<Vec<BatchInfo>> {
        let url = format!("{}/batch", self.url());
        let list: BatchInfoList = http::fetch_json(self.session.as_ref(), self.session.get(&url)?).await?;
        Ok(list.batch_info)
    }

    /// Re-fetch the job, replacing the stored record.
    #[instrument(skip(self), fields(job_id = %self.response.id))]
    pub async fn info(&mut self) -> Result<JobInfo> {
        let request = self.session.get(&self.url())?;
        self.response = http::fetch_json(self.session.as_ref(), request).await?;
        Ok(self.response.clone())
    }

    /// Stop accepting batches.
    pub async fn close(&mut self) -> Result<JobInfo> {
        self.set_state("Closed").await
    }

    pub async fn abort(&mut self) -> Result<JobInfo> {
        self.set_state("Aborted").await
    }

    #[instrument(skip(self), fields(job_id = %self.response.id))]
    async fn set_state(&mut self, state: &str) -> Result<JobInfo> {
        let request = self.session.post(&self.url())?;
        let response: JobInfo = http::request_state(self.session.as_ref(), request, state).await?;
        info!(job_id = %response.id, state = ?response.state, "Bulk v1 job state changed");
        self.response = response.clone();
        Ok(response)
    }

    #[instrument(skip(self), fields(job_id = %self.response.id))]
    pub async fn delete(&self) -> Result<()> {
        http::delete(self.session.as_ref(), &self.url()).await
    }

    /// Stream one batch's raw result CSV to `path`, returning the byte count.
    #[instrument(skip(self, path, batch), fields(job_id = %self.response.id, batch_id = %batch.id))]
    pub async fn export_results(&self, path: impl AsRef<Path>, batch: &BatchInfo) -> Result<u64> {
        let url = format!("{}/result", self.batch_url(&batch.id));
        let response = http::fetch_csv(self.session.as_ref(), self.session.get(&url)?).await?;
        http::export(response, path.as_ref()).await
    }
}

/// Entry point for Bulk API 1.0 jobs.
#[derive(Debug)]
pub struct BulkV1Resource<S> {
    session: Arc<S>,
}

impl<S> Clone for BulkV1Resource<S> {
    fn clone(&self) -> Self {
        Self {
            session: Arc::clone(&self.session),
        }
    }
}

impl<S: Session> BulkV1Resource<S> {
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

    /// Validate the options and create a classic job.
    #[instrument(skip(self, options, header), fields(object = %options.object))]
    pub async fn create_job(&self, options: V1Options, header: HeaderOptions) -> Result<BulkV1Job<S>> {
        let (options, header) = validate(options, header)?;

        let mut request = self
            .session
            .post(&jobs_url(self.session.as_ref()))?
            .json(&options)?;
        if let Some(pk_chunking) = header.pk_chunking {
            request = request.header("Sforce-Enable-PKChunking", pk_chunking);
        }
        if let Some(line_ending) = header.line_ending {
            request = request.header("Sforce-Line-Ending", line_ending.api_name());
        }
        if let Some(client) = header.client.filter(|c| !c.trim().is_empty()) {
            request = request.sforce_call_options(format!("client={client}"));
        }

        let response: JobInfo = http::fetch_json(self.session.as_ref(), request).await?;
        info!(job_id = %response.id, "Created bulk v1 job");

        Ok(BulkV1Job {
            session: Arc::clone(&self.session),
            response,
        })
    }

    #[instrument(skip(self))]
    pub async fn get_job(&self, id: &str) -> Result<BulkV1Job<S>> {
        let url = http::join(&jobs_url(self.session.as_ref()), id);
        let response: JobInfo = http::fetch_json(self.session.as_ref(), self.session.get(&url)?).await?;

        Ok(BulkV1Job {
            session: Arc::clone(&self.session),
            response,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use sfdc_client::SalesforceClient;
    use wiremock::matchers::{body_json, body_string, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const JOBS_PATH: &str = "/services/async/62.0/job";

    fn job_json(id: &str, state: &str) -> serde_json::Value {
        serde_json::json!({
            "id": id,
            "state": state,
            "object": "Contact",
            "operation": "insert",
            "contentType": "CSV",
            "concurrencyMode": "Parallel",
            "apiVersion": 62.0,
            "numberBatchesTotal": 0
        })
    }

    fn batch_json(id: &str, state: &str) -> serde_json::Value {
        serde_json::json!({
            "id": id,
            "jobId": "750V",
            "state": state,
            "numberRecordsProcessed": 0,
            "numberRecordsFailed": 0
        })
    }

    async fn resource(server: &MockServer) -> BulkV1Resource<SalesforceClient> {
        let client = SalesforceClient::new(server.uri(), "test-token").unwrap();
        BulkV1Resource::new(client).await.unwrap()
    }

    async fn open_job(server: &MockServer) -> BulkV1Job<SalesforceClient> {
        Mock::given(method("POST"))
            .and(path(JOBS_PATH))
            .respond_with(ResponseTemplate::new(201).set_body_json(job_json("750V", "Open")))
            .mount(server)
            .await;

        resource(server)
            .await
            .create_job(V1Options::new("Contact", Operation::Insert), HeaderOptions::default())
            .await
            .unwrap()
    }

    #[test]
    fn test_header_defaults_and_body_content_type() {
        let (options, header) =
            validate(V1Options::new("Contact", Operation::Insert), HeaderOptions::default()).unwrap();
        assert_eq!(header.line_ending, Some(LineEnding::Lf));
        assert_eq!(header.content_type, Some(BatchContentType::Csv));
        assert_eq!(header.pk_chunking.as_deref(), Some("TRUE"));
        assert_eq!(options.content_type, Some(BatchContentType::Csv));

        let (options, header) = validate(
            V1Options::new("Contact", Operation::Insert).with_content_type(BatchContentType::Json),
            HeaderOptions {
                content_type: Some(BatchContentType::Xml),
                pk_chunking: Some("chunkSize=50000".into()),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(options.content_type, Some(BatchContentType::Json));
        assert_eq!(header.pk_chunking.as_deref(), Some("chunkSize=50000"));
    }

    #[test]
    fn test_validation() {
        let missing_object = validate(V1Options::new(" ", Operation::Insert), HeaderOptions::default());
        assert!(missing_object.unwrap_err().to_string().contains("object is required"));

        let upsert = validate(V1Options::new("Contact", Operation::Upsert), HeaderOptions::default());
        assert!(upsert.unwrap_err().is_validation_error());

        let no_operation = validate(
            V1Options {
                object: "Contact".into(),
                ..Default::default()
            },
            HeaderOptions::default(),
        );
        assert!(no_operation.unwrap_err().to_string().contains("operation is required"));
    }

    #[test]
    fn test_mime_types() {
        assert_eq!(BatchContentType::Csv.mime_type(), "text/csv");
        assert_eq!(BatchContentType::Json.mime_type(), "application/json");
        assert_eq!(BatchContentType::Xml.mime_type(), "application/xml");
        assert_eq!(BatchContentType::ZipCsv.mime_type(), "zip/csv");
        assert_eq!(BatchContentType::ZipJson.mime_type(), "zip/json");
        assert_eq!(BatchContentType::ZipXml.mime_type(), "zip/xml");
    }

    #[tokio::test]
    async fn test_create_job_headers_and_body() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(JOBS_PATH))
            .and(header("Sforce-Enable-PKChunking", "TRUE"))
            .and(header("Sforce-Line-Ending", "CRLF"))
            .and(header("Sforce-Call-Options", "client=nightly-sync"))
            .and(body_json(serde_json::json!({
                "contentType": "CSV",
                "externalIdFieldName": "Email",
                "object": "Contact",
                "operation": "upsert"
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(job_json("750V", "Open")))
            .expect(1)
            .mount(&mock_server)
            .await;

        let job = resource(&mock_server)
            .await
            .create_job(
                V1Options::new("Contact", Operation::Upsert).with_external_id_field("Email"),
                HeaderOptions {
                    line_ending: Some(LineEnding::Crlf),
                    client: Some("nightly-sync".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(job.id(), "750V");
        assert_eq!(job.state(), V1JobState::Open);
    }

    #[tokio::test]
    async fn test_batch_lifecycle() {
        let mock_server = MockServer::start().await;
        let job = open_job(&mock_server).await;

        Mock::given(method("POST"))
            .and(path(format!("{JOBS_PATH}/750V/batch")))
            .and(header("Content-Type", "text/csv"))
            .and(body_string("LastName\nSmith\n"))
            .respond_with(ResponseTemplate::new(201).set_body_json(batch_json("751A", "Queued")))
            .expect(1)
            .mount(&mock_server)
            .await;

        Mock::given(method("GET"))
            .and(path(format!("{JOBS_PATH}/750V/batch/751A")))
            .respond_with(ResponseTemplate::new(200).set_body_json(batch_json("751A", "Completed")))
            .mount(&mock_server)
            .await;

        Mock::given(method("GET"))
            .and(path(format!("{JOBS_PATH}/750V/batch")))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "batchInfo": [batch_json("751A", "Completed"), batch_json("751B", "NotProcessed")]
            })))
            .mount(&mock_server)
            .await;

        let batch = job.create_batch("LastName\nSmith\n").await.unwrap();
        assert_eq!(batch.state, BatchState::Queued);

        let polled = job.batch_info(&batch).await.unwrap();
        assert!(polled.state.is_terminal());

        let batches = job.batches().await.unwrap();
        assert_eq!(batches.len(), 2);
        assert_eq!(batches[1].state, BatchState::NotProcessed);
    }

    #[tokio::test]
    async fn test_create_batch_requires_created() {
        let mock_server = MockServer::start().await;
        let job = open_job(&mock_server).await;

        Mock::given(method("POST"))
            .and(path(format!("{JOBS_PATH}/750V/batch")))
            .respond_with(ResponseTemplate::new(200).set_body_json(batch_json("751A", "Queued")))
            .mount(&mock_server)
            .await;

        let err = job.create_batch("LastName\nSmith\n").await.unwrap_err();
        assert!(matches!(err.kind, ErrorKind::Upload(_)));
    }

    #[tokio::test]
    async fn test_close_info_delete() {
        let mock_server = MockServer::start().await;
        let mut job = open_job(&mock_server).await;

        Mock::given(method("POST"))
            .and(path(format!("{JOBS_PATH}/750V")))
            .and(body_json(serde_json::json!({"state": "Closed"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(job_json("750V", "Closed")))
            .expect(1)
            .mount(&mock_server)
            .await;

        let mut info = job_json("750V", "Closed");
        info["numberBatchesCompleted"] = 1.into();
        info["numberRecordsProcessed"] = 1.into();

        Mock::given(method("GET"))
            .and(path(format!("{JOBS_PATH}/750V")))
            .respond_with(ResponseTemplate::new(200).set_body_json(info))
            .mount(&mock_server)
            .await;

        Mock::given(method("DELETE"))
            .and(path(format!("{JOBS_PATH}/750V")))
            .respond_with(ResponseTemplate::new(200))
            .mount(&mock_server)
            .await;

        job.close().await.unwrap();
        assert_eq!(job.state(), V1JobState::Closed);

        let info = job.info().await.unwrap();
        assert_eq!(info.number_batches_completed, 1);

        let err = job.delete().await.unwrap_err();
        assert!(matches!(err.kind, ErrorKind::Job(_)));
    }

    #[tokio::test]
    async fn test_export_batch_results() {
        let mock_server = MockServer::start().await;
        let job = open_job(&mock_server).await;
        let body = "\"Id\",\"Success\",\"Created\",\"Error\"\n\"003A\",\"true\",\"true\",\"\"\n";

        Mock::given(method("GET"))
            .and(path(format!("{JOBS_PATH}/750V/batch/751A/result")))
            .and(header("Accept", "text/csv"))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(&mock_server)
            .await;

        let batch: BatchInfo = serde_json::from_value(batch_json("751A", "Completed")).unwrap();
        let file = tempfile::NamedTempFile::new().unwrap();

        let written = job.export_results(file.path(), &batch).await.unwrap();
        assert_eq!(written, body.len() as u64);
        assert_eq!(std::fs::read_to_string(file.path()).unwrap(), body);
    }
}
