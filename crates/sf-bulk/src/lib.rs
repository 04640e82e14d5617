//! # sfdc-bulk
//!
//! Salesforce Bulk API jobs for large-scale data operations.
//!
//! - **Ingest jobs (2.0)** - insert, update, upsert, delete and hard delete
//!   from a single CSV upload, with typed successful, failed and unprocessed
//!   results
//! - **Query jobs (2.0)** - CSV result pages driven by an opaque locator
//! - **Classic jobs (1.0)** - many independent batches per job
//!
//! Jobs never poll on their own. Each handle keeps the last job record the
//! server sent and replaces it on every state read.
//!
//! ## Example - Bulk Insert
//!
//! ```rust,ignore
//! use sfdc_bulk::{IngestOptions, IngestResource, Operation};
//! use sfdc_client::SalesforceClient;
//!
//! let client = SalesforceClient::new(instance_url, access_token)?;
//! let ingest = IngestResource::new(client).await?;
//!
//! let mut job = ingest
//!     .create_job(IngestOptions::new("Account", Operation::Insert))
//!     .await?;
//! job.upload("Name,Industry\nAcme Corp,Technology\n").await?;
//! job.close().await?;
//!
//! while !job.info().await?.job.state.is_terminal() {
//!     tokio::time::sleep(std::time::Duration::from_secs(5)).await;
//! }
//!
//! for record in job.successful_records().await? {
//!     println!("{} created={}", record.id(), record.created);
//! }
//! ```
//!
//! ## Example - Bulk Query
//!
//! ```rust,ignore
//! use sfdc_bulk::{QueryJobResource, QueryOptions};
//!
//! let queries = QueryJobResource::new(client).await?;
//! let job = queries
//!     .create_job(QueryOptions::new("SELECT Id, Name FROM Account"))
//!     .await?;
//!
//! // ...wait for JobComplete...
//!
//! let mut locator = None;
//! let mut page = 0;
//! loop {
//!     page += 1;
//!     locator = job
//!         .export_results(format!("accounts-{page}.csv"), None, locator.as_deref())
//!         .await?;
//!     if locator.is_none() {
//!         break;
//!     }
//! }
//! ```

mod error;
mod http;
mod ingest;
mod query;
pub mod results;
mod types;
mod v1;

pub use error::{Error, ErrorKind, Result};
pub use ingest::{IngestJob, IngestJobInfo, IngestJobResponse, IngestOptions, IngestResource};
pub use query::{
    QueryJob, QueryJobInfo, QueryJobResource, QueryJobResponse, QueryOptions, QueryResultsPage,
};
pub use results::{FailedRecord, Fields, JobRecord, SuccessfulRecord, UnprocessedRecord};
pub use types::*;
pub use v1::{
    BatchContentType, BatchInfo, BatchState, BulkV1Job, BulkV1Resource, HeaderOptions, JobInfo,
    V1JobState, V1Options,
};

// Re-export QueryBuilder when the feature is enabled for convenient access
#[cfg(feature = "query-builder")]
pub use sfdc_soql::QueryBuilder;
