//! The SOQL query resource and its paginated results.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sfdc_client::{RequestBuilder, Session};
use tracing::{debug, instrument};

use crate::error::Result;
use crate::formatter::QueryFormatter;

/// Issues SOQL queries through a [`Session`].
#[derive(Debug)]
pub struct Resource<S> {
    session: Arc<S>,
}

impl<S> Clone for Resource<S> {
    fn clone(&self) -> Self {
        Self {
            session: Arc::clone(&self.session),
        }
    }
}

impl<S: Session> Resource<S> {
    /// Refresh the session once and wrap it.
    #[instrument(skip(session))]
    pub async fn new(session: impl Into<Arc<S>>) -> Result<Self> {
        let session = session.into();
        session.refresh().await?;
        Ok(Self { session })
    }

    /// The session this resource issues requests through.
    pub fn session(&self) -> &Arc<S> {
        &self.session
    }

    /// Run a query and return the first page.
    ///
    /// With `all` set the `queryAll` endpoint is used, which also returns
    /// deleted and archived records.
    #[instrument(skip(self, querier))]
    pub async fn query<T, Q>(&self, querier: &Q, all: bool) -> Result<QueryResult<S, T>>
    where
        T: DeserializeOwned,
        Q: QueryFormatter + ?Sized,
    {
        let soql = querier.format()?;
        let endpoint = if all { "queryAll" } else { "query" };
        let url = format!("{}/{}/", self.session.service_url(), endpoint);
        debug!(soql = %soql, "Running SOQL query");

        let request = self.session.get(&url)?.query("q", soql);
        fetch(&self.session, request).await
    }

    /// Run a query and follow `nextRecordsUrl` until every record is loaded.
    pub async fn query_all_pages<T, Q>(&self, querier: &Q, all: bool) -> Result<Vec<T>>
    where
        T: DeserializeOwned,
        Q: QueryFormatter + ?Sized,
    {
        let mut page = self.query::<T, Q>(querier, all).await?;
        let mut records = Vec::new();

        loop {
            let next = page.next().await?;
            records.append(&mut page.response.records);
            match next {
                Some(next) => page = next,
                None => break,
            }
        }

        Ok(records)
    }
}

async fn fetch<S, T>(session: &Arc<S>, request: RequestBuilder) -> Result<QueryResult<S, T>>
where
    S: Session,
    T: DeserializeOwned,
{
    let request = request.accept("application/json");
    let response: QueryResponse<T> = session.execute(request).await?.json().await?;
    Ok(QueryResult {
        session: Arc::clone(session),
        response,
    })
}

/// Raw body of a query response page.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResponse<T> {
    /// Total number of records matching the query.
    pub total_size: u64,

    /// Whether all records are returned (no more pages).
    pub done: bool,

    /// Relative URL of the next page.
    #[serde(default)]
    pub next_records_url: Option<String>,

    /// The records on this page.
    pub records: Vec<T>,
}

/// One page of query results that can fetch the page after it.
#[derive(Debug)]
pub struct QueryResult<S, T = Record> {
    session: Arc<S>,
    response: QueryResponse<T>,
}

impl<S: Session, T: DeserializeOwned> QueryResult<S, T> {
    pub fn total_size(&self) -> u64 {
        self.response.total_size
    }

    pub fn done(&self) -> bool {
        self.response.done
    }

    pub fn next_records_url(&self) -> Option<&str> {
        self.response.next_records_url.as_deref()
    }

    pub fn records(&self) -> &[T] {
        &self.response.records
    }

    pub fn into_records(self) -> Vec<T> {
        self.response.records
    }

    pub fn into_response(self) -> QueryResponse<T> {
        self.response
    }

    /// True while the server reports more pages.
    pub fn has_more(&self) -> bool {
        !self.response.done && self.response.next_records_url.is_some()
    }

    /// Fetch the following page, or `None` once the server reports `done`.
    #[instrument(skip(self), fields(next = ?self.response.next_records_url))]
    pub async fn next(&self) -> Result<Option<QueryResult<S, T>>> {
        let Some(next_url) = self.response.next_records_url.as_deref() else {
            return Ok(None);
        };
        if self.response.done {
            return Ok(None);
        }

        let url = format!("{}{}", self.session.instance_url(), next_url);
        let request = self.session.get(&url)?;
        fetch(&self.session, request).await.map(Some)
    }
}

/// A generic SObject record.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Record {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributes: Option<RecordAttributes>,
    #[serde(flatten)]
    pub fields: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RecordAttributes {
    #[serde(rename = "type")]
    pub sobject: String,
    #[serde(default)]
    pub url: Option<String>,
}

impl Record {
    /// The SObject type, e.g. `Account`.
    pub fn sobject(&self) -> Option<&str> {
        self.attributes.as_ref().map(|a| a.sobject.as_str())
    }

    pub fn field(&self, name: &str) -> Option<&serde_json::Value> {
        self.fields.get(name)
    }

    /// A field's value when it is a JSON string.
    pub fn string(&self, name: &str) -> Option<&str> {
        self.field(name)?.as_str()
    }
}
