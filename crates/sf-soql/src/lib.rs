//! # sfdc-soql
//!
//! SOQL queries over the REST `query`/`queryAll` endpoints.
//!
//! A [`Resource`] runs anything implementing [`QueryFormatter`] (raw strings
//! or a [`QueryBuilder`]) and returns a [`QueryResult`] page that can fetch
//! the page after it.
//!
//! ## Example
//!
//! ```rust,ignore
//! use sfdc_client::SalesforceClient;
//! use sfdc_soql::{QueryBuilder, QueryResult, Resource};
//!
//! let client = SalesforceClient::new(instance_url, access_token)?;
//! let soql = Resource::new(client).await?;
//!
//! let query = QueryBuilder::new("Account")?
//!     .select(&["Id", "Name"])
//!     .where_eq("Industry", "Energy")?;
//!
//! let mut page: QueryResult<_> = soql.query(&query, false).await?;
//! loop {
//!     for record in page.records() {
//!         println!("{:?}", record.string("Name"));
//!     }
//!     match page.next().await? {
//!         Some(next) => page = next,
//!         None => break,
//!     }
//! }
//! ```

mod builder;
mod error;
pub mod escape;
mod formatter;
mod resource;

pub use builder::QueryBuilder;
pub use error::{Error, ErrorKind, Result};
pub use formatter::QueryFormatter;
pub use resource::{QueryResponse, QueryResult, Record, RecordAttributes, Resource};
