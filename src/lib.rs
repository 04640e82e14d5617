//! # sfdc
//!
//! Salesforce Bulk API (1.0 and 2.0) and SOQL client for Rust.
//!
//! Every API resource is generic over a [`Session`](client::Session): the
//! static-token [`SalesforceClient`](client::SalesforceClient) or an
//! [`OAuthSession`](auth::OAuthSession) that logs in and refreshes through a
//! credential provider.
//!
//! ## Crates
//!
//! - **sfdc-client** - HTTP transport, structured API errors, the `Session` trait
//! - **sfdc-auth** - Password and refresh-token credentials, OAuth sessions
//! - **sfdc-soql** - SOQL queries with pagination and an injection-safe builder
//! - **sfdc-bulk** - Bulk API 2.0 ingest and query jobs, Bulk API 1.0 jobs and batches
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use sfdc::auth::{Credentials, OAuthSession, PasswordCredentials};
//! use sfdc::soql::{QueryResult, Resource};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let credentials = Credentials::password(PasswordCredentials::from_env()?)?;
//!     let session = OAuthSession::login(credentials).await?;
//!
//!     let soql = Resource::new(session).await?;
//!     let page: QueryResult<_> = soql.query("SELECT Id, Name FROM Account LIMIT 10", false).await?;
//!     for account in page.records() {
//!         println!("{:?}", account.string("Name"));
//!     }
//!
//!     Ok(())
//! }
//! ```

#[cfg(feature = "auth")]
pub use sfdc_auth as auth;
#[cfg(feature = "bulk")]
pub use sfdc_bulk as bulk;
#[cfg(feature = "client")]
pub use sfdc_client as client;
#[cfg(feature = "soql")]
pub use sfdc_soql as soql;

#[cfg(feature = "auth")]
pub use sfdc_auth::{Credentials, OAuthSession};
#[cfg(feature = "client")]
pub use sfdc_client::{ClientConfig, SalesforceClient, Session};
