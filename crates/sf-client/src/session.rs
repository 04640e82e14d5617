//! The session capability consumed by every API resource.
//!
//! A session knows where the org lives (instance URL and API version), owns
//! the HTTP transport, stamps requests with the current access token and can
//! re-acquire that token. Resources never hold credentials themselves.

use std::future::Future;

use crate::client::SfHttpClient;
use crate::error::Result;
use crate::request::RequestBuilder;
use crate::response::Response;

/// An authenticated connection to one Salesforce org.
///
/// Implementors supply the five required methods; URL construction and the
/// authorized request helpers are derived from them.
pub trait Session: Send + Sync {
    /// Base URL of the org, without a trailing slash.
    fn instance_url(&self) -> String;

    /// API version such as `"62.0"`.
    fn api_version(&self) -> &str;

    /// The transport used for every request.
    fn http(&self) -> &SfHttpClient;

    /// Attach the current credentials to a request.
    fn authorize(&self, request: RequestBuilder) -> Result<RequestBuilder>;

    /// Re-acquire credentials.
    fn refresh(&self) -> impl Future<Output = Result<()>> + Send;

    /// `{instance}/services/data/v{version}`
    fn service_url(&self) -> String {
        format!(
            "{}/services/data/v{}",
            self.instance_url(),
            self.api_version()
        )
    }

    /// `{instance}/services/async/{version}`, the Bulk API 1.0 root.
    fn async_service_url(&self) -> String {
        format!(
            "{}/services/async/{}",
            self.instance_url(),
            self.api_version()
        )
    }

    /// Authorized GET request builder.
    fn get(&self, url: &str) -> Result<RequestBuilder> {
        self.authorize(self.http().get(url))
    }

    /// Authorized POST request builder.
    fn post(&self, url: &str) -> Result<RequestBuilder> {
        self.authorize(self.http().post(url))
    }

    /// Authorized PUT request builder.
    fn put(&self, url: &str) -> Result<RequestBuilder> {
        self.authorize(self.http().put(url))
    }

    /// Authorized PATCH request builder.
    fn patch(&self, url: &str) -> Result<RequestBuilder> {
        self.authorize(self.http().patch(url))
    }

    /// Authorized DELETE request builder.
    fn delete(&self, url: &str) -> Result<RequestBuilder> {
        self.authorize(self.http().delete(url))
    }

    /// Send a request through this session's transport.
    fn execute(&self, request: RequestBuilder) -> impl Future<Output = Result<Response>> + Send {
        self.http().execute(request)
    }
}
