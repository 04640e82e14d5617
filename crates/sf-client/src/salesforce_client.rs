//! A [`Session`] backed by a fixed instance URL and access token.
//!
//! ## Security
//!
//! - Access tokens are redacted in Debug output
//! - Tokens never appear in tracing spans

use std::future::Future;

use crate::client::SfHttpClient;
use crate::config::ClientConfig;
use crate::error::{Error, ErrorKind, Result};
use crate::request::RequestBuilder;
use crate::session::Session;
use crate::DEFAULT_API_VERSION;

/// Salesforce session with a pre-issued access token.
///
/// Useful when the token comes from somewhere else (the `sf` CLI, a
/// secrets store, a previous OAuth exchange). [`Session::refresh`] is a no-op
/// because there is nothing to refresh from.
///
/// # Example
///
/// ```rust,ignore
/// use sfdc_client::{SalesforceClient, Session};
///
/// let client = SalesforceClient::new("https://na1.salesforce.com", token)?
///     .with_api_version("60.0");
/// assert_eq!(
///     client.service_url(),
///     "https://na1.salesforce.com/services/data/v60.0"
/// );
/// ```
#[derive(Clone)]
pub struct SalesforceClient {
    http: SfHttpClient,
    instance_url: String,
    access_token: String,
    api_version: String,
}

impl std::fmt::Debug for SalesforceClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SalesforceClient")
            .field("instance_url", &self.instance_url)
            .field("access_token", &"[REDACTED]")
            .field("api_version", &self.api_version)
            .finish_non_exhaustive()
    }
}

impl SalesforceClient {
    /// Create a new Salesforce client with the given instance URL and access token.
    pub fn new(instance_url: impl Into<String>, access_token: impl Into<String>) -> Result<Self> {
        Self::with_config(instance_url, access_token, ClientConfig::default())
    }

    /// Create a new Salesforce client with custom configuration.
    pub fn with_config(
        instance_url: impl Into<String>,
        access_token: impl Into<String>,
        config: ClientConfig,
    ) -> Result<Self> {
        let instance_url = instance_url.into();
        url::Url::parse(&instance_url)?;

        let access_token = access_token.into();
        if access_token.is_empty() {
            return Err(Error::new(ErrorKind::Config(
                "access token can not be empty".to_string(),
            )));
        }

        Ok(Self {
            http: SfHttpClient::new(config)?,
            instance_url: instance_url.trim_end_matches('/').to_string(),
            access_token,
            api_version: DEFAULT_API_VERSION.to_string(),
        })
    }

    /// Load from `SF_INSTANCE_URL`, `SF_ACCESS_TOKEN` and optionally `SF_API_VERSION`.
    pub fn from_env() -> Result<Self> {
        let instance_url = require_env("SF_INSTANCE_URL")?;
        let access_token = require_env("SF_ACCESS_TOKEN")?;

        let client = Self::new(instance_url, access_token)?;
        Ok(match std::env::var("SF_API_VERSION") {
            Ok(version) if !version.is_empty() => client.with_api_version(version),
            _ => client,
        })
    }

    /// Set the API version (e.g., "62.0").
    pub fn with_api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = version.into();
        self
    }

    /// Get the access token.
    pub fn access_token(&self) -> &str {
        &self.access_token
    }
}

fn require_env(name: &str) -> Result<String> {
    std::env::var(name).map_err(|_| {
        Error::new(ErrorKind::Config(format!(
            "{name} environment variable not set"
        )))
    })
}

impl Session for SalesforceClient {
    fn instance_url(&self) -> String {
        self.instance_url.clone()
    }

    fn api_version(&self) -> &str {
        &self.api_version
    }

    fn http(&self) -> &SfHttpClient {
        &self.http
    }

    fn authorize(&self, request: RequestBuilder) -> Result<RequestBuilder> {
        Ok(request.bearer_auth(&self.access_token))
    }

    fn refresh(&self) -> impl Future<Output = Result<()>> + Send {
        std::future::ready(Ok(()))
    }
}
