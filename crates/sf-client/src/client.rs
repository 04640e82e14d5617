//! Core HTTP client with compression and Salesforce-specific error handling.

use tracing::{debug, info, instrument};

use crate::config::ClientConfig;
use crate::error::{Error, ErrorKind, Result};
use crate::request::{RequestBody, RequestBuilder, RequestMethod};
use crate::response::Response;

/// HTTP client for Salesforce APIs.
///
/// Each request is sent once; non-2xx answers are decoded into
/// [`ErrorKind::SalesforceApi`] or a status-derived error kind.
#[derive(Debug, Clone)]
pub struct SfHttpClient {
    inner: reqwest::Client,
    config: ClientConfig,
}

impl SfHttpClient {
    /// Create a new HTTP client with the given configuration.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let inner = reqwest::Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .pool_idle_timeout(config.pool_idle_timeout)
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .user_agent(&config.user_agent)
            .gzip(config.accept_compressed)
            .deflate(config.accept_compressed)
            .build()
            .map_err(|e| Error::with_source(ErrorKind::Config(e.to_string()), e))?;

        Ok(Self { inner, config })
    }

    /// Create a new HTTP client with default configuration.
    pub fn default_client() -> Result<Self> {
        Self::new(ClientConfig::default())
    }

    /// Get the client configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// The configured reqwest client, for callers that speak to non-API
    /// endpoints such as the OAuth token URL.
    pub fn reqwest_client(&self) -> &reqwest::Client {
        &self.inner
    }

    /// Create a GET request builder.
    pub fn get(&self, url: impl Into<String>) -> RequestBuilder {
        RequestBuilder::new(RequestMethod::Get, url)
    }

    /// Create a POST request builder.
    pub fn post(&self, url: impl Into<String>) -> RequestBuilder {
        RequestBuilder::new(RequestMethod::Post, url)
    }

    /// Create a PATCH request builder.
    pub fn patch(&self, url: impl Into<String>) -> RequestBuilder {
        RequestBuilder::new(RequestMethod::Patch, url)
    }

    /// Create a PUT request builder.
    pub fn put(&self, url: impl Into<String>) -> RequestBuilder {
        RequestBuilder::new(RequestMethod::Put, url)
    }

    /// Create a DELETE request builder.
    pub fn delete(&self, url: impl Into<String>) -> RequestBuilder {
        RequestBuilder::new(RequestMethod::Delete, url)
    }

    /// Execute a request, returning an error for any non-2xx response.
    #[instrument(skip(self, request), fields(method = ?request.method, url = %request.url))]
    pub async fn execute(&self, request: RequestBuilder) -> Result<Response> {
        let response = self.execute_once(request).await?;
        response.check_salesforce_error().await
    }

    /// Execute a request and deserialize the JSON response.
    pub async fn send_json<T: serde::de::DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T> {
        let response = self.execute(request).await?;
        response.json().await
    }

    async fn execute_once(&self, request: RequestBuilder) -> Result<Response> {
        let RequestBuilder {
            method,
            url,
            headers,
            query_params,
            body,
            bearer_token,
        } = request;

        let mut req = self.inner.request(method.to_reqwest(), &url);

        if let Some(ref token) = bearer_token {
            req = req.bearer_auth(token);
        }

        for (name, value) in &headers {
            req = req.header(name.as_str(), value.as_str());
        }

        if !query_params.is_empty() {
            req = req.query(&query_params);
        }

        if let Some(body) = body {
            req = match body {
                RequestBody::Json(value) => req.json(&value),
                RequestBody::Text(text) => req.body(text),
                RequestBody::Bytes(bytes) => req.body(bytes),
            };
        }

        if self.config.enable_tracing {
            debug!(method = ?method, url = %url, "Sending request");
        }

        let response = req.send().await?;

        if self.config.enable_tracing {
            let status = response.status().as_u16();
            let content_length = response.content_length();

            if response.status().is_success() {
                debug!(status, content_length, "Response received");
            } else {
                info!(status, content_length, "Non-success response");
            }
        }

        Ok(Response::new(response))
    }
}
