//! HTTP request building with Salesforce-specific headers.

use bytes::Bytes;
use serde::Serialize;
use std::collections::HashMap;

use crate::error::Result;

/// HTTP request method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestMethod {
    Get,
    Post,
    Patch,
    Put,
    Delete,
}

impl RequestMethod {
    /// Convert to reqwest::Method.
    pub fn to_reqwest(&self) -> reqwest::Method {
        match self {
            RequestMethod::Get => reqwest::Method::GET,
            RequestMethod::Post => reqwest::Method::POST,
            RequestMethod::Patch => reqwest::Method::PATCH,
            RequestMethod::Put => reqwest::Method::PUT,
            RequestMethod::Delete => reqwest::Method::DELETE,
        }
    }
}

/// Builder for HTTP requests with Salesforce-specific options.
#[derive(Debug)]
pub struct RequestBuilder {
    pub(crate) method: RequestMethod,
    pub(crate) url: String,
    pub(crate) headers: HashMap<String, String>,
    pub(crate) query_params: Vec<(String, String)>,
    pub(crate) body: Option<RequestBody>,
    pub(crate) bearer_token: Option<String>,
}

/// Request body content.
#[derive(Debug)]
pub enum RequestBody {
    Json(serde_json::Value),
    Text(String),
    Bytes(Bytes),
}

impl RequestBuilder {
    /// Create a new request builder.
    pub fn new(method: RequestMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: HashMap::new(),
            query_params: Vec::new(),
            body: None,
            bearer_token: None,
        }
    }

    /// The request method.
    pub fn method(&self) -> RequestMethod {
        self.method
    }

    /// The target URL, without query parameters.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Look up a header that has been set on this request.
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }

    /// Set the bearer token for authentication.
    pub fn bearer_auth(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    /// Add a header.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Add a query parameter.
    pub fn query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query_params.push((name.into(), value.into()));
        self
    }

    /// Set the Accept header.
    pub fn accept(self, mime: impl Into<String>) -> Self {
        self.header("Accept", mime)
    }

    /// Set JSON body.
    pub fn json<T: Serialize>(mut self, body: &T) -> Result<Self> {
        let value = serde_json::to_value(body)?;
        self.body = Some(RequestBody::Json(value));
        self.headers
            .insert("Content-Type".to_string(), "application/json".to_string());
        Ok(self)
    }

    /// Set bytes body with an explicit content type.
    pub fn bytes(mut self, body: impl Into<Bytes>, content_type: impl Into<String>) -> Self {
        self.body = Some(RequestBody::Bytes(body.into()));
        self.headers
            .insert("Content-Type".to_string(), content_type.into());
        self
    }

    /// Set CSV body (for Bulk API uploads).
    pub fn csv(self, data: impl Into<Bytes>) -> Self {
        self.bytes(data, "text/csv")
    }

    /// Set an already URL-encoded form body.
    pub fn form_encoded(mut self, body: impl Into<String>) -> Self {
        self.body = Some(RequestBody::Text(body.into()));
        self.headers.insert(
            "Content-Type".to_string(),
            "application/x-www-form-urlencoded".to_string(),
        );
        self
    }

    /// Set Sforce-Call-Options header (client name for API usage tracking).
    pub fn sforce_call_options(self, options: impl Into<String>) -> Self {
        self.header("Sforce-Call-Options", options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_builder() {
        let req = RequestBuilder::new(RequestMethod::Get, "https://example.com/api")
            .bearer_auth("token123")
            .header("X-Custom", "value")
            .query("q", "SELECT Id FROM Account");

        assert_eq!(req.method(), RequestMethod::Get);
        assert_eq!(req.url(), "https://example.com/api");
        assert_eq!(req.bearer_token, Some("token123".to_string()));
        assert_eq!(req.header_value("X-Custom"), Some("value"));
        assert_eq!(req.query_params.len(), 1);
    }

    #[test]
    fn test_json_body() {
        let data = serde_json::json!({"object": "Account", "operation": "insert"});
        let req = RequestBuilder::new(RequestMethod::Post, "https://example.com")
            .json(&data)
            .unwrap();

        assert!(matches!(req.body, Some(RequestBody::Json(_))));
        assert_eq!(req.header_value("Content-Type"), Some("application/json"));
    }

    #[test]
    fn test_csv_body() {
        let req = RequestBuilder::new(RequestMethod::Put, "https://example.com")
            .csv("Id,Name\n001xx,Test");

        assert!(matches!(req.body, Some(RequestBody::Bytes(_))));
        assert_eq!(req.header_value("Content-Type"), Some("text/csv"));
    }

    #[test]
    fn test_form_encoded_body() {
        let req = RequestBuilder::new(RequestMethod::Post, "https://example.com")
            .form_encoded("grant_type=password");

        assert!(matches!(req.body, Some(RequestBody::Text(ref b)) if b == "grant_type=password"));
        assert_eq!(
            req.header_value("Content-Type"),
            Some("application/x-www-form-urlencoded")
        );
    }
}
