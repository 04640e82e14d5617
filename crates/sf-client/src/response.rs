//! HTTP response handling with Salesforce-specific extensions.

use serde::de::DeserializeOwned;
use std::sync::OnceLock;
use std::time::Duration;
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::error::{Error, ErrorKind, Result};

/// Wrapper around HTTP response with additional functionality.
#[derive(Debug)]
pub struct Response {
    inner: reqwest::Response,
}

impl Response {
    pub(crate) fn new(inner: reqwest::Response) -> Self {
        Self { inner }
    }

    /// Get the HTTP status code.
    pub fn status(&self) -> u16 {
        self.inner.status().as_u16()
    }

    /// Returns true if the response status is successful (2xx).
    pub fn is_success(&self) -> bool {
        self.inner.status().is_success()
    }

    /// Get a header value.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.inner.headers().get(name)?.to_str().ok()
    }

    /// Get the Retry-After header as a Duration.
    ///
    /// Only the delta-seconds form is understood.
    pub fn retry_after(&self) -> Option<Duration> {
        self.header("retry-after")?
            .parse::<u64>()
            .ok()
            .map(Duration::from_secs)
    }

    /// Get the Sforce-Locator header (Bulk API 2.0 query result paging).
    ///
    /// Salesforce sends the literal string `null` on the last page; that and
    /// an empty header are both reported as `None`.
    pub fn sforce_locator(&self) -> Option<&str> {
        self.header("sforce-locator")
            .map(str::trim)
            .filter(|locator| !locator.is_empty() && *locator != "null")
    }

    /// Get the Content-Type header.
    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }

    /// Get the response body as text.
    pub async fn text(self) -> Result<String> {
        self.inner.text().await.map_err(Into::into)
    }

    /// Get the response body as bytes.
    pub async fn bytes(self) -> Result<bytes::Bytes> {
        self.inner.bytes().await.map_err(Into::into)
    }

    /// Deserialize the response body as JSON.
    pub async fn json<T: DeserializeOwned>(self) -> Result<T> {
        let body = self.inner.bytes().await?;
        serde_json::from_slice(&body).map_err(Into::into)
    }

    /// Stream the body into `writer` chunk by chunk, returning the byte count.
    ///
    /// The body is passed through untouched.
    pub async fn write_to<W>(self, writer: &mut W) -> Result<u64>
    where
        W: AsyncWrite + Unpin,
    {
        let mut inner = self.inner;
        let mut written = 0u64;
        while let Some(chunk) = inner.chunk().await? {
            writer.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        writer.flush().await?;
        Ok(written)
    }

    /// Get access to the inner reqwest::Response.
    pub fn into_inner(self) -> reqwest::Response {
        self.inner
    }

    /// Turn a non-2xx response into the matching error.
    pub(crate) async fn check_salesforce_error(self) -> Result<Response> {
        if self.is_success() {
            return Ok(self);
        }

        let status = self.status();
        let retry_after = self.retry_after();
        let body = self.text().await.unwrap_or_default();
        Err(parse_error_response(status, retry_after, &body))
    }
}

/// Parse an error response body and convert it to the appropriate error kind.
fn parse_error_response(status: u16, retry_after: Option<Duration>, body: &str) -> Error {
    if status == 429 {
        return Error::new(ErrorKind::RateLimited { retry_after });
    }

    // Salesforce usually answers with an array of errors; the first one wins.
    if let Ok(errors) = serde_json::from_str::<Vec<SalesforceErrorResponse>>(body) {
        if let Some(err) = errors.into_iter().next() {
            return err.into_error();
        }
    }

    if let Ok(err) = serde_json::from_str::<SalesforceErrorResponse>(body) {
        return err.into_error();
    }

    let sanitized = sanitize_error_message(body);
    let kind = match status {
        401 => ErrorKind::Authentication(sanitized),
        403 => ErrorKind::Authorization(sanitized),
        404 => ErrorKind::NotFound(sanitized),
        _ => ErrorKind::Http {
            status,
            message: sanitized,
        },
    };

    Error::new(kind)
}

fn token_pattern() -> &'static regex_lite::Regex {
    static PATTERN: OnceLock<regex_lite::Regex> = OnceLock::new();
    // Access tokens are "<org id>!<opaque>".
    PATTERN.get_or_init(|| {
        regex_lite::Regex::new(r"00[A-Za-z0-9]{13,}[!][A-Za-z0-9_.]+")
            .expect("token pattern is a valid regex")
    })
}

fn session_pattern() -> &'static regex_lite::Regex {
    static PATTERN: OnceLock<regex_lite::Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        regex_lite::Regex::new(r"sid=[A-Za-z0-9]{20,}")
            .expect("session pattern is a valid regex")
    })
}

/// Redact access tokens and session ids, then cap the length at 500 bytes.
fn sanitize_error_message(message: &str) -> String {
    const MAX_LENGTH: usize = 500;

    let redacted = token_pattern().replace_all(message, "[REDACTED_TOKEN]");
    let mut sanitized = session_pattern()
        .replace_all(&redacted, "sid=[REDACTED]")
        .into_owned();

    if sanitized.len() > MAX_LENGTH {
        let mut cut = MAX_LENGTH;
        while !sanitized.is_char_boundary(cut) {
            cut -= 1;
        }
        sanitized.truncate(cut);
        sanitized.push_str("...[truncated]");
    }

    sanitized
}

/// Salesforce API error response format.
///
/// Bulk API 1.0 reports `exceptionCode`/`exceptionMessage` instead.
#[derive(Debug, serde::Deserialize)]
struct SalesforceErrorResponse {
    #[serde(alias = "errorCode", alias = "exceptionCode")]
    error_code: String,
    #[serde(alias = "exceptionMessage")]
    message: String,
    fields: Option<Vec<String>>,
}

impl SalesforceErrorResponse {
    fn into_error(self) -> Error {
        Error::new(ErrorKind::SalesforceApi {
            error_code: self.error_code,
            message: sanitize_error_message(&self.message),
            fields: self.fields.unwrap_or_default(),
        })
    }
}
