//! OAuth 2.0 token endpoint client.

use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::credentials::Credentials;
use crate::error::{Error, ErrorKind, Result};

/// OAuth client for authenticating with Salesforce.
#[derive(Debug, Clone, Default)]
pub struct OAuthClient {
    http_client: reqwest::Client,
}

impl OAuthClient {
    /// Create a new OAuth client.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a preconfigured reqwest client (proxies, timeouts).
    pub fn with_http_client(http_client: reqwest::Client) -> Self {
        Self { http_client }
    }

    /// Exchange credentials for an access token.
    ///
    /// Posts the provider's form body to `{url}/services/oauth2/token`.
    #[instrument(skip(self, credentials), fields(url = %credentials.url()))]
    pub async fn authenticate(&self, credentials: &Credentials) -> Result<TokenResponse> {
        let body = credentials.retrieve()?;
        let token_url = format!(
            "{}/services/oauth2/token",
            credentials.url().trim_end_matches('/')
        );

        let response = self
            .http_client
            .post(token_url)
            .header("Content-Type", "application/x-www-form-urlencoded")
            .header("Accept", "application/json")
            .body(body)
            .send()
            .await?;

        self.handle_token_response(response).await
    }

    /// Handle a token response, checking for errors.
    async fn handle_token_response(&self, response: reqwest::Response) -> Result<TokenResponse> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await?;
            return Err(match serde_json::from_str::<OAuthErrorResponse>(&body) {
                Ok(error) => Error::new(ErrorKind::OAuth {
                    error: error.error,
                    description: error.error_description,
                }),
                Err(_) => Error::new(ErrorKind::Http(format!(
                    "token request failed with status {}",
                    status.as_u16()
                ))),
            });
        }

        let token: TokenResponse = response.json().await?;
        Ok(token)
    }
}

/// Token response from OAuth.
///
/// Sensitive fields like `access_token` and `refresh_token` are redacted
/// in Debug output to prevent accidental exposure in logs.
#[derive(Clone, Deserialize, Serialize)]
pub struct TokenResponse {
    /// Access token.
    pub access_token: String,
    /// Refresh token (if requested).
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Instance URL.
    pub instance_url: String,
    /// User ID URL.
    #[serde(default)]
    pub id: Option<String>,
    /// Token type (usually "Bearer").
    #[serde(default)]
    pub token_type: Option<String>,
    /// Scopes granted.
    #[serde(default)]
    pub scope: Option<String>,
    /// Signature for verification.
    #[serde(default)]
    pub signature: Option<String>,
    /// Issued at timestamp.
    #[serde(default)]
    pub issued_at: Option<String>,
}

impl std::fmt::Debug for TokenResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenResponse")
            .field("access_token", &"[REDACTED]")
            .field(
                "refresh_token",
                &self.refresh_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("instance_url", &self.instance_url)
            .field("id", &self.id)
            .field("token_type", &self.token_type)
            .field("scope", &self.scope)
            .field("signature", &self.signature.as_ref().map(|_| "[REDACTED]"))
            .field("issued_at", &self.issued_at)
            .finish()
    }
}

/// OAuth error response.
#[derive(Debug, Deserialize)]
struct OAuthErrorResponse {
    error: String,
    #[serde(default)]
    error_description: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::PasswordCredentials;
    use wiremock::matchers::{body_string, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn credentials(url: String) -> Credentials {
        Credentials::password(PasswordCredentials {
            url,
            username: "user".to_string(),
            password: "pass".to_string(),
            client_id: "id".to_string(),
            client_secret: "secret".to_string(),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_authenticate_posts_form_body() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/services/oauth2/token"))
            .and(header("Content-Type", "application/x-www-form-urlencoded"))
            .and(body_string(
                "grant_type=password&username=user&password=pass&client_id=id&client_secret=secret",
            ))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "00Dxx!token",
                "instance_url": "https://na1.salesforce.com",
                "token_type": "Bearer"
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let token = OAuthClient::new()
            .authenticate(&credentials(mock_server.uri()))
            .await
            .unwrap();

        assert_eq!(token.access_token, "00Dxx!token");
        assert_eq!(token.instance_url, "https://na1.salesforce.com");
        assert!(token.refresh_token.is_none());
    }

    #[tokio::test]
    async fn test_authenticate_oauth_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/services/oauth2/token"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "error": "invalid_grant",
                "error_description": "authentication failure"
            })))
            .mount(&mock_server)
            .await;

        let err = OAuthClient::new()
            .authenticate(&credentials(mock_server.uri()))
            .await
            .unwrap_err();

        match err.kind {
            ErrorKind::OAuth { error, description } => {
                assert_eq!(error, "invalid_grant");
                assert_eq!(description, "authentication failure");
            }
            other => panic!("unexpected error kind: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_authenticate_unparseable_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/services/oauth2/token"))
            .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
            .mount(&mock_server)
            .await;

        let err = OAuthClient::new()
            .authenticate(&credentials(mock_server.uri()))
            .await
            .unwrap_err();

        assert!(matches!(err.kind, ErrorKind::Http(ref m) if m.contains("503")));
    }

    #[test]
    fn test_token_response_debug_redacts() {
        let token = TokenResponse {
            access_token: "secret-access".to_string(),
            refresh_token: Some("secret-refresh".to_string()),
            instance_url: "https://na1.salesforce.com".to_string(),
            id: None,
            token_type: None,
            scope: None,
            signature: None,
            issued_at: None,
        };
        let debug = format!("{token:?}");
        assert!(!debug.contains("secret-access"));
        assert!(!debug.contains("secret-refresh"));
    }
}
