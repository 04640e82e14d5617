//! OAuth credential providers.
//!
//! A provider knows which login endpoint to talk to and how to encode the
//! token request body for its grant type. Both built-in providers validate
//! every field up front so a half-filled configuration never reaches the
//! network.

use std::sync::Arc;

use crate::error::{Error, ErrorKind, Result};
use crate::PRODUCTION_LOGIN_URL;

/// Strategy for producing an OAuth token request.
pub trait CredentialProvider: Send + Sync {
    /// Login URL, e.g. `https://login.salesforce.com`.
    fn url(&self) -> &str;

    /// The `application/x-www-form-urlencoded` token request body.
    fn retrieve(&self) -> Result<String>;
}

/// Username/password grant for a connected app.
///
/// `url` is the login URL, such as `https://test.salesforce.com` for
/// sandboxes.
#[derive(Clone, Default)]
pub struct PasswordCredentials {
    pub url: String,
    pub username: String,
    pub password: String,
    pub client_id: String,
    pub client_secret: String,
}

impl std::fmt::Debug for PasswordCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasswordCredentials")
            .field("url", &self.url)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .finish()
    }
}

impl PasswordCredentials {
    /// Load from `SF_USERNAME`, `SF_PASSWORD`, `SF_CLIENT_ID` and
    /// `SF_CLIENT_SECRET`; `SF_LOGIN_URL` defaults to production.
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            url: login_url_from_env(),
            username: env_var("SF_USERNAME")?,
            password: env_var("SF_PASSWORD")?,
            client_id: env_var("SF_CLIENT_ID")?,
            client_secret: env_var("SF_CLIENT_SECRET")?,
        })
    }

    fn validate(&self) -> Result<()> {
        require(&self.url, "password credential's URL")?;
        require(&self.username, "password credential's username")?;
        require(&self.password, "password credential's password")?;
        require(&self.client_id, "password credential's client ID")?;
        require(&self.client_secret, "password credential's client secret")
    }
}

impl CredentialProvider for PasswordCredentials {
    fn url(&self) -> &str {
        &self.url
    }

    fn retrieve(&self) -> Result<String> {
        let form = [
            ("grant_type", "password"),
            ("username", self.username.as_str()),
            ("password", self.password.as_str()),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
        ];
        Ok(serde_urlencoded::to_string(form)?)
    }
}

/// Refresh-token grant, reusing a token issued by an earlier login.
#[derive(Clone, Default)]
pub struct RefreshTokenCredentials {
    pub url: String,
    pub refresh_token: String,
    pub client_id: String,
    pub client_secret: String,
}

impl std::fmt::Debug for RefreshTokenCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshTokenCredentials")
            .field("url", &self.url)
            .field("refresh_token", &"[REDACTED]")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .finish()
    }
}

impl RefreshTokenCredentials {
    /// Load from `SF_REFRESH_TOKEN`, `SF_CLIENT_ID` and `SF_CLIENT_SECRET`;
    /// `SF_LOGIN_URL` defaults to production.
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            url: login_url_from_env(),
            refresh_token: env_var("SF_REFRESH_TOKEN")?,
            client_id: env_var("SF_CLIENT_ID")?,
            client_secret: env_var("SF_CLIENT_SECRET")?,
        })
    }

    fn validate(&self) -> Result<()> {
        require(&self.url, "refresh token credential's URL")?;
        require(&self.refresh_token, "refresh token credential's refresh token")?;
        require(&self.client_id, "refresh token credential's client ID")?;
        require(&self.client_secret, "refresh token credential's client secret")
    }
}

impl CredentialProvider for RefreshTokenCredentials {
    fn url(&self) -> &str {
        &self.url
    }

    fn retrieve(&self) -> Result<String> {
        let form = [
            ("grant_type", "refresh_token"),
            ("format", "json"),
            ("refresh_token", self.refresh_token.as_str()),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
        ];
        Ok(serde_urlencoded::to_string(form)?)
    }
}

/// Validated credentials, ready to hand to [`OAuthClient`](crate::OAuthClient).
#[derive(Clone)]
pub struct Credentials {
    provider: Arc<dyn CredentialProvider>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("url", &self.provider.url())
            .finish_non_exhaustive()
    }
}

impl Credentials {
    /// Password grant. Fails if any field is empty.
    pub fn password(creds: PasswordCredentials) -> Result<Self> {
        creds.validate()?;
        Ok(Self::from_provider(creds))
    }

    /// Refresh-token grant. Fails if any field is empty.
    pub fn refresh_token(creds: RefreshTokenCredentials) -> Result<Self> {
        creds.validate()?;
        Ok(Self::from_provider(creds))
    }

    /// Wrap a custom provider. No validation is applied.
    pub fn from_provider(provider: impl CredentialProvider + 'static) -> Self {
        Self {
            provider: Arc::new(provider),
        }
    }

    /// Login URL of the underlying provider.
    pub fn url(&self) -> &str {
        self.provider.url()
    }

    /// Encoded token request body.
    pub fn retrieve(&self) -> Result<String> {
        self.provider.retrieve()
    }
}

fn require(value: &str, what: &str) -> Result<()> {
    if value.is_empty() {
        return Err(Error::invalid_credentials(format!("{what} can not be empty")));
    }
    Ok(())
}

fn env_var(name: &str) -> Result<String> {
    std::env::var(name).map_err(|_| Error::new(ErrorKind::EnvVar(name.to_string())))
}

fn login_url_from_env() -> String {
    std::env::var("SF_LOGIN_URL").unwrap_or_else(|_| PRODUCTION_LOGIN_URL.to_string())
}
