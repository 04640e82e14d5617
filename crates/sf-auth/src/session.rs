//! A [`Session`] that logs in through a credential provider.

use std::future::Future;
use std::sync::{PoisonError, RwLock, RwLockReadGuard};

use sfdc_client::{ClientConfig, RequestBuilder, Session, SfHttpClient, DEFAULT_API_VERSION};
use tracing::{info, instrument};

use crate::credentials::Credentials;
use crate::error::{Error, ErrorKind, Result};
use crate::oauth::{OAuthClient, TokenResponse};

/// Session whose access token comes from an OAuth grant.
///
/// A fresh session holds no token. [`Session::refresh`] (or
/// [`OAuthSession::login`]) performs the grant and swaps the token in; every
/// later refresh repeats the grant with the same credentials.
///
/// # Example
///
/// ```rust,ignore
/// use sfdc_auth::{Credentials, OAuthSession, PasswordCredentials};
///
/// let credentials = Credentials::password(PasswordCredentials::from_env()?)?;
/// let session = OAuthSession::login(credentials).await?;
/// ```
pub struct OAuthSession {
    credentials: Credentials,
    oauth: OAuthClient,
    http: SfHttpClient,
    api_version: String,
    token: RwLock<Option<TokenResponse>>,
}

impl std::fmt::Debug for OAuthSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthSession")
            .field("credentials", &self.credentials)
            .field("api_version", &self.api_version)
            .field("authenticated", &self.is_authenticated())
            .finish_non_exhaustive()
    }
}

impl OAuthSession {
    /// Create an unauthenticated session with the default client configuration.
    pub fn new(credentials: Credentials) -> Result<Self> {
        Self::with_config(credentials, ClientConfig::default())
    }

    /// Create an unauthenticated session with a custom client configuration.
    ///
    /// Token requests share the configured timeouts and user agent.
    pub fn with_config(credentials: Credentials, config: ClientConfig) -> Result<Self> {
        let http = SfHttpClient::new(config)?;
        Ok(Self {
            credentials,
            oauth: OAuthClient::with_http_client(http.reqwest_client().clone()),
            http,
            api_version: DEFAULT_API_VERSION.to_string(),
            token: RwLock::new(None),
        })
    }

    /// Create a session and perform the initial grant.
    pub async fn login(credentials: Credentials) -> Result<Self> {
        let session = Self::new(credentials)?;
        session.authenticate().await?;
        Ok(session)
    }

    /// Set the API version (e.g., "62.0").
    pub fn with_api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = version.into();
        self
    }

    /// Replace the token endpoint client.
    pub fn with_oauth_client(mut self, oauth: OAuthClient) -> Self {
        self.oauth = oauth;
        self
    }

    /// Run the grant and store the resulting token.
    #[instrument(skip(self), fields(url = %self.credentials.url()))]
    pub async fn authenticate(&self) -> Result<()> {
        let token = self.oauth.authenticate(&self.credentials).await?;
        info!(instance_url = %token.instance_url, "Obtained access token");
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = Some(token);
        Ok(())
    }

    /// Returns true once a grant has succeeded.
    pub fn is_authenticated(&self) -> bool {
        self.current().is_some()
    }

    /// A copy of the current token response, if any.
    pub fn token(&self) -> Option<TokenResponse> {
        self.current().clone()
    }

    fn current(&self) -> RwLockReadGuard<'_, Option<TokenResponse>> {
        self.token.read().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Session for OAuthSession {
    fn instance_url(&self) -> String {
        self.current()
            .as_ref()
            .map(|token| token.instance_url.trim_end_matches('/').to_string())
            .unwrap_or_default()
    }

    fn api_version(&self) -> &str {
        &self.api_version
    }

    fn http(&self) -> &SfHttpClient {
        &self.http
    }

    fn authorize(&self, request: RequestBuilder) -> sfdc_client::Result<RequestBuilder> {
        match self.current().as_ref() {
            Some(token) => Ok(request.bearer_auth(&token.access_token)),
            None => Err(Error::new(ErrorKind::NotAuthenticated(
                "refresh the session before issuing requests".to_string(),
            ))
            .into()),
        }
    }

    fn refresh(&self) -> impl Future<Output = sfdc_client::Result<()>> + Send {
        async move { self.authenticate().await.map_err(Into::into) }
    }
}
