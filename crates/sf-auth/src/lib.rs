//! # sfdc-auth
//!
//! OAuth 2.0 credential providers for Salesforce and a session that uses them.
//!
//! ## Security
//!
//! - Secrets (passwords, client secrets, tokens) are redacted in Debug output
//! - Tracing spans skip credential parameters
//! - Every required credential field is validated before any request is sent
//!
//! ## Supported grants
//!
//! - **Username/password** ([`PasswordCredentials`])
//! - **Refresh token** ([`RefreshTokenCredentials`])
//! - Anything else through a custom [`CredentialProvider`]
//!
//! ## Example
//!
//! ```rust,ignore
//! use sfdc_auth::{Credentials, OAuthSession, PasswordCredentials};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), sfdc_auth::Error> {
//!     let credentials = Credentials::password(PasswordCredentials {
//!         url: sfdc_auth::SANDBOX_LOGIN_URL.to_string(),
//!         ..PasswordCredentials::from_env()?
//!     })?;
//!
//!     let session = OAuthSession::login(credentials).await?;
//!     Ok(())
//! }
//! ```

mod credentials;
mod error;
mod oauth;
mod session;

pub use credentials::{
    CredentialProvider, Credentials, PasswordCredentials, RefreshTokenCredentials,
};
pub use error::{Error, ErrorKind, Result};
pub use oauth::{OAuthClient, TokenResponse};
pub use session::OAuthSession;

/// Default Salesforce login URL for production.
pub const PRODUCTION_LOGIN_URL: &str = "https://login.salesforce.com";

/// Default Salesforce login URL for sandbox.
pub const SANDBOX_LOGIN_URL: &str = "https://test.salesforce.com";
