//! # sfdc-client
//!
//! Core HTTP client infrastructure for Salesforce APIs.
//!
//! This crate provides:
//! - `SfHttpClient`, a thin reqwest wrapper with compression and tracing
//! - Structured decoding of Salesforce error bodies
//! - The [`Session`] trait every API resource is generic over
//! - `SalesforceClient`, a session built from a pre-issued access token
//!
//! Requests are sent exactly once. Nothing here retries or backs off.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Application Layer                        │
//! │            (sfdc-soql, sfdc-bulk resources and jobs)        │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   Session (trait)                           │
//! │  - SalesforceClient (static token)                          │
//! │  - OAuthSession in sfdc-auth (password / refresh grants)    │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    SfHttpClient                             │
//! │  - Raw HTTP with compression                                │
//! │  - Salesforce error decoding                                │
//! └─────────────────────────────────────────────────────────────┘
//! ```

mod client;
mod config;
mod error;
mod request;
mod response;
mod salesforce_client;
mod session;

pub use client::SfHttpClient;
pub use config::{ClientConfig, ClientConfigBuilder};
pub use error::{Error, ErrorKind, Result};
pub use request::{RequestBody, RequestBuilder, RequestMethod};
pub use response::Response;
pub use salesforce_client::SalesforceClient;
pub use session::Session;

/// Default Salesforce API version
pub const DEFAULT_API_VERSION: &str = "62.0";

/// User-Agent string for the client
pub const USER_AGENT: &str = concat!("sfdc-rs/", env!("CARGO_PKG_VERSION"));
