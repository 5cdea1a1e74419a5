//! ReportLink proxy: obtains client-credential access tokens from an
//! identity authority and trades them for report embed tokens.
//!
//! Each request:
//!
//! 1. Exchanges the configured client id/secret for a fresh access token.
//! 2. Sends it, with the report/dataset ids and the viewer-identity
//!    policy, to the reporting service's `GenerateToken` endpoint.
//! 3. Returns the embed token (and, for report details, the embed URL).
//!
//! Nothing is cached between requests.

pub mod authority;
pub mod config;
pub mod cors;
pub mod error;
pub mod exchanger;
pub mod flow;
pub mod routes;
pub mod upstream;

use crate::config::AppConfig;
use crate::upstream::UpstreamClient;

pub use crate::routes::router;

/// State shared across all Axum handlers.
///
/// Holds read-only configuration and the pooled HTTP client; no tokens.
#[derive(Debug)]
pub struct AppState {
    /// Configuration loaded at startup.
    pub config: AppConfig,
    http: UpstreamClient,
}

impl AppState {
    /// Build the state, including the outbound HTTP client.
    pub fn new(config: AppConfig) -> Result<Self, reqwest::Error> {
        let http = UpstreamClient::new(config.upstream)?;
        Ok(Self { config, http })
    }
}
