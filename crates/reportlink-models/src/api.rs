//! Payloads served by the ReportLink HTTP facade.
//!
//! Field names are camelCase to match what the front-end embed component
//! reads.

use serde::{Deserialize, Serialize};

use crate::ids::ReportId;

/// Response of `GET /api/embedded-tokens`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EmbeddedTokenResponse {
    /// The embed token (named `accessToken` by the front-end contract).
    pub access_token: String,
}

/// Response of `GET /api/report-details`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EmbedResponse {
    /// Report to render.
    pub report_id: ReportId,
    /// URL the viewer component loads.
    pub embed_url: String,
    /// Embed token authorising the viewer.
    pub access_token: String,
}

/// Static per-user feature flags served by `GET /api/user/settings`.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserSettings {
    /// Whether the recruitment report is shown to the user.
    pub is_recruitment_report_enabled: bool,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            is_recruitment_report_enabled: true,
        }
    }
}

/// Error payload of `GET /api/report-details`.
///
/// `status` mirrors the HTTP status of the response; `details` echoes the
/// upstream body when one was received.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct UpstreamErrorBody {
    /// Human-readable summary.
    pub error: String,
    /// HTTP status code of this response.
    pub status: u16,
    /// Upstream response body (JSON when parsable, otherwise a string).
    pub details: serde_json::Value,
}
