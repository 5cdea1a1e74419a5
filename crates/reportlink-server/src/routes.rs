//! HTTP facade.
//!
//! | Route                     | Success                             |
//! |---------------------------|-------------------------------------|
//! | `GET /api/user/settings`  | static [`UserSettings`]             |
//! | `GET /api/embedded-tokens`| `{accessToken}`                     |
//! | `GET /api/report-details` | `{reportId, embedUrl, accessToken}` |

use std::sync::Arc;

use axum::Router;
use axum::extract::{Json, Query, State};
use axum::routing::get;
use reportlink_models::{
    EmbedResponse, EmbeddedTokenResponse, ModelError, ReportId, UserSettings, WorkspaceId,
    parse_id_list,
};
use serde::Deserialize;

use crate::AppState;
use crate::cors::build_cors_layer;
use crate::error::ApiError;

/// Query string of `GET /api/embedded-tokens`.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct EmbeddedTokenQuery {
    report_id: Option<String>,
    /// One dataset id, or several separated by commas.
    dataset_id: Option<String>,
    workspace_id: Option<String>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn invalid(err: ModelError) -> ApiError {
    ApiError::Validation(err.to_string())
}

/// `GET /api/user/settings` — static feature flags.
async fn get_user_settings(State(state): State<Arc<AppState>>) -> Json<UserSettings> {
    Json(state.config.user_settings)
}

/// `GET /api/embedded-tokens` — embed token for a caller-chosen report.
///
/// Validation happens before any outbound call.  Upstream failures are
/// logged and surface as an opaque `500`.
async fn get_embedded_token(
    State(state): State<Arc<AppState>>,
    Query(query): Query<EmbeddedTokenQuery>,
) -> Result<Json<EmbeddedTokenResponse>, ApiError> {
    let (Some(report_id), Some(dataset_ids)) =
        (non_blank(query.report_id), non_blank(query.dataset_id))
    else {
        return Err(ApiError::Validation(
            "Both reportId and datasetId are required".into(),
        ));
    };

    let report_id = ReportId::new(&report_id).map_err(invalid)?;
    let dataset_ids = parse_id_list(&dataset_ids, "datasetId").map_err(invalid)?;
    let workspace_id = non_blank(query.workspace_id)
        .map(|w| WorkspaceId::new(&w))
        .transpose()
        .map_err(invalid)?;

    let request = state
        .token_request(report_id, dataset_ids, workspace_id)
        .map_err(invalid)?;
    let token = state
        .generate_embed_token(&request)
        .await
        .map_err(ApiError::TokenIssuance)?;

    Ok(Json(EmbeddedTokenResponse {
        access_token: token.token,
    }))
}

/// `GET /api/report-details` — embed payload for the configured report.
///
/// Upstream failures propagate their status with `{error, status, details}`.
async fn get_report_details(
    State(state): State<Arc<AppState>>,
) -> Result<Json<EmbedResponse>, ApiError> {
    let target = state.config.embed.report.as_ref().ok_or_else(|| {
        ApiError::NotConfigured("REPORT_ID and DATASET_ID must be set".into())
    })?;

    state
        .report_details(target)
        .await
        .map(Json)
        .map_err(ApiError::Upstream)
}

/// Build the application router.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = build_cors_layer(&state.config.cors_allowed_origins);

    Router::new()
        .route("/api/user/settings", get(get_user_settings))
        .route("/api/embedded-tokens", get(get_embedded_token))
        .route("/api/report-details", get(get_report_details))
        .layer(cors)
        .with_state(state)
}
