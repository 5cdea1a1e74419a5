//! The token flow: access token first, then embed token.
//!
//! Both steps run strictly in sequence; the embed exchange is never
//! attempted without an access token obtained in the same call.

use reportlink_models::{
    DatasetId, EmbedResponse, EmbedToken, EmbedTokenRequest, ModelError, ReportId, WorkspaceId,
};
use tracing::{info, warn};

use crate::AppState;
use crate::authority::acquire_access_token;
use crate::config::ReportTarget;
use crate::error::FlowError;
use crate::exchanger::acquire_embed_token;

impl AppState {
    /// Bind the configured identity policy to a report and its datasets.
    pub fn token_request(
        &self,
        report_id: ReportId,
        dataset_ids: Vec<DatasetId>,
        workspace_id: Option<WorkspaceId>,
    ) -> Result<EmbedTokenRequest, ModelError> {
        EmbedTokenRequest::new(&self.config.policy, report_id, dataset_ids, workspace_id)
    }

    /// Acquire a fresh access token and trade it for an embed token.
    pub async fn generate_embed_token(
        &self,
        request: &EmbedTokenRequest,
    ) -> Result<EmbedToken, FlowError> {
        let report_id = request.report_id();
        info!(
            report_id = %report_id,
            datasets = request.dataset_ids().len(),
            "embed token requested"
        );

        let access_token = acquire_access_token(&self.http, &self.config.credentials)
            .await
            .inspect_err(|e| {
                warn!(report_id = %report_id, error = %e, "access token acquisition failed");
            })?;

        let token = acquire_embed_token(
            &self.http,
            &self.config.embed.generate_embed_url,
            access_token,
            request,
        )
        .await
        .inspect_err(|e| {
            warn!(report_id = %report_id, error = %e, "embed token exchange failed");
        })?;

        info!(
            report_id = %report_id,
            token_id = token.token_id.as_deref().unwrap_or("-"),
            "embed token issued"
        );
        Ok(token)
    }

    /// Run the flow for `target` and assemble the front-end payload.
    pub async fn report_details(&self, target: &ReportTarget) -> Result<EmbedResponse, FlowError> {
        let request = self.token_request(
            target.report_id.clone(),
            target.dataset_ids.clone(),
            target.workspace_id.clone(),
        )?;
        let token = self.generate_embed_token(&request).await?;

        Ok(EmbedResponse {
            report_id: target.report_id.clone(),
            embed_url: self
                .config
                .embed
                .embed_url_for(&target.report_id, target.workspace_id.as_ref()),
            access_token: token.token,
        })
    }
}
