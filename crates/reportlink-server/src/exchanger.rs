//! Embed-token exchange against the reporting service.
//!
//! Turns an access token plus an [`EmbedTokenRequest`] into an
//! [`EmbedToken`], and composes the embed URL the front-end loads.

use reportlink_models::{EmbedToken, EmbedTokenRequest, ReportId, WorkspaceId};
use url::Url;

use crate::authority::AccessToken;
use crate::config::EmbedConfig;
use crate::error::FlowError;
use crate::upstream::{Upstream, UpstreamClient};

/// Request an embed token from the `GenerateToken` endpoint.
///
/// Consumes `access_token`.  Anything other than a `200` carrying a
/// non-empty `token` is an [`FlowError::EmbedToken`] with the upstream
/// status and body.
pub async fn acquire_embed_token(
    http: &UpstreamClient,
    endpoint: &Url,
    access_token: AccessToken,
    request: &EmbedTokenRequest,
) -> Result<EmbedToken, FlowError> {
    let body = request.to_body();

    let reply = http
        .send(Upstream::ReportingService, |client| {
            client
                .post(endpoint.clone())
                .bearer_auth(access_token.expose())
                .json(&body)
        })
        .await?;

    let Some(token) = reply.token_field("token") else {
        return Err(FlowError::EmbedToken {
            status: reply.status,
            body: reply.body,
        });
    };

    // `tokenId`/`expiration` are informational; a malformed one must not
    // discard a valid token.
    Ok(
        serde_json::from_str::<EmbedToken>(&reply.body).unwrap_or(EmbedToken {
            token,
            token_id: None,
            expiration: None,
        }),
    )
}

/// Append `reportId` and, when given, `groupId` to `base`.
pub fn compose_embed_url(
    base: &Url,
    report_id: &ReportId,
    workspace_id: Option<&WorkspaceId>,
) -> String {
    let mut url = base.clone();
    {
        let mut query = url.query_pairs_mut();
        query.append_pair("reportId", report_id.as_str());
        if let Some(workspace_id) = workspace_id {
            query.append_pair("groupId", workspace_id.as_str());
        }
    }
    url.into()
}

impl EmbedConfig {
    /// Embed URL for a report: the configured override, or a composed one.
    pub fn embed_url_for(
        &self,
        report_id: &ReportId,
        workspace_id: Option<&WorkspaceId>,
    ) -> String {
        self.embed_url
            .clone()
            .unwrap_or_else(|| compose_embed_url(&self.embed_url_base, report_id, workspace_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::upstream::UpstreamPolicy;
    use reportlink_models::{DatasetId, EmbedTokenPolicy};
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn request(workspace: Option<&str>) -> EmbedTokenRequest {
        EmbedTokenRequest::new(
            &EmbedTokenPolicy::default(),
            ReportId::new("R").unwrap(),
            vec![DatasetId::new("D").unwrap()],
            workspace.map(|w| WorkspaceId::new(w).unwrap()),
        )
        .unwrap()
    }

    fn http() -> UpstreamClient {
        UpstreamClient::new(UpstreamPolicy::default()).unwrap()
    }

    fn generate_token_url(server: &MockServer) -> Url {
        Url::parse(&format!("{}/GenerateToken", server.uri())).unwrap()
    }

    fn token(raw: &str) -> AccessToken {
        AccessToken::new(raw.to_string()).unwrap()
    }

    #[tokio::test]
    async fn sends_bearer_and_generate_token_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/GenerateToken"))
            .and(header("authorization", "Bearer T"))
            .and(body_json(json!({
                "accessLevel": "View",
                "datasets": [{ "id": "D", "xmlaPermissions": "ReadOnly" }],
                "reports": [{ "id": "R" }],
                "identities": [{ "username": "13026", "roles": ["Admin"], "datasets": ["D"] }]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "token": "E",
                "tokenId": "tok-1",
                "expiration": "2026-10-16T13:00:00Z"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let endpoint = generate_token_url(&server);
        let embed = acquire_embed_token(&http(), &endpoint, token("T"), &request(None))
            .await
            .unwrap();

        assert_eq!(embed.token, "E");
        assert_eq!(embed.token_id.as_deref(), Some("tok-1"));
        assert!(embed.expiration.is_some());
    }

    #[tokio::test]
    async fn forbidden_is_an_embed_token_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(403).set_body_json(json!({
                "error": { "code": "PowerBINotAuthorizedException" }
            })))
            .mount(&server)
            .await;

        let endpoint = generate_token_url(&server);
        let err = acquire_embed_token(&http(), &endpoint, token("T"), &request(None))
            .await
            .unwrap_err();

        match err {
            FlowError::EmbedToken { status, body } => {
                assert_eq!(status, 403);
                assert!(body.contains("PowerBINotAuthorizedException"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn ok_status_without_token_is_a_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "tokenId": "x" })))
            .mount(&server)
            .await;

        let endpoint = generate_token_url(&server);
        let err = acquire_embed_token(&http(), &endpoint, token("T"), &request(None))
            .await
            .unwrap_err();
        assert!(matches!(err, FlowError::EmbedToken { status: 200, .. }));
    }

    #[tokio::test]
    async fn malformed_expiration_keeps_the_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "token": "E",
                "expiration": "tomorrow"
            })))
            .mount(&server)
            .await;

        let endpoint = generate_token_url(&server);
        let embed = acquire_embed_token(&http(), &endpoint, token("T"), &request(None))
            .await
            .unwrap();
        assert_eq!(embed.token, "E");
        assert!(embed.expiration.is_none());
    }

    #[test]
    fn embed_url_carries_report_and_group_ids() {
        let base = Url::parse("https://app.powerbi.com/reportEmbed").unwrap();
        let url = compose_embed_url(
            &base,
            &ReportId::new("R").unwrap(),
            Some(&WorkspaceId::new("W").unwrap()),
        );
        assert_eq!(url, "https://app.powerbi.com/reportEmbed?reportId=R&groupId=W");
    }

    #[test]
    fn embed_url_without_workspace_has_no_group() {
        let base = Url::parse("https://app.powerbi.com/reportEmbed").unwrap();
        let url = compose_embed_url(&base, &ReportId::new("R").unwrap(), None);
        assert_eq!(url, "https://app.powerbi.com/reportEmbed?reportId=R");
    }

    #[test]
    fn embed_url_extends_existing_query() {
        let base = Url::parse("https://app.powerbi.com/reportEmbed?autoAuth=true").unwrap();
        let url = compose_embed_url(&base, &ReportId::new("R").unwrap(), None);
        assert_eq!(
            url,
            "https://app.powerbi.com/reportEmbed?autoAuth=true&reportId=R"
        );
    }

    #[test]
    fn configured_embed_url_wins() {
        let cfg = EmbedConfig {
            generate_embed_url: Url::parse("http://reports.test/GenerateToken").unwrap(),
            embed_url: Some("https://embed.test/fixed".into()),
            embed_url_base: Url::parse("https://app.powerbi.com/reportEmbed").unwrap(),
            report: None,
        };
        assert_eq!(
            cfg.embed_url_for(&ReportId::new("R").unwrap(), None),
            "https://embed.test/fixed"
        );
    }
}
