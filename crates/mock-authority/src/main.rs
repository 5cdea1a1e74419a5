//! Mock identity authority and reporting service.
//!
//! Lets the proxy run end-to-end on a laptop:
//!
//! * `POST /{tenant}/oauth2/v2.0/token` — client-credentials grant; issues
//!   an HS256 JWT access token for the configured client.
//! * `POST /v1.0/myorg/GenerateToken` — checks the bearer JWT and returns a
//!   random embed token valid for one hour.

use std::sync::Arc;

use axum::extract::{Form, Json, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::routing::post;
use axum::Router;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use reportlink_models::{EmbedToken, GenerateTokenBody};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;

const ISSUER: &str = "http://localhost:4000";
const AUDIENCE: &str = "https://analysis.windows.net/powerbi/api";

struct MockState {
    client_id: String,
    client_secret: String,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl MockState {
    fn new(client_id: String, client_secret: String, signing_key: &[u8]) -> Self {
        Self {
            client_id,
            client_secret,
            encoding_key: EncodingKey::from_secret(signing_key),
            decoding_key: DecodingKey::from_secret(signing_key),
        }
    }

    /// `MOCK_CLIENT_ID`, `MOCK_CLIENT_SECRET` and `MOCK_SIGNING_KEY`, with
    /// development defaults.
    fn from_env() -> Self {
        let var = |name: &str, default: &str| {
            std::env::var(name).unwrap_or_else(|_| default.to_string())
        };
        Self::new(
            var("MOCK_CLIENT_ID", "mock-client"),
            var("MOCK_CLIENT_SECRET", "mock-secret"),
            var("MOCK_SIGNING_KEY", "mock-signing-key").as_bytes(),
        )
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let port = std::env::var("MOCK_PORT").unwrap_or_else(|_| "4000".to_string());
    let state = Arc::new(MockState::from_env());
    info!(client_id = %state.client_id, "mock client registered");

    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(address = %addr, "mock authority listening");
    axum::serve(listener, app(state)).await?;
    Ok(())
}

fn app(state: Arc<MockState>) -> Router {
    Router::new()
        .route("/{tenant}/oauth2/v2.0/token", post(token))
        .route("/v1.0/myorg/GenerateToken", post(generate_token))
        .with_state(state)
}

// --- Authority ---

#[derive(Deserialize)]
struct TokenRequest {
    grant_type: String,
    client_id: String,
    client_secret: String,
    #[serde(default)]
    scope: String,
}

#[derive(Serialize, Deserialize)]
struct AccessClaims {
    iss: String,
    sub: String,
    aud: String,
    exp: i64,
    iat: i64,
    jti: String,
    scp: String,
}

async fn token(
    State(state): State<Arc<MockState>>,
    Form(req): Form<TokenRequest>,
) -> (StatusCode, Json<Value>) {
    info!(client_id = %req.client_id, grant_type = %req.grant_type, "token request");

    if req.grant_type != "client_credentials" {
        return oauth_error(StatusCode::BAD_REQUEST, "unsupported_grant_type");
    }
    if req.client_id != state.client_id || req.client_secret != state.client_secret {
        return oauth_error(StatusCode::UNAUTHORIZED, "invalid_client");
    }

    let now = Utc::now();
    let expires_in = 3599;
    let claims = AccessClaims {
        iss: ISSUER.to_string(),
        sub: req.client_id,
        aud: AUDIENCE.to_string(),
        exp: (now + Duration::seconds(expires_in)).timestamp(),
        iat: now.timestamp(),
        jti: Uuid::new_v4().to_string(),
        scp: req.scope,
    };

    match encode(&Header::new(Algorithm::HS256), &claims, &state.encoding_key) {
        Ok(access_token) => (
            StatusCode::OK,
            Json(json!({
                "token_type": "Bearer",
                "expires_in": expires_in,
                "access_token": access_token
            })),
        ),
        Err(e) => oauth_error(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string()),
    }
}

fn oauth_error(status: StatusCode, code: &str) -> (StatusCode, Json<Value>) {
    (status, Json(json!({ "error": code })))
}

// --- Reporting service ---

async fn generate_token(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Json(body): Json<GenerateTokenBody>,
) -> (StatusCode, Json<Value>) {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));
    let Some(bearer) = bearer else {
        return service_error(StatusCode::UNAUTHORIZED, "MissingBearerToken");
    };

    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_audience(&[AUDIENCE]);
    let claims = match decode::<AccessClaims>(bearer, &state.decoding_key, &validation) {
        Ok(data) => data.claims,
        Err(_) => return service_error(StatusCode::FORBIDDEN, "TokenExpiredOrInvalid"),
    };

    if body.reports.is_empty() || body.datasets.is_empty() {
        return service_error(StatusCode::BAD_REQUEST, "InvalidRequest");
    }

    info!(
        client_id = %claims.sub,
        reports = body.reports.len(),
        datasets = body.datasets.len(),
        identities = body.identities.len(),
        access_level = %body.access_level,
        "embed token issued"
    );

    let embed = EmbedToken {
        token: format!("mock-embed.{}", Uuid::new_v4().simple()),
        token_id: Some(Uuid::new_v4().to_string()),
        expiration: Some(Utc::now() + Duration::hours(1)),
    };
    (StatusCode::OK, Json(json!(embed)))
}

fn service_error(status: StatusCode, code: &str) -> (StatusCode, Json<Value>) {
    (
        status,
        Json(json!({ "error": { "code": code, "message": status.canonical_reason() } })),
    )
}

#[cfg(test)]
mod tests {
    use axum_test::TestServer;

    use super::*;

    fn server() -> TestServer {
        let state = Arc::new(MockState::new(
            "mock-client".into(),
            "mock-secret".into(),
            b"test-key",
        ));
        TestServer::new(app(state)).unwrap()
    }

    fn form(secret: &str) -> Vec<(&'static str, String)> {
        vec![
            ("grant_type", "client_credentials".to_string()),
            ("client_id", "mock-client".to_string()),
            ("client_secret", secret.to_string()),
            ("scope", format!("{AUDIENCE}/.default")),
        ]
    }

    async fn access_token(server: &TestServer) -> String {
        let body = server
            .post("/common/oauth2/v2.0/token")
            .form(&form("mock-secret"))
            .await
            .json::<Value>();
        body["access_token"].as_str().unwrap().to_string()
    }

    fn generate_body() -> Value {
        json!({
            "datasets": [{ "id": "D", "xmlaPermissions": "ReadOnly" }],
            "reports": [{ "id": "R" }],
            "identities": [{ "username": "13026", "roles": ["Admin"], "datasets": ["D"] }]
        })
    }

    #[tokio::test]
    async fn wrong_secret_is_invalid_client() {
        let response = server()
            .post("/common/oauth2/v2.0/token")
            .form(&form("nope"))
            .await;
        assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(response.json::<Value>()["error"], "invalid_client");
    }

    #[tokio::test]
    async fn issued_token_unlocks_generate_token() {
        let server = server();
        let token = access_token(&server).await;

        let response = server
            .post("/v1.0/myorg/GenerateToken")
            .authorization_bearer(token)
            .json(&generate_body())
            .await;

        assert_eq!(response.status_code(), StatusCode::OK);
        let embed = response.json::<EmbedToken>();
        assert!(embed.token.starts_with("mock-embed."));
        assert!(embed.expiration.is_some());
    }

    #[tokio::test]
    async fn generate_token_rejects_foreign_bearer() {
        let response = server()
            .post("/v1.0/myorg/GenerateToken")
            .authorization_bearer("not-a-jwt")
            .json(&generate_body())
            .await;
        assert_eq!(response.status_code(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn generate_token_requires_reports() {
        let server = server();
        let token = access_token(&server).await;

        let response = server
            .post("/v1.0/myorg/GenerateToken")
            .authorization_bearer(token)
            .json(&json!({ "datasets": [{ "id": "D" }], "reports": [] }))
            .await;
        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    }
}
