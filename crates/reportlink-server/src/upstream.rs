//! Outbound HTTP plumbing shared by both token calls.
//!
//! [`UpstreamClient`] owns the pooled `reqwest` client (configured with a
//! per-call timeout) and applies the retry policy: a call that times out is
//! re-sent up to `timeout_retries` more times.  Any answer from the
//! upstream, including 4xx/5xx, is final.

use std::time::Duration;

use reqwest::{Client, RequestBuilder};
use tracing::warn;

use crate::error::FlowError;

/// The two upstreams the proxy talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum Upstream {
    /// OAuth2 token endpoint.
    #[strum(serialize = "identity authority")]
    Authority,
    /// Embed-token endpoint of the reporting service.
    #[strum(serialize = "reporting service")]
    ReportingService,
}

/// Timeout and retry settings for outbound calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpstreamPolicy {
    /// Deadline for one complete request/response exchange.
    pub timeout: Duration,
    /// Extra attempts allowed after a timeout.
    pub timeout_retries: u32,
}

impl Default for UpstreamPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            timeout_retries: 1,
        }
    }
}

/// Status and raw body of an upstream answer.
#[derive(Debug, Clone)]
pub struct UpstreamReply {
    /// HTTP status code.
    pub status: u16,
    /// Response body as text.
    pub body: String,
}

impl UpstreamReply {
    /// Extract a non-empty string field from a `200` JSON body.
    ///
    /// Returns `None` for any other status, an unparsable body, or a
    /// missing/empty/non-string field.
    pub fn token_field(&self, field: &str) -> Option<String> {
        if self.status != 200 {
            return None;
        }
        let body: serde_json::Value = serde_json::from_str(&self.body).ok()?;
        body[field]
            .as_str()
            .filter(|token| !token.is_empty())
            .map(String::from)
    }
}

/// HTTP client for upstream calls.
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    client: Client,
    policy: UpstreamPolicy,
}

impl UpstreamClient {
    /// Build a client enforcing `policy`.
    pub fn new(policy: UpstreamPolicy) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(policy.timeout).build()?;
        Ok(Self { client, policy })
    }

    /// Send the request produced by `build`, retrying on timeout only.
    ///
    /// `build` is called once per attempt so every attempt carries a fresh
    /// body.
    pub async fn send<F>(&self, upstream: Upstream, build: F) -> Result<UpstreamReply, FlowError>
    where
        F: Fn(&Client) -> RequestBuilder,
    {
        let attempts = self.policy.timeout_retries.saturating_add(1);
        let mut attempt = 1;

        loop {
            match Self::exchange(build(&self.client)).await {
                Ok(reply) => return Ok(reply),
                Err(err) if err.is_timeout() && attempt < attempts => {
                    warn!(%upstream, attempt, "upstream call timed out, retrying");
                    attempt += 1;
                }
                Err(err) if err.is_timeout() => {
                    return Err(FlowError::Timeout { upstream, attempts });
                }
                Err(err) => return Err(FlowError::Transport(err)),
            }
        }
    }

    async fn exchange(request: RequestBuilder) -> Result<UpstreamReply, reqwest::Error> {
        let res = request.send().await?;
        let status = res.status().as_u16();
        let body = res.text().await?;
        Ok(UpstreamReply { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn reply(status: u16, body: &str) -> UpstreamReply {
        UpstreamReply {
            status,
            body: body.to_string(),
        }
    }

    #[test]
    fn token_field_requires_exact_200() {
        assert_eq!(
            reply(200, r#"{"token":"E"}"#).token_field("token").as_deref(),
            Some("E")
        );
        assert!(reply(201, r#"{"token":"E"}"#).token_field("token").is_none());
    }

    #[test]
    fn token_field_rejects_missing_or_empty_values() {
        assert!(reply(200, "{}").token_field("token").is_none());
        assert!(reply(200, r#"{"token":""}"#).token_field("token").is_none());
        assert!(reply(200, r#"{"token":42}"#).token_field("token").is_none());
        assert!(reply(200, "not json").token_field("token").is_none());
    }

    #[tokio::test]
    async fn timed_out_call_is_retried_then_reported() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/slow"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
            .expect(2)
            .mount(&server)
            .await;

        let client = UpstreamClient::new(UpstreamPolicy {
            timeout: Duration::from_millis(100),
            timeout_retries: 1,
        })
        .unwrap();
        let url = format!("{}/slow", server.uri());

        let err = client
            .send(Upstream::Authority, |http| http.post(&url))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            FlowError::Timeout {
                upstream: Upstream::Authority,
                attempts: 2
            }
        ));
    }

    #[tokio::test]
    async fn error_statuses_are_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/denied"))
            .respond_with(ResponseTemplate::new(503).set_body_string("busy"))
            .expect(1)
            .mount(&server)
            .await;

        let client = UpstreamClient::new(UpstreamPolicy::default()).unwrap();
        let url = format!("{}/denied", server.uri());

        let reply = client
            .send(Upstream::ReportingService, |http| http.post(&url))
            .await
            .unwrap();

        assert_eq!(reply.status, 503);
        assert_eq!(reply.body, "busy");
    }

    #[tokio::test]
    async fn unreachable_upstream_is_a_transport_error() {
        let client = UpstreamClient::new(UpstreamPolicy::default()).unwrap();
        let err = client
            .send(Upstream::Authority, |http| http.post("http://127.0.0.1:1/token"))
            .await
            .unwrap_err();
        assert!(matches!(err, FlowError::Transport(_)));
    }
}
