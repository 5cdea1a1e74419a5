//! OAuth2 client-credentials exchange against the identity authority.
//!
//! Every call performs a fresh exchange; tokens are never cached.

use secrecy::{ExposeSecret, SecretString};

use crate::config::Credentials;
use crate::error::FlowError;
use crate::upstream::{Upstream, UpstreamClient};

/// Bearer token for the reporting-service API.
///
/// Not `Clone`: each token is moved into exactly one embed-token exchange
/// and dropped with it.
#[derive(Debug)]
pub struct AccessToken(SecretString);

impl AccessToken {
    /// Wrap a raw token, rejecting empty strings.
    pub fn new(raw: String) -> Option<Self> {
        if raw.is_empty() {
            return None;
        }
        Some(Self(SecretString::new(raw.into())))
    }

    pub(crate) fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

/// Obtain an access token via the client-credentials grant.
///
/// Anything other than a `200` carrying a non-empty `access_token` is an
/// [`FlowError::Authentication`] with the upstream status and body.
pub async fn acquire_access_token(
    http: &UpstreamClient,
    credentials: &Credentials,
) -> Result<AccessToken, FlowError> {
    let reply = http
        .send(Upstream::Authority, |client| {
            client.post(credentials.authority_url.clone()).form(&[
                ("grant_type", "client_credentials"),
                ("client_id", credentials.client_id.as_str()),
                ("client_secret", credentials.client_secret.expose_secret()),
                ("scope", credentials.scope.as_str()),
            ])
        })
        .await?;

    reply
        .token_field("access_token")
        .and_then(AccessToken::new)
        .ok_or(FlowError::Authentication {
            status: reply.status,
            body: reply.body,
        })
}
