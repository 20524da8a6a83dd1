//! OAuth2 client-credentials exchange against the DevCycle auth service.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error};

/// Token endpoint of the DevCycle auth service.
pub const DEFAULT_AUTH_URL: &str = "https://auth.devcycle.com/oauth/token";

/// Audience the management API expects in issued tokens.
pub const API_AUDIENCE: &str = "https://api.devcycle.com/";

/// Errors from the token exchange.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Client id or secret was empty.
    #[error("missing credentials: {0}")]
    MissingCredentials(&'static str),

    /// The request could not be sent or the body could not be read.
    #[error("token request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The auth service answered with a non-success status.
    #[error("token request rejected with HTTP status {status}: {body}")]
    Rejected {
        /// HTTP status code.
        status: u16,
        /// Truncated response body.
        body: String,
    },

    /// The response was not a token.
    #[error("invalid token response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Token issued by the auth service.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct AuthToken {
    /// Bearer token for the management API.
    pub access_token: String,
    /// Token type, normally `Bearer`.
    #[serde(default)]
    pub token_type: String,
    /// Lifetime in seconds.
    #[serde(default)]
    pub expires_in: u64,
}

impl std::fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthToken")
            .field("access_token", &"<redacted>")
            .field("token_type", &self.token_type)
            .field("expires_in", &self.expires_in)
            .finish()
    }
}

#[derive(Serialize)]
struct TokenRequest<'a> {
    grant_type: &'static str,
    client_id: &'a str,
    client_secret: &'a str,
    audience: &'static str,
}

/// Exchange client credentials for an access token at [`DEFAULT_AUTH_URL`].
pub async fn get_auth_token(client_id: &str, client_secret: &str) -> Result<AuthToken, AuthError> {
    get_auth_token_from(DEFAULT_AUTH_URL, client_id, client_secret).await
}

/// Exchange client credentials for an access token at `url`.
pub async fn get_auth_token_from(
    url: &str,
    client_id: &str,
    client_secret: &str,
) -> Result<AuthToken, AuthError> {
    if client_id.is_empty() {
        return Err(AuthError::MissingCredentials("client_id"));
    }
    if client_secret.is_empty() {
        return Err(AuthError::MissingCredentials("client_secret"));
    }

    debug!(url, "requesting access token");
    let response = reqwest::Client::new()
        .post(url)
        .form(&TokenRequest {
            grant_type: "client_credentials",
            client_id,
            client_secret,
            audience: API_AUDIENCE,
        })
        .send()
        .await?;

    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        let body: String = body.chars().take(200).collect();
        error!(status = status.as_u16(), "token request rejected");
        return Err(AuthError::Rejected {
            status: status.as_u16(),
            body,
        });
    }

    Ok(serde_json::from_str(&body)?)
}
