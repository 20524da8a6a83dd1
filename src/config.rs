//! Provider configuration block.

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::api::{DevCycleClient, DEFAULT_API_URL};
use crate::auth::{get_auth_token_from, DEFAULT_AUTH_URL};
use crate::error::ProviderError;
use crate::schema::{Attribute, Schema};

/// Environment variable consulted when `client_id` is not configured.
pub const CLIENT_ID_ENV: &str = "DEVCYCLE_CLIENT_ID";

/// Environment variable consulted when `client_secret` is not configured.
pub const CLIENT_SECRET_ENV: &str = "DEVCYCLE_CLIENT_SECRET";

/// Decoded provider configuration.
#[derive(Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// OAuth client id.
    pub client_id: Option<String>,
    /// OAuth client secret.
    pub client_secret: Option<String>,
    /// Pre-issued bearer token. Skips the credentials exchange when set.
    pub access_token: Option<String>,
    /// Management API base URL.
    pub api_url: Option<String>,
    /// Token endpoint.
    pub auth_url: Option<String>,
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let redact = |v: &Option<String>| v.as_ref().map(|_| "<redacted>");
        f.debug_struct("ProviderConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &redact(&self.client_secret))
            .field("access_token", &redact(&self.access_token))
            .field("api_url", &self.api_url)
            .field("auth_url", &self.auth_url)
            .finish()
    }
}

impl ProviderConfig {
    /// Attribute table of the provider configuration block.
    pub fn schema() -> Schema {
        Schema::v0()
            .with_description("DevCycle management API credentials")
            .with_attribute(
                "client_id",
                Attribute::optional_string().with_description(format!(
                    "OAuth client id. Defaults to ${}",
                    CLIENT_ID_ENV
                )),
            )
            .with_attribute(
                "client_secret",
                Attribute::optional_string()
                    .sensitive()
                    .with_description(format!("OAuth client secret. Defaults to ${}", CLIENT_SECRET_ENV)),
            )
            .with_attribute(
                "access_token",
                Attribute::optional_string()
                    .sensitive()
                    .with_description("Bearer token used instead of the client credentials exchange"),
            )
            .with_attribute(
                "api_url",
                Attribute::optional_string().with_description("Management API base URL"),
            )
            .with_attribute(
                "auth_url",
                Attribute::optional_string().with_description("OAuth token endpoint"),
            )
    }

    /// Decode the configuration block, filling missing credentials from the process environment.
    pub fn from_value(config: Value) -> Result<Self, ProviderError> {
        Self::from_value_with_env(config, |name| std::env::var(name).ok())
    }

    /// Decode the configuration block, filling missing credentials through `lookup`.
    pub fn from_value_with_env(
        config: Value,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ProviderError> {
        let mut parsed: Self = if config.is_null() {
            Self::default()
        } else {
            serde_json::from_value(config)?
        };

        let non_empty = |v: Option<String>| v.filter(|s| !s.is_empty());
        parsed.client_id = non_empty(parsed.client_id).or_else(|| non_empty(lookup(CLIENT_ID_ENV)));
        parsed.client_secret =
            non_empty(parsed.client_secret).or_else(|| non_empty(lookup(CLIENT_SECRET_ENV)));
        parsed.access_token = non_empty(parsed.access_token);
        Ok(parsed)
    }

    /// Management API base URL in effect.
    pub fn api_url(&self) -> &str {
        self.api_url.as_deref().unwrap_or(DEFAULT_API_URL)
    }

    /// Token endpoint in effect.
    pub fn auth_url(&self) -> &str {
        self.auth_url.as_deref().unwrap_or(DEFAULT_AUTH_URL)
    }

    /// Produce the bearer token, exchanging client credentials when no token is configured.
    pub async fn resolve_token(&self) -> Result<String, ProviderError> {
        if let Some(token) = &self.access_token {
            debug!("using configured access token");
            return Ok(token.clone());
        }

        let (client_id, client_secret) = match (&self.client_id, &self.client_secret) {
            (Some(id), Some(secret)) => (id, secret),
            _ => {
                return Err(ProviderError::Configuration(format!(
                    "client_id and client_secret must be configured or set through {} and {}",
                    CLIENT_ID_ENV, CLIENT_SECRET_ENV
                )))
            }
        };

        let token = get_auth_token_from(self.auth_url(), client_id, client_secret)
            .await
            .map_err(|e| ProviderError::Configuration(format!("unable to authenticate: {}", e)))?;
        Ok(token.access_token)
    }

    /// Authenticate and build the management API client.
    pub async fn build_client(&self) -> Result<DevCycleClient, ProviderError> {
        let token = self.resolve_token().await?;
        DevCycleClient::new(self.api_url(), token)
            .map_err(|e| ProviderError::Configuration(format!("invalid api_url: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn env(pairs: &'static [(&'static str, &'static str)]) -> impl Fn(&str) -> Option<String> {
        move |name| {
            pairs
                .iter()
                .find(|(k, _)| *k == name)
                .map(|(_, v)| v.to_string())
        }
    }

    #[test]
    fn test_explicit_values_win_over_env() {
        let config = ProviderConfig::from_value_with_env(
            json!({"client_id": "cfg-id", "client_secret": "cfg-secret"}),
            env(&[(CLIENT_ID_ENV, "env-id"), (CLIENT_SECRET_ENV, "env-secret")]),
        )
        .unwrap();
        assert_eq!(config.client_id.as_deref(), Some("cfg-id"));
        assert_eq!(config.client_secret.as_deref(), Some("cfg-secret"));
    }

    #[test]
    fn test_env_fills_missing_and_empty_values() {
        let config = ProviderConfig::from_value_with_env(
            json!({"client_id": ""}),
            env(&[(CLIENT_ID_ENV, "env-id"), (CLIENT_SECRET_ENV, "env-secret")]),
        )
        .unwrap();
        assert_eq!(config.client_id.as_deref(), Some("env-id"));
        assert_eq!(config.client_secret.as_deref(), Some("env-secret"));
    }

    #[test]
    fn test_null_block_uses_defaults() {
        let config = ProviderConfig::from_value_with_env(Value::Null, env(&[])).unwrap();
        assert_eq!(config.api_url(), DEFAULT_API_URL);
        assert_eq!(config.auth_url(), DEFAULT_AUTH_URL);
        assert!(config.client_id.is_none());
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = ProviderConfig {
            client_id: Some("id".into()),
            client_secret: Some("top-secret".into()),
            access_token: Some("bearer-value".into()),
            ..Default::default()
        };
        let text = format!("{:?}", config);
        assert!(!text.contains("top-secret"));
        assert!(!text.contains("bearer-value"));
        assert!(text.contains("\"id\""));
    }

    #[tokio::test]
    async fn test_access_token_skips_exchange() {
        let config = ProviderConfig {
            access_token: Some("preissued".into()),
            ..Default::default()
        };
        assert_eq!(config.resolve_token().await.unwrap(), "preissued");
    }

    #[tokio::test]
    async fn test_missing_credentials_is_configuration_error() {
        let err = ProviderConfig::default().resolve_token().await.unwrap_err();
        assert!(matches!(err, ProviderError::Configuration(_)));
    }

    #[test]
    fn test_schema_marks_secrets_sensitive() {
        let schema = ProviderConfig::schema();
        assert!(schema.block.attributes["client_secret"].flags.sensitive);
        assert!(schema.block.attributes["access_token"].flags.sensitive);
        assert!(!schema.block.attributes["client_id"].flags.sensitive);
        assert!(schema.check().is_empty());
    }
}
