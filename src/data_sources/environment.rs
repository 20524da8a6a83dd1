use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use super::DataSource;
use crate::api::{check_response, EnvironmentsApi};
use crate::error::ProviderError;
use crate::records::{DataSourceQuery, EnvironmentRecord};
use crate::schema::{Attribute, Block, NestedBlock, Schema};

/// Lookup of an existing environment, registered as `devcycle_environment`.
pub struct EnvironmentDataSource {
    api: Arc<dyn EnvironmentsApi>,
}

impl EnvironmentDataSource {
    /// Data source type name.
    pub const TYPE_NAME: &'static str = "devcycle_environment";

    /// Create a data source that talks to `api`.
    pub fn new(api: Arc<dyn EnvironmentsApi>) -> Self {
        Self { api }
    }

    /// Attribute table: `key` and `project_key` select, everything else is computed.
    pub fn data_source_schema() -> Schema {
        Schema::v0()
            .with_description("Look up a DevCycle environment")
            .with_attribute(
                "key",
                Attribute::required_string().with_description("Environment key or id"),
            )
            .with_attribute(
                "project_key",
                Attribute::required_string()
                    .with_description("Project id or key the environment belongs to"),
            )
            .with_attribute("id", Attribute::computed_string().with_description("Environment id"))
            .with_attribute(
                "project_id",
                Attribute::computed_string().with_description("Id of the owning project"),
            )
            .with_attribute("name", Attribute::computed_string())
            .with_attribute("description", Attribute::computed_string())
            .with_attribute("color", Attribute::computed_string())
            .with_attribute("type", Attribute::computed_string())
            .with_attribute(
                "sdk_keys",
                Attribute::computed_string_list()
                    .with_description("SDK keys ordered mobile, server, client"),
            )
            .with_block(
                "settings",
                NestedBlock::single(
                    Block::new().with_attribute("app_icon_uri", Attribute::computed_string()),
                )
                .computed(),
            )
    }
}

#[async_trait]
impl DataSource for EnvironmentDataSource {
    fn type_name(&self) -> &'static str {
        Self::TYPE_NAME
    }

    fn schema(&self) -> Schema {
        Self::data_source_schema()
    }

    async fn read(&self, config: Value) -> Result<Value, ProviderError> {
        let query = DataSourceQuery::from_config(&config)?;

        let environment = check_response(
            self.api
                .find_environment(&query.key, &query.project_key)
                .await,
            "read",
            "environment",
        )?;

        debug!(key = %environment.key, project = %query.project_key, "looked up environment");
        Ok(serde_json::to_value(EnvironmentRecord::from_response(
            environment,
            query.project_key,
        ))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::CreateEnvironmentDto;
    use crate::testing::InMemoryApi;
    use serde_json::json;

    #[tokio::test]
    async fn test_lookup_returns_full_record() {
        let api = Arc::new(InMemoryApi::new());
        api.insert_environment(
            "my-project",
            CreateEnvironmentDto {
                name: "Production".to_string(),
                key: "production".to_string(),
                description: "live traffic".to_string(),
                color: "#ef4444".to_string(),
                environment_type: "production".to_string(),
                settings: None,
            },
        );

        let source = EnvironmentDataSource::new(api);
        let state = source
            .read(json!({"key": "production", "project_key": "my-project"}))
            .await
            .unwrap();

        assert_eq!(state["name"], "Production");
        assert_eq!(state["project_key"], "my-project");
        assert_eq!(state["sdk_keys"].as_array().unwrap().len(), 3);
        assert!(state["id"].is_string());
    }

    #[tokio::test]
    async fn test_lookup_missing_environment_fails() {
        let source = EnvironmentDataSource::new(Arc::new(InMemoryApi::new()));
        let err = source
            .read(json!({"key": "nope", "project_key": "my-project"}))
            .await
            .unwrap_err();
        assert!(err.message().starts_with("Unable to read environment"));
    }

    #[tokio::test]
    async fn test_lookup_requires_project_key() {
        let source = EnvironmentDataSource::new(Arc::new(InMemoryApi::new()));
        let err = source.read(json!({"key": "production"})).await.unwrap_err();
        assert!(matches!(err, ProviderError::Serialization(_)));
    }

    #[test]
    fn test_schema_is_consistent() {
        assert!(EnvironmentDataSource::data_source_schema().check().is_empty());
    }
}
