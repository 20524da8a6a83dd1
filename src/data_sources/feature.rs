use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use super::DataSource;
use crate::api::{check_response, FeaturesApi};
use crate::error::ProviderError;
use crate::records::{DataSourceQuery, FeatureRecord};
use crate::resources::FeatureResource;
use crate::schema::{Attribute, Schema};

/// Lookup of an existing feature, registered as `devcycle_feature`.
pub struct FeatureDataSource {
    api: Arc<dyn FeaturesApi>,
}

impl FeatureDataSource {
    /// Data source type name.
    pub const TYPE_NAME: &'static str = "devcycle_feature";

    /// Create a data source that talks to `api`.
    pub fn new(api: Arc<dyn FeaturesApi>) -> Self {
        Self { api }
    }

    /// Attribute table: `key` and `project_key` select, everything else is computed.
    pub fn data_source_schema() -> Schema {
        Schema::v0()
            .with_description("Look up a DevCycle feature")
            .with_attribute(
                "key",
                Attribute::required_string().with_description("Feature key or id"),
            )
            .with_attribute(
                "project_key",
                Attribute::required_string()
                    .with_description("Project id or key the feature belongs to"),
            )
            .with_attribute("id", Attribute::computed_string().with_description("Feature id"))
            .with_attribute("project_id", Attribute::computed_string())
            .with_attribute("name", Attribute::computed_string())
            .with_attribute("description", Attribute::computed_string())
            .with_attribute("type", Attribute::computed_string())
            .with_attribute(
                "variables",
                Attribute::computed_string_list()
                    .with_description("Ids of the variables attached to the feature"),
            )
            .with_block("variations", FeatureResource::variations_block())
    }
}

#[async_trait]
impl DataSource for FeatureDataSource {
    fn type_name(&self) -> &'static str {
        Self::TYPE_NAME
    }

    fn schema(&self) -> Schema {
        Self::data_source_schema()
    }

    async fn read(&self, config: Value) -> Result<Value, ProviderError> {
        let query = DataSourceQuery::from_config(&config)?;

        let feature = check_response(
            self.api.find_feature(&query.key, &query.project_key).await,
            "read",
            "feature",
        )?;

        debug!(key = %feature.key, project = %query.project_key, "looked up feature");
        let record = FeatureRecord {
            tags: None,
            ..FeatureRecord::from_response(feature, query.project_key)
        };
        Ok(serde_json::to_value(record)?)
    }
}
