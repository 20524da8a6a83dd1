use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, trace};

use super::Resource;
use crate::api::{check_response, FeaturesApi};
use crate::error::ProviderError;
use crate::records::{FeatureRecord, StateLocator};
use crate::schema::{Attribute, AttributeFlags, AttributeType, Block, NestedBlock, Schema};

const KIND: &str = "feature";

/// Handler for `devcycle_feature`.
pub struct FeatureResource {
    api: Arc<dyn FeaturesApi>,
}

impl FeatureResource {
    /// Resource type name.
    pub const TYPE_NAME: &'static str = "devcycle_feature";

    /// Create a handler that talks to `api`.
    pub fn new(api: Arc<dyn FeaturesApi>) -> Self {
        Self { api }
    }

    /// Computed `variations` block. Also published by the feature data source.
    pub fn variations_block() -> NestedBlock {
        NestedBlock::list(
            Block::new()
                .with_description("Feature variations")
                .with_attribute(
                    "key",
                    Attribute::computed_string().with_description("Variation key"),
                )
                .with_attribute(
                    "name",
                    Attribute::computed_string().with_description("Variation name"),
                )
                .with_attribute(
                    "id",
                    Attribute::computed_string().with_description("Variation id"),
                )
                .with_attribute(
                    "variables",
                    Attribute::new(
                        AttributeType::map(AttributeType::String),
                        AttributeFlags::computed(),
                    )
                    .with_description("Variable values of the variation, rendered as strings"),
                ),
        )
        .computed()
    }

    /// Attribute table of `devcycle_feature`.
    pub fn resource_schema() -> Schema {
        Schema::v0()
            .with_description("DevCycle feature")
            .with_attribute(
                "name",
                Attribute::required_string().with_description("Feature name"),
            )
            .with_attribute(
                "description",
                Attribute::optional_string().with_description("Feature description"),
            )
            .with_attribute(
                "key",
                Attribute::required_string()
                    .with_description("Feature key")
                    .with_requires_replace(),
            )
            .with_attribute(
                "project_key",
                Attribute::required_string()
                    .with_description("Project id or key that the feature belongs to")
                    .with_requires_replace(),
            )
            .with_attribute(
                "project_id",
                Attribute::computed_string().with_description("Project id that the feature belongs to"),
            )
            .with_attribute(
                "type",
                Attribute::new(AttributeType::String, AttributeFlags::optional_computed())
                    .with_description("Feature type: release, experiment, permission or ops"),
            )
            .with_attribute(
                "tags",
                Attribute::new(
                    AttributeType::list(AttributeType::String),
                    AttributeFlags::optional(),
                )
                .with_description("Tags attached to the feature"),
            )
            .with_attribute(
                "variables",
                Attribute::computed_string_list()
                    .with_description("Ids of the variables attached to the feature"),
            )
            .with_attribute(
                "id",
                Attribute::computed_string().with_description("Feature id"),
            )
            .with_block("variations", Self::variations_block())
    }
}

#[async_trait]
impl Resource for FeatureResource {
    fn type_name(&self) -> &'static str {
        Self::TYPE_NAME
    }

    fn schema(&self) -> Schema {
        Self::resource_schema()
    }

    async fn create(&self, config: Value) -> Result<Value, ProviderError> {
        let record: FeatureRecord = serde_json::from_value(config)?;

        let feature = check_response(
            self.api
                .create_feature(&record.to_create_request(), &record.project_key)
                .await,
            "create",
            KIND,
        )?;

        let state = FeatureRecord::from_response(feature, record.project_key);
        trace!(key = %state.key, "created a feature");
        Ok(serde_json::to_value(state)?)
    }

    async fn read(&self, state: Value) -> Result<Value, ProviderError> {
        let locator = StateLocator::from_state(&state)?;
        let project = locator.project(KIND)?;

        let feature = check_response(
            self.api.find_feature(locator.lookup_key(KIND)?, project).await,
            "read",
            KIND,
        )?;

        debug!(key = %feature.key, "refreshed feature");
        Ok(serde_json::to_value(FeatureRecord::from_response(
            feature, project,
        ))?)
    }

    async fn update(
        &self,
        prior_state: Value,
        planned_state: Value,
    ) -> Result<Value, ProviderError> {
        let locator = StateLocator::from_state(&prior_state)?;
        let plan: FeatureRecord = serde_json::from_value(planned_state)?;

        let feature = check_response(
            self.api
                .update_feature(
                    &plan.to_update_request(),
                    locator.lookup_key(KIND)?,
                    &plan.project_key,
                )
                .await,
            "update",
            KIND,
        )?;

        let state = FeatureRecord::from_response(feature, plan.project_key);
        trace!(key = %state.key, "updated a feature");
        Ok(serde_json::to_value(state)?)
    }

    async fn delete(&self, state: Value) -> Result<(), ProviderError> {
        let locator = StateLocator::from_state(&state)?;

        check_response(
            self.api
                .remove_feature(locator.lookup_key(KIND)?, locator.project(KIND)?)
                .await,
            "delete",
            KIND,
        )?;
        trace!(key = ?locator.key, "deleted a feature");
        Ok(())
    }
}
