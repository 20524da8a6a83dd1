use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, trace};

use super::Resource;
use crate::api::{check_response, EnvironmentsApi};
use crate::error::ProviderError;
use crate::records::{EnvironmentRecord, StateLocator};
use crate::schema::{Attribute, Block, NestedBlock, Schema};

const KIND: &str = "environment";

/// Handler for `devcycle_environment`.
pub struct EnvironmentResource {
    api: Arc<dyn EnvironmentsApi>,
}

impl EnvironmentResource {
    /// Resource type name.
    pub const TYPE_NAME: &'static str = "devcycle_environment";

    /// Create a handler that talks to `api`.
    pub fn new(api: Arc<dyn EnvironmentsApi>) -> Self {
        Self { api }
    }

    /// Attribute table of `devcycle_environment`.
    pub fn resource_schema() -> Schema {
        Schema::v0()
            .with_description("DevCycle environment")
            .with_attribute(
                "project_key",
                Attribute::required_string()
                    .with_description("Project id or key of the project to which the environment belongs")
                    .with_requires_replace(),
            )
            .with_attribute(
                "project_id",
                Attribute::computed_string().with_description("Id of the owning project"),
            )
            .with_attribute(
                "name",
                Attribute::required_string().with_description("Environment Name"),
            )
            .with_attribute(
                "key",
                Attribute::required_string()
                    .with_description("Environment Key")
                    .with_requires_replace(),
            )
            .with_attribute(
                "description",
                Attribute::required_string().with_description("Environment Description"),
            )
            .with_attribute(
                "color",
                Attribute::required_string()
                    .with_description("Environment Color in Hex with leading #"),
            )
            .with_attribute(
                "type",
                Attribute::required_string().with_description("Environment Type"),
            )
            .with_attribute(
                "id",
                Attribute::computed_string().with_description("Environment Id"),
            )
            .with_attribute(
                "sdk_keys",
                Attribute::computed_string_list()
                    .with_description("SDK keys of the environment, ordered mobile, server, client"),
            )
            .with_block(
                "settings",
                NestedBlock::single(
                    Block::new().with_attribute(
                        "app_icon_uri",
                        Attribute::optional_string()
                            .with_description("Environment App Icon URI"),
                    ),
                ),
            )
    }
}

#[async_trait]
impl Resource for EnvironmentResource {
    fn type_name(&self) -> &'static str {
        Self::TYPE_NAME
    }

    fn schema(&self) -> Schema {
        Self::resource_schema()
    }

    async fn create(&self, config: Value) -> Result<Value, ProviderError> {
        let record: EnvironmentRecord = serde_json::from_value(config)?;

        let environment = check_response(
            self.api
                .create_environment(&record.to_create_request(), &record.project_key)
                .await,
            "create",
            KIND,
        )?;

        let state = EnvironmentRecord::from_response(environment, record.project_key);
        trace!(key = %state.key, "created an environment");
        Ok(serde_json::to_value(state)?)
    }

    async fn read(&self, state: Value) -> Result<Value, ProviderError> {
        let locator = StateLocator::from_state(&state)?;
        let project = locator.project(KIND)?;

        let environment = check_response(
            self.api
                .find_environment(locator.lookup_key(KIND)?, project)
                .await,
            "read",
            KIND,
        )?;

        debug!(key = %environment.key, "refreshed environment");
        Ok(serde_json::to_value(EnvironmentRecord::from_response(
            environment,
            project,
        ))?)
    }

    async fn update(
        &self,
        prior_state: Value,
        planned_state: Value,
    ) -> Result<Value, ProviderError> {
        let locator = StateLocator::from_state(&prior_state)?;
        let plan: EnvironmentRecord = serde_json::from_value(planned_state)?;

        let environment = check_response(
            self.api
                .update_environment(
                    &plan.to_update_request(),
                    locator.lookup_key(KIND)?,
                    &plan.project_key,
                )
                .await,
            "update",
            KIND,
        )?;

        let state = EnvironmentRecord::from_response(environment, plan.project_key);
        trace!(key = %state.key, "updated an environment");
        Ok(serde_json::to_value(state)?)
    }

    async fn delete(&self, state: Value) -> Result<(), ProviderError> {
        let locator = StateLocator::from_state(&state)?;

        check_response(
            self.api
                .remove_environment(locator.lookup_key(KIND)?, locator.project(KIND)?)
                .await,
            "delete",
            KIND,
        )?;
        trace!(key = ?locator.key, "deleted an environment");
        Ok(())
    }
}
