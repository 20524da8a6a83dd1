//! The provider: a dispatch table of resource and data source handlers.
//!
//! The host calls into [`DevCycleProvider`] with a type name and JSON
//! values. The provider looks the handler up, runs the operation and turns
//! any [`ProviderError`] into a diagnostic on the returned
//! [`ResourceResponse`]. Handlers never see the host directly.
//!
//! # Example
//!
//! ```no_run
//! use devcycle_provider::DevCycleProvider;
//! use serde_json::json;
//!
//! # async fn run() -> Result<(), devcycle_provider::ProviderError> {
//! let provider = DevCycleProvider::configure(json!({"access_token": "..."})).await?;
//!
//! let response = provider
//!     .apply(
//!         "devcycle_environment",
//!         None,
//!         Some(json!({
//!             "project_key": "my-project",
//!             "key": "staging",
//!             "name": "Staging",
//!             "description": "pre-release checks",
//!             "color": "#f59e0b",
//!             "type": "staging"
//!         })),
//!     )
//!     .await;
//! assert!(!response.has_errors());
//! # Ok(())
//! # }
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::{debug, error, info, instrument, warn};

use crate::api::ManagementApi;
use crate::config::ProviderConfig;
use crate::data_sources::{DataSource, EnvironmentDataSource, FeatureDataSource};
use crate::error::ProviderError;
use crate::resources::{EnvironmentResource, FeatureResource, Resource};
use crate::schema::{Diagnostic, ProviderSchema, Schema};
use crate::types::{AttributeChange, PlanResult, ProviderMetadata, ResourceResponse};
use crate::validation::validate;

/// Registry of handlers, checked once when built.
#[derive(Default)]
pub struct ProviderBuilder {
    resources: Vec<Arc<dyn Resource>>,
    data_sources: Vec<Arc<dyn DataSource>>,
}

impl ProviderBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a resource handler.
    pub fn with_resource(mut self, resource: Arc<dyn Resource>) -> Self {
        self.resources.push(resource);
        self
    }

    /// Register a data source handler.
    pub fn with_data_source(mut self, data_source: Arc<dyn DataSource>) -> Self {
        self.data_sources.push(data_source);
        self
    }

    /// Build the dispatch table.
    ///
    /// Fails on duplicate type names and on attribute tables with
    /// contradictory flags.
    pub fn build(self) -> Result<DevCycleProvider, ProviderError> {
        let mut resources = BTreeMap::new();
        for resource in self.resources {
            let name = resource.type_name();
            check_schema("resource", name, &resource.schema())?;
            if resources.insert(name, resource).is_some() {
                return Err(ProviderError::Configuration(format!(
                    "resource type {} registered twice",
                    name
                )));
            }
        }

        let mut data_sources = BTreeMap::new();
        for data_source in self.data_sources {
            let name = data_source.type_name();
            check_schema("data source", name, &data_source.schema())?;
            if data_sources.insert(name, data_source).is_some() {
                return Err(ProviderError::Configuration(format!(
                    "data source type {} registered twice",
                    name
                )));
            }
        }

        Ok(DevCycleProvider {
            resources,
            data_sources,
        })
    }
}

fn check_schema(kind: &str, name: &str, schema: &Schema) -> Result<(), ProviderError> {
    let problems = schema.check();
    if problems.is_empty() {
        return Ok(());
    }
    let summaries: Vec<_> = problems.into_iter().map(|d| d.summary).collect();
    Err(ProviderError::Configuration(format!(
        "{} {} has an invalid schema: {}",
        kind,
        name,
        summaries.join("; ")
    )))
}

/// DevCycle provider with its registered handlers.
pub struct DevCycleProvider {
    resources: BTreeMap<&'static str, Arc<dyn Resource>>,
    data_sources: BTreeMap<&'static str, Arc<dyn DataSource>>,
}

impl std::fmt::Debug for DevCycleProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DevCycleProvider")
            .field("resources", &self.resources.keys().collect::<Vec<_>>())
            .field("data_sources", &self.data_sources.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl DevCycleProvider {
    /// Start an empty registry.
    pub fn builder() -> ProviderBuilder {
        ProviderBuilder::new()
    }

    /// Register the environment and feature handlers against `api`.
    pub fn new<C>(api: Arc<C>) -> Result<Self, ProviderError>
    where
        C: ManagementApi + 'static,
    {
        Self::builder()
            .with_resource(Arc::new(EnvironmentResource::new(api.clone())))
            .with_resource(Arc::new(FeatureResource::new(api.clone())))
            .with_data_source(Arc::new(EnvironmentDataSource::new(api.clone())))
            .with_data_source(Arc::new(FeatureDataSource::new(api)))
            .build()
    }

    /// Validate the provider configuration block without authenticating.
    ///
    /// Client credentials next to an `access_token` are reported as a warning;
    /// the token wins and no exchange happens.
    pub fn validate_provider_config(config: &Value) -> Vec<Diagnostic> {
        let mut diagnostics = validate(&ProviderConfig::schema(), config);
        let is_set = |name: &str| config.get(name).is_some_and(|v| !v.is_null());
        if is_set("access_token") && (is_set("client_id") || is_set("client_secret")) {
            diagnostics.push(
                Diagnostic::warning("Client credentials ignored")
                    .with_detail("access_token is set, so client_id and client_secret are not used"),
            );
        }
        diagnostics
    }

    /// Authenticate with the configuration block and build a provider backed by the HTTP client.
    #[instrument(skip(config), name = "provider.configure")]
    pub async fn configure(config: Value) -> Result<Self, ProviderError> {
        let diagnostics = Self::validate_provider_config(&config);
        if let Some(first) = diagnostics.iter().find(|d| d.is_error()) {
            warn!(diagnostics = diagnostics.len(), "provider configuration rejected");
            return Err(ProviderError::Configuration(first.summary.clone()));
        }

        let settings = ProviderConfig::from_value(config)?;
        let client = settings.build_client().await.inspect_err(|e| {
            error!(error = %e, "configure failed");
        })?;
        info!(api_url = settings.api_url(), "provider configured");
        Self::new(Arc::new(client))
    }

    /// Full schema: provider block, resources and data sources.
    pub fn schema(&self) -> ProviderSchema {
        let mut schema = ProviderSchema::new().with_provider_config(ProviderConfig::schema());
        for (name, resource) in &self.resources {
            schema = schema.with_resource(*name, resource.schema());
        }
        for (name, data_source) in &self.data_sources {
            schema = schema.with_data_source(*name, data_source.schema());
        }
        schema
    }

    /// Registered type names.
    pub fn metadata(&self) -> ProviderMetadata {
        ProviderMetadata {
            resources: self.resources.keys().map(|s| s.to_string()).collect(),
            data_sources: self.data_sources.keys().map(|s| s.to_string()).collect(),
        }
    }

    fn resource(&self, type_name: &str) -> Result<&Arc<dyn Resource>, ProviderError> {
        self.resources
            .get(type_name)
            .ok_or_else(|| ProviderError::UnknownResource(type_name.to_string()))
    }

    fn data_source(&self, type_name: &str) -> Result<&Arc<dyn DataSource>, ProviderError> {
        self.data_sources
            .get(type_name)
            .ok_or_else(|| ProviderError::UnknownResource(type_name.to_string()))
    }

    /// Validate a resource configuration against its attribute table.
    pub fn validate_resource_config(&self, type_name: &str, config: &Value) -> Vec<Diagnostic> {
        match self.resource(type_name) {
            Ok(resource) => validate(&resource.schema(), config),
            Err(e) => vec![e.into()],
        }
    }

    /// Validate a data source configuration against its attribute table.
    pub fn validate_data_source_config(&self, type_name: &str, config: &Value) -> Vec<Diagnostic> {
        match self.data_source(type_name) {
            Ok(data_source) => validate(&data_source.schema(), config),
            Err(e) => vec![e.into()],
        }
    }

    // =========================================================================
    // Plan
    // =========================================================================

    /// Compute the change from `prior_state` to `config`.
    ///
    /// A `null` config plans a delete. Computed attributes keep their prior
    /// values unless the plan replaces the resource, in which case they are
    /// left unknown.
    #[instrument(skip(self, prior_state, config), name = "provider.plan")]
    pub fn plan(
        &self,
        type_name: &str,
        prior_state: Option<&Value>,
        config: &Value,
    ) -> Result<PlanResult, ProviderError> {
        let schema = self.resource(type_name)?.schema();
        let plan = plan_resource(&schema, prior_state, config);
        debug!(
            changes = plan.changes.len(),
            requires_replace = plan.requires_replace,
            "plan computed"
        );
        Ok(plan)
    }

    // =========================================================================
    // Resource lifecycle
    // =========================================================================

    /// Create a resource from `config`. On failure no state is returned.
    #[instrument(skip(self, config), name = "provider.create")]
    pub async fn create(&self, type_name: &str, config: Value) -> ResourceResponse {
        info!("create called");
        let resource = match self.resource(type_name) {
            Ok(resource) => resource,
            Err(e) => return ResourceResponse::failed(None, e),
        };

        let diagnostics = validate(&resource.schema(), &config);
        if diagnostics.iter().any(Diagnostic::is_error) {
            warn!(diagnostics = diagnostics.len(), "create rejected by validation");
            return ResourceResponse {
                state: None,
                diagnostics,
            };
        }

        match resource.create(config).await {
            Ok(state) => {
                info!("create completed successfully");
                ResourceResponse::ok(state)
            }
            Err(e) => {
                error!(error = %e, "create failed");
                ResourceResponse::failed(None, e)
            }
        }
    }

    /// Refresh `state`. On failure the prior state is kept.
    #[instrument(skip(self, state), name = "provider.read")]
    pub async fn read(&self, type_name: &str, state: Value) -> ResourceResponse {
        debug!("read called");
        let resource = match self.resource(type_name) {
            Ok(resource) => resource,
            Err(e) => return ResourceResponse::failed(Some(state), e),
        };

        match resource.read(state.clone()).await {
            Ok(refreshed) => ResourceResponse::ok(refreshed),
            Err(e) => {
                error!(error = %e, "read failed");
                ResourceResponse::failed(Some(state), e)
            }
        }
    }

    /// Update in place. On failure the prior state is kept.
    #[instrument(skip(self, prior_state, planned_state), name = "provider.update")]
    pub async fn update(
        &self,
        type_name: &str,
        prior_state: Value,
        planned_state: Value,
    ) -> ResourceResponse {
        info!("update called");
        let resource = match self.resource(type_name) {
            Ok(resource) => resource,
            Err(e) => return ResourceResponse::failed(Some(prior_state), e),
        };

        match resource.update(prior_state.clone(), planned_state).await {
            Ok(state) => {
                info!("update completed successfully");
                ResourceResponse::ok(state)
            }
            Err(e) => {
                error!(error = %e, "update failed");
                ResourceResponse::failed(Some(prior_state), e)
            }
        }
    }

    /// Delete the resource. On failure the state is kept.
    #[instrument(skip(self, state), name = "provider.delete")]
    pub async fn delete(&self, type_name: &str, state: Value) -> ResourceResponse {
        info!("delete called");
        let resource = match self.resource(type_name) {
            Ok(resource) => resource,
            Err(e) => return ResourceResponse::failed(Some(state), e),
        };

        match resource.delete(state.clone()).await {
            Ok(()) => {
                info!("delete completed successfully");
                ResourceResponse::removed()
            }
            Err(e) => {
                error!(error = %e, "delete failed");
                ResourceResponse::failed(Some(state), e)
            }
        }
    }

    /// Seed state for an import. The host follows up with [`read`](Self::read).
    #[instrument(skip(self), name = "provider.import")]
    pub fn import(&self, type_name: &str, id: &str) -> ResourceResponse {
        match self.resource(type_name).and_then(|r| r.import(id)) {
            Ok(state) => ResourceResponse::ok(state),
            Err(e) => {
                error!(error = %e, "import failed");
                ResourceResponse::failed(None, e)
            }
        }
    }

    /// Converge the remote object on `config`.
    ///
    /// | prior | config | action |
    /// |-------|--------|--------|
    /// | none  | none   | nothing |
    /// | none  | some   | create |
    /// | some  | none   | delete |
    /// | some  | some   | plan, then nothing, update, or delete followed by create |
    ///
    /// A change to a requires-replace attribute never reaches the update handler.
    #[instrument(skip(self, prior_state, config), name = "provider.apply")]
    pub async fn apply(
        &self,
        type_name: &str,
        prior_state: Option<Value>,
        config: Option<Value>,
    ) -> ResourceResponse {
        let (prior, config) = match (prior_state, config) {
            (None, None) => return ResourceResponse::removed(),
            (None, Some(config)) => return self.create(type_name, config).await,
            (Some(prior), None) => return self.delete(type_name, prior).await,
            (Some(prior), Some(config)) => (prior, config),
        };

        let plan = match self.plan(type_name, Some(&prior), &config) {
            Ok(plan) => plan,
            Err(e) => return ResourceResponse::failed(Some(prior), e),
        };

        if plan.is_empty() {
            debug!("no changes to apply");
            return ResourceResponse::ok(prior);
        }

        if plan.requires_replace {
            info!("replacing resource");
            let deleted = self.delete(type_name, prior).await;
            if deleted.has_errors() {
                return deleted;
            }
            return self.create(type_name, plan.planned_state).await;
        }

        self.update(type_name, prior, plan.planned_state).await
    }

    // =========================================================================
    // Data sources
    // =========================================================================

    /// Look up an existing entity.
    #[instrument(skip(self, config), name = "provider.read_data_source")]
    pub async fn read_data_source(&self, type_name: &str, config: Value) -> ResourceResponse {
        debug!("read_data_source called");
        let data_source = match self.data_source(type_name) {
            Ok(data_source) => data_source,
            Err(e) => return ResourceResponse::failed(None, e),
        };

        let diagnostics = validate(&data_source.schema(), &config);
        if diagnostics.iter().any(Diagnostic::is_error) {
            return ResourceResponse {
                state: None,
                diagnostics,
            };
        }

        match data_source.read(config).await {
            Ok(state) => ResourceResponse::ok(state),
            Err(e) => {
                error!(error = %e, "read_data_source failed");
                ResourceResponse::failed(None, e)
            }
        }
    }
}

/// Walk the top level of the attribute table and diff `config` against `prior`.
///
/// Nulls are left out of the planned state so handlers see them as absent.
fn plan_resource(schema: &Schema, prior: Option<&Value>, config: &Value) -> PlanResult {
    let Some(config_map) = config.as_object() else {
        return plan_delete(prior);
    };

    let prior_value = |name: &str| {
        prior
            .and_then(|p| p.get(name))
            .cloned()
            .unwrap_or(Value::Null)
    };
    let config_value = |name: &str| config_map.get(name).cloned().unwrap_or(Value::Null);

    let mut planned = Map::new();
    let mut computed = Vec::new();
    let mut changes = Vec::new();
    let mut requires_replace = false;

    for (name, attr) in &schema.block.attributes {
        let before = prior_value(name);
        let after = config_value(name);

        let value = if attr.flags.is_computed_only() {
            computed.push(name.as_str());
            before
        } else if attr.flags.computed && after.is_null() {
            before
        } else {
            if let Some(change) = AttributeChange::between(name.as_str(), &before, &after) {
                requires_replace |= prior.is_some() && attr.requires_replace;
                changes.push(change);
            }
            after
        };

        if !value.is_null() {
            planned.insert(name.clone(), value);
        }
    }

    for (name, nested) in &schema.block.blocks {
        let before = prior_value(name);
        let value = if nested.computed {
            computed.push(name.as_str());
            before
        } else {
            let after = config_value(name);
            if let Some(change) = AttributeChange::between(name.as_str(), &before, &after) {
                changes.push(change);
            }
            after
        };

        if !value.is_null() {
            planned.insert(name.clone(), value);
        }
    }

    match prior {
        Some(prior) if changes.is_empty() => PlanResult::no_change(prior.clone()),
        _ => {
            if requires_replace {
                for name in computed {
                    planned.remove(name);
                }
            }
            PlanResult::with_changes(Value::Object(planned), changes, requires_replace)
        }
    }
}

fn plan_delete(prior: Option<&Value>) -> PlanResult {
    let Some(Value::Object(prior)) = prior else {
        return PlanResult::no_change(Value::Null);
    };
    let changes = prior
        .iter()
        .filter(|(_, v)| !v.is_null())
        .map(|(name, v)| AttributeChange::removed(name.as_str(), v.clone()))
        .collect();
    PlanResult::with_changes(Value::Null, changes, false)
}
