//! Testing utilities for the provider.
//!
//! [`InMemoryApi`] stands in for the management API: it keeps environments
//! and features in memory, records every call and can be told to fail the
//! next one. [`ProviderTester`] drives a [`DevCycleProvider`] through the
//! lifecycle the way the host would.
//!
//! # Example
//!
//! ```
//! use devcycle_provider::testing::{InMemoryApi, ProviderTester};
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! # tokio_test::block_on(async {
//! let api = Arc::new(InMemoryApi::new());
//! let tester = ProviderTester::with_api(api.clone()).unwrap();
//!
//! let state = tester
//!     .lifecycle_create(
//!         "devcycle_feature",
//!         json!({"name": "Dark Mode", "key": "dark-mode", "project_key": "web"}),
//!     )
//!     .await
//!     .unwrap();
//!
//! assert_eq!(state["key"], "dark-mode");
//! assert_eq!(api.count("create_feature"), 1);
//! # });
//! ```

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use serde_json::Value;

use crate::api::models::{
    ApiKey, CreateEnvironmentDto, CreateFeatureDto, Environment, Feature, SdkKeys,
    UpdateEnvironmentDto, UpdateFeatureDto,
};
use crate::api::{ApiResponse, ApiResult, EnvironmentsApi, FeaturesApi};
use crate::error::ProviderError;
use crate::provider::DevCycleProvider;
use crate::schema::{Diagnostic, DiagnosticSeverity, ProviderSchema};
use crate::types::{PlanResult, ResourceResponse};

// =========================================================================
// In-memory management API
// =========================================================================

/// One recorded call against [`InMemoryApi`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiCall {
    /// Trait method name, e.g. `update_feature`.
    pub operation: &'static str,
    /// Key or id in the path. Empty for create calls.
    pub key: String,
    /// Project in the path.
    pub project: String,
}

#[derive(Default)]
struct Store {
    environments: Vec<(String, Environment)>,
    features: Vec<(String, Feature)>,
    project_ids: BTreeMap<String, String>,
    calls: Vec<ApiCall>,
    failure: Option<(u16, String)>,
    next_id: u64,
}

impl Store {
    fn generate_id(&mut self) -> String {
        self.next_id += 1;
        format!("{:024x}", self.next_id)
    }

    fn project_id(&mut self, project: &str) -> String {
        if let Some(id) = self.project_ids.get(project) {
            return id.clone();
        }
        let id = self.generate_id();
        self.project_ids.insert(project.to_string(), id.clone());
        id
    }

    fn record(&mut self, operation: &'static str, key: &str, project: &str) -> Option<(u16, String)> {
        self.calls.push(ApiCall {
            operation,
            key: key.to_string(),
            project: project.to_string(),
        });
        self.failure.take()
    }

    fn environment_mut(&mut self, key: &str, project: &str) -> Option<&mut Environment> {
        self.environments
            .iter_mut()
            .find(|(p, e)| p == project && (e.key == key || e.id == key))
            .map(|(_, e)| e)
    }

    fn feature_mut(&mut self, key: &str, project: &str) -> Option<&mut Feature> {
        self.features
            .iter_mut()
            .find(|(p, f)| p == project && (f.key == key || f.id == key))
            .map(|(_, f)| f)
    }

    fn create_environment(&mut self, dto: &CreateEnvironmentDto, project: &str) -> Environment {
        let environment = Environment {
            id: self.generate_id(),
            project: self.project_id(project),
            name: dto.name.clone(),
            key: dto.key.clone(),
            description: dto.description.clone(),
            color: dto.color.clone(),
            environment_type: dto.environment_type.clone(),
            settings: dto.settings.clone(),
            sdk_keys: sdk_keys_for(&dto.key),
        };
        self.environments
            .push((project.to_string(), environment.clone()));
        environment
    }

    fn create_feature(&mut self, dto: &CreateFeatureDto, project: &str) -> Feature {
        let feature = Feature {
            id: self.generate_id(),
            project: self.project_id(project),
            name: dto.name.clone(),
            key: dto.key.clone(),
            description: dto.description.clone(),
            feature_type: Some(
                dto.feature_type
                    .clone()
                    .unwrap_or_else(|| "release".to_string()),
            ),
            tags: dto.tags.clone().unwrap_or_default(),
            variations: Vec::new(),
            variables: Vec::new(),
        };
        self.features.push((project.to_string(), feature.clone()));
        feature
    }
}

fn sdk_keys_for(key: &str) -> SdkKeys {
    let api_key = |platform: &str| ApiKey {
        key: format!("dvc_{}_{}", platform, key),
        ..Default::default()
    };
    SdkKeys {
        mobile: vec![api_key("mobile")],
        client: vec![api_key("client")],
        server: vec![api_key("server")],
    }
}

fn not_found<T>() -> ApiResult<T> {
    Ok(ApiResponse::failed(404, "Not Found"))
}

/// Management API double that keeps everything in memory.
///
/// Entities are found by key or id within their project. A create with a
/// key already in use answers 409, a lookup of a missing entity 404.
#[derive(Default)]
pub struct InMemoryApi {
    store: Mutex<Store>,
}

impl InMemoryApi {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn store(&self) -> MutexGuard<'_, Store> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Answer the next call, whatever it is, with `status` and `message`.
    pub fn fail_next(&self, status: u16, message: impl Into<String>) {
        self.store().failure = Some((status, message.into()));
    }

    /// Seed an environment without recording a call.
    pub fn insert_environment(&self, project: &str, dto: CreateEnvironmentDto) -> Environment {
        self.store().create_environment(&dto, project)
    }

    /// Seed a feature without recording a call.
    pub fn insert_feature(&self, project: &str, dto: CreateFeatureDto) -> Feature {
        self.store().create_feature(&dto, project)
    }

    /// Seed a fully specified feature, e.g. one with variations.
    pub fn put_feature(&self, project: &str, feature: Feature) {
        self.store().features.push((project.to_string(), feature));
    }

    /// Every call made so far, oldest first.
    pub fn calls(&self) -> Vec<ApiCall> {
        self.store().calls.clone()
    }

    /// Number of calls made to `operation`.
    pub fn count(&self, operation: &str) -> usize {
        self.store()
            .calls
            .iter()
            .filter(|c| c.operation == operation)
            .count()
    }

    /// Forget the recorded calls.
    pub fn clear_calls(&self) {
        self.store().calls.clear();
    }
}

#[async_trait]
impl EnvironmentsApi for InMemoryApi {
    async fn find_environment(&self, key: &str, project: &str) -> ApiResult<Environment> {
        let mut store = self.store();
        if let Some((status, message)) = store.record("find_environment", key, project) {
            return Ok(ApiResponse::failed(status, message));
        }
        match store.environment_mut(key, project) {
            Some(environment) => Ok(ApiResponse::ok(environment.clone())),
            None => not_found(),
        }
    }

    async fn create_environment(
        &self,
        dto: &CreateEnvironmentDto,
        project: &str,
    ) -> ApiResult<Environment> {
        let mut store = self.store();
        if let Some((status, message)) = store.record("create_environment", "", project) {
            return Ok(ApiResponse::failed(status, message));
        }
        if store.environment_mut(&dto.key, project).is_some() {
            return Ok(ApiResponse::failed(409, "key already exists"));
        }
        Ok(ApiResponse::ok(store.create_environment(dto, project)))
    }

    async fn update_environment(
        &self,
        dto: &UpdateEnvironmentDto,
        key: &str,
        project: &str,
    ) -> ApiResult<Environment> {
        let mut store = self.store();
        if let Some((status, message)) = store.record("update_environment", key, project) {
            return Ok(ApiResponse::failed(status, message));
        }
        let Some(environment) = store.environment_mut(key, project) else {
            return not_found();
        };
        if let Some(name) = &dto.name {
            environment.name = name.clone();
        }
        if let Some(description) = &dto.description {
            environment.description = description.clone();
        }
        if let Some(color) = &dto.color {
            environment.color = color.clone();
        }
        if let Some(environment_type) = &dto.environment_type {
            environment.environment_type = environment_type.clone();
        }
        if dto.settings.is_some() {
            environment.settings = dto.settings.clone();
        }
        Ok(ApiResponse::ok(environment.clone()))
    }

    async fn remove_environment(&self, key: &str, project: &str) -> ApiResult<()> {
        let mut store = self.store();
        if let Some((status, message)) = store.record("remove_environment", key, project) {
            return Ok(ApiResponse::failed(status, message));
        }
        let before = store.environments.len();
        store
            .environments
            .retain(|(p, e)| !(p == project && (e.key == key || e.id == key)));
        if store.environments.len() == before {
            return not_found();
        }
        Ok(ApiResponse::ok(()))
    }
}

#[async_trait]
impl FeaturesApi for InMemoryApi {
    async fn find_feature(&self, key: &str, project: &str) -> ApiResult<Feature> {
        let mut store = self.store();
        if let Some((status, message)) = store.record("find_feature", key, project) {
            return Ok(ApiResponse::failed(status, message));
        }
        match store.feature_mut(key, project) {
            Some(feature) => Ok(ApiResponse::ok(feature.clone())),
            None => not_found(),
        }
    }

    async fn create_feature(&self, dto: &CreateFeatureDto, project: &str) -> ApiResult<Feature> {
        let mut store = self.store();
        if let Some((status, message)) = store.record("create_feature", "", project) {
            return Ok(ApiResponse::failed(status, message));
        }
        if store.feature_mut(&dto.key, project).is_some() {
            return Ok(ApiResponse::failed(409, "key already exists"));
        }
        Ok(ApiResponse::ok(store.create_feature(dto, project)))
    }

    async fn update_feature(
        &self,
        dto: &UpdateFeatureDto,
        key: &str,
        project: &str,
    ) -> ApiResult<Feature> {
        let mut store = self.store();
        if let Some((status, message)) = store.record("update_feature", key, project) {
            return Ok(ApiResponse::failed(status, message));
        }
        let Some(feature) = store.feature_mut(key, project) else {
            return not_found();
        };
        if let Some(name) = &dto.name {
            feature.name = name.clone();
        }
        if dto.description.is_some() {
            feature.description = dto.description.clone();
        }
        if dto.feature_type.is_some() {
            feature.feature_type = dto.feature_type.clone();
        }
        if let Some(tags) = &dto.tags {
            feature.tags = tags.clone();
        }
        Ok(ApiResponse::ok(feature.clone()))
    }

    async fn remove_feature(&self, key: &str, project: &str) -> ApiResult<()> {
        let mut store = self.store();
        if let Some((status, message)) = store.record("remove_feature", key, project) {
            return Ok(ApiResponse::failed(status, message));
        }
        let before = store.features.len();
        store
            .features
            .retain(|(p, f)| !(p == project && (f.key == key || f.id == key)));
        if store.features.len() == before {
            return not_found();
        }
        Ok(ApiResponse::ok(()))
    }
}

// =========================================================================
// Provider tester
// =========================================================================

/// A test harness around [`DevCycleProvider`].
///
/// Lifecycle methods return `Err(TestError)` when the provider answers with
/// error diagnostics, so tests can use `?` or `unwrap` directly.
pub struct ProviderTester {
    provider: DevCycleProvider,
}

impl ProviderTester {
    /// Wrap an already built provider.
    pub fn new(provider: DevCycleProvider) -> Self {
        Self { provider }
    }

    /// Build a provider over `api` and wrap it.
    pub fn with_api(api: Arc<InMemoryApi>) -> Result<Self, ProviderError> {
        Ok(Self::new(DevCycleProvider::new(api)?))
    }

    /// Get a reference to the underlying provider.
    pub fn provider(&self) -> &DevCycleProvider {
        &self.provider
    }

    /// Get the provider's schema.
    pub fn schema(&self) -> ProviderSchema {
        self.provider.schema()
    }

    /// Get the list of resource type names.
    pub fn resource_types(&self) -> Vec<String> {
        self.provider.metadata().resources
    }

    /// Get the list of data source type names.
    pub fn data_source_types(&self) -> Vec<String> {
        self.provider.metadata().data_sources
    }

    /// Validate a resource configuration.
    pub fn validate_resource_config(&self, type_name: &str, config: Value) -> Result<(), TestError> {
        check_diagnostics(self.provider.validate_resource_config(type_name, &config))
    }

    /// Plan a resource creation (no prior state).
    pub fn plan_create(&self, type_name: &str, config: Value) -> Result<PlanResult, ProviderError> {
        self.provider.plan(type_name, None, &config)
    }

    /// Plan a change from `prior_state` to `config`.
    pub fn plan_update(
        &self,
        type_name: &str,
        prior_state: Value,
        config: Value,
    ) -> Result<PlanResult, ProviderError> {
        self.provider.plan(type_name, Some(&prior_state), &config)
    }

    /// Create a resource.
    pub async fn create(&self, type_name: &str, config: Value) -> Result<Value, TestError> {
        into_state(self.provider.create(type_name, config).await)
    }

    /// Read a resource.
    pub async fn read(&self, type_name: &str, state: Value) -> Result<Value, TestError> {
        into_state(self.provider.read(type_name, state).await)
    }

    /// Update a resource.
    pub async fn update(
        &self,
        type_name: &str,
        prior_state: Value,
        planned_state: Value,
    ) -> Result<Value, TestError> {
        into_state(
            self.provider
                .update(type_name, prior_state, planned_state)
                .await,
        )
    }

    /// Delete a resource.
    pub async fn delete(&self, type_name: &str, state: Value) -> Result<(), TestError> {
        let response = self.provider.delete(type_name, state).await;
        check_diagnostics(response.diagnostics)
    }

    /// Import by id and read the full state.
    pub async fn import(
        &self,
        type_name: &str,
        id: &str,
        project_key: &str,
    ) -> Result<Value, TestError> {
        let mut seeded = into_state(self.provider.import(type_name, id))?;
        if let Value::Object(map) = &mut seeded {
            map.insert("project_key".to_string(), Value::String(project_key.to_string()));
        }
        self.read(type_name, seeded).await
    }

    /// Apply `config` over `prior_state`.
    pub async fn apply(
        &self,
        type_name: &str,
        prior_state: Option<Value>,
        config: Option<Value>,
    ) -> ResourceResponse {
        self.provider.apply(type_name, prior_state, config).await
    }

    /// Read a data source.
    pub async fn read_data_source(&self, type_name: &str, config: Value) -> Result<Value, TestError> {
        into_state(self.provider.read_data_source(type_name, config).await)
    }

    // =========================================================================
    // Lifecycle Helpers
    // =========================================================================

    /// Run a full create lifecycle: plan, create, read.
    ///
    /// Returns the final state after read.
    pub async fn lifecycle_create(&self, type_name: &str, config: Value) -> Result<Value, TestError> {
        let plan = self.plan_create(type_name, config)?;
        let created = self.create(type_name, plan.planned_state).await?;
        self.read(type_name, created).await
    }

    /// Run a full update lifecycle: plan, update, read.
    pub async fn lifecycle_update(
        &self,
        type_name: &str,
        prior_state: Value,
        config: Value,
    ) -> Result<Value, TestError> {
        let plan = self.plan_update(type_name, prior_state.clone(), config)?;
        let updated = self
            .update(type_name, prior_state, plan.planned_state)
            .await?;
        self.read(type_name, updated).await
    }

    /// Run create, update and delete in sequence.
    ///
    /// Returns the state after the update (before delete).
    pub async fn lifecycle_crud(
        &self,
        type_name: &str,
        initial_config: Value,
        updated_config: Value,
    ) -> Result<Value, TestError> {
        let created = self.lifecycle_create(type_name, initial_config).await?;
        let updated = self
            .lifecycle_update(type_name, created, updated_config)
            .await?;
        self.delete(type_name, updated.clone()).await?;
        Ok(updated)
    }
}

/// Error type for test operations that may fail with diagnostics.
#[derive(Debug)]
pub enum TestError {
    /// The operation failed with diagnostics.
    Diagnostics(Vec<Diagnostic>),
    /// The operation failed with a provider error.
    Provider(ProviderError),
}

impl std::fmt::Display for TestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TestError::Diagnostics(diags) => {
                writeln!(f, "Operation failed with {} diagnostic(s):", diags.len())?;
                for diag in diags {
                    write!(f, "  [{:?}] {}", diag.severity, diag.summary)?;
                    if let Some(detail) = &diag.detail {
                        write!(f, ": {}", detail)?;
                    }
                    if let Some(attr) = &diag.attribute {
                        write!(f, " (at {})", attr)?;
                    }
                    writeln!(f)?;
                }
                Ok(())
            }
            TestError::Provider(e) => write!(f, "Provider error: {}", e),
        }
    }
}

impl std::error::Error for TestError {}

impl From<ProviderError> for TestError {
    fn from(e: ProviderError) -> Self {
        TestError::Provider(e)
    }
}

impl TestError {
    /// Diagnostics carried by the error, if any.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        match self {
            TestError::Diagnostics(diags) => diags,
            TestError::Provider(_) => &[],
        }
    }
}

fn check_diagnostics(diagnostics: Vec<Diagnostic>) -> Result<(), TestError> {
    let errors: Vec<_> = diagnostics
        .into_iter()
        .filter(|d| matches!(d.severity, DiagnosticSeverity::Error))
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(TestError::Diagnostics(errors))
    }
}

fn into_state(response: ResourceResponse) -> Result<Value, TestError> {
    check_diagnostics(response.diagnostics)?;
    Ok(response.state.unwrap_or(Value::Null))
}

// =========================================================================
// Assertion Helpers
// =========================================================================

/// Assert that a plan result requires resource replacement.
///
/// # Panics
///
/// Panics if the plan does not require replacement.
pub fn assert_plan_replaces(plan: &PlanResult) {
    assert!(
        plan.requires_replace,
        "Expected plan to require replacement, but it does not"
    );
}

/// Assert that a plan updates in place.
///
/// # Panics
///
/// Panics if the plan has no changes or requires replacement.
pub fn assert_plan_updates_in_place(plan: &PlanResult) {
    assert!(
        !plan.changes.is_empty(),
        "Expected plan to have changes, but got no changes"
    );
    assert!(
        !plan.requires_replace,
        "Expected plan to update in place, but it requires replacement"
    );
}

/// Assert that a plan result indicates no changes.
///
/// # Panics
///
/// Panics if the plan has any changes.
pub fn assert_plan_no_changes(plan: &PlanResult) {
    assert!(
        plan.changes.is_empty(),
        "Expected no changes, but got {} change(s): {:?}",
        plan.changes.len(),
        plan.changes.iter().map(|c| &c.path).collect::<Vec<_>>()
    );
}

/// Assert that a plan has a change for a specific attribute path.
///
/// # Panics
///
/// Panics if the plan does not have a change for the given path.
pub fn assert_plan_changes_attribute(plan: &PlanResult, path: &str) {
    let has_change = plan.changes.iter().any(|c| c.path == path);
    assert!(
        has_change,
        "Expected plan to change attribute '{}', but it was not changed. Changed attributes: {:?}",
        path,
        plan.changes.iter().map(|c| &c.path).collect::<Vec<_>>()
    );
}

/// Assert that diagnostics contain no errors.
///
/// # Panics
///
/// Panics if there are any error diagnostics.
pub fn assert_no_errors(diagnostics: &[Diagnostic]) {
    let errors: Vec<_> = diagnostics.iter().filter(|d| d.is_error()).collect();

    assert!(
        errors.is_empty(),
        "Expected no errors, but got {} error(s): {:?}",
        errors.len(),
        errors.iter().map(|d| &d.summary).collect::<Vec<_>>()
    );
}

/// Assert that diagnostics contain at least one error.
///
/// # Panics
///
/// Panics if there are no error diagnostics.
pub fn assert_has_errors(diagnostics: &[Diagnostic]) {
    assert!(
        diagnostics.iter().any(Diagnostic::is_error),
        "Expected at least one error, but got none"
    );
}

/// Assert that an error diagnostic's summary or detail contains `substring`.
///
/// # Panics
///
/// Panics if no error diagnostic matches.
pub fn assert_error_contains(diagnostics: &[Diagnostic], substring: &str) {
    let matches = |d: &&Diagnostic| {
        d.is_error()
            && (d.summary.contains(substring)
                || d.detail.as_deref().is_some_and(|detail| detail.contains(substring)))
    };

    assert!(
        diagnostics.iter().any(|d| matches(&d)),
        "Expected an error containing '{}', but no matching error found. Errors: {:?}",
        substring,
        diagnostics
            .iter()
            .filter(|d| d.is_error())
            .map(|d| (&d.summary, &d.detail))
            .collect::<Vec<_>>()
    );
}
