//! The DevCycle management API as consumed by the resource handlers.
//!
//! Handlers only see the [`EnvironmentsApi`] and [`FeaturesApi`] traits.
//! [`DevCycleClient`] implements both over HTTP; tests substitute in-memory
//! doubles (see [`crate::testing::InMemoryApi`]).

mod client;
#[allow(missing_docs)]
pub mod models;
mod response;

pub use client::{DevCycleClient, DEFAULT_API_URL};
pub use response::{check_response, ApiError, ApiResponse, ApiResult, STATUS_OK};

use async_trait::async_trait;

use models::{
    CreateEnvironmentDto, CreateFeatureDto, Environment, Feature, UpdateEnvironmentDto,
    UpdateFeatureDto,
};

/// Environment endpoints, scoped by project id or key.
#[async_trait]
pub trait EnvironmentsApi: Send + Sync {
    /// `GET /projects/{project}/environments/{key}`. `key` may also be the environment id.
    async fn find_environment(&self, key: &str, project: &str) -> ApiResult<Environment>;

    /// `POST /projects/{project}/environments`.
    async fn create_environment(
        &self,
        dto: &CreateEnvironmentDto,
        project: &str,
    ) -> ApiResult<Environment>;

    /// `PATCH /projects/{project}/environments/{key}`.
    async fn update_environment(
        &self,
        dto: &UpdateEnvironmentDto,
        key: &str,
        project: &str,
    ) -> ApiResult<Environment>;

    /// `DELETE /projects/{project}/environments/{key}`.
    async fn remove_environment(&self, key: &str, project: &str) -> ApiResult<()>;
}

/// Feature endpoints, scoped by project id or key.
#[async_trait]
pub trait FeaturesApi: Send + Sync {
    /// `GET /projects/{project}/features/{key}`. `key` may also be the feature id.
    async fn find_feature(&self, key: &str, project: &str) -> ApiResult<Feature>;

    /// `POST /projects/{project}/features`.
    async fn create_feature(&self, dto: &CreateFeatureDto, project: &str) -> ApiResult<Feature>;

    /// `PATCH /projects/{project}/features/{key}`.
    async fn update_feature(
        &self,
        dto: &UpdateFeatureDto,
        key: &str,
        project: &str,
    ) -> ApiResult<Feature>;

    /// `DELETE /projects/{project}/features/{key}`.
    async fn remove_feature(&self, key: &str, project: &str) -> ApiResult<()>;
}

/// Everything the provider needs from the management API.
pub trait ManagementApi: EnvironmentsApi + FeaturesApi {}

impl<T: EnvironmentsApi + FeaturesApi> ManagementApi for T {}
