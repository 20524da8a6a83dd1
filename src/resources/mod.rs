//! Resource handlers.
//!
//! A [`Resource`] owns one resource type's schema and its five lifecycle
//! operations. Each operation decodes its input into a record, makes exactly
//! one management API call, and maps the response back into state.

mod environment;
mod feature;

pub use environment::EnvironmentResource;
pub use feature::FeatureResource;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::error::ProviderError;
use crate::schema::Schema;

/// Lifecycle contract implemented by every resource type.
#[async_trait]
pub trait Resource: Send + Sync {
    /// Name the resource is registered under, e.g. `devcycle_environment`.
    fn type_name(&self) -> &'static str;

    /// Attribute table of the resource.
    fn schema(&self) -> Schema;

    /// Create the remote object from configuration and return its full state.
    async fn create(&self, config: Value) -> Result<Value, ProviderError>;

    /// Refresh state from the remote object. The result replaces `state` entirely.
    async fn read(&self, state: Value) -> Result<Value, ProviderError>;

    /// Apply `planned_state` in place. `prior_state` identifies the remote object.
    async fn update(&self, prior_state: Value, planned_state: Value)
        -> Result<Value, ProviderError>;

    /// Remove the remote object.
    async fn delete(&self, state: Value) -> Result<(), ProviderError>;

    /// Seed state for an import. Only `id` is set; a read fills in the rest.
    fn import(&self, id: &str) -> Result<Value, ProviderError> {
        if id.trim().is_empty() {
            return Err(ProviderError::Validation(format!(
                "an id is required to import {}",
                self.type_name()
            )));
        }
        Ok(json!({ "id": id }))
    }
}
