//! Provider-side records and their conversions to and from API shapes.
//!
//! Records are what the host stores as state. They serialize to the
//! attribute names published in each handler's schema.

mod environment;
mod feature;

pub use environment::{flatten_sdk_keys, EnvironmentRecord, EnvironmentSettingsRecord};
pub use feature::{FeatureRecord, VariationRecord};

use serde::Deserialize;
use serde_json::Value;

use crate::error::ProviderError;

/// The identifying subset of a resource's state.
///
/// Imported state carries only `id`; everything else is filled in by the
/// following read.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StateLocator {
    /// Server-assigned id.
    pub id: Option<String>,
    /// Natural key.
    pub key: Option<String>,
    /// Project id or key the resource belongs to.
    pub project_key: Option<String>,
}

impl StateLocator {
    /// Extract the locator from a state value.
    pub fn from_state(state: &Value) -> Result<Self, ProviderError> {
        Ok(Self::deserialize(state)?)
    }

    /// Key used in endpoint paths. Falls back to `id`, which the API accepts in its place.
    pub fn lookup_key(&self, kind: &str) -> Result<&str, ProviderError> {
        self.key
            .as_deref()
            .or(self.id.as_deref())
            .filter(|key| !key.is_empty())
            .ok_or_else(|| {
                ProviderError::Validation(format!("{} state has neither a key nor an id", kind))
            })
    }

    /// Project scope for endpoint paths.
    pub fn project(&self, kind: &str) -> Result<&str, ProviderError> {
        self.project_key
            .as_deref()
            .filter(|project| !project.is_empty())
            .ok_or_else(|| {
                ProviderError::Validation(format!(
                    "project_key must be known to look up the {}",
                    kind
                ))
            })
    }
}

/// Lookup arguments of a data source.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DataSourceQuery {
    /// Natural key (or id) of the entity.
    pub key: String,
    /// Project id or key.
    pub project_key: String,
}

impl DataSourceQuery {
    /// Decode the query from a data source configuration.
    pub fn from_config(config: &Value) -> Result<Self, ProviderError> {
        Ok(Self::deserialize(config)?)
    }
}
