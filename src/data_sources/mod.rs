//! Data source handlers.
//!
//! A data source looks up an existing entity by key and project and returns
//! its full record. It never creates, changes or deletes anything.

mod environment;
mod feature;

pub use environment::EnvironmentDataSource;
pub use feature::FeatureDataSource;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::ProviderError;
use crate::schema::Schema;

/// Read-only lookup contract implemented by every data source type.
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Name the data source is registered under, e.g. `devcycle_feature`.
    fn type_name(&self) -> &'static str;

    /// Attribute table of the data source.
    fn schema(&self) -> Schema;

    /// Look up the entity described by `config` and return its state.
    async fn read(&self, config: Value) -> Result<Value, ProviderError>;
}
