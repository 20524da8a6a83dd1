//! DevCycle Provider
//!
//! Resource and data source handlers that manage DevCycle environments and
//! features through the DevCycle management API, for use inside an
//! infrastructure-as-code host.
//!
//! # Overview
//!
//! The crate provides:
//!
//! - **API client**: typed calls against `https://api.devcycle.com/v1`, behind the
//!   [`EnvironmentsApi`] and [`FeaturesApi`] traits
//! - **Resources**: `devcycle_environment` and `devcycle_feature` with create, read,
//!   update, delete and import
//! - **Data sources**: lookups of existing environments and features by key
//! - **Provider**: a dispatch table keyed by type name with schema metadata, config
//!   validation, plan and apply
//! - **Auth**: the OAuth2 client-credentials exchange used to obtain a bearer token
//! - **Logging**: `tracing` output to stderr
//!
//! # Quick Start
//!
//! ```no_run
//! use devcycle_provider::{init_logging, DevCycleProvider};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     init_logging();
//!
//!     // Credentials fall back to DEVCYCLE_CLIENT_ID / DEVCYCLE_CLIENT_SECRET.
//!     let provider = DevCycleProvider::configure(json!({})).await?;
//!
//!     let response = provider
//!         .read_data_source(
//!             "devcycle_feature",
//!             json!({"key": "dark-mode", "project_key": "web"}),
//!         )
//!         .await;
//!     println!("{:?}", response.state);
//!     Ok(())
//! }
//! ```
//!
//! # Lifecycle
//!
//! Every handler operation decodes its input into a record, issues exactly
//! one management API call and maps the response back into state. Any
//! status other than 200 becomes a `Client Error` diagnostic; the state
//! the host keeps is then the prior state (read, update, delete) or none
//! (create). A change to `key` or `project_key` is applied as delete
//! followed by create.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod api;
pub mod auth;
pub mod config;
pub mod data_sources;
pub mod error;
pub mod logging;
pub mod provider;
pub mod records;
pub mod resources;
pub mod schema;
pub mod testing;
pub mod types;
pub mod validation;

// Re-export main types at crate root
pub use api::{DevCycleClient, EnvironmentsApi, FeaturesApi, ManagementApi};
pub use auth::{get_auth_token, AuthError, AuthToken};
pub use config::ProviderConfig;
pub use data_sources::DataSource;
pub use error::ProviderError;
pub use logging::{init_logging, init_logging_with_default, try_init_logging};
pub use provider::{DevCycleProvider, ProviderBuilder};
pub use resources::Resource;
pub use schema::ProviderSchema;
pub use types::{AttributeChange, PlanResult, ProviderMetadata, ResourceResponse};
pub use validation::{is_valid, validate, validate_result};

// Re-export async_trait for convenience
pub use async_trait::async_trait;

// Re-export commonly used external types
pub use serde_json;
pub use tracing;
