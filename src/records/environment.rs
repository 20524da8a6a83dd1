use serde::{Deserialize, Serialize};

use crate::api::models::{
    ApiKey, CreateEnvironmentDto, Environment, EnvironmentSettings, SdkKeys, UpdateEnvironmentDto,
};

/// Flatten per-platform SDK keys into one list.
///
/// Platforms are visited in the fixed order mobile, server, client. Keys
/// within a platform keep the order the API returned them in.
pub fn flatten_sdk_keys(keys: &SdkKeys) -> Vec<String> {
    [&keys.mobile, &keys.server, &keys.client]
        .into_iter()
        .flat_map(|platform| platform.iter().map(|api_key: &ApiKey| api_key.key.clone()))
        .collect()
}

/// Optional settings block of an environment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentSettingsRecord {
    /// Icon shown for the environment in the dashboard.
    #[serde(default)]
    pub app_icon_uri: Option<String>,
}

impl EnvironmentSettingsRecord {
    fn to_request(&self) -> EnvironmentSettings {
        EnvironmentSettings {
            app_icon_uri: self.app_icon_uri.clone(),
        }
    }

    fn from_response(settings: EnvironmentSettings) -> Option<Self> {
        settings
            .app_icon_uri
            .filter(|uri| !uri.is_empty())
            .map(|uri| Self {
                app_icon_uri: Some(uri),
            })
    }
}

/// State of a `devcycle_environment`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentRecord {
    /// Server-assigned id.
    #[serde(default)]
    pub id: Option<String>,
    /// Project id or key supplied by the operator.
    pub project_key: String,
    /// Server id of the owning project.
    #[serde(default)]
    pub project_id: Option<String>,
    /// Natural key, immutable after creation.
    pub key: String,
    /// Display name.
    pub name: String,
    /// Free-form description.
    pub description: String,
    /// Hex color with a leading `#`.
    pub color: String,
    /// Environment type (development, staging, production, disaster_recovery).
    #[serde(rename = "type")]
    pub environment_type: String,
    /// Optional settings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<EnvironmentSettingsRecord>,
    /// SDK keys ordered mobile, server, client.
    #[serde(default)]
    pub sdk_keys: Vec<String>,
}

impl EnvironmentRecord {
    /// Body for the create call.
    pub fn to_create_request(&self) -> CreateEnvironmentDto {
        CreateEnvironmentDto {
            name: self.name.clone(),
            key: self.key.clone(),
            description: self.description.clone(),
            color: self.color.clone(),
            environment_type: self.environment_type.clone(),
            settings: self.settings.as_ref().map(EnvironmentSettingsRecord::to_request),
        }
    }

    /// Body for the update call. The key is never sent; changing it forces replacement.
    ///
    /// Settings are always sent; a removed icon goes out as an empty string.
    pub fn to_update_request(&self) -> UpdateEnvironmentDto {
        let app_icon_uri = self
            .settings
            .as_ref()
            .and_then(|settings| settings.app_icon_uri.clone())
            .unwrap_or_default();
        UpdateEnvironmentDto {
            name: Some(self.name.clone()),
            description: Some(self.description.clone()),
            color: Some(self.color.clone()),
            environment_type: Some(self.environment_type.clone()),
            settings: Some(EnvironmentSettings {
                app_icon_uri: Some(app_icon_uri),
            }),
        }
    }

    /// Build the full record from an API response.
    ///
    /// `project_key` is the scope the operator addressed the environment by;
    /// it is not part of the response.
    pub fn from_response(environment: Environment, project_key: impl Into<String>) -> Self {
        let sdk_keys = flatten_sdk_keys(&environment.sdk_keys);
        Self {
            id: Some(environment.id),
            project_key: project_key.into(),
            project_id: Some(environment.project),
            key: environment.key,
            name: environment.name,
            description: environment.description,
            color: environment.color,
            environment_type: environment.environment_type,
            settings: environment
                .settings
                .and_then(EnvironmentSettingsRecord::from_response),
            sdk_keys,
        }
    }
}
