//! Request and response shapes of the DevCycle management API.
//!
//! Field names follow the API's JSON (`_id`, `_project`, camelCase). Every
//! response struct tolerates missing fields so partial payloads still decode.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// A single SDK key issued for an environment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ApiKey {
    pub key: String,
    pub compromised: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

/// SDK keys grouped by platform.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SdkKeys {
    pub mobile: Vec<ApiKey>,
    pub client: Vec<ApiKey>,
    pub server: Vec<ApiKey>,
}

/// Environment settings sub-object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvironmentSettings {
    #[serde(rename = "appIconURI", skip_serializing_if = "Option::is_none")]
    pub app_icon_uri: Option<String>,
}

/// Environment as returned by the API.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Environment {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_project")]
    pub project: String,
    pub name: String,
    pub key: String,
    pub description: String,
    pub color: String,
    #[serde(rename = "type")]
    pub environment_type: String,
    pub settings: Option<EnvironmentSettings>,
    pub sdk_keys: SdkKeys,
}

/// Body of `POST /projects/{project}/environments`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CreateEnvironmentDto {
    pub name: String,
    pub key: String,
    pub description: String,
    pub color: String,
    #[serde(rename = "type")]
    pub environment_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub settings: Option<EnvironmentSettings>,
}

/// Body of `PATCH /projects/{project}/environments/{key}`. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateEnvironmentDto {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub environment_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub settings: Option<EnvironmentSettings>,
}

/// A variation of a feature. Variable values are arbitrary JSON.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Variation {
    #[serde(rename = "_id")]
    pub id: String,
    pub key: String,
    pub name: String,
    pub variables: BTreeMap<String, Value>,
}

/// A variable attached to a feature.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Variable {
    #[serde(rename = "_id")]
    pub id: String,
    pub key: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub variable_type: Option<String>,
}

/// Feature as returned by the API.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Feature {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_project")]
    pub project: String,
    pub name: String,
    pub key: String,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub feature_type: Option<String>,
    pub tags: Vec<String>,
    pub variations: Vec<Variation>,
    pub variables: Vec<Variable>,
}

/// Body of `POST /projects/{project}/features`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CreateFeatureDto {
    pub name: String,
    pub key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub feature_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

/// Body of `PATCH /projects/{project}/features/{key}`. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateFeatureDto {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub feature_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_environment_decodes_api_field_names() {
        let env: Environment = serde_json::from_value(json!({
            "_id": "61f97628ff4afcb6d057dbf0",
            "_project": "61f97628ff4afcb6d057dbea",
            "name": "Development",
            "key": "development",
            "color": "#60A5FA",
            "type": "development",
            "settings": {"appIconURI": "https://example.com/icon.png"},
            "sdkKeys": {
                "mobile": [{"key": "dvc_mobile_1", "compromised": false, "createdAt": "2022-02-01T00:00:00Z"}],
                "server": [{"key": "dvc_server_1"}]
            },
            "_createdBy": "google-oauth2|1"
        }))
        .unwrap();

        assert_eq!(env.id, "61f97628ff4afcb6d057dbf0");
        assert_eq!(env.environment_type, "development");
        assert_eq!(env.description, "");
        assert_eq!(
            env.settings.unwrap().app_icon_uri.as_deref(),
            Some("https://example.com/icon.png")
        );
        assert_eq!(env.sdk_keys.mobile[0].key, "dvc_mobile_1");
        assert!(env.sdk_keys.client.is_empty());
    }

    #[test]
    fn test_update_dto_omits_absent_fields() {
        let dto = UpdateEnvironmentDto {
            name: Some("Staging".to_string()),
            ..Default::default()
        };
        assert_eq!(serde_json::to_value(&dto).unwrap(), json!({"name": "Staging"}));
    }

    #[test]
    fn test_create_feature_dto_wire_names() {
        let dto = CreateFeatureDto {
            name: "New Checkout".to_string(),
            key: "new-checkout".to_string(),
            feature_type: Some("experiment".to_string()),
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_value(&dto).unwrap(),
            json!({"name": "New Checkout", "key": "new-checkout", "type": "experiment"})
        );
    }

    #[test]
    fn test_feature_decodes_variations() {
        let feature: Feature = serde_json::from_value(json!({
            "_id": "abc",
            "variations": [
                {"_id": "v1", "key": "on", "name": "On", "variables": {"enabled": true, "color": "red"}}
            ],
            "variables": [{"_id": "var1", "key": "enabled", "type": "Boolean"}]
        }))
        .unwrap();

        assert_eq!(feature.id, "abc");
        assert_eq!(feature.variations[0].variables["enabled"], json!(true));
        assert_eq!(feature.variables[0].variable_type.as_deref(), Some("Boolean"));
        assert!(feature.tags.is_empty());
    }
}
