use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::api::models::{CreateFeatureDto, Feature, UpdateFeatureDto, Variation};

/// A feature variation as kept in state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariationRecord {
    /// Variation key.
    pub key: String,
    /// Variation name.
    pub name: String,
    /// Variation id.
    pub id: String,
    /// Variable values rendered as strings.
    #[serde(default)]
    pub variables: BTreeMap<String, String>,
}

impl VariationRecord {
    fn from_response(variation: Variation) -> Self {
        Self {
            key: variation.key,
            name: variation.name,
            id: variation.id,
            variables: variation
                .variables
                .into_iter()
                .map(|(key, value)| (key, variable_value_to_string(value)))
                .collect(),
        }
    }
}

// Strings are kept verbatim; anything else becomes its compact JSON text.
fn variable_value_to_string(value: Value) -> String {
    match value {
        Value::String(s) => s,
        other => other.to_string(),
    }
}

/// State of a `devcycle_feature`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureRecord {
    /// Server-assigned id.
    #[serde(default)]
    pub id: Option<String>,
    /// Display name.
    pub name: String,
    /// Free-form description.
    #[serde(default)]
    pub description: Option<String>,
    /// Natural key, immutable after creation.
    pub key: String,
    /// Project id or key supplied by the operator.
    pub project_key: String,
    /// Server id of the owning project.
    #[serde(default)]
    pub project_id: Option<String>,
    /// Feature type (release, experiment, permission, ops).
    #[serde(default, rename = "type")]
    pub feature_type: Option<String>,
    /// Tags attached to the feature.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    /// Variations in API order.
    #[serde(default)]
    pub variations: Vec<VariationRecord>,
    /// Ids of the variables attached to the feature.
    #[serde(default)]
    pub variables: Vec<String>,
}

impl FeatureRecord {
    /// Body for the create call.
    pub fn to_create_request(&self) -> CreateFeatureDto {
        CreateFeatureDto {
            name: self.name.clone(),
            key: self.key.clone(),
            description: self.description.clone(),
            feature_type: self.feature_type.clone(),
            tags: self.tags.clone(),
        }
    }

    /// Body for the update call. The key is never sent; changing it forces replacement.
    ///
    /// An absent description or tag list is sent as empty so the server clears it.
    pub fn to_update_request(&self) -> UpdateFeatureDto {
        UpdateFeatureDto {
            name: Some(self.name.clone()),
            description: Some(self.description.clone().unwrap_or_default()),
            feature_type: self.feature_type.clone(),
            tags: Some(self.tags.clone().unwrap_or_default()),
        }
    }

    /// Build the full record from an API response.
    pub fn from_response(feature: Feature, project_key: impl Into<String>) -> Self {
        Self {
            id: Some(feature.id),
            name: feature.name,
            description: feature.description.filter(|d| !d.is_empty()),
            key: feature.key,
            project_key: project_key.into(),
            project_id: Some(feature.project),
            feature_type: feature.feature_type,
            tags: (!feature.tags.is_empty()).then_some(feature.tags),
            variations: feature
                .variations
                .into_iter()
                .map(VariationRecord::from_response)
                .collect(),
            variables: feature
                .variables
                .into_iter()
                .map(|variable| variable.id)
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::Variable;
    use serde_json::json;

    #[test]
    fn test_variation_variables_rendered_as_strings() {
        let variation = Variation {
            id: "v1".to_string(),
            key: "variation-on".to_string(),
            name: "Variation On".to_string(),
            variables: BTreeMap::from([
                ("enabled".to_string(), json!(true)),
                ("label".to_string(), json!("Buy now")),
                ("limits".to_string(), json!({"max": 3})),
                ("ratio".to_string(), json!(0.5)),
            ]),
        };

        let record = VariationRecord::from_response(variation);
        assert_eq!(record.variables["enabled"], "true");
        assert_eq!(record.variables["label"], "Buy now");
        assert_eq!(record.variables["limits"], r#"{"max":3}"#);
        assert_eq!(record.variables["ratio"], "0.5");
    }

    #[test]
    fn test_from_response_maps_variables_to_ids() {
        let feature = Feature {
            id: "feature-id".to_string(),
            project: "project-id".to_string(),
            key: "checkout".to_string(),
            variables: vec![
                Variable {
                    id: "var-b".to_string(),
                    key: "b".to_string(),
                    variable_type: None,
                },
                Variable {
                    id: "var-a".to_string(),
                    key: "a".to_string(),
                    variable_type: None,
                },
            ],
            ..Default::default()
        };

        let record = FeatureRecord::from_response(feature, "my-project");
        assert_eq!(record.variables, vec!["var-b", "var-a"]);
        assert_eq!(record.project_id.as_deref(), Some("project-id"));
        assert_eq!(record.project_key, "my-project");
        assert_eq!(record.tags, None);
    }

    #[test]
    fn test_create_request_projects_config_fields() {
        let record = FeatureRecord {
            name: "Checkout".to_string(),
            key: "checkout".to_string(),
            project_key: "p1".to_string(),
            feature_type: Some("experiment".to_string()),
            tags: Some(vec!["payments".to_string()]),
            id: Some("ignored".to_string()),
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_value(record.to_create_request()).unwrap(),
            json!({"name": "Checkout", "key": "checkout", "type": "experiment", "tags": ["payments"]})
        );
    }

    #[test]
    fn test_update_request_clears_removed_optionals() {
        let record = FeatureRecord {
            name: "Checkout".to_string(),
            key: "checkout".to_string(),
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_value(record.to_update_request()).unwrap(),
            json!({"name": "Checkout", "description": "", "tags": []})
        );
    }

    #[test]
    fn test_empty_description_in_response_is_absent() {
        let feature = Feature {
            description: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(FeatureRecord::from_response(feature, "p").description, None);
    }
}
