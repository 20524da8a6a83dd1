//! Value types exchanged between the host and the provider.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::schema::Diagnostic;

/// A change to a single attribute during a plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeChange {
    /// The path to the attribute that changed.
    pub path: String,
    /// The value before the change (None if the attribute is being set for the first time).
    pub before: Option<Value>,
    /// The value after the change (None if the attribute is being cleared).
    pub after: Option<Value>,
}

impl AttributeChange {
    /// Create a new attribute change.
    pub fn new(path: impl Into<String>, before: Option<Value>, after: Option<Value>) -> Self {
        Self {
            path: path.into(),
            before,
            after,
        }
    }

    /// Create a change for a new attribute.
    pub fn added(path: impl Into<String>, value: Value) -> Self {
        Self::new(path, None, Some(value))
    }

    /// Create a change for a removed attribute.
    pub fn removed(path: impl Into<String>, value: Value) -> Self {
        Self::new(path, Some(value), None)
    }

    /// Create a change for a modified attribute.
    pub fn modified(path: impl Into<String>, before: Value, after: Value) -> Self {
        Self::new(path, Some(before), Some(after))
    }

    /// Build the change between two values, treating `null` as absent.
    ///
    /// Returns `None` when the values are equal.
    pub fn between(path: impl Into<String>, before: &Value, after: &Value) -> Option<Self> {
        if before == after {
            return None;
        }
        Some(match (before.is_null(), after.is_null()) {
            (true, _) => Self::added(path, after.clone()),
            (_, true) => Self::removed(path, before.clone()),
            _ => Self::modified(path, before.clone(), after.clone()),
        })
    }
}

/// The result of a plan operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanResult {
    /// The planned state after the operation.
    pub planned_state: Value,
    /// The list of attribute changes.
    pub changes: Vec<AttributeChange>,
    /// Whether the resource requires replacement.
    pub requires_replace: bool,
}

impl PlanResult {
    /// Create a plan result with no changes.
    pub fn no_change(state: Value) -> Self {
        Self {
            planned_state: state,
            changes: Vec::new(),
            requires_replace: false,
        }
    }

    /// Create a plan result with changes.
    pub fn with_changes(
        planned_state: Value,
        changes: Vec<AttributeChange>,
        requires_replace: bool,
    ) -> Self {
        Self {
            planned_state,
            changes,
            requires_replace,
        }
    }

    /// True when applying the plan would not touch the remote object.
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }
}

/// Resource and data source names the provider answers for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ProviderMetadata {
    /// Resource type names.
    pub resources: Vec<String>,
    /// Data source type names.
    pub data_sources: Vec<String>,
}

/// Outcome of a lifecycle operation as handed back to the host.
///
/// `state` is the state the host should store afterwards. `None` means no
/// state: nothing was created, or the object was deleted.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResourceResponse {
    /// State to store.
    pub state: Option<Value>,
    /// Diagnostics raised by the operation.
    pub diagnostics: Vec<Diagnostic>,
}

impl ResourceResponse {
    /// A successful response carrying `state`.
    pub fn ok(state: Value) -> Self {
        Self {
            state: Some(state),
            diagnostics: Vec::new(),
        }
    }

    /// A successful response with no state left behind.
    pub fn removed() -> Self {
        Self::default()
    }

    /// A failed response. `state` is what the host should keep.
    pub fn failed(state: Option<Value>, diagnostic: impl Into<Diagnostic>) -> Self {
        Self {
            state,
            diagnostics: vec![diagnostic.into()],
        }
    }

    /// True if any diagnostic is an error.
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProviderError;
    use serde_json::json;

    #[test]
    fn test_attribute_change_constructors() {
        let added = AttributeChange::added("name", json!("test"));
        assert!(added.before.is_none());
        assert_eq!(added.after, Some(json!("test")));

        let removed = AttributeChange::removed("name", json!("old"));
        assert_eq!(removed.before, Some(json!("old")));
        assert!(removed.after.is_none());

        let modified = AttributeChange::modified("color", json!("#000000"), json!("#ffffff"));
        assert_eq!(modified.before, Some(json!("#000000")));
        assert_eq!(modified.after, Some(json!("#ffffff")));
    }

    #[test]
    fn test_attribute_change_between() {
        assert!(AttributeChange::between("name", &json!("a"), &json!("a")).is_none());
        assert_eq!(
            AttributeChange::between("description", &Value::Null, &json!("x")),
            Some(AttributeChange::added("description", json!("x")))
        );
        assert_eq!(
            AttributeChange::between("tags", &json!(["a"]), &Value::Null),
            Some(AttributeChange::removed("tags", json!(["a"])))
        );
    }

    #[test]
    fn test_plan_result() {
        let no_change = PlanResult::no_change(json!({"id": "123"}));
        assert!(no_change.is_empty());
        assert!(!no_change.requires_replace);

        let with_changes = PlanResult::with_changes(
            json!({"id": "123", "name": "new"}),
            vec![AttributeChange::modified("name", json!("old"), json!("new"))],
            false,
        );
        assert_eq!(with_changes.changes.len(), 1);
        assert!(!with_changes.is_empty());
    }

    #[test]
    fn test_resource_response() {
        let ok = ResourceResponse::ok(json!({"id": "1"}));
        assert!(!ok.has_errors());

        let failed = ResourceResponse::failed(
            Some(json!({"id": "1"})),
            ProviderError::Client("Unable to read feature, got error: HTTP status 404".into()),
        );
        assert!(failed.has_errors());
        assert_eq!(failed.state, Some(json!({"id": "1"})));
        assert_eq!(failed.diagnostics[0].summary, "Client Error");

        assert_eq!(ResourceResponse::removed().state, None);
    }
}
