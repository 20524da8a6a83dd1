//! Lifecycle tests for the provider against the in-memory management API.

use std::sync::Arc;

use devcycle_provider::api::models::{Feature, Variation};
use devcycle_provider::testing::{
    assert_error_contains, assert_plan_changes_attribute, assert_plan_no_changes,
    assert_plan_replaces, assert_plan_updates_in_place, InMemoryApi, ProviderTester,
};
use serde_json::{json, Value};

fn tester() -> (Arc<InMemoryApi>, ProviderTester) {
    let api = Arc::new(InMemoryApi::new());
    let tester = ProviderTester::with_api(api.clone()).expect("handlers register");
    (api, tester)
}

fn feature_config() -> Value {
    json!({
        "name": "Dark Mode",
        "key": "dark-mode",
        "project_key": "web",
        "description": "Dark theme for the dashboard",
        "type": "release",
        "tags": ["ui"]
    })
}

fn environment_config() -> Value {
    json!({
        "project_key": "web",
        "key": "production",
        "name": "Production",
        "description": "live traffic",
        "color": "#ef4444",
        "type": "production",
        "settings": {"app_icon_uri": "https://cdn.example.com/icon.png"}
    })
}

#[tokio::test]
async fn test_environment_crud() {
    let (api, tester) = tester();

    let mut updated = environment_config();
    updated["color"] = json!("#dc2626");

    let state = tester
        .lifecycle_crud("devcycle_environment", environment_config(), updated)
        .await
        .unwrap();

    assert_eq!(state["color"], "#dc2626");
    assert_eq!(
        state["settings"]["app_icon_uri"],
        "https://cdn.example.com/icon.png"
    );
    assert_eq!(
        state["sdk_keys"],
        json!([
            "dvc_mobile_production",
            "dvc_server_production",
            "dvc_client_production"
        ])
    );
    assert_eq!(api.count("update_environment"), 1);
    assert_eq!(api.count("remove_environment"), 1);
}

#[tokio::test]
async fn test_read_is_idempotent() {
    let (_, tester) = tester();
    let created = tester
        .create("devcycle_feature", feature_config())
        .await
        .unwrap();

    let first = tester.read("devcycle_feature", created).await.unwrap();
    let second = tester.read("devcycle_feature", first.clone()).await.unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_plans_after_create() {
    let (_, tester) = tester();
    let state = tester
        .lifecycle_create("devcycle_feature", feature_config())
        .await
        .unwrap();

    let plan = tester
        .plan_update("devcycle_feature", state.clone(), feature_config())
        .unwrap();
    assert_plan_no_changes(&plan);

    let mut renamed = feature_config();
    renamed["description"] = json!("Now with auto switching");
    let plan = tester
        .plan_update("devcycle_feature", state.clone(), renamed)
        .unwrap();
    assert_plan_updates_in_place(&plan);
    assert_plan_changes_attribute(&plan, "description");

    let mut moved = feature_config();
    moved["project_key"] = json!("mobile");
    let plan = tester
        .plan_update("devcycle_feature", state, moved)
        .unwrap();
    assert_plan_replaces(&plan);
    assert!(plan.planned_state.get("id").is_none());
    assert!(plan.planned_state.get("variations").is_none());
}

#[tokio::test]
async fn test_optional_computed_type_keeps_server_default() {
    let (_, tester) = tester();
    let mut config = feature_config();
    config.as_object_mut().unwrap().remove("type");

    let state = tester
        .create("devcycle_feature", config.clone())
        .await
        .unwrap();
    assert_eq!(state["type"], "release");

    let plan = tester
        .plan_update("devcycle_feature", state, config)
        .unwrap();
    assert_plan_no_changes(&plan);
}

#[tokio::test]
async fn test_removing_optional_feature_attributes_converges() {
    let (api, tester) = tester();
    let created = tester
        .apply("devcycle_feature", None, Some(feature_config()))
        .await;
    let state = created.state.expect("created");
    assert_eq!(state["tags"], json!(["ui"]));

    let mut trimmed = feature_config();
    let fields = trimmed.as_object_mut().unwrap();
    fields.remove("description");
    fields.remove("tags");

    let updated = tester
        .apply("devcycle_feature", Some(state), Some(trimmed.clone()))
        .await;
    let state = updated.state.expect("updated");
    assert!(state.get("description").is_none());
    assert!(state.get("tags").is_none());

    let plan = tester
        .plan_update("devcycle_feature", state.clone(), trimmed.clone())
        .unwrap();
    assert_plan_no_changes(&plan);

    api.clear_calls();
    let again = tester
        .apply("devcycle_feature", Some(state.clone()), Some(trimmed))
        .await;
    assert_eq!(again.state, Some(state));
    assert!(api.calls().is_empty());
}

#[tokio::test]
async fn test_removing_environment_settings_converges() {
    let (_, tester) = tester();
    let state = tester
        .lifecycle_create("devcycle_environment", environment_config())
        .await
        .unwrap();

    let mut trimmed = environment_config();
    trimmed.as_object_mut().unwrap().remove("settings");

    let state = tester
        .lifecycle_update("devcycle_environment", state, trimmed.clone())
        .await
        .unwrap();
    assert!(state.get("settings").is_none());

    let plan = tester
        .plan_update("devcycle_environment", state, trimmed)
        .unwrap();
    assert_plan_no_changes(&plan);
}

#[tokio::test]
async fn test_key_change_never_reaches_update() {
    let (api, tester) = tester();
    let prior = tester
        .create("devcycle_feature", feature_config())
        .await
        .unwrap();
    api.clear_calls();

    let mut config = feature_config();
    config["key"] = json!("dark-theme");
    let response = tester
        .apply("devcycle_feature", Some(prior.clone()), Some(config))
        .await;

    assert!(!response.has_errors());
    let state = response.state.unwrap();
    assert_eq!(state["key"], "dark-theme");
    assert_ne!(state["id"], prior["id"]);

    let operations: Vec<_> = api.calls().into_iter().map(|c| c.operation).collect();
    assert_eq!(operations, vec!["remove_feature", "create_feature"]);
}

#[tokio::test]
async fn test_failed_update_keeps_prior_state() {
    let (api, tester) = tester();
    let prior = tester
        .create("devcycle_environment", environment_config())
        .await
        .unwrap();

    let mut config = environment_config();
    config["name"] = json!("Prod");
    api.fail_next(500, "internal");

    let response = tester
        .apply("devcycle_environment", Some(prior.clone()), Some(config))
        .await;

    assert_eq!(response.state, Some(prior));
    assert_error_contains(&response.diagnostics, "Unable to update environment");
}

#[tokio::test]
async fn test_delete_then_read_reports_missing() {
    let (_, tester) = tester();
    let state = tester
        .create("devcycle_environment", environment_config())
        .await
        .unwrap();

    tester
        .delete("devcycle_environment", state.clone())
        .await
        .unwrap();

    let err = tester
        .read("devcycle_environment", state)
        .await
        .unwrap_err();
    assert_error_contains(err.diagnostics(), "Unable to read environment");
    assert_error_contains(err.diagnostics(), "HTTP status 404");
}

#[tokio::test]
async fn test_import_by_id_then_read() {
    let (_, tester) = tester();
    let created = tester
        .create("devcycle_feature", feature_config())
        .await
        .unwrap();

    let imported = tester
        .import(
            "devcycle_feature",
            created["id"].as_str().unwrap(),
            "web",
        )
        .await
        .unwrap();

    assert_eq!(imported, created);
}

#[tokio::test]
async fn test_import_without_project_is_rejected_on_read() {
    let (_, tester) = tester();
    let seeded = tester.provider().import("devcycle_environment", "e1");
    let response = tester
        .provider()
        .read("devcycle_environment", seeded.state.unwrap())
        .await;
    assert_error_contains(&response.diagnostics, "Validation Error");
}

#[tokio::test]
async fn test_supplying_computed_attribute_is_rejected() {
    let (api, tester) = tester();
    let mut config = feature_config();
    config["id"] = json!("forged");

    let err = tester
        .create("devcycle_feature", config)
        .await
        .unwrap_err();
    assert_error_contains(err.diagnostics(), "Cannot set computed attribute 'id'");
    assert!(api.calls().is_empty());
}

#[tokio::test]
async fn test_feature_data_source_reads_variations() {
    let (api, tester) = tester();
    api.put_feature(
        "web",
        Feature {
            id: "f1".into(),
            project: "p1".into(),
            name: "Checkout".into(),
            key: "checkout".into(),
            variations: vec![Variation {
                id: "v1".into(),
                key: "on".into(),
                name: "On".into(),
                variables: [("limit".to_string(), json!(3))].into_iter().collect(),
            }],
            ..Default::default()
        },
    );

    let state = tester
        .read_data_source(
            "devcycle_feature",
            json!({"key": "checkout", "project_key": "web"}),
        )
        .await
        .unwrap();

    assert_eq!(
        state["variations"],
        json!([{"key": "on", "name": "On", "id": "v1", "variables": {"limit": "3"}}])
    );
}

#[test]
fn test_lifecycle_on_blocking_executor() {
    let (api, tester) = tester();
    let state = tokio_test::block_on(
        tester.lifecycle_create("devcycle_environment", environment_config()),
    )
    .unwrap();

    assert_eq!(state["key"], "production");
    assert_eq!(api.count("create_environment"), 1);
    assert_eq!(api.count("find_environment"), 1);
}

#[test]
fn test_missing_required_attribute_is_reported() {
    let (_, tester) = tester();
    let err = tester
        .validate_resource_config("devcycle_environment", json!({"key": "production"}))
        .unwrap_err();
    assert_error_contains(err.diagnostics(), "Missing required attribute 'project_key'");
}
