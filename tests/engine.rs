//! End-to-end workflow runs through the real node handlers
//!
//! No credentials are configured, so every integration node produces
//! simulated output.
mod common;
use common::*;
use nodeflow::workflow::NodeCategory;
use nodeflow::EngineError;
use serde_json::json;

#[tokio::test]
async fn schedule_weather_email_chain() {
    let engine = offline_engine();
    let nodes = vec![
        node("s", NodeCategory::Trigger, "schedule", json!({})),
        node("w", NodeCategory::Data, "weather", json!({ "location": "Oslo" })),
        node(
            "e",
            NodeCategory::Action,
            "email",
            json!({ "to": "ops@example.com", "subject": "Daily weather" }),
        ),
    ];
    let connections = vec![connect("s", "w"), connect("w", "e")];

    let results = engine.execute_workflow(&nodes, &connections).await.unwrap();

    let keys: Vec<&String> = results.keys().collect();
    assert_eq!(keys, vec!["s", "w", "e"]);

    assert_eq!(results["s"]["triggered"], true);
    assert_eq!(results["s"]["cron"], "0 9 * * *");

    let weather = &results["w"];
    assert_eq!(weather["real_service"], false);
    assert_eq!(weather["location"], "Oslo");
    let temperature = weather["temperature"].as_i64().unwrap();
    assert!((60..90).contains(&temperature));

    let email = &results["e"];
    assert_eq!(email["sent"], true);
    assert_eq!(email["real_service"], false);
    assert_eq!(email["to"], "ops@example.com");
    assert_eq!(email["subject"], "Daily weather");
}

#[tokio::test]
async fn false_condition_still_runs_successors() {
    let engine = offline_engine();
    let nodes = vec![
        node("t", NodeCategory::Trigger, "webhook", json!({})),
        node("c", NodeCategory::Logic, "condition", json!({ "condition": false })),
        node("n", NodeCategory::Action, "notification", json!({})),
    ];
    let connections = vec![connect("t", "c"), connect("c", "n")];

    let results = engine.execute_workflow(&nodes, &connections).await.unwrap();

    assert_eq!(results["c"]["condition_met"], false);
    assert_eq!(results["c"]["result"], "Condition not met");
    assert!(results["c"]["input"].get("t").is_some());
    assert!(results.contains_key("n"));
}

#[tokio::test]
async fn missing_condition_defaults_to_met() {
    let engine = offline_engine();
    let nodes = vec![
        node("t", NodeCategory::Trigger, "schedule", json!({})),
        node("c", NodeCategory::Logic, "condition", json!({})),
    ];

    let results = engine.execute_workflow(&nodes, &[connect("t", "c")]).await.unwrap();

    assert_eq!(results["c"]["condition_met"], true);
    assert_eq!(results["c"]["evaluated"], "default");
}

#[tokio::test]
async fn merge_sees_both_branches() {
    let engine = offline_engine();
    let nodes = vec![
        node("t", NodeCategory::Trigger, "schedule", json!({})),
        node("g", NodeCategory::Data, "github", json!({})),
        node("d", NodeCategory::Data, "database", json!({})),
        node("m", NodeCategory::Logic, "merge", json!({})),
    ];
    let connections = vec![
        connect("t", "g"),
        connect("t", "d"),
        connect("g", "m"),
        connect("d", "m"),
    ];

    let results = engine.execute_workflow(&nodes, &connections).await.unwrap();

    let inputs = results["m"]["inputs"].as_object().unwrap();
    let keys: Vec<&String> = inputs.keys().collect();
    assert_eq!(keys, vec!["g", "d"]);
    assert_eq!(results["m"]["output"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn unknown_type_uses_default_handler() {
    let engine = offline_engine();
    let nodes = vec![
        node("t", NodeCategory::Trigger, "schedule", json!({})),
        node("x", NodeCategory::Action, "teleport", json!({})),
    ];

    let results = engine.execute_workflow(&nodes, &[connect("t", "x")]).await.unwrap();

    assert_eq!(results["x"]["executed"], true);
    assert_eq!(results["x"]["node_type"], "teleport");
    assert!(results["x"]["timestamp"].is_string());
}

#[tokio::test]
async fn workflow_without_trigger_is_rejected() {
    let engine = offline_engine();
    let nodes = vec![node("w", NodeCategory::Data, "weather", json!({}))];

    let err = engine.execute_workflow(&nodes, &[]).await.unwrap_err();

    assert!(matches!(err, EngineError::NoTrigger));
    assert_eq!(err.to_string(), "No trigger node found");
}

#[tokio::test]
async fn malformed_config_aborts_run() {
    let engine = offline_engine();
    let nodes = vec![
        node("t", NodeCategory::Trigger, "schedule", json!({})),
        node("e", NodeCategory::Action, "email", json!({ "to": 42 })),
    ];

    let err = engine.execute_workflow(&nodes, &[connect("t", "e")]).await.unwrap_err();

    match err {
        EngineError::Handler { node_id, .. } => assert_eq!(node_id, "e"),
        other => panic!("unexpected error: {other}"),
    }
}
