//! SQLite storage behaviour against an in-memory database
use nodeflow::workflow::storage::{NewNode, NewWorkflow, NodeUpdate, WorkflowUpdate};
use nodeflow::workflow::{ConnectionRejected, ExecutionStatus, NodeCategory, ResultMap, WorkflowStorage};
use serde_json::json;

async fn storage() -> WorkflowStorage {
    WorkflowStorage::connect("sqlite::memory:")
        .await
        .expect("Failed to open in-memory database")
}

fn new_workflow(name: &str) -> NewWorkflow {
    NewWorkflow {
        name: name.to_string(),
        description: Some("test".to_string()),
        user_id: "user-1".to_string(),
    }
}

fn new_node(category: NodeCategory, node_type: &str) -> NewNode {
    NewNode {
        category,
        node_type: node_type.to_string(),
        label: node_type.to_string(),
        position_x: 10.0,
        position_y: 20.0,
        config: json!({ "location": "Lima" }).as_object().cloned().unwrap(),
    }
}

#[tokio::test]
async fn workflow_crud() {
    let storage = storage().await;

    let created = storage.create_workflow(new_workflow("First")).await.unwrap();
    assert!(!created.is_active);
    assert!(created.last_run_at.is_none());

    let listed = storage.list_workflows("user-1").await.unwrap();
    assert_eq!(listed.len(), 1);
    assert!(storage.list_workflows("someone-else").await.unwrap().is_empty());

    let updated = storage
        .update_workflow(
            &created.id,
            WorkflowUpdate {
                is_active: Some(true),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .unwrap();
    assert!(updated.is_active);
    assert_eq!(updated.name, "First");

    assert!(storage.update_workflow("missing", WorkflowUpdate::default()).await.unwrap().is_none());
    assert!(storage.delete_workflow(&created.id).await.unwrap());
    assert!(storage.get_workflow(&created.id).await.unwrap().is_none());
    assert!(!storage.delete_workflow(&created.id).await.unwrap());
}

#[tokio::test]
async fn graph_loads_in_creation_order() {
    let storage = storage().await;
    let workflow = storage.create_workflow(new_workflow("Graph")).await.unwrap();

    let a = storage.create_node(&workflow.id, new_node(NodeCategory::Trigger, "schedule")).await.unwrap();
    let b = storage.create_node(&workflow.id, new_node(NodeCategory::Data, "weather")).await.unwrap();
    let c = storage.create_node(&workflow.id, new_node(NodeCategory::Action, "email")).await.unwrap();
    storage.create_connection(&workflow.id, &a.id, &c.id).await.unwrap();
    storage.create_connection(&workflow.id, &a.id, &b.id).await.unwrap();

    let (nodes, connections) = storage.load_graph(&workflow.id).await.unwrap();
    let ids: Vec<&str> = nodes.iter().map(|n| n.id.as_str()).collect();
    assert_eq!(ids, vec![a.id.as_str(), b.id.as_str(), c.id.as_str()]);
    assert_eq!(nodes[1].config["location"], "Lima");
    assert_eq!(connections[0].target_node_id, c.id);
    assert_eq!(connections[1].target_node_id, b.id);

    let detail = storage.get_workflow_detail(&workflow.id).await.unwrap().unwrap();
    assert_eq!(detail.nodes.len(), 3);
    assert_eq!(detail.connections.len(), 2);
}

#[tokio::test]
async fn connections_are_validated() {
    let storage = storage().await;
    let workflow = storage.create_workflow(new_workflow("Edges")).await.unwrap();
    let other = storage.create_workflow(new_workflow("Other")).await.unwrap();

    let a = storage.create_node(&workflow.id, new_node(NodeCategory::Trigger, "schedule")).await.unwrap();
    let b = storage.create_node(&workflow.id, new_node(NodeCategory::Logic, "merge")).await.unwrap();
    let foreign = storage.create_node(&other.id, new_node(NodeCategory::Logic, "merge")).await.unwrap();

    storage.create_connection(&workflow.id, &a.id, &b.id).await.unwrap();

    let duplicate = storage.create_connection(&workflow.id, &a.id, &b.id).await.unwrap_err();
    assert_eq!(duplicate.downcast_ref::<ConnectionRejected>(), Some(&ConnectionRejected::Duplicate));

    let unknown = storage.create_connection(&workflow.id, &a.id, "ghost").await.unwrap_err();
    assert_eq!(unknown.downcast_ref::<ConnectionRejected>(), Some(&ConnectionRejected::UnknownEndpoint));

    let cross = storage.create_connection(&workflow.id, &a.id, &foreign.id).await.unwrap_err();
    assert_eq!(cross.downcast_ref::<ConnectionRejected>(), Some(&ConnectionRejected::UnknownEndpoint));

    // The reverse direction is a different ordered pair
    storage.create_connection(&workflow.id, &b.id, &a.id).await.unwrap();
}

#[tokio::test]
async fn deleting_node_removes_its_connections() {
    let storage = storage().await;
    let workflow = storage.create_workflow(new_workflow("Prune")).await.unwrap();
    let a = storage.create_node(&workflow.id, new_node(NodeCategory::Trigger, "schedule")).await.unwrap();
    let b = storage.create_node(&workflow.id, new_node(NodeCategory::Data, "weather")).await.unwrap();
    let c = storage.create_node(&workflow.id, new_node(NodeCategory::Action, "sms")).await.unwrap();
    storage.create_connection(&workflow.id, &a.id, &b.id).await.unwrap();
    storage.create_connection(&workflow.id, &b.id, &c.id).await.unwrap();
    storage.create_connection(&workflow.id, &a.id, &c.id).await.unwrap();

    assert!(storage.delete_node(&b.id).await.unwrap());

    let (nodes, connections) = storage.load_graph(&workflow.id).await.unwrap();
    assert_eq!(nodes.len(), 2);
    assert_eq!(connections.len(), 1);
    assert_eq!(connections[0].source_node_id, a.id);
    assert_eq!(connections[0].target_node_id, c.id);
}

#[tokio::test]
async fn node_update_is_partial() {
    let storage = storage().await;
    let workflow = storage.create_workflow(new_workflow("Edit")).await.unwrap();
    let node = storage.create_node(&workflow.id, new_node(NodeCategory::Data, "weather")).await.unwrap();

    let updated = storage
        .update_node(
            &node.id,
            NodeUpdate {
                position_x: Some(99.0),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .unwrap();

    assert_eq!(updated.position_x, 99.0);
    assert_eq!(updated.position_y, 20.0);
    assert_eq!(updated.label, "weather");
    assert_eq!(updated.config["location"], "Lima");
}

#[tokio::test]
async fn execution_record_transitions_once() {
    let storage = storage().await;
    let workflow = storage.create_workflow(new_workflow("Runs")).await.unwrap();

    storage.insert_execution("exec-1", &workflow.id).await.unwrap();
    let running = storage.get_execution("exec-1").await.unwrap().unwrap();
    assert_eq!(running.status, ExecutionStatus::Running);
    assert!(running.completed_at.is_none());

    let mut results = ResultMap::new();
    results.insert("n1".to_string(), json!({ "ok": true }));
    storage.complete_execution("exec-1", &results).await.unwrap();

    let done = storage.get_execution("exec-1").await.unwrap().unwrap();
    assert_eq!(done.status, ExecutionStatus::Completed);
    assert_eq!(done.execution_data, Some(json!({ "n1": { "ok": true } })));

    // A terminal record cannot be finished again
    assert!(storage.fail_execution("exec-1", "late").await.is_err());
    let still_done = storage.get_execution("exec-1").await.unwrap().unwrap();
    assert_eq!(still_done.status, ExecutionStatus::Completed);
    assert!(still_done.error_message.is_none());
}

#[tokio::test]
async fn execution_history_is_capped_at_fifty() {
    let storage = storage().await;
    let workflow = storage.create_workflow(new_workflow("Busy")).await.unwrap();

    for i in 0..55 {
        storage.insert_execution(&format!("exec-{i}"), &workflow.id).await.unwrap();
    }

    let executions = storage.list_executions(&workflow.id).await.unwrap();
    assert_eq!(executions.len(), 50);
    assert_eq!(executions[0].id, "exec-54");
}
