/// Node and connection editing endpoints used by the canvas

use crate::{
    api::workflows::AppState,
    workflow::storage::{ConnectionRejected, NewNode, NodeUpdate},
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{delete, post, put},
    Router,
};
use serde::Deserialize;
use serde_json::{json, Value};

#[derive(Debug, Deserialize)]
pub struct CreateConnectionRequest {
    pub source_node_id: String,
    pub target_node_id: String,
}

pub fn create_node_routes() -> Router<AppState> {
    Router::new()
        .route("/api/workflows/{id}/nodes", post(create_node))
        .route("/api/nodes/{id}", put(update_node).delete(delete_node))
        .route("/api/workflows/{id}/connections", post(create_connection))
        .route("/api/connections/{id}", delete(delete_connection))
}

/// POST /api/workflows/{id}/nodes
async fn create_node(
    State(state): State<AppState>,
    Path(workflow_id): Path<String>,
    Json(payload): Json<NewNode>,
) -> Result<(StatusCode, Json<Value>), StatusCode> {
    match state.storage.get_workflow(&workflow_id).await {
        Ok(Some(_)) => {}
        Ok(None) => return Err(StatusCode::NOT_FOUND),
        Err(e) => {
            tracing::error!("Failed to look up workflow {}: {}", workflow_id, e);
            return Err(StatusCode::INTERNAL_SERVER_ERROR);
        }
    }

    match state.storage.create_node(&workflow_id, payload).await {
        Ok(node) => {
            tracing::debug!("Created node {} ({}) in {}", node.id, node.node_type, workflow_id);
            Ok((StatusCode::CREATED, Json(json!(node))))
        }
        Err(e) => {
            tracing::error!("Failed to create node: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// PUT /api/nodes/{id}
async fn update_node(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<NodeUpdate>,
) -> Result<Json<Value>, StatusCode> {
    match state.storage.update_node(&id, payload).await {
        Ok(Some(node)) => Ok(Json(json!(node))),
        Ok(None) => Err(StatusCode::NOT_FOUND),
        Err(e) => {
            tracing::error!("Failed to update node {}: {}", id, e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// DELETE /api/nodes/{id}
/// Also removes every connection touching the node
async fn delete_node(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, StatusCode> {
    match state.storage.delete_node(&id).await {
        Ok(true) => Ok(StatusCode::NO_CONTENT),
        Ok(false) => Err(StatusCode::NOT_FOUND),
        Err(e) => {
            tracing::error!("Failed to delete node {}: {}", id, e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// POST /api/workflows/{id}/connections
/// Body: { "source_node_id": "...", "target_node_id": "..." }
async fn create_connection(
    State(state): State<AppState>,
    Path(workflow_id): Path<String>,
    Json(payload): Json<CreateConnectionRequest>,
) -> Result<(StatusCode, Json<Value>), (StatusCode, Json<Value>)> {
    let created = state
        .storage
        .create_connection(&workflow_id, &payload.source_node_id, &payload.target_node_id)
        .await;

    match created {
        Ok(connection) => Ok((StatusCode::CREATED, Json(json!(connection)))),
        Err(e) => match e.downcast_ref::<ConnectionRejected>() {
            Some(rejected) => Err((StatusCode::BAD_REQUEST, Json(json!({ "error": rejected.to_string() })))),
            None => {
                tracing::error!("Failed to create connection: {}", e);
                Err((
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "Failed to create connection" })),
                ))
            }
        },
    }
}

/// DELETE /api/connections/{id}
async fn delete_connection(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, StatusCode> {
    match state.storage.delete_connection(&id).await {
        Ok(true) => Ok(StatusCode::NO_CONTENT),
        Ok(false) => Err(StatusCode::NOT_FOUND),
        Err(e) => {
            tracing::error!("Failed to delete connection {}: {}", id, e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}
