/// Workflow management REST API endpoints
///
/// CRUD for workflows, manual execution, and execution history.

use crate::{
    runtime::runner::{RunError, WorkflowRunner},
    services::ServiceClients,
    workflow::storage::{default_user, NewWorkflow, WorkflowStorage, WorkflowUpdate},
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

/// Application state containing shared resources
#[derive(Clone)]
pub struct AppState {
    /// Workflow storage for persistence
    pub storage: WorkflowStorage,
    /// Runs workflows and records their executions
    pub runner: Arc<WorkflowRunner>,
    /// Integration clients, reported by the health check
    pub services: Arc<ServiceClients>,
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default = "default_user")]
    pub user_id: String,
}

/// Create workflow management routes
pub fn create_workflow_routes() -> Router<AppState> {
    Router::new()
        .route("/api/workflows", post(create_workflow).get(list_workflows))
        .route(
            "/api/workflows/{id}",
            get(get_workflow).put(update_workflow).delete(delete_workflow),
        )
        .route("/api/workflows/{id}/execute", post(execute_workflow))
        .route("/api/workflows/{id}/executions", get(list_executions))
}

/// POST /api/workflows
/// Body: { "name": "...", "description": "...", "user_id": "..." }
async fn create_workflow(
    State(state): State<AppState>,
    Json(payload): Json<NewWorkflow>,
) -> Result<(StatusCode, Json<Value>), StatusCode> {
    if payload.name.trim().is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }

    match state.storage.create_workflow(payload).await {
        Ok(workflow) => {
            tracing::info!("Created workflow: {} ({})", workflow.id, workflow.name);
            Ok((StatusCode::CREATED, Json(json!(workflow))))
        }
        Err(e) => {
            tracing::error!("Failed to create workflow: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// GET /api/workflows?user_id=...
async fn list_workflows(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Value>, StatusCode> {
    match state.storage.list_workflows(&query.user_id).await {
        Ok(workflows) => Ok(Json(json!(workflows))),
        Err(e) => {
            tracing::error!("Failed to list workflows: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// GET /api/workflows/{id}
/// Returns the workflow with its nodes and connections
async fn get_workflow(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, StatusCode> {
    match state.storage.get_workflow_detail(&id).await {
        Ok(Some(detail)) => Ok(Json(json!(detail))),
        Ok(None) => Err(StatusCode::NOT_FOUND),
        Err(e) => {
            tracing::error!("Failed to get workflow {}: {}", id, e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// PUT /api/workflows/{id}
/// Body: any of { "name", "description", "is_active" }
async fn update_workflow(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<WorkflowUpdate>,
) -> Result<Json<Value>, StatusCode> {
    match state.storage.update_workflow(&id, payload).await {
        Ok(Some(workflow)) => Ok(Json(json!(workflow))),
        Ok(None) => Err(StatusCode::NOT_FOUND),
        Err(e) => {
            tracing::error!("Failed to update workflow {}: {}", id, e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// DELETE /api/workflows/{id}
async fn delete_workflow(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, StatusCode> {
    match state.storage.delete_workflow(&id).await {
        Ok(true) => {
            tracing::info!("Deleted workflow: {}", id);
            Ok(StatusCode::NO_CONTENT)
        }
        Ok(false) => Err(StatusCode::NOT_FOUND),
        Err(e) => {
            tracing::error!("Failed to delete workflow {}: {}", id, e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// POST /api/workflows/{id}/execute
///
/// Success: { "execution_id", "status": "completed", "result": { node_id: output } }
/// Failure: 500 with { "error", "execution_id" }
async fn execute_workflow(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    match state.runner.run(&id).await {
        Ok(outcome) => Json(json!({
            "execution_id": outcome.execution_id,
            "status": outcome.status,
            "result": outcome.result
        }))
        .into_response(),
        Err(err) => {
            let status = match &err {
                RunError::WorkflowNotFound { .. } => StatusCode::NOT_FOUND,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            };
            let body = json!({
                "error": err.to_string(),
                "execution_id": err.execution_id()
            });
            (status, Json(body)).into_response()
        }
    }
}

/// GET /api/workflows/{id}/executions
/// The 50 most recent executions, newest first
async fn list_executions(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, StatusCode> {
    match state.storage.list_executions(&id).await {
        Ok(executions) => Ok(Json(json!(executions))),
        Err(e) => {
            tracing::error!("Failed to list executions for {}: {}", id, e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}
