/// Server setup and initialization
///
/// Wires together storage, service clients, the execution engine and HTTP routes.
/// Provides the application factory used by `main` and the integration tests.

use crate::{
    api::{create_node_routes, create_workflow_routes, AppState},
    config::Config,
    runtime::{engine::ExecutionEngine, executor::NodeExecutor, runner::WorkflowRunner},
    services::{ServiceClients, ServiceStatus},
    workflow::storage::WorkflowStorage,
};
use anyhow::Result;
use axum::{extract::State, response::Json, routing::get, Router};
use serde::Serialize;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    timestamp: String,
    services: ServiceStatus,
}

/// Create the main Axum application with all routes
pub async fn create_app(config: Config) -> Result<Router> {
    tracing::info!("Opening workflow database at {}", config.database.url);
    let storage = WorkflowStorage::connect(&config.database.url)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to open workflow database: {}", e))?;

    tracing::info!("Initializing service clients");
    let services = Arc::new(ServiceClients::from_config(&config.services));

    Ok(build_router(storage, services, &config))
}

/// Assemble routes around an already opened storage and client set
pub fn build_router(storage: WorkflowStorage, services: Arc<ServiceClients>, config: &Config) -> Router {
    let executor = Arc::new(NodeExecutor::new(Arc::clone(&services)));
    let engine = Arc::new(ExecutionEngine::new(executor, config.engine.node_delay()));
    tracing::debug!("Node delay set to {:?}", config.engine.node_delay());

    let state = AppState {
        storage: storage.clone(),
        runner: Arc::new(WorkflowRunner::new(storage, engine)),
        services,
    };

    Router::new()
        .route("/health", get(health_check))
        .merge(create_workflow_routes())
        .merge(create_node_routes())
        .with_state(state)
}

/// Start the HTTP server with the given configuration
pub async fn start_server(config: Config) -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_level(true)
        .init();

    tracing::info!("Starting workflow server...");

    let app = create_app(config.clone()).await?;

    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&bind_addr).await?;

    tracing::info!("Server listening on http://{}", bind_addr);

    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}

/// GET /health
/// Reports which integrations have credentials configured
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "OK",
        timestamp: chrono::Utc::now().to_rfc3339(),
        services: state.services.status(),
    })
}
