/// HTTP API Layer
///
/// This module provides the REST API endpoints used by the workflow canvas:
/// - Workflow CRUD operations
/// - Node and connection editing
/// - Manual execution and execution history

// Workflow management and execution endpoints
pub mod workflows;

// Node and connection endpoints
pub mod nodes;

// Re-export router builders
pub use nodes::create_node_routes;
pub use workflows::{create_workflow_routes, AppState};
