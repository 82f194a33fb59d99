/// Nodeflow: visual workflow automation backend
///
/// Workflows are graphs of typed nodes. A run starts at every trigger node and
/// walks the graph breadth-first, handing each node the results of its already
/// executed predecessors. Integration nodes call real services when credentials
/// are configured and fall back to simulated output otherwise.

// Core configuration and setup
pub mod config;

// Workflow definitions and SQLite persistence
pub mod workflow;

// Graph traversal engine, node handlers and run orchestration
pub mod runtime;

// External service adapters (email, SMS, weather, social, GitHub)
pub mod services;

// HTTP API layer - REST endpoints for the workflow canvas
pub mod api;

// Server setup and initialization
pub mod server;

// Re-export commonly used types for external consumers
pub use runtime::{EngineError, ExecutionEngine, NodeExecutor, WorkflowRunner};
pub use server::start_server;
pub use services::ServiceClients;
pub use workflow::{Connection, Node, NodeCategory, ResultMap, Workflow};
