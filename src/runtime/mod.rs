/// Runtime Execution Engine
///
/// This module turns a stored workflow into a run. It handles:
/// - Building a petgraph view of nodes and connections
/// - Breadth-first traversal seeded from trigger nodes
/// - Per-type node handlers backed by the service adapters
/// - Execution records around each run

// Graph view over nodes and connections
pub mod graph;

// Breadth-first traversal engine
pub mod engine;

// Per-type node handlers
pub mod executor;

// Engine and handler errors
pub mod error;

// Run orchestration with execution records
pub mod runner;

// Re-export main types
pub use engine::{ExecutionEngine, NodeDispatcher};
pub use error::{EngineError, EngineResult, GraphError, HandlerError};
pub use executor::{HandlerKind, NodeExecutor};
pub use graph::WorkflowGraph;
pub use runner::{RunError, RunOutcome, WorkflowRunner};
