/// Workflow Management Layer
///
/// This module handles workflow definitions and persistence:
/// - Type definitions (Workflow, Node, Connection, ExecutionRecord)
/// - SQLite persistence with sqlx

// Core workflow type definitions
pub mod types;

// SQLite persistence layer for workflow storage
pub mod storage;

// Re-export commonly used types
pub use storage::{ConnectionRejected, WorkflowStorage};
pub use types::{
    Connection, ExecutionRecord, ExecutionStatus, Node, NodeCategory, NodeConfig, ResultMap,
    Workflow, WorkflowDetail,
};
