//! Execution error types.

use thiserror::Error;

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// A connection that cannot be placed in the graph.
#[derive(Debug, Error)]
pub enum GraphError {
    /// Connection endpoint is not part of the supplied node collection.
    #[error("connection {connection_id} references unknown node {node_id}")]
    UnknownNode {
        connection_id: String,
        node_id: String,
    },
}

/// A type handler's own logic failed.
///
/// Integration outages never show up here; the service adapters absorb them.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// A recognised configuration key holds a value of the wrong shape.
    #[error("invalid config for node {node_id} ({node_type}): {message}")]
    InvalidConfig {
        node_id: String,
        node_type: String,
        message: String,
    },

    /// Output could not be serialized.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Errors that abort a workflow run.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Graph(#[from] GraphError),

    /// No node has category `trigger`.
    #[error("No trigger node found")]
    NoTrigger,

    /// A handler failed while executing a node.
    #[error("node {node_id} failed: {source}")]
    Handler {
        node_id: String,
        #[source]
        source: HandlerError,
    },
}
