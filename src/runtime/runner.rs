/// Workflow run orchestration
///
/// Wraps one engine run in an execution record: a `running` row is written
/// before anything else, then updated exactly once to `completed` (with the
/// result map) or `failed` (with the error message).

use crate::runtime::engine::ExecutionEngine;
use crate::workflow::storage::WorkflowStorage;
use crate::workflow::types::{ExecutionStatus, ResultMap};
use std::sync::Arc;
use thiserror::Error;

/// Outcome of a successful run
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub execution_id: String,
    pub status: ExecutionStatus,
    pub result: ResultMap,
}

/// Why a run did not complete
#[derive(Debug, Error)]
pub enum RunError {
    #[error("Workflow not found")]
    WorkflowNotFound { execution_id: String },

    /// The run started and its record was marked failed
    #[error("{message}")]
    Failed { execution_id: String, message: String },

    /// The execution record itself could not be written
    #[error("storage error: {0}")]
    Storage(#[from] anyhow::Error),
}

impl RunError {
    pub fn execution_id(&self) -> Option<&str> {
        match self {
            RunError::WorkflowNotFound { execution_id } | RunError::Failed { execution_id, .. } => {
                Some(execution_id)
            }
            RunError::Storage(_) => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct WorkflowRunner {
    storage: WorkflowStorage,
    engine: Arc<ExecutionEngine>,
}

impl WorkflowRunner {
    pub fn new(storage: WorkflowStorage, engine: Arc<ExecutionEngine>) -> Self {
        Self { storage, engine }
    }

    pub fn engine(&self) -> &ExecutionEngine {
        &self.engine
    }

    /// Load a workflow's graph, run it, and record the outcome
    pub async fn run(&self, workflow_id: &str) -> Result<RunOutcome, RunError> {
        let execution_id = uuid::Uuid::new_v4().to_string();
        self.storage.insert_execution(&execution_id, workflow_id).await?;
        tracing::info!("Execution {} started for workflow {}", execution_id, workflow_id);

        match self.storage.get_workflow(workflow_id).await {
            Ok(Some(_)) => {}
            Ok(None) => {
                self.storage
                    .fail_execution(&execution_id, "Workflow not found")
                    .await?;
                return Err(RunError::WorkflowNotFound { execution_id });
            }
            Err(e) => return self.fail(execution_id, e.to_string()).await,
        }

        let (nodes, connections) = match self.storage.load_graph(workflow_id).await {
            Ok(graph) => graph,
            Err(e) => return self.fail(execution_id, e.to_string()).await,
        };

        match self.engine.execute_workflow(&nodes, &connections).await {
            Ok(result) => {
                self.storage.complete_execution(&execution_id, &result).await?;
                if let Err(e) = self.storage.touch_last_run(workflow_id).await {
                    tracing::warn!("Failed to update last run time of {}: {}", workflow_id, e);
                }
                tracing::info!("Execution {} completed with {} node result(s)", execution_id, result.len());
                Ok(RunOutcome {
                    execution_id,
                    status: ExecutionStatus::Completed,
                    result,
                })
            }
            Err(e) => self.fail(execution_id, e.to_string()).await,
        }
    }

    async fn fail(&self, execution_id: String, message: String) -> Result<RunOutcome, RunError> {
        tracing::error!("Execution {} failed: {}", execution_id, message);
        self.storage.fail_execution(&execution_id, &message).await?;
        Err(RunError::Failed { execution_id, message })
    }
}
