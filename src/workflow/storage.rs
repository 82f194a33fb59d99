/// SQLite persistence layer for workflows, nodes, connections and executions
///
/// Thin CRUD over sqlx. Node configuration and execution results are stored as
/// JSON text. Rows are read back in insertion order so the engine sees nodes in
/// the order they were created.

use crate::workflow::types::{
    Connection, ExecutionRecord, ExecutionStatus, Node, NodeCategory, NodeConfig, ResultMap,
    Workflow, WorkflowDetail,
};
use anyhow::Result;
use serde::Deserialize;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use thiserror::Error;

/// Why a connection could not be created
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConnectionRejected {
    #[error("Source or target node not found")]
    UnknownEndpoint,
    #[error("Connection already exists")]
    Duplicate,
}

/// Fields accepted when creating a workflow
#[derive(Debug, Clone, Deserialize)]
pub struct NewWorkflow {
    pub name: String,
    pub description: Option<String>,
    #[serde(default = "default_user")]
    pub user_id: String,
}

pub fn default_user() -> String {
    "default-user".to_string()
}

/// Fields accepted when updating a workflow
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WorkflowUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub is_active: Option<bool>,
}

/// Fields accepted when creating a node
#[derive(Debug, Clone, Deserialize)]
pub struct NewNode {
    #[serde(rename = "type")]
    pub category: NodeCategory,
    pub node_type: String,
    pub label: String,
    #[serde(default)]
    pub position_x: f64,
    #[serde(default)]
    pub position_y: f64,
    #[serde(default)]
    pub config: NodeConfig,
}

/// Fields accepted when updating a node; category and type tag are immutable
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NodeUpdate {
    pub label: Option<String>,
    pub position_x: Option<f64>,
    pub position_y: Option<f64>,
    pub config: Option<NodeConfig>,
}

/// SQLite-based workflow storage manager
#[derive(Debug, Clone)]
pub struct WorkflowStorage {
    pool: SqlitePool,
}

impl WorkflowStorage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open a pool for the given URL and make sure the schema exists
    pub async fn connect(url: &str) -> Result<Self> {
        let options = if url.contains(":memory:") {
            // An in-memory database lives exactly as long as its one connection
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(5)
        };
        let pool = options.connect(url).await?;
        let storage = Self::new(pool);
        storage.init_schema().await?;
        Ok(storage)
    }

    /// Create tables and indexes; safe to call multiple times
    pub async fn init_schema(&self) -> Result<()> {
        let statements = [
            r#"
            CREATE TABLE IF NOT EXISTS workflows (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                name TEXT NOT NULL,
                description TEXT,
                is_active INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                last_run_at TEXT
            )
            "#,
            "CREATE INDEX IF NOT EXISTS idx_workflows_user_id ON workflows(user_id)",
            r#"
            CREATE TABLE IF NOT EXISTS nodes (
                id TEXT PRIMARY KEY,
                workflow_id TEXT NOT NULL,
                type TEXT NOT NULL CHECK (type IN ('trigger', 'action', 'data', 'logic')),
                node_type TEXT NOT NULL,
                label TEXT NOT NULL,
                position_x REAL NOT NULL,
                position_y REAL NOT NULL,
                config TEXT NOT NULL DEFAULT '{}',
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            "#,
            "CREATE INDEX IF NOT EXISTS idx_nodes_workflow_id ON nodes(workflow_id)",
            r#"
            CREATE TABLE IF NOT EXISTS connections (
                id TEXT PRIMARY KEY,
                workflow_id TEXT NOT NULL,
                source_node_id TEXT NOT NULL,
                target_node_id TEXT NOT NULL,
                created_at TEXT NOT NULL,
                UNIQUE (source_node_id, target_node_id)
            )
            "#,
            "CREATE INDEX IF NOT EXISTS idx_connections_workflow_id ON connections(workflow_id)",
            r#"
            CREATE TABLE IF NOT EXISTS executions (
                id TEXT PRIMARY KEY,
                workflow_id TEXT NOT NULL,
                status TEXT NOT NULL CHECK (status IN ('running', 'completed', 'failed')),
                started_at TEXT NOT NULL,
                completed_at TEXT,
                error_message TEXT,
                execution_data TEXT
            )
            "#,
            "CREATE INDEX IF NOT EXISTS idx_executions_workflow_id ON executions(workflow_id)",
        ];

        for statement in statements {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }

    // ---- workflows ----

    pub async fn create_workflow(&self, new: NewWorkflow) -> Result<Workflow> {
        let id = uuid::Uuid::new_v4().to_string();
        let now = now();
        sqlx::query(
            r#"
            INSERT INTO workflows (id, user_id, name, description, is_active, created_at, updated_at)
            VALUES (?, ?, ?, ?, 0, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(&new.user_id)
        .bind(&new.name)
        .bind(&new.description)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        self.get_workflow(&id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Workflow vanished after insert: {}", id))
    }

    /// Workflows of one user, most recently updated first
    pub async fn list_workflows(&self, user_id: &str) -> Result<Vec<Workflow>> {
        let rows = sqlx::query("SELECT * FROM workflows WHERE user_id = ? ORDER BY updated_at DESC")
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(workflow_from_row).collect()
    }

    pub async fn get_workflow(&self, id: &str) -> Result<Option<Workflow>> {
        let row = sqlx::query("SELECT * FROM workflows WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(workflow_from_row).transpose()
    }

    /// Workflow plus its nodes and connections
    pub async fn get_workflow_detail(&self, id: &str) -> Result<Option<WorkflowDetail>> {
        let Some(workflow) = self.get_workflow(id).await? else {
            return Ok(None);
        };
        let (nodes, connections) = self.load_graph(id).await?;
        Ok(Some(WorkflowDetail {
            workflow,
            nodes,
            connections,
        }))
    }

    pub async fn update_workflow(&self, id: &str, update: WorkflowUpdate) -> Result<Option<Workflow>> {
        let result = sqlx::query(
            r#"
            UPDATE workflows SET
                name = COALESCE(?, name),
                description = COALESCE(?, description),
                is_active = COALESCE(?, is_active),
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&update.name)
        .bind(&update.description)
        .bind(update.is_active)
        .bind(now())
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_workflow(id).await
    }

    /// Delete a workflow together with its nodes and connections
    pub async fn delete_workflow(&self, id: &str) -> Result<bool> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM connections WHERE workflow_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM nodes WHERE workflow_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        let result = sqlx::query("DELETE FROM workflows WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn touch_last_run(&self, id: &str) -> Result<()> {
        sqlx::query("UPDATE workflows SET last_run_at = ? WHERE id = ?")
            .bind(now())
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    // ---- nodes ----

    pub async fn create_node(&self, workflow_id: &str, new: NewNode) -> Result<Node> {
        let id = uuid::Uuid::new_v4().to_string();
        let now = now();
        sqlx::query(
            r#"
            INSERT INTO nodes (id, workflow_id, type, node_type, label, position_x, position_y, config, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(workflow_id)
        .bind(new.category.as_str())
        .bind(&new.node_type)
        .bind(&new.label)
        .bind(new.position_x)
        .bind(new.position_y)
        .bind(serde_json::to_string(&new.config)?)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        self.get_node(&id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Node vanished after insert: {}", id))
    }

    pub async fn get_node(&self, id: &str) -> Result<Option<Node>> {
        let row = sqlx::query("SELECT * FROM nodes WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(node_from_row).transpose()
    }

    pub async fn update_node(&self, id: &str, update: NodeUpdate) -> Result<Option<Node>> {
        let config = update.config.as_ref().map(serde_json::to_string).transpose()?;
        let result = sqlx::query(
            r#"
            UPDATE nodes SET
                label = COALESCE(?, label),
                position_x = COALESCE(?, position_x),
                position_y = COALESCE(?, position_y),
                config = COALESCE(?, config),
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&update.label)
        .bind(update.position_x)
        .bind(update.position_y)
        .bind(config)
        .bind(now())
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_node(id).await
    }

    /// Delete a node and every connection touching it
    pub async fn delete_node(&self, id: &str) -> Result<bool> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM connections WHERE source_node_id = ? OR target_node_id = ?")
            .bind(id)
            .bind(id)
            .execute(&mut *tx)
            .await?;
        let result = sqlx::query("DELETE FROM nodes WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }

    // ---- connections ----

    /// Both endpoints must belong to `workflow_id`; duplicate ordered pairs are rejected
    ///
    /// Rejections surface as a `ConnectionRejected` inside the returned error.
    pub async fn create_connection(&self, workflow_id: &str, source: &str, target: &str) -> Result<Connection> {
        let endpoints: i64 = sqlx::query_scalar(
            "SELECT COUNT(DISTINCT id) FROM nodes WHERE workflow_id = ? AND id IN (?, ?)",
        )
        .bind(workflow_id)
        .bind(source)
        .bind(target)
        .fetch_one(&self.pool)
        .await?;
        let expected = if source == target { 1 } else { 2 };
        if endpoints < expected {
            return Err(ConnectionRejected::UnknownEndpoint.into());
        }

        let existing: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM connections WHERE source_node_id = ? AND target_node_id = ?",
        )
        .bind(source)
        .bind(target)
        .fetch_one(&self.pool)
        .await?;
        if existing > 0 {
            return Err(ConnectionRejected::Duplicate.into());
        }

        let connection = Connection {
            id: uuid::Uuid::new_v4().to_string(),
            workflow_id: workflow_id.to_string(),
            source_node_id: source.to_string(),
            target_node_id: target.to_string(),
        };
        sqlx::query(
            r#"
            INSERT INTO connections (id, workflow_id, source_node_id, target_node_id, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&connection.id)
        .bind(&connection.workflow_id)
        .bind(&connection.source_node_id)
        .bind(&connection.target_node_id)
        .bind(now())
        .execute(&self.pool)
        .await?;

        Ok(connection)
    }

    pub async fn delete_connection(&self, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM connections WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Nodes and connections of one workflow, in creation order
    pub async fn load_graph(&self, workflow_id: &str) -> Result<(Vec<Node>, Vec<Connection>)> {
        let node_rows = sqlx::query("SELECT * FROM nodes WHERE workflow_id = ? ORDER BY rowid")
            .bind(workflow_id)
            .fetch_all(&self.pool)
            .await?;
        let connection_rows =
            sqlx::query("SELECT * FROM connections WHERE workflow_id = ? ORDER BY rowid")
                .bind(workflow_id)
                .fetch_all(&self.pool)
                .await?;

        let nodes = node_rows.iter().map(node_from_row).collect::<Result<Vec<_>>>()?;
        let connections = connection_rows
            .iter()
            .map(|row| -> Result<Connection> {
                Ok(Connection {
                    id: row.try_get("id")?,
                    workflow_id: row.try_get("workflow_id")?,
                    source_node_id: row.try_get("source_node_id")?,
                    target_node_id: row.try_get("target_node_id")?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok((nodes, connections))
    }

    // ---- executions ----

    /// Insert a `running` record at run start
    pub async fn insert_execution(&self, id: &str, workflow_id: &str) -> Result<()> {
        sqlx::query(
            "INSERT INTO executions (id, workflow_id, status, started_at) VALUES (?, ?, 'running', ?)",
        )
        .bind(id)
        .bind(workflow_id)
        .bind(now())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Mark a running record completed with its result map
    pub async fn complete_execution(&self, id: &str, results: &ResultMap) -> Result<()> {
        let data = serde_json::to_string(results)?;
        self.finish_execution(id, ExecutionStatus::Completed, Some(data), None)
            .await
    }

    /// Mark a running record failed with an error message
    pub async fn fail_execution(&self, id: &str, message: &str) -> Result<()> {
        self.finish_execution(id, ExecutionStatus::Failed, None, Some(message))
            .await
    }

    async fn finish_execution(
        &self,
        id: &str,
        status: ExecutionStatus,
        data: Option<String>,
        error_message: Option<&str>,
    ) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE executions
            SET status = ?, completed_at = ?, execution_data = ?, error_message = ?
            WHERE id = ? AND status = 'running'
            "#,
        )
        .bind(status.as_str())
        .bind(now())
        .bind(data)
        .bind(error_message)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            anyhow::bail!("Execution {} is not running", id);
        }
        Ok(())
    }

    pub async fn get_execution(&self, id: &str) -> Result<Option<ExecutionRecord>> {
        let row = sqlx::query("SELECT * FROM executions WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(execution_from_row).transpose()
    }

    /// The 50 most recent executions of a workflow
    pub async fn list_executions(&self, workflow_id: &str) -> Result<Vec<ExecutionRecord>> {
        let rows = sqlx::query(
            "SELECT * FROM executions WHERE workflow_id = ? ORDER BY started_at DESC, rowid DESC LIMIT 50",
        )
        .bind(workflow_id)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(execution_from_row).collect()
    }
}

fn workflow_from_row(row: &SqliteRow) -> Result<Workflow> {
    Ok(Workflow {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        is_active: row.try_get("is_active")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
        last_run_at: row.try_get("last_run_at")?,
    })
}

fn node_from_row(row: &SqliteRow) -> Result<Node> {
    let category: String = row.try_get("type")?;
    let config: String = row.try_get("config")?;
    Ok(Node {
        id: row.try_get("id")?,
        workflow_id: row.try_get("workflow_id")?,
        category: category.parse().map_err(anyhow::Error::msg)?,
        node_type: row.try_get("node_type")?,
        label: row.try_get("label")?,
        position_x: row.try_get("position_x")?,
        position_y: row.try_get("position_y")?,
        config: serde_json::from_str(&config)?,
    })
}

fn execution_from_row(row: &SqliteRow) -> Result<ExecutionRecord> {
    let status: String = row.try_get("status")?;
    let data: Option<String> = row.try_get("execution_data")?;
    Ok(ExecutionRecord {
        id: row.try_get("id")?,
        workflow_id: row.try_get("workflow_id")?,
        status: status.parse().map_err(anyhow::Error::msg)?,
        started_at: row.try_get("started_at")?,
        completed_at: row.try_get("completed_at")?,
        error_message: row.try_get("error_message")?,
        execution_data: data.as_deref().map(serde_json::from_str::<serde_json::Value>).transpose()?,
    })
}

/// Fixed-width UTC timestamps so text ordering matches time ordering
fn now() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Micros, true)
}
