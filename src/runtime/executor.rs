/// Node execution handlers
///
/// Dispatch is a pure function of the node's type tag: every known tag maps to
/// exactly one `HandlerKind` in a lookup table built at construction, and any
/// other tag runs the default handler. Handlers read only the configuration keys
/// they recognise, defaulting missing ones, and a recognised key holding the
/// wrong kind of value is a `HandlerError`.
///
/// - Trigger handlers (schedule, webhook, calendar): echo their configuration
/// - Data handlers (weather, github, database, sheets): adapters or sample data
/// - Action handlers (email, sms, social, notification, sheets_write)
/// - Logic handlers (transform, condition, ai_generate, merge): pure functions
///   over the predecessor results

use crate::runtime::error::HandlerError;
use crate::services::{
    EmailRequest, GithubRequest, ServiceClients, SmsRequest, SocialRequest, WeatherRequest,
};
use crate::workflow::types::{Node, NodeConfig, ResultMap};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::{collections::HashMap, sync::Arc};

/// Behaviour selected by a node's type tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandlerKind {
    Schedule,
    Webhook,
    Calendar,
    Weather,
    Github,
    Database,
    Sheets,
    Email,
    Sms,
    Social,
    Notification,
    SheetsWrite,
    Transform,
    Condition,
    AiGenerate,
    Merge,
    /// Fallback for unrecognised tags
    Default,
}

impl HandlerKind {
    /// Every registered type tag
    pub const REGISTERED: [(&'static str, HandlerKind); 16] = [
        ("schedule", HandlerKind::Schedule),
        ("webhook", HandlerKind::Webhook),
        ("calendar", HandlerKind::Calendar),
        ("weather", HandlerKind::Weather),
        ("github", HandlerKind::Github),
        ("database", HandlerKind::Database),
        ("sheets", HandlerKind::Sheets),
        ("email", HandlerKind::Email),
        ("sms", HandlerKind::Sms),
        ("social", HandlerKind::Social),
        ("notification", HandlerKind::Notification),
        ("sheets_write", HandlerKind::SheetsWrite),
        ("transform", HandlerKind::Transform),
        ("condition", HandlerKind::Condition),
        ("ai_generate", HandlerKind::AiGenerate),
        ("merge", HandlerKind::Merge),
    ];
}

/// Node executor that handles execution of different node types
///
/// Holds the process-wide service clients and the type-tag lookup table.
#[derive(Debug)]
pub struct NodeExecutor {
    services: Arc<ServiceClients>,
    handlers: HashMap<&'static str, HandlerKind>,
}

impl NodeExecutor {
    pub fn new(services: Arc<ServiceClients>) -> Self {
        Self {
            services,
            handlers: HandlerKind::REGISTERED.into_iter().collect(),
        }
    }

    pub fn services(&self) -> &ServiceClients {
        &self.services
    }

    pub fn handler_for(&self, node_type: &str) -> HandlerKind {
        self.handlers
            .get(node_type)
            .copied()
            .unwrap_or(HandlerKind::Default)
    }

    /// Execute a single node given the results of its executed predecessors
    pub async fn execute_node(&self, node: &Node, previous: &ResultMap) -> Result<Value, HandlerError> {
        let kind = self.handler_for(&node.node_type);
        tracing::info!("Executing node: {} ({}) via {:?}", node.label, node.node_type, kind);
        tracing::debug!("Predecessor results: {:?}", previous.keys().collect::<Vec<_>>());

        let start_time = std::time::Instant::now();

        let result = match kind {
            HandlerKind::Schedule => self.schedule(node),
            HandlerKind::Webhook => self.webhook(node),
            HandlerKind::Calendar => self.calendar(node),
            HandlerKind::Weather => {
                let request: WeatherRequest = settings(node)?;
                Ok(self.services.fetch_weather(&request).await)
            }
            HandlerKind::Github => {
                let request: GithubRequest = settings(node)?;
                Ok(self.services.fetch_github(&request).await)
            }
            HandlerKind::Database => self.database(node),
            HandlerKind::Sheets => self.sheets(node),
            HandlerKind::Email => {
                let request: EmailRequest = settings(node)?;
                Ok(self.services.send_email(&request, previous).await)
            }
            HandlerKind::Sms => {
                let request: SmsRequest = settings(node)?;
                Ok(self.services.send_sms(&request).await)
            }
            HandlerKind::Social => {
                let request: SocialRequest = settings(node)?;
                Ok(self.services.post_social(&request, previous).await)
            }
            HandlerKind::Notification => self.notification(node),
            HandlerKind::SheetsWrite => self.sheets_write(node, previous),
            HandlerKind::Transform => self.transform(node, previous),
            HandlerKind::Condition => self.condition(node, previous),
            HandlerKind::AiGenerate => self.ai_generate(node, previous),
            HandlerKind::Merge => self.merge(node, previous),
            HandlerKind::Default => Ok(self.fallback(node)),
        };

        let duration = start_time.elapsed();
        match &result {
            Ok(_) => tracing::debug!("Node {} handler finished in {:?}", node.id, duration),
            Err(e) => tracing::error!("Node {} handler failed in {:?}: {}", node.id, duration, e),
        }

        result
    }

    fn schedule(&self, node: &Node) -> Result<Value, HandlerError> {
        #[derive(Deserialize)]
        struct Settings {
            #[serde(default = "default_cron")]
            cron: String,
        }
        fn default_cron() -> String {
            "0 9 * * *".to_string()
        }

        let settings: Settings = settings(node)?;
        Ok(json!({
            "triggered": true,
            "timestamp": now(),
            "cron": settings.cron,
            "type": "scheduled_trigger"
        }))
    }

    fn webhook(&self, node: &Node) -> Result<Value, HandlerError> {
        #[derive(Deserialize)]
        struct Settings {
            #[serde(default = "default_url")]
            url: String,
            #[serde(default = "default_method")]
            method: String,
            #[serde(default)]
            headers: Map<String, Value>,
        }
        fn default_url() -> String {
            "https://example.com/webhook".to_string()
        }
        fn default_method() -> String {
            "POST".to_string()
        }

        let settings: Settings = settings(node)?;
        Ok(json!({
            "triggered": true,
            "url": settings.url,
            "method": settings.method,
            "payload": { "timestamp": now(), "source": "webhook" },
            "headers": settings.headers
        }))
    }

    fn calendar(&self, node: &Node) -> Result<Value, HandlerError> {
        #[derive(Deserialize)]
        struct Settings {
            #[serde(default = "default_calendar")]
            calendar: String,
        }
        fn default_calendar() -> String {
            "primary".to_string()
        }

        let settings: Settings = settings(node)?;
        Ok(json!({
            "events": [{
                "title": "Team Meeting",
                "time": now(),
                "duration": 60,
                "location": "Conference Room A",
                "attendees": ["user@example.com"]
            }],
            "calendar": settings.calendar,
            "timestamp": now()
        }))
    }

    fn database(&self, node: &Node) -> Result<Value, HandlerError> {
        #[derive(Deserialize)]
        struct Settings {
            #[serde(default = "default_query")]
            query: String,
        }
        fn default_query() -> String {
            "SELECT * FROM users".to_string()
        }

        let settings: Settings = settings(node)?;
        Ok(json!({
            "real_service": false,
            "query": settings.query,
            "results": [
                { "id": 1, "name": "John Doe", "email": "john@example.com" },
                { "id": 2, "name": "Jane Smith", "email": "jane@example.com" }
            ],
            "row_count": 2
        }))
    }

    fn sheets(&self, node: &Node) -> Result<Value, HandlerError> {
        let settings: SpreadsheetSettings = settings(node)?;
        Ok(json!({
            "real_service": false,
            "spreadsheet": settings.spreadsheet_id,
            "data": [
                ["Name", "Email", "Role"],
                ["John Doe", "john@example.com", "Developer"],
                ["Jane Smith", "jane@example.com", "Designer"]
            ]
        }))
    }

    fn notification(&self, node: &Node) -> Result<Value, HandlerError> {
        #[derive(Deserialize)]
        struct Settings {
            #[serde(rename = "type", default = "default_kind")]
            kind: String,
            #[serde(default = "default_title")]
            title: String,
            #[serde(default = "default_message")]
            message: String,
            #[serde(default = "default_device")]
            device: String,
        }
        fn default_kind() -> String {
            "push".to_string()
        }
        fn default_title() -> String {
            "Notification".to_string()
        }
        fn default_message() -> String {
            "You have a new notification".to_string()
        }
        fn default_device() -> String {
            "all".to_string()
        }

        let settings: Settings = settings(node)?;
        Ok(json!({
            "sent": true,
            "real_service": false,
            "type": settings.kind,
            "title": settings.title,
            "message": settings.message,
            "device": settings.device
        }))
    }

    fn sheets_write(&self, node: &Node, previous: &ResultMap) -> Result<Value, HandlerError> {
        let settings: SpreadsheetSettings = settings(node)?;
        Ok(json!({
            "written": true,
            "real_service": false,
            "spreadsheet": settings.spreadsheet_id,
            "range": settings.range,
            "data": previous
        }))
    }

    fn transform(&self, node: &Node, previous: &ResultMap) -> Result<Value, HandlerError> {
        #[derive(Deserialize)]
        struct Settings {
            #[serde(default = "default_transformation")]
            transformation: String,
        }
        fn default_transformation() -> String {
            "default".to_string()
        }

        let settings: Settings = settings(node)?;
        let keys = previous.keys().map(String::as_str).collect::<Vec<_>>().join(", ");
        Ok(json!({
            "transformed": true,
            "input": previous,
            "output": format!("Transformed data at {}\nInput keys: {}", now(), keys),
            "transformation": settings.transformation
        }))
    }

    /// Annotates whether the configured condition holds; never prunes successors
    fn condition(&self, node: &Node, previous: &ResultMap) -> Result<Value, HandlerError> {
        #[derive(Deserialize)]
        struct Settings {
            condition: Option<Value>,
        }

        let settings: Settings = settings(node)?;
        let (condition_met, evaluated) = match settings.condition {
            Some(condition) => (is_truthy(&condition), condition),
            None => (true, json!("default")),
        };

        Ok(json!({
            "condition_met": condition_met,
            "evaluated": evaluated,
            "input": previous,
            "result": if condition_met { "Proceed to next node" } else { "Condition not met" }
        }))
    }

    fn ai_generate(&self, node: &Node, previous: &ResultMap) -> Result<Value, HandlerError> {
        #[derive(Deserialize)]
        struct Settings {
            #[serde(default = "default_prompt")]
            prompt: String,
            #[serde(default = "default_model")]
            model: String,
        }
        fn default_prompt() -> String {
            "Generate content based on input data".to_string()
        }
        fn default_model() -> String {
            "gpt-4".to_string()
        }

        let settings: Settings = settings(node)?;
        let input = serde_json::to_string(previous)?;
        Ok(json!({
            "generated": true,
            "real_service": false,
            "prompt": settings.prompt,
            "input": previous,
            "output": format!(
                "AI generated content based on: {}\n\nThis is simulated AI content created at {}",
                input,
                now()
            ),
            "model": settings.model
        }))
    }

    fn merge(&self, node: &Node, previous: &ResultMap) -> Result<Value, HandlerError> {
        #[derive(Deserialize)]
        struct Settings {
            #[serde(default = "default_strategy")]
            strategy: String,
        }
        fn default_strategy() -> String {
            "combine_all".to_string()
        }

        let settings: Settings = settings(node)?;
        Ok(json!({
            "merged": true,
            "inputs": previous,
            "output": flatten_one_level(previous.values()),
            "strategy": settings.strategy
        }))
    }

    fn fallback(&self, node: &Node) -> Value {
        tracing::debug!("No handler registered for '{}', using default", node.node_type);
        json!({
            "executed": true,
            "node_type": node.node_type,
            "label": node.label,
            "timestamp": now(),
            "status_message": format!("Node {} executed successfully", node.label)
        })
    }
}

#[derive(Deserialize)]
struct SpreadsheetSettings {
    #[serde(default = "default_spreadsheet")]
    spreadsheet_id: String,
    #[serde(default = "default_range")]
    range: String,
}

fn default_spreadsheet() -> String {
    "default".to_string()
}

fn default_range() -> String {
    "Sheet1!A1".to_string()
}

/// Deserialize the keys a handler recognises; null and empty-string values count as unset
fn settings<T: DeserializeOwned>(node: &Node) -> Result<T, HandlerError> {
    let present: NodeConfig = node
        .config
        .iter()
        .filter(|(_, value)| !matches!(value, Value::Null) && value.as_str() != Some(""))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();

    serde_json::from_value(Value::Object(present)).map_err(|e| HandlerError::InvalidConfig {
        node_id: node.id.clone(),
        node_type: node.node_type.clone(),
        message: e.to_string(),
    })
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Arrays are spliced in, every other value is appended as-is
fn flatten_one_level<'a>(values: impl Iterator<Item = &'a Value>) -> Vec<Value> {
    let mut flat = Vec::new();
    for value in values {
        match value {
            Value::Array(items) => flat.extend(items.iter().cloned()),
            other => flat.push(other.clone()),
        }
    }
    flat
}

fn now() -> String {
    chrono::Utc::now().to_rfc3339()
}
