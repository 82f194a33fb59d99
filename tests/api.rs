//! HTTP API tests against a server bound to an ephemeral port
use nodeflow::config::Config;
use nodeflow::server::build_router;
use nodeflow::services::ServiceClients;
use nodeflow::workflow::WorkflowStorage;
use serde_json::{json, Value};
use std::sync::Arc;

struct TestServer {
    base: String,
    http: reqwest::Client,
}

impl TestServer {
    async fn start() -> Self {
        let storage = WorkflowStorage::connect("sqlite::memory:").await.unwrap();
        let mut config = Config::default();
        config.engine.node_delay_ms = 0;
        let app = build_router(storage, Arc::new(ServiceClients::unconfigured()), &config);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app.into_make_service()).await.unwrap();
        });

        Self {
            base: format!("http://{}", addr),
            http: reqwest::Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    async fn post(&self, path: &str, body: Value) -> reqwest::Response {
        self.http.post(self.url(path)).json(&body).send().await.unwrap()
    }

    async fn get(&self, path: &str) -> reqwest::Response {
        self.http.get(self.url(path)).send().await.unwrap()
    }
}

async fn create_node(server: &TestServer, workflow_id: &str, body: Value) -> String {
    let response = server.post(&format!("/api/workflows/{workflow_id}/nodes"), body).await;
    assert_eq!(response.status(), 201);
    response.json::<Value>().await.unwrap()["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn health_reports_unconfigured_services() {
    let server = TestServer::start().await;

    let body: Value = server.get("/health").await.json().await.unwrap();

    assert_eq!(body["status"], "OK");
    assert_eq!(body["services"]["email"], false);
    assert_eq!(body["services"]["github"], false);
}

#[tokio::test]
async fn build_and_execute_workflow() {
    let server = TestServer::start().await;

    let response = server
        .post("/api/workflows", json!({ "name": "Weather alert", "user_id": "u1" }))
        .await;
    assert_eq!(response.status(), 201);
    let workflow_id = response.json::<Value>().await.unwrap()["id"].as_str().unwrap().to_string();

    let trigger = create_node(
        &server,
        &workflow_id,
        json!({ "type": "trigger", "node_type": "schedule", "label": "Every morning" }),
    )
    .await;
    let weather = create_node(
        &server,
        &workflow_id,
        json!({ "type": "data", "node_type": "weather", "label": "Weather", "config": { "location": "Rome" } }),
    )
    .await;

    let response = server
        .post(
            &format!("/api/workflows/{workflow_id}/connections"),
            json!({ "source_node_id": trigger, "target_node_id": weather }),
        )
        .await;
    assert_eq!(response.status(), 201);

    let response = server
        .post(
            &format!("/api/workflows/{workflow_id}/connections"),
            json!({ "source_node_id": trigger, "target_node_id": weather }),
        )
        .await;
    assert_eq!(response.status(), 400);

    let response = server.post(&format!("/api/workflows/{workflow_id}/execute"), json!({})).await;
    assert_eq!(response.status(), 200);
    let run: Value = response.json().await.unwrap();
    assert_eq!(run["status"], "completed");
    assert_eq!(run["result"][&weather]["location"], "Rome");
    assert_eq!(run["result"][&trigger]["triggered"], true);

    let history: Value = server
        .get(&format!("/api/workflows/{workflow_id}/executions"))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(history.as_array().unwrap().len(), 1);
    assert_eq!(history[0]["id"], run["execution_id"]);
    assert_eq!(history[0]["status"], "completed");

    let detail: Value = server.get(&format!("/api/workflows/{workflow_id}")).await.json().await.unwrap();
    assert_eq!(detail["nodes"].as_array().unwrap().len(), 2);
    assert!(detail["last_run_at"].is_string());
}

#[tokio::test]
async fn failed_run_returns_error_and_execution_id() {
    let server = TestServer::start().await;
    let workflow: Value = server
        .post("/api/workflows", json!({ "name": "No trigger" }))
        .await
        .json()
        .await
        .unwrap();
    let workflow_id = workflow["id"].as_str().unwrap();
    create_node(
        &server,
        workflow_id,
        json!({ "type": "action", "node_type": "email", "label": "Mail" }),
    )
    .await;

    let response = server.post(&format!("/api/workflows/{workflow_id}/execute"), json!({})).await;
    assert_eq!(response.status(), 500);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "No trigger node found");
    assert!(body["execution_id"].is_string());

    let history: Value = server
        .get(&format!("/api/workflows/{workflow_id}/executions"))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(history[0]["status"], "failed");
    assert_eq!(history[0]["error_message"], "No trigger node found");
}

#[tokio::test]
async fn unknown_workflow_is_not_found() {
    let server = TestServer::start().await;

    assert_eq!(server.get("/api/workflows/missing").await.status(), 404);
    let response = server.post("/api/workflows/missing/execute", json!({})).await;
    assert_eq!(response.status(), 404);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Workflow not found");
}
