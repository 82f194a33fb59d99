/// Nodeflow server entry point
///
/// Loads `.env`, reads configuration from the environment and starts the HTTP
/// server:
/// - Workflow, node and connection API under /api/*
/// - Manual execution at /api/workflows/{id}/execute
/// - Health check at /health

use nodeflow::{config::Config, server::start_server};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();

    let config = Config::from_env();

    start_server(config).await?;

    Ok(())
}
