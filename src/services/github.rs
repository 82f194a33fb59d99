/// Repository metadata lookup on GitHub

use super::{join_url, timestamp, IntegrationError};
use crate::config::GithubConfig;
use serde::Deserialize;
use serde_json::{json, Value};

#[derive(Debug, Clone, Deserialize)]
pub struct GithubRequest {
    #[serde(default = "default_username")]
    pub username: String,
}

fn default_username() -> String {
    "octocat".to_string()
}

impl Default for GithubRequest {
    fn default() -> Self {
        Self {
            username: default_username(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct Repository {
    name: String,
    stargazers_count: u64,
    forks_count: u64,
    language: Option<String>,
    updated_at: Option<String>,
    html_url: String,
}

#[derive(Debug, Clone)]
pub struct GithubClient {
    http: reqwest::Client,
    token: String,
    base_url: String,
}

impl GithubClient {
    pub fn from_config(config: &GithubConfig, http: reqwest::Client) -> Option<Self> {
        Some(Self {
            http,
            token: config.token.clone()?,
            base_url: config.base_url.clone(),
        })
    }

    async fn repositories(&self, username: &str) -> Result<Vec<Value>, IntegrationError> {
        let repos: Vec<Repository> = self
            .http
            .get(join_url(&self.base_url, &format!("users/{}/repos", urlencoding::encode(username))))
            .header(reqwest::header::AUTHORIZATION, format!("token {}", self.token))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(repos
            .into_iter()
            .map(|repo| {
                json!({
                    "name": repo.name,
                    "stars": repo.stargazers_count,
                    "forks": repo.forks_count,
                    "language": repo.language,
                    "last_updated": repo.updated_at,
                    "url": repo.html_url
                })
            })
            .collect())
    }
}

fn sample_repositories() -> Value {
    json!([
        { "name": "awesome-project", "stars": 42, "forks": 15, "language": "JavaScript" },
        { "name": "utility-tools", "stars": 28, "forks": 8, "language": "Python" }
    ])
}

pub async fn fetch_github(client: Option<&GithubClient>, request: &GithubRequest) -> Value {
    let Some(client) = client else {
        tracing::debug!("GitHub token not configured, simulating repos for {}", request.username);
        return json!({
            "real_service": false,
            "user": request.username,
            "repositories": sample_repositories(),
            "timestamp": timestamp(),
            "status_message": "GitHub token not configured - using simulated data"
        });
    };

    match client.repositories(&request.username).await {
        Ok(repositories) => json!({
            "real_service": true,
            "user": request.username,
            "repositories": repositories,
            "timestamp": timestamp()
        }),
        Err(e) => {
            tracing::warn!("GitHub lookup for {} failed: {}", request.username, e);
            json!({
                "real_service": false,
                "user": request.username,
                "repositories": sample_repositories(),
                "timestamp": timestamp(),
                "error": format!("GitHub service unavailable - using simulated data: {}", e)
            })
        }
    }
}
