/// External service adapters
///
/// Each integration (email, SMS, weather, social, GitHub) attempts a real call
/// when its credentials are configured and otherwise returns simulated output
/// of the same shape. Every result carries `real_service` so callers can audit
/// which capabilities were actually exercised. Integration failures never leave
/// this module: they become a fallback result annotated with `error`.
///
/// Clients are built once at startup from `ServicesConfig` and shared through
/// `Arc<ServiceClients>`.

pub mod email;
pub mod github;
pub mod sms;
pub mod social;
pub mod weather;

use crate::config::ServicesConfig;
use crate::workflow::types::ResultMap;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

pub use email::{EmailClient, EmailRequest};
pub use github::{GithubClient, GithubRequest};
pub use sms::{SmsClient, SmsRequest};
pub use social::{SocialClient, SocialRequest};
pub use weather::{WeatherClient, WeatherRequest};

const USER_AGENT: &str = "Workflow-Builder";

/// Failure of a real integration call
///
/// Only ever observed inside the adapters, which convert it to a fallback result.
#[derive(Debug, Error)]
pub enum IntegrationError {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("smtp delivery failed: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),

    #[error("invalid email address: {0}")]
    Address(#[from] lettre::address::AddressError),

    #[error("could not build email: {0}")]
    Message(#[from] lettre::error::Error),

    #[error("request signing failed: {0}")]
    Signature(String),

    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),
}

/// Which integrations run for real
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ServiceStatus {
    pub email: bool,
    pub sms: bool,
    pub weather: bool,
    pub twitter: bool,
    pub github: bool,
}

/// Process-wide integration clients
#[derive(Debug, Default)]
pub struct ServiceClients {
    email: Option<EmailClient>,
    sms: Option<SmsClient>,
    weather: Option<WeatherClient>,
    social: Option<SocialClient>,
    github: Option<GithubClient>,
}

impl ServiceClients {
    /// Build every configured client, sharing one HTTP connection pool
    pub fn from_config(config: &ServicesConfig) -> Self {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!("Falling back to default HTTP client: {}", e);
                reqwest::Client::new()
            });

        let clients = Self {
            email: EmailClient::from_config(&config.smtp),
            sms: SmsClient::from_config(&config.sms, http.clone()),
            weather: WeatherClient::from_config(&config.weather, http.clone()),
            social: SocialClient::from_config(&config.social, http.clone()),
            github: GithubClient::from_config(&config.github, http),
        };

        let status = clients.status();
        tracing::info!(
            email = status.email,
            sms = status.sms,
            weather = status.weather,
            twitter = status.twitter,
            github = status.github,
            "Service adapters initialized"
        );

        clients
    }

    /// No credentials at all; every adapter simulates
    pub fn unconfigured() -> Self {
        Self::default()
    }

    pub fn status(&self) -> ServiceStatus {
        ServiceStatus {
            email: self.email.is_some(),
            sms: self.sms.is_some(),
            weather: self.weather.is_some(),
            twitter: self.social.is_some(),
            github: self.github.is_some(),
        }
    }

    pub async fn send_email(&self, request: &EmailRequest, previous: &ResultMap) -> Value {
        email::send_email(self.email.as_ref(), request, previous).await
    }

    pub async fn send_sms(&self, request: &SmsRequest) -> Value {
        sms::send_sms(self.sms.as_ref(), request).await
    }

    pub async fn fetch_weather(&self, request: &WeatherRequest) -> Value {
        weather::fetch_weather(self.weather.as_ref(), request).await
    }

    pub async fn post_social(&self, request: &SocialRequest, previous: &ResultMap) -> Value {
        social::post_social(self.social.as_ref(), request, previous).await
    }

    pub async fn fetch_github(&self, request: &GithubRequest) -> Value {
        github::fetch_github(self.github.as_ref(), request).await
    }
}

/// Current time as RFC 3339
pub(crate) fn timestamp() -> String {
    chrono::Utc::now().to_rfc3339()
}

/// Join a configured base URL and a path without doubling slashes
pub(crate) fn join_url(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unconfigured_reports_nothing_real() {
        let status = ServiceClients::unconfigured().status();
        assert_eq!(
            status,
            ServiceStatus {
                email: false,
                sms: false,
                weather: false,
                twitter: false,
                github: false,
            }
        );
    }

    #[test]
    fn default_config_builds_no_clients() {
        let clients = ServiceClients::from_config(&ServicesConfig::default());
        assert!(!clients.status().weather);
        assert!(!clients.status().email);
    }

    #[test]
    fn join_url_normalizes_slashes() {
        assert_eq!(join_url("http://x/", "/a/b"), "http://x/a/b");
        assert_eq!(join_url("http://x", "a"), "http://x/a");
    }
}
