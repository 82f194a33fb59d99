/// Configuration management for the nodeflow engine
///
/// Handles server configuration, database connection, engine pacing and the
/// optional credentials of every external integration. Everything is sourced
/// from environment variables; a missing integration credential simply puts
/// that integration into simulated mode.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server configuration
    pub server: ServerConfig,
    /// Database configuration
    pub database: DatabaseConfig,
    /// Execution engine configuration
    pub engine: EngineConfig,
    /// External integration credentials
    pub services: ServicesConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server bind address (e.g., "0.0.0.0")
    pub host: String,
    /// Server port number
    pub port: u16,
}

/// Database configuration for workflow, node, connection and execution storage
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// sqlx connection URL (default: "sqlite://nodeflow.db?mode=rwc")
    pub url: String,
}

/// Execution engine pacing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Pause injected before every node handler, in milliseconds
    pub node_delay_ms: u64,
}

impl EngineConfig {
    pub fn node_delay(&self) -> Duration {
        Duration::from_millis(self.node_delay_ms)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self { node_delay_ms: 500 }
    }
}

/// Outbound SMTP credentials
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub user: Option<String>,
    pub password: Option<String>,
}

/// SMS provider (Twilio) credentials
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SmsConfig {
    pub account_sid: Option<String>,
    pub auth_token: Option<String>,
    pub from_number: Option<String>,
    pub base_url: String,
}

/// Weather provider (OpenWeather) credentials
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WeatherConfig {
    pub api_key: Option<String>,
    pub base_url: String,
}

/// Social media (Twitter) app and user tokens
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SocialConfig {
    pub api_key: Option<String>,
    pub api_secret: Option<String>,
    pub access_token: Option<String>,
    pub access_secret: Option<String>,
    pub base_url: String,
}

/// Source-control host (GitHub) token
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GithubConfig {
    pub token: Option<String>,
    pub base_url: String,
}

/// Credentials for every external integration
///
/// All fields are optional. `ServicesConfig::default()` is the fully
/// unconfigured state where every adapter runs simulated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServicesConfig {
    pub smtp: SmtpConfig,
    pub sms: SmsConfig,
    pub weather: WeatherConfig,
    pub social: SocialConfig,
    pub github: GithubConfig,
}

impl Default for ServicesConfig {
    fn default() -> Self {
        Self {
            smtp: SmtpConfig {
                host: "smtp.gmail.com".to_string(),
                port: 587,
                user: None,
                password: None,
            },
            sms: SmsConfig {
                base_url: "https://api.twilio.com".to_string(),
                ..Default::default()
            },
            weather: WeatherConfig {
                base_url: "https://api.openweathermap.org".to_string(),
                ..Default::default()
            },
            social: SocialConfig {
                base_url: "https://api.twitter.com".to_string(),
                ..Default::default()
            },
            github: GithubConfig {
                base_url: "https://api.github.com".to_string(),
                ..Default::default()
            },
        }
    }
}

impl ServicesConfig {
    /// Read every integration credential from the environment
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            smtp: SmtpConfig {
                host: env_or("SMTP_HOST", &defaults.smtp.host),
                port: env_opt("SMTP_PORT")
                    .and_then(|p| p.parse().ok())
                    .unwrap_or(defaults.smtp.port),
                user: env_opt("SMTP_USER"),
                password: env_opt("SMTP_PASSWORD"),
            },
            sms: SmsConfig {
                account_sid: env_opt("TWILIO_ACCOUNT_SID"),
                auth_token: env_opt("TWILIO_AUTH_TOKEN"),
                from_number: env_opt("TWILIO_PHONE_NUMBER"),
                base_url: env_or("TWILIO_BASE_URL", &defaults.sms.base_url),
            },
            weather: WeatherConfig {
                api_key: env_opt("OPENWEATHER_API_KEY"),
                base_url: env_or("OPENWEATHER_BASE_URL", &defaults.weather.base_url),
            },
            social: SocialConfig {
                api_key: env_opt("TWITTER_API_KEY"),
                api_secret: env_opt("TWITTER_API_SECRET"),
                access_token: env_opt("TWITTER_ACCESS_TOKEN"),
                access_secret: env_opt("TWITTER_ACCESS_SECRET"),
                base_url: env_or("TWITTER_API_BASE_URL", &defaults.social.base_url),
            },
            github: GithubConfig {
                token: env_opt("GITHUB_TOKEN"),
                base_url: env_or("GITHUB_API_BASE_URL", &defaults.github.base_url),
            },
        }
    }
}

impl Config {
    /// Build configuration from ENV_VARs for k8s/container deployment
    pub fn from_env() -> Self {
        Self {
            server: ServerConfig {
                host: env_or("NODEFLOW_HOST", "0.0.0.0"),
                port: env_opt("NODEFLOW_PORT")
                    .or_else(|| env_opt("PORT"))
                    .and_then(|p| p.parse().ok())
                    .unwrap_or(3001),
            },
            database: DatabaseConfig {
                url: env_or("DATABASE_URL", "sqlite://nodeflow.db?mode=rwc"),
            },
            engine: EngineConfig {
                node_delay_ms: env_opt("NODEFLOW_NODE_DELAY_MS")
                    .and_then(|d| d.parse().ok())
                    .unwrap_or_else(|| EngineConfig::default().node_delay_ms),
            },
            services: ServicesConfig::from_env(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

/// Non-empty environment variable, `None` when unset or blank
fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_or(key: &str, default: &str) -> String {
    env_opt(key).unwrap_or_else(|| default.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_services_are_unconfigured() {
        let services = ServicesConfig::default();
        assert!(services.smtp.user.is_none());
        assert!(services.sms.account_sid.is_none());
        assert!(services.weather.api_key.is_none());
        assert!(services.social.api_key.is_none());
        assert!(services.github.token.is_none());
        assert_eq!(services.smtp.port, 587);
        assert_eq!(services.weather.base_url, "https://api.openweathermap.org");
    }

    #[test]
    fn engine_delay_defaults_to_half_a_second() {
        assert_eq!(EngineConfig::default().node_delay(), Duration::from_millis(500));
    }
}
