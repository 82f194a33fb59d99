/// Current weather lookup (OpenWeather), simulated when no API key is set

use super::{join_url, timestamp, IntegrationError};
use crate::config::WeatherConfig;
use rand::Rng;
use serde::Deserialize;
use serde_json::{json, Value};

const CONDITIONS: [&str; 4] = ["Sunny", "Cloudy", "Rainy", "Snowy"];

#[derive(Debug, Clone, Deserialize)]
pub struct WeatherRequest {
    #[serde(default = "default_location")]
    pub location: String,
}

fn default_location() -> String {
    "New York".to_string()
}

impl Default for WeatherRequest {
    fn default() -> Self {
        Self {
            location: default_location(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct CurrentWeather {
    name: String,
    main: MainReadings,
    weather: Vec<Condition>,
    wind: Wind,
}

#[derive(Debug, Deserialize)]
struct MainReadings {
    temp: f64,
    humidity: f64,
    pressure: f64,
}

#[derive(Debug, Deserialize)]
struct Condition {
    description: String,
}

#[derive(Debug, Deserialize)]
struct Wind {
    speed: f64,
}

#[derive(Debug, Clone)]
pub struct WeatherClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl WeatherClient {
    pub fn from_config(config: &WeatherConfig, http: reqwest::Client) -> Option<Self> {
        Some(Self {
            http,
            api_key: config.api_key.clone()?,
            base_url: config.base_url.clone(),
        })
    }

    async fn current(&self, location: &str) -> Result<Value, IntegrationError> {
        let report: CurrentWeather = self
            .http
            .get(join_url(&self.base_url, "data/2.5/weather"))
            .query(&[("q", location), ("appid", self.api_key.as_str()), ("units", "metric")])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let condition = report
            .weather
            .first()
            .map(|c| c.description.clone())
            .ok_or_else(|| IntegrationError::UnexpectedResponse("no weather conditions".to_string()))?;

        Ok(json!({
            "real_service": true,
            "location": report.name,
            "temperature": report.main.temp,
            "condition": condition,
            "humidity": report.main.humidity,
            "wind_speed": report.wind.speed,
            "pressure": report.main.pressure,
            "timestamp": timestamp()
        }))
    }
}

/// Random readings: temperature in [60, 90), humidity in [0, 100), wind in [5, 25)
fn simulated(location: &str) -> Value {
    let mut rng = rand::rng();
    json!({
        "real_service": false,
        "location": location,
        "temperature": rng.random_range(60..90),
        "condition": CONDITIONS[rng.random_range(0..CONDITIONS.len())],
        "humidity": rng.random_range(0..100),
        "wind_speed": rng.random_range(5..25),
        "timestamp": timestamp()
    })
}

pub async fn fetch_weather(client: Option<&WeatherClient>, request: &WeatherRequest) -> Value {
    let Some(client) = client else {
        tracing::debug!("OpenWeather not configured, simulating weather for {}", request.location);
        let mut result = simulated(&request.location);
        result["status_message"] =
            json!("OpenWeather API key not configured - using simulated data");
        return result;
    };

    match client.current(&request.location).await {
        Ok(result) => result,
        Err(e) => {
            tracing::warn!("Weather lookup for {} failed: {}", request.location, e);
            let mut result = simulated(&request.location);
            result["error"] = json!(format!("Weather service unavailable - using simulated data: {}", e));
            result
        }
    }
}
