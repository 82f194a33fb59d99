/// Social media posting (Twitter API v2, OAuth 1.0a user context)

use super::{join_url, timestamp, IntegrationError};
use crate::config::SocialConfig;
use crate::workflow::types::ResultMap;
use base64::Engine as _;
use hmac::{Hmac, Mac};
use rand::distr::Alphanumeric;
use rand::Rng;
use serde::Deserialize;
use serde_json::{json, Value};
use sha1::Sha1;

const PREVIEW_CHARS: usize = 50;

#[derive(Debug, Clone, Deserialize)]
pub struct SocialRequest {
    #[serde(default = "default_platform")]
    pub platform: String,
    #[serde(default = "default_content")]
    pub content: String,
}

fn default_platform() -> String {
    "twitter".to_string()
}

fn default_content() -> String {
    "Automated post from workflow builder".to_string()
}

impl Default for SocialRequest {
    fn default() -> Self {
        Self {
            platform: default_platform(),
            content: default_content(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct TweetEnvelope {
    data: Tweet,
}

#[derive(Debug, Deserialize)]
struct Tweet {
    id: String,
}

#[derive(Clone)]
pub struct SocialClient {
    http: reqwest::Client,
    api_key: String,
    api_secret: String,
    access_token: String,
    access_secret: String,
    base_url: String,
}

impl std::fmt::Debug for SocialClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SocialClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl SocialClient {
    /// Posting needs the app key pair and the user's access token pair
    pub fn from_config(config: &SocialConfig, http: reqwest::Client) -> Option<Self> {
        Some(Self {
            http,
            api_key: config.api_key.clone()?,
            api_secret: config.api_secret.clone()?,
            access_token: config.access_token.clone()?,
            access_secret: config.access_secret.clone()?,
            base_url: config.base_url.clone(),
        })
    }

    async fn tweet(&self, text: &str) -> Result<String, IntegrationError> {
        let url = join_url(&self.base_url, "2/tweets");
        let nonce: String = rand::rng()
            .sample_iter(&Alphanumeric)
            .take(32)
            .map(char::from)
            .collect();
        let authorization = self.authorization("POST", &url, &nonce, chrono::Utc::now().timestamp())?;

        let envelope: TweetEnvelope = self
            .http
            .post(&url)
            .header(reqwest::header::AUTHORIZATION, authorization)
            .json(&json!({ "text": text }))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(envelope.data.id)
    }

    /// OAuth 1.0a HMAC-SHA1 `Authorization` header; JSON bodies are not signed
    fn authorization(&self, method: &str, url: &str, nonce: &str, unix_time: i64) -> Result<String, IntegrationError> {
        let unix_time = unix_time.to_string();
        let oauth_params = [
            ("oauth_consumer_key", self.api_key.as_str()),
            ("oauth_nonce", nonce),
            ("oauth_signature_method", "HMAC-SHA1"),
            ("oauth_timestamp", unix_time.as_str()),
            ("oauth_token", self.access_token.as_str()),
            ("oauth_version", "1.0"),
        ];

        let parameter_string = oauth_params
            .iter()
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&");
        let base_string = format!(
            "{}&{}&{}",
            method.to_uppercase(),
            urlencoding::encode(url),
            urlencoding::encode(&parameter_string)
        );
        let signing_key = format!(
            "{}&{}",
            urlencoding::encode(&self.api_secret),
            urlencoding::encode(&self.access_secret)
        );

        let mut mac = Hmac::<Sha1>::new_from_slice(signing_key.as_bytes())
            .map_err(|e| IntegrationError::Signature(e.to_string()))?;
        mac.update(base_string.as_bytes());
        let signature = base64::engine::general_purpose::STANDARD.encode(mac.finalize().into_bytes());

        let header = oauth_params
            .iter()
            .map(|(k, v)| (*k, *v))
            .chain(std::iter::once(("oauth_signature", signature.as_str())))
            .map(|(k, v)| format!("{}=\"{}\"", k, urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join(", ");
        Ok(format!("OAuth {}", header))
    }
}

/// Configured content plus a short preview of every predecessor result
pub fn compose_content(base: &str, previous: &ResultMap) -> String {
    if previous.is_empty() {
        return base.to_string();
    }

    let previews = previous
        .values()
        .map(|result| match result {
            Value::Object(_) | Value::Array(_) => {
                let compact = result.to_string();
                format!("{}...", compact.chars().take(PREVIEW_CHARS).collect::<String>())
            }
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
        .collect::<Vec<_>>()
        .join(" | ");

    format!("{}\n\nData from workflow: {}", base, previews)
}

pub async fn post_social(client: Option<&SocialClient>, request: &SocialRequest, previous: &ResultMap) -> Value {
    let content = compose_content(&request.content, previous);
    let simulated = |error: Option<String>| {
        let mut result = json!({
            "posted": error.is_none(),
            "real_service": false,
            "platform": request.platform,
            "content": content,
            "timestamp": timestamp(),
            "status_message": "Social media API not configured - this would be a real post"
        });
        if let Some(error) = error {
            result["error"] = json!(error);
        }
        result
    };

    let client = match client {
        Some(client) if request.platform == "twitter" => client,
        _ => {
            tracing::debug!("No client for platform {}, simulating post", request.platform);
            return simulated(None);
        }
    };

    match client.tweet(&content).await {
        Ok(tweet_id) => {
            tracing::info!("Published tweet {}", tweet_id);
            json!({
                "posted": true,
                "real_service": true,
                "platform": "twitter",
                "content": content,
                "tweet_id": tweet_id,
                "url": format!("https://twitter.com/user/status/{}", tweet_id),
                "timestamp": timestamp(),
                "status_message": "Real Twitter post published"
            })
        }
        Err(e) => {
            tracing::warn!("Twitter post failed: {}", e);
            simulated(Some(e.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn configured(base_url: String) -> SocialClient {
        let config = SocialConfig {
            api_key: Some("xvz1evFS4wEEPTGEFPHBog".to_string()),
            api_secret: Some("kAcSOqF21Fu85e7zjz7ZN2U4ZRhfV3WpwPAoE3Z7kBw".to_string()),
            access_token: Some("370773112-GmHxMAgYyLbNEtIKZeRNFsMKPR9EyMZeS9weJAEb".to_string()),
            access_secret: Some("LswwdoUaIvS8ltyTt5jkRh4J50vUPVVHtR2YPi5kE".to_string()),
            base_url,
        };
        SocialClient::from_config(&config, reqwest::Client::new()).unwrap()
    }

    #[test]
    fn content_appends_truncated_previews() {
        let mut previous = ResultMap::new();
        previous.insert("a".to_string(), json!({ "long": "x".repeat(80) }));
        previous.insert("b".to_string(), json!("plain"));
        previous.insert("c".to_string(), json!(7));

        let content = compose_content("Hello", &previous);
        let (head, tail) = content.split_once("\n\nData from workflow: ").unwrap();
        assert_eq!(head, "Hello");

        let parts: Vec<&str> = tail.split(" | ").collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0].chars().count(), PREVIEW_CHARS + 3);
        assert!(parts[0].ends_with("..."));
        assert_eq!(parts[1], "plain");
        assert_eq!(parts[2], "7");
    }

    #[test]
    fn authorization_header_is_deterministic_for_fixed_inputs() {
        let client = configured("https://api.twitter.com".to_string());
        let url = "https://api.twitter.com/2/tweets";
        let first = client.authorization("POST", url, "nonce", 1_318_622_958).unwrap();
        let second = client.authorization("POST", url, "nonce", 1_318_622_958).unwrap();
        assert_eq!(first, second);
        assert!(first.starts_with("OAuth oauth_consumer_key=\"xvz1evFS4wEEPTGEFPHBog\""));
        assert!(first.contains("oauth_signature=\""));

        let other = client.authorization("POST", url, "other", 1_318_622_958).unwrap();
        assert_ne!(first, other);
    }

    #[tokio::test]
    async fn non_twitter_platform_is_simulated_even_when_configured() {
        let client = configured("http://unused".to_string());
        let request = SocialRequest {
            platform: "mastodon".to_string(),
            ..Default::default()
        };
        let result = post_social(Some(&client), &request, &ResultMap::new()).await;
        assert_eq!(result["real_service"], false);
        assert_eq!(result["platform"], "mastodon");
        assert_eq!(result["posted"], true);
    }

    #[tokio::test]
    async fn real_tweet_reports_id_and_url() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/2/tweets")
            .match_header("authorization", mockito::Matcher::Regex("^OAuth ".to_string()))
            .with_status(201)
            .with_header("content-type", "application/json")
            .with_body(r#"{"data":{"id":"1445880548472328192","text":"hi"}}"#)
            .create_async()
            .await;

        let client = configured(server.url());
        let result = post_social(Some(&client), &SocialRequest::default(), &ResultMap::new()).await;

        assert_eq!(result["real_service"], true);
        assert_eq!(result["tweet_id"], "1445880548472328192");
        assert_eq!(result["url"], "https://twitter.com/user/status/1445880548472328192");
    }

    #[tokio::test]
    async fn rejected_tweet_falls_back_with_error() {
        let mut server = mockito::Server::new_async().await;
        server.mock("POST", "/2/tweets").with_status(403).create_async().await;

        let client = configured(server.url());
        let result = post_social(Some(&client), &SocialRequest::default(), &ResultMap::new()).await;

        assert_eq!(result["real_service"], false);
        assert_eq!(result["posted"], false);
        assert!(result["error"].is_string());
    }
}
