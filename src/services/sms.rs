/// Outbound SMS through the Twilio REST API

use super::{join_url, timestamp, IntegrationError};
use crate::config::SmsConfig;
use serde::Deserialize;
use serde_json::{json, Value};

#[derive(Debug, Clone, Deserialize)]
pub struct SmsRequest {
    #[serde(default = "default_phone")]
    pub phone: String,
    #[serde(default = "default_message")]
    pub message: String,
}

fn default_phone() -> String {
    "+1234567890".to_string()
}

fn default_message() -> String {
    "Workflow automation test message".to_string()
}

impl Default for SmsRequest {
    fn default() -> Self {
        Self {
            phone: default_phone(),
            message: default_message(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct MessageResource {
    sid: String,
}

#[derive(Debug, Clone)]
pub struct SmsClient {
    http: reqwest::Client,
    account_sid: String,
    auth_token: String,
    from_number: String,
    base_url: String,
}

impl SmsClient {
    /// Needs account sid, auth token and a sender number
    pub fn from_config(config: &SmsConfig, http: reqwest::Client) -> Option<Self> {
        Some(Self {
            http,
            account_sid: config.account_sid.clone()?,
            auth_token: config.auth_token.clone()?,
            from_number: config.from_number.clone()?,
            base_url: config.base_url.clone(),
        })
    }

    async fn deliver(&self, to: &str, body: &str) -> Result<String, IntegrationError> {
        let url = join_url(
            &self.base_url,
            &format!("2010-04-01/Accounts/{}/Messages.json", self.account_sid),
        );
        let resource: MessageResource = self
            .http
            .post(url)
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(&[("To", to), ("From", self.from_number.as_str()), ("Body", body)])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(resource.sid)
    }
}

pub async fn send_sms(client: Option<&SmsClient>, request: &SmsRequest) -> Value {
    let Some(client) = client else {
        tracing::debug!("Twilio not configured, simulating SMS to {}", request.phone);
        return json!({
            "sent": true,
            "real_service": false,
            "to": request.phone,
            "message": request.message,
            "timestamp": timestamp(),
            "status_message": "Twilio not configured - this would be a real SMS"
        });
    };

    match client.deliver(&request.phone, &request.message).await {
        Ok(sid) => {
            tracing::info!("SMS sent to {} ({})", request.phone, sid);
            json!({
                "sent": true,
                "real_service": true,
                "to": request.phone,
                "message": request.message,
                "sid": sid,
                "timestamp": timestamp(),
                "status_message": "Real SMS sent successfully"
            })
        }
        Err(e) => {
            tracing::warn!("SMS delivery to {} failed: {}", request.phone, e);
            json!({
                "sent": false,
                "real_service": false,
                "to": request.phone,
                "message": request.message,
                "timestamp": timestamp(),
                "error": e.to_string()
            })
        }
    }
}
