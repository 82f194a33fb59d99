/// Outbound email over SMTP (STARTTLS)

use super::{timestamp, IntegrationError};
use crate::config::SmtpConfig;
use crate::workflow::types::ResultMap;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use serde::Deserialize;
use serde_json::{json, Value};

/// Recognised email node settings
#[derive(Debug, Clone, Deserialize)]
pub struct EmailRequest {
    #[serde(default = "default_recipient")]
    pub to: String,
    #[serde(default = "default_subject")]
    pub subject: String,
}

fn default_recipient() -> String {
    "test@example.com".to_string()
}

fn default_subject() -> String {
    "Workflow Automation Test".to_string()
}

impl Default for EmailRequest {
    fn default() -> Self {
        Self {
            to: default_recipient(),
            subject: default_subject(),
        }
    }
}

/// SMTP transport with the authenticated sender address
#[derive(Clone)]
pub struct EmailClient {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: String,
}

impl std::fmt::Debug for EmailClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailClient").field("from", &self.from).finish()
    }
}

impl EmailClient {
    /// `None` unless both user and password are set
    pub fn from_config(config: &SmtpConfig) -> Option<Self> {
        let (user, password) = match (&config.user, &config.password) {
            (Some(user), Some(password)) => (user.clone(), password.clone()),
            _ => return None,
        };

        match AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host) {
            Ok(builder) => Some(Self {
                transport: builder
                    .port(config.port)
                    .credentials(Credentials::new(user.clone(), password))
                    .build(),
                from: user,
            }),
            Err(e) => {
                tracing::warn!("SMTP relay {} unusable, email stays simulated: {}", config.host, e);
                None
            }
        }
    }

    async fn deliver(&self, to: &str, subject: &str, body: String) -> Result<(), IntegrationError> {
        let message = Message::builder()
            .from(self.from.parse::<Mailbox>()?)
            .to(to.parse::<Mailbox>()?)
            .subject(subject)
            .body(body)?;
        self.transport.send(message).await?;
        Ok(())
    }
}

/// Plain-text body listing every predecessor result
pub fn compose_body(previous: &ResultMap) -> String {
    let mut body = String::from("Workflow execution completed successfully!\n\n");
    if !previous.is_empty() {
        body.push_str("Previous node results:\n");
        for result in previous.values() {
            let rendered = serde_json::to_string_pretty(result).unwrap_or_else(|_| result.to_string());
            body.push_str(&format!("- {}\n", rendered));
        }
    }
    body
}

pub async fn send_email(client: Option<&EmailClient>, request: &EmailRequest, previous: &ResultMap) -> Value {
    let Some(client) = client else {
        tracing::debug!("SMTP not configured, simulating email to {}", request.to);
        return json!({
            "sent": true,
            "real_service": false,
            "to": request.to,
            "subject": request.subject,
            "timestamp": timestamp(),
            "status_message": "SMTP not configured - this would be a real email"
        });
    };

    match client.deliver(&request.to, &request.subject, compose_body(previous)).await {
        Ok(()) => {
            tracing::info!("Email sent to {}", request.to);
            json!({
                "sent": true,
                "real_service": true,
                "to": request.to,
                "subject": request.subject,
                "timestamp": timestamp(),
                "status_message": "Real email sent successfully"
            })
        }
        Err(e) => {
            tracing::warn!("Email delivery to {} failed: {}", request.to, e);
            json!({
                "sent": false,
                "real_service": false,
                "to": request.to,
                "subject": request.subject,
                "timestamp": timestamp(),
                "error": e.to_string()
            })
        }
    }
}
