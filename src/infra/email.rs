//! Transactional email over a Resend-compatible HTTP API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde_json::json;
use tracing::debug;

use crate::application::contact::{Mailer, OutboundEmail};
use crate::infra::error::InfraError;

#[derive(Debug, Clone)]
pub struct MailConfig {
    pub api_base: Url,
    pub api_key: String,
    pub from: String,
    pub to: String,
    pub timeout: Duration,
}

pub struct HttpMailer {
    client: Client,
    config: MailConfig,
}

impl HttpMailer {
    pub fn new(config: MailConfig) -> Result<Self, InfraError> {
        let client = Client::builder()
            .user_agent(concat!("printworks/", env!("CARGO_PKG_VERSION")))
            .timeout(config.timeout)
            .build()
            .map_err(|err| InfraError::mail(err.to_string()))?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl Mailer for HttpMailer {
    async fn send(&self, email: &OutboundEmail) -> Result<(), InfraError> {
        let url = self
            .config
            .api_base
            .join("emails")
            .map_err(|err| InfraError::mail(format!("bad api base: {err}")))?;

        let mut payload = json!({
            "from": self.config.from,
            "to": [self.config.to],
            "subject": email.subject,
            "text": email.text_body,
        });
        if let Some(reply_to) = &email.reply_to {
            payload["reply_to"] = json!(reply_to);
        }

        let response = self
            .client
            .post(url)
            .bearer_auth(&self.config.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|err| InfraError::mail(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(InfraError::mail(format!("status {status}: {body}")));
        }

        debug!(target = "printworks::mail", subject = %email.subject, "notification sent");
        Ok(())
    }
}
