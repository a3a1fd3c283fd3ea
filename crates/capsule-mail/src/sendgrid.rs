use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::debug;

use capsule_core::EmailService;
use capsule_types::EmailMessage;

use crate::error::MailError;

pub const SENDGRID_ENDPOINT: &str = "https://api.sendgrid.com/v3/mail/send";
pub const DEFAULT_SENDER: &str = "noreply@timecapsules.local";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Plain-text delivery through the SendGrid v3 mail API.
pub struct SendGridEmailService {
    client: reqwest::Client,
    api_key: String,
    sender: String,
    endpoint: String,
}

impl SendGridEmailService {
    pub fn new(api_key: impl Into<String>) -> Result<Self, MailError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(MailError::MissingApiKey);
        }

        let client = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;

        Ok(Self {
            client,
            api_key,
            sender: DEFAULT_SENDER.to_string(),
            endpoint: SENDGRID_ENDPOINT.to_string(),
        })
    }

    pub fn with_sender(mut self, sender: impl Into<String>) -> Self {
        self.sender = sender.into();
        self
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    fn payload(&self, email: &EmailMessage) -> Value {
        json!({
            "personalizations": [{ "to": [{ "email": email.to }] }],
            "from": { "email": self.sender },
            "subject": email.subject,
            "content": [{ "type": "text/plain", "value": email.body }],
        })
    }

    async fn post(&self, email: &EmailMessage) -> Result<(), MailError> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&self.payload(email))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MailError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        debug!(to = %email.to, status = status.as_u16(), "email accepted by SendGrid");
        Ok(())
    }
}

#[async_trait]
impl EmailService for SendGridEmailService {
    async fn send_email(&self, email: &EmailMessage) -> anyhow::Result<()> {
        self.post(email).await?;
        Ok(())
    }
}
