use async_trait::async_trait;
use tracing::info;

use capsule_core::EmailService;
use capsule_types::EmailMessage;

/// Logs deliveries instead of sending them. Used when no provider is
/// configured.
pub struct LogEmailService;

#[async_trait]
impl EmailService for LogEmailService {
    async fn send_email(&self, email: &EmailMessage) -> anyhow::Result<()> {
        info!(to = %email.to, subject = %email.subject, "email not sent (log-only delivery)");
        Ok(())
    }
}
