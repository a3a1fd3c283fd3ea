use async_trait::async_trait;
use capsule_types::EmailMessage;

/// Outbound email delivery.
///
/// Implementations return an error when the provider did not accept the
/// message; the caller decides what a failure means for the capsule.
#[async_trait]
pub trait EmailService: Send + Sync {
    async fn send_email(&self, email: &EmailMessage) -> anyhow::Result<()>;
}
