pub mod twilio;

use async_trait::async_trait;

use crate::models::Notice;

#[async_trait]
pub trait MessagingProvider: Send + Sync {
    async fn send_notice(&self, to: &str, notice: &Notice) -> anyhow::Result<()>;
}

/// Used when no WhatsApp credentials are configured.
pub struct LogMessenger;

#[async_trait]
impl MessagingProvider for LogMessenger {
    async fn send_notice(&self, to: &str, notice: &Notice) -> anyhow::Result<()> {
        tracing::info!(
            recipient = %to,
            kind = notice.kind.as_str(),
            booking_id = %notice.booking.id,
            "whatsapp not configured, notice logged only"
        );
        Ok(())
    }
}
