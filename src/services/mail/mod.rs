pub mod http;

use async_trait::async_trait;

use crate::models::Notice;

/// Delivers a booking notice by email. Implementations own the templates.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, to: &str, notice: &Notice) -> anyhow::Result<()>;
}

/// Used when no mail API is configured.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, to: &str, notice: &Notice) -> anyhow::Result<()> {
        tracing::info!(
            recipient = %to,
            kind = notice.kind.as_str(),
            booking_id = %notice.booking.id,
            has_invite = notice.invite_ics.is_some(),
            "mail not configured, notice logged only"
        );
        Ok(())
    }
}
