use anyhow::Context;
use async_trait::async_trait;

use super::MessagingProvider;
use crate::models::{Notice, NoticeKind};

pub struct TwilioWhatsAppProvider {
    account_sid: String,
    auth_token: String,
    from_number: String,
    client: reqwest::Client,
}

impl TwilioWhatsAppProvider {
    pub fn new(account_sid: String, auth_token: String, from_number: String) -> Self {
        Self {
            account_sid,
            auth_token,
            from_number,
            client: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(15))
                .build()
                .unwrap_or_default(),
        }
    }
}

fn whatsapp_address(number: &str) -> String {
    if number.starts_with("whatsapp:") {
        number.to_string()
    } else {
        format!("whatsapp:{number}")
    }
}

pub fn render_body(notice: &Notice) -> String {
    let b = &notice.booking;
    let when = format!(
        "{} {}-{}",
        b.slot_date.format("%Y-%m-%d"),
        b.start_time.format("%H:%M"),
        b.end_time.format("%H:%M")
    );
    match notice.kind {
        NoticeKind::BookingRequested => format!(
            "{}: new {} request from {} for {when} (Rs {}).",
            notice.studio_name, b.rental_type, b.user_name, b.price
        ),
        NoticeKind::BookingApproved => format!(
            "{}: {} booking for {when} is confirmed.",
            notice.studio_name, b.rental_type
        ),
        NoticeKind::BookingRejected => match &notice.reason {
            Some(reason) => format!(
                "{}: booking for {when} was rejected. Reason: {reason}",
                notice.studio_name
            ),
            None => format!("{}: booking for {when} was rejected.", notice.studio_name),
        },
        NoticeKind::BookingCancelled => format!(
            "{}: booking by {} for {when} was cancelled.",
            notice.studio_name, b.user_name
        ),
    }
}

#[async_trait]
impl MessagingProvider for TwilioWhatsAppProvider {
    async fn send_notice(&self, to: &str, notice: &Notice) -> anyhow::Result<()> {
        let url = format!(
            "https://api.twilio.com/2010-04-01/Accounts/{}/Messages.json",
            self.account_sid
        );
        let to = whatsapp_address(to);
        let from = whatsapp_address(&self.from_number);
        let body = render_body(notice);

        self.client
            .post(&url)
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(&[("To", to.as_str()), ("From", from.as_str()), ("Body", body.as_str())])
            .send()
            .await
            .context("failed to send Twilio WhatsApp message")?
            .error_for_status()
            .context("Twilio API returned error")?;

        Ok(())
    }
}
