use anyhow::Context;
use async_trait::async_trait;
use serde::Serialize;

use super::Mailer;
use crate::models::Notice;

/// Posts notices to a transactional mail API, which renders the template named after
/// the notice kind.
pub struct HttpMailer {
    api_url: String,
    api_key: String,
    from: String,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct Attachment<'a> {
    filename: String,
    content_type: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct MailRequest<'a> {
    from: &'a str,
    to: &'a str,
    template: &'static str,
    data: &'a Notice,
    attachments: Vec<Attachment<'a>>,
}

impl HttpMailer {
    pub fn new(api_url: String, api_key: String, from: String) -> Self {
        Self {
            api_url,
            api_key,
            from,
            client: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(15))
                .build()
                .unwrap_or_default(),
        }
    }
}

#[async_trait]
impl Mailer for HttpMailer {
    async fn send(&self, to: &str, notice: &Notice) -> anyhow::Result<()> {
        let attachments = notice
            .invite_ics
            .as_deref()
            .map(|ics| Attachment {
                filename: format!("booking-{}.ics", notice.booking.id),
                content_type: "text/calendar; method=REQUEST",
                content: ics,
            })
            .into_iter()
            .collect();

        let request = MailRequest {
            from: &self.from,
            to,
            template: notice.kind.as_str(),
            data: notice,
            attachments,
        };

        let mut builder = self.client.post(&self.api_url).json(&request);
        if !self.api_key.is_empty() {
            builder = builder.bearer_auth(&self.api_key);
        }

        builder
            .send()
            .await
            .context("failed to reach mail API")?
            .error_for_status()
            .context("mail API returned error")?;

        Ok(())
    }
}
