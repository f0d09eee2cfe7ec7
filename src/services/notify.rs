use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::models::{AdminSettings, Booking, Notice, NoticeKind};
use crate::services::calendar::generate_invite;
use crate::services::mail::Mailer;
use crate::services::messaging::MessagingProvider;

/// Fans booking notices out to email and WhatsApp after the state change has
/// committed. Every recipient is delivered on its own task; failures are logged and
/// never reach the caller.
#[derive(Clone)]
pub struct Notifier {
    mailer: Arc<dyn Mailer>,
    messenger: Arc<dyn MessagingProvider>,
    studio_name: String,
}

impl Notifier {
    pub fn new(
        mailer: Arc<dyn Mailer>,
        messenger: Arc<dyn MessagingProvider>,
        studio_name: String,
    ) -> Self {
        Self {
            mailer,
            messenger,
            studio_name,
        }
    }

    pub fn booking_requested(&self, booking: &Booking, settings: &AdminSettings) -> Vec<JoinHandle<()>> {
        let notice = self.notice(NoticeKind::BookingRequested, booking, None, None);
        let emails = with_requester(booking, &settings.admin_emails);
        self.dispatch(notice, emails, settings.whatsapp_recipients.clone())
    }

    pub fn booking_approved(&self, booking: &Booking, settings: &AdminSettings) -> Vec<JoinHandle<()>> {
        let emails = with_requester(booking, &settings.admin_emails);
        let invite = generate_invite(booking, &self.studio_name, &emails);
        let notice = self.notice(NoticeKind::BookingApproved, booking, None, Some(invite));
        self.dispatch(notice, emails, vec![])
    }

    pub fn booking_rejected(&self, booking: &Booking, reason: Option<&str>) -> Vec<JoinHandle<()>> {
        let notice = self.notice(
            NoticeKind::BookingRejected,
            booking,
            reason.map(str::to_string),
            None,
        );
        self.dispatch(notice, vec![booking.user_email.clone()], vec![])
    }

    pub fn booking_cancelled(&self, booking: &Booking, settings: &AdminSettings) -> Vec<JoinHandle<()>> {
        let notice = self.notice(NoticeKind::BookingCancelled, booking, None, None);
        let emails = with_requester(booking, &settings.admin_emails);
        self.dispatch(notice, emails, vec![])
    }

    fn notice(
        &self,
        kind: NoticeKind,
        booking: &Booking,
        reason: Option<String>,
        invite_ics: Option<String>,
    ) -> Notice {
        Notice {
            kind,
            studio_name: self.studio_name.clone(),
            booking: booking.clone(),
            reason,
            invite_ics,
        }
    }

    pub fn dispatch(
        &self,
        notice: Notice,
        emails: Vec<String>,
        whatsapp: Vec<String>,
    ) -> Vec<JoinHandle<()>> {
        let notice = Arc::new(notice);
        let mut handles = Vec::with_capacity(emails.len() + whatsapp.len());

        for to in emails {
            let mailer = Arc::clone(&self.mailer);
            let notice = Arc::clone(&notice);
            handles.push(tokio::spawn(async move {
                if let Err(e) = mailer.send(&to, &notice).await {
                    tracing::error!(
                        error = %e,
                        recipient = %to,
                        kind = notice.kind.as_str(),
                        booking_id = %notice.booking.id,
                        "failed to send email notice"
                    );
                }
            }));
        }

        for to in whatsapp {
            let messenger = Arc::clone(&self.messenger);
            let notice = Arc::clone(&notice);
            handles.push(tokio::spawn(async move {
                if let Err(e) = messenger.send_notice(&to, &notice).await {
                    tracing::error!(
                        error = %e,
                        recipient = %to,
                        kind = notice.kind.as_str(),
                        booking_id = %notice.booking.id,
                        "failed to send whatsapp notice"
                    );
                }
            }));
        }

        handles
    }
}

/// Requester first, then admins not already listed (case-insensitive).
pub fn with_requester(booking: &Booking, admins: &[String]) -> Vec<String> {
    let mut emails = vec![booking.user_email.clone()];
    for admin in admins {
        if !emails.iter().any(|e| e.eq_ignore_ascii_case(admin)) {
            emails.push(admin.clone());
        }
    }
    emails
}
