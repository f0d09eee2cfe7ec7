use serde::Serialize;

use super::booking::Booking;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
    BookingRequested,
    BookingApproved,
    BookingRejected,
    BookingCancelled,
}

impl NoticeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NoticeKind::BookingRequested => "booking_requested",
            NoticeKind::BookingApproved => "booking_approved",
            NoticeKind::BookingRejected => "booking_rejected",
            NoticeKind::BookingCancelled => "booking_cancelled",
        }
    }
}

/// Event payload handed to notification channels. Channels render their own text.
#[derive(Debug, Clone, Serialize)]
pub struct Notice {
    pub kind: NoticeKind,
    pub studio_name: String,
    pub booking: Booking,
    pub reason: Option<String>,
    /// iCalendar invite, attached on approval.
    pub invite_ics: Option<String>,
}
