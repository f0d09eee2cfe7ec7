use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};

use super::bookings::notification_settings;
use crate::errors::AppError;
use crate::models::{BookingStatus, Principal};
use crate::services::booking;
use crate::services::calendar::generate_invite;
use crate::services::notify::with_requester;
use crate::state::AppState;

// GET /calendar/:booking_id
pub async fn download_ics(
    State(state): State<Arc<AppState>>,
    principal: Principal,
    Path(raw_id): Path<String>,
) -> Result<Response, AppError> {
    let booking_id = raw_id.strip_suffix(".ics").unwrap_or(&raw_id);

    let (booking, settings) = {
        let db = state.db()?;
        let booking = booking::get_booking(&db, booking_id)?;
        (booking, notification_settings(&db))
    };

    if !principal.is_admin() && booking.user_id != principal.id {
        return Err(AppError::Forbidden);
    }
    if booking.booking_status != BookingStatus::Confirmed {
        return Err(AppError::Conflict(format!(
            "booking is {}",
            booking.booking_status.as_str()
        )));
    }

    let attendees = with_requester(&booking, &settings.admin_emails);
    let ics = generate_invite(&booking, &state.config.studio_name, &attendees);
    let filename = format!("booking-{booking_id}.ics");

    Ok((
        [
            (header::CONTENT_TYPE, "text/calendar; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        ics,
    )
        .into_response())
}
