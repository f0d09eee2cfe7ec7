use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use rusqlite::Connection;
use serde::Deserialize;

use crate::errors::AppError;
use crate::models::{AdminSettings, Booking, Principal};
use crate::services::booking::{self, NewBooking};
use crate::services::settings;
use crate::state::AppState;

/// Settings for addressing notices once a write has committed. A read failure here
/// must not fail the request, so it degrades to requester-only delivery.
pub(crate) fn notification_settings(db: &Connection) -> AdminSettings {
    settings::get_settings(db).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "could not load settings for notifications");
        AdminSettings::default()
    })
}

// POST /api/bookings
#[derive(Deserialize)]
pub struct CreateBookingRequest {
    #[serde(default)]
    pub slot_id: String,
    #[serde(default)]
    pub rental_type: String,
    pub band_name: Option<String>,
    pub notes: Option<String>,
}

pub async fn create_booking(
    State(state): State<Arc<AppState>>,
    principal: Principal,
    Json(body): Json<CreateBookingRequest>,
) -> Result<(StatusCode, Json<Booking>), AppError> {
    let req = NewBooking {
        slot_id: body.slot_id,
        rental_type: body.rental_type,
        band_name: body.band_name,
        notes: body.notes,
    };

    let (booking, settings) = {
        let db = state.db()?;
        let booking = booking::create_booking(&db, &principal, &req)?;
        (booking, notification_settings(&db))
    };

    state.notifier.booking_requested(&booking, &settings);
    Ok((StatusCode::CREATED, Json(booking)))
}

// GET /api/bookings/mine
pub async fn my_bookings(
    State(state): State<Arc<AppState>>,
    principal: Principal,
) -> Result<Json<Vec<Booking>>, AppError> {
    let db = state.db()?;
    Ok(Json(booking::list_for_user(&db, &principal.id)?))
}

// POST /api/bookings/:id/cancel
pub async fn cancel_booking(
    State(state): State<Arc<AppState>>,
    principal: Principal,
    Path(id): Path<String>,
) -> Result<Json<Booking>, AppError> {
    let (booking, settings) = {
        let db = state.db()?;
        let booking = booking::cancel_booking(&db, &id, &principal)?;
        (booking, notification_settings(&db))
    };

    state.notifier.booking_cancelled(&booking, &settings);
    Ok(Json(booking))
}
