use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use super::auth::Admin;
use super::bookings::notification_settings;
use super::slots::required_date;
use crate::errors::AppError;
use crate::models::{AdminSettings, Booking, BookingStatus, BusinessHours, RentalRate, RevenueReport};
use crate::services::booking;
use crate::services::revenue;
use crate::services::settings::{self, SettingsPatch};
use crate::state::AppState;

// GET /api/admin/bookings
#[derive(Deserialize)]
pub struct BookingsQuery {
    pub status: Option<String>,
    pub limit: Option<i64>,
}

pub async fn get_bookings(
    State(state): State<Arc<AppState>>,
    _admin: Admin,
    Query(query): Query<BookingsQuery>,
) -> Result<Json<Vec<Booking>>, AppError> {
    let status = match query.status.as_deref() {
        None | Some("") => None,
        Some(s) => Some(
            BookingStatus::parse(s)
                .ok_or_else(|| AppError::invalid("status", format!("unknown status: {s}")))?,
        ),
    };
    let limit = query.limit.unwrap_or(50);

    let db = state.db()?;
    Ok(Json(booking::list_bookings(&db, status, limit)?))
}

// POST /api/admin/bookings/:id/approve
pub async fn approve_booking(
    State(state): State<Arc<AppState>>,
    Admin(approver): Admin,
    Path(id): Path<String>,
) -> Result<Json<Booking>, AppError> {
    let (booking, settings) = {
        let db = state.db()?;
        let booking = booking::approve_booking(&db, &id, &approver)?;
        (booking, notification_settings(&db))
    };

    state.notifier.booking_approved(&booking, &settings);
    Ok(Json(booking))
}

// POST /api/admin/bookings/:id/reject
#[derive(Deserialize, Default)]
pub struct RejectRequest {
    pub reason: Option<String>,
}

pub async fn reject_booking(
    State(state): State<Arc<AppState>>,
    _admin: Admin,
    Path(id): Path<String>,
    body: Option<Json<RejectRequest>>,
) -> Result<Json<Booking>, AppError> {
    let body = body.map(|Json(b)| b).unwrap_or_default();
    let reason = body.reason.as_deref().map(str::trim).filter(|r| !r.is_empty());

    let booking = {
        let db = state.db()?;
        booking::reject_booking(&db, &id, reason)?
    };

    state.notifier.booking_rejected(&booking, reason);
    Ok(Json(booking))
}

// GET /api/admin/settings
pub async fn get_settings(
    State(state): State<Arc<AppState>>,
    _admin: Admin,
) -> Result<Json<AdminSettings>, AppError> {
    let db = state.db()?;
    Ok(Json(settings::get_settings(&db)?))
}

// POST /api/admin/settings
pub async fn update_settings(
    State(state): State<Arc<AppState>>,
    _admin: Admin,
    Json(body): Json<SettingsPatch>,
) -> Result<Json<AdminSettings>, AppError> {
    let db = state.db()?;
    Ok(Json(settings::update_settings(&db, body)?))
}

// GET /api/settings
#[derive(Serialize)]
pub struct PublicSettings {
    rate_table: Vec<RentalRate>,
    business_hours: BusinessHours,
    business_hours_text: String,
    slot_duration_minutes: i64,
    upi_id: String,
    upi_name: String,
    gst_enabled: bool,
    gst_rate: f64,
}

pub async fn public_settings(
    State(state): State<Arc<AppState>>,
) -> Result<Json<PublicSettings>, AppError> {
    let s = {
        let db = state.db()?;
        settings::get_settings(&db)?
    };

    Ok(Json(PublicSettings {
        business_hours_text: s.business_hours.to_human_readable(),
        rate_table: s.rate_table,
        business_hours: s.business_hours,
        slot_duration_minutes: s.slot_duration_minutes,
        upi_id: s.upi_id,
        upi_name: s.upi_name,
        gst_enabled: s.gst_enabled,
        gst_rate: s.gst_rate,
    }))
}

// GET /api/admin/revenue
#[derive(Deserialize)]
pub struct RevenueQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

pub async fn get_revenue(
    State(state): State<Arc<AppState>>,
    _admin: Admin,
    Query(query): Query<RevenueQuery>,
) -> Result<Json<RevenueReport>, AppError> {
    let mut errors = vec![];
    let start = required_date("start_date", query.start_date.as_deref(), &mut errors);
    let end = required_date("end_date", query.end_date.as_deref(), &mut errors);
    let (Some(start), Some(end)) = (start, end) else {
        return Err(AppError::Validation(errors));
    };

    let db = state.db()?;
    Ok(Json(revenue::compute_revenue(&db, start, end)?))
}
