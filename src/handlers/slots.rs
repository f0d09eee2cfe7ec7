use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use super::auth::Admin;
use crate::errors::{AppError, FieldError};
use crate::models::slot::{parse_date, parse_time};
use crate::models::{DateQuery, Principal, Slot, SlotAvailability};
use crate::services::slots::{self, BulkSlotOutcome, BulkSlotRequest};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct AvailabilityQuery {
    pub date: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

pub(crate) fn required_date(
    field: &str,
    raw: Option<&str>,
    errors: &mut Vec<FieldError>,
) -> Option<chrono::NaiveDate> {
    match raw {
        None => {
            errors.push(FieldError::new(field, "is required"));
            None
        }
        Some(s) => {
            let parsed = parse_date(s);
            if parsed.is_none() {
                errors.push(FieldError::new(field, "expected YYYY-MM-DD"));
            }
            parsed
        }
    }
}

fn required_time(
    field: &str,
    raw: Option<&str>,
    errors: &mut Vec<FieldError>,
) -> Option<chrono::NaiveTime> {
    match raw {
        None => {
            errors.push(FieldError::new(field, "is required"));
            None
        }
        Some(s) => {
            let parsed = parse_time(s);
            if parsed.is_none() {
                errors.push(FieldError::new(field, "expected HH:MM"));
            }
            parsed
        }
    }
}

impl AvailabilityQuery {
    fn to_date_query(&self) -> Result<DateQuery, AppError> {
        let mut errors = vec![];
        let query = if let Some(date) = self.date.as_deref() {
            required_date("date", Some(date), &mut errors).map(DateQuery::Single)
        } else {
            let start = required_date("start_date", self.start_date.as_deref(), &mut errors);
            let end = required_date("end_date", self.end_date.as_deref(), &mut errors);
            start.zip(end).map(|(s, e)| DateQuery::Range(s, e))
        };

        match query {
            Some(q) if errors.is_empty() => Ok(q),
            _ => Err(AppError::Validation(errors)),
        }
    }
}

// GET /api/slots
pub async fn list_available(
    State(state): State<Arc<AppState>>,
    _principal: Principal,
    Query(query): Query<AvailabilityQuery>,
) -> Result<Json<Vec<SlotAvailability>>, AppError> {
    let date_query = query.to_date_query()?;
    let db = state.db()?;
    Ok(Json(slots::list_availability(&db, date_query, false)?))
}

// GET /api/admin/slots
pub async fn list_all(
    State(state): State<Arc<AppState>>,
    _admin: Admin,
    Query(query): Query<AvailabilityQuery>,
) -> Result<Json<Vec<SlotAvailability>>, AppError> {
    let date_query = query.to_date_query()?;
    let db = state.db()?;
    Ok(Json(slots::list_availability(&db, date_query, true)?))
}

// POST /api/admin/slots
#[derive(Deserialize)]
pub struct CreateSlotRequest {
    pub date: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
}

pub async fn create_slot(
    State(state): State<Arc<AppState>>,
    _admin: Admin,
    Json(body): Json<CreateSlotRequest>,
) -> Result<(StatusCode, Json<Slot>), AppError> {
    let mut errors = vec![];
    let date = required_date("date", body.date.as_deref(), &mut errors);
    let start = required_time("start_time", body.start_time.as_deref(), &mut errors);
    let end = required_time("end_time", body.end_time.as_deref(), &mut errors);

    let (Some(date), Some(start), Some(end)) = (date, start, end) else {
        return Err(AppError::Validation(errors));
    };

    let db = state.db()?;
    let slot = slots::create_slot(&db, date, start, end)?;
    Ok((StatusCode::CREATED, Json(slot)))
}

// POST /api/admin/slots/bulk
#[derive(Deserialize)]
pub struct BulkCreateRequest {
    #[serde(default)]
    pub dates: Vec<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub duration_minutes: Option<i64>,
}

pub async fn create_bulk(
    State(state): State<Arc<AppState>>,
    _admin: Admin,
    Json(body): Json<BulkCreateRequest>,
) -> Result<Json<BulkSlotOutcome>, AppError> {
    let mut errors = vec![];
    let dates: Vec<_> = body
        .dates
        .iter()
        .filter_map(|d| required_date("dates", Some(d), &mut errors))
        .collect();
    let start_time = body
        .start_time
        .as_deref()
        .and_then(|t| required_time("start_time", Some(t), &mut errors));
    let end_time = body
        .end_time
        .as_deref()
        .and_then(|t| required_time("end_time", Some(t), &mut errors));
    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }

    let req = BulkSlotRequest {
        dates,
        start_time,
        end_time,
        duration_minutes: body.duration_minutes,
    };
    let db = state.db()?;
    Ok(Json(slots::create_slots_bulk(&db, &req)?))
}

// POST /api/admin/slots/:id/block
#[derive(Deserialize)]
pub struct BlockRequest {
    pub blocked: bool,
}

pub async fn set_blocked(
    State(state): State<Arc<AppState>>,
    _admin: Admin,
    Path(id): Path<String>,
    Json(body): Json<BlockRequest>,
) -> Result<Json<Slot>, AppError> {
    let db = state.db()?;
    Ok(Json(slots::set_blocked(&db, &id, body.blocked)?))
}

// DELETE /api/admin/slots/:id
pub async fn delete_slot(
    State(state): State<Arc<AppState>>,
    _admin: Admin,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let db = state.db()?;
    slots::delete_slot(&db, &id)?;
    Ok(StatusCode::NO_CONTENT)
}
