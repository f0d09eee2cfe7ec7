use chrono::{NaiveDate, NaiveTime, Timelike, Utc};
use rusqlite::Connection;

use crate::db::{self, queries};
use crate::errors::{AppError, FieldError};
use crate::models::slot::to_minute;
use crate::models::{DateQuery, Slot, SlotAvailability};

pub const MAX_BULK_DATES: usize = 366;

#[derive(Debug, Clone)]
pub struct BulkSlotRequest {
    pub dates: Vec<NaiveDate>,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub duration_minutes: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct BulkSlotOutcome {
    pub created: usize,
    pub skipped: usize,
}

/// Slots in the date (range), annotated with their booking state. Blocked slots are
/// only included for admin views.
pub fn list_availability(
    conn: &Connection,
    query: DateQuery,
    include_blocked: bool,
) -> Result<Vec<SlotAvailability>, AppError> {
    let (start, end) = query.bounds();
    if start > end {
        return Err(AppError::invalid("end_date", "must not be before start_date"));
    }
    Ok(queries::list_slot_availability(conn, &start, &end, include_blocked)?)
}

pub fn create_slot(
    conn: &Connection,
    date: NaiveDate,
    start_time: NaiveTime,
    end_time: NaiveTime,
) -> Result<Slot, AppError> {
    let (start_time, end_time) = (to_minute(start_time), to_minute(end_time));
    if end_time <= start_time {
        return Err(AppError::invalid("end_time", "must be after start_time"));
    }

    let slot = new_slot(date, start_time, end_time);
    match queries::insert_slot(conn, &slot) {
        Ok(()) => {
            tracing::info!(slot_id = %slot.id, date = %slot.date, start = %slot.start_time, "slot created");
            Ok(slot)
        }
        Err(e) if db::is_unique_violation(&e) => Err(AppError::Conflict(format!(
            "a slot already starts at {} on {}",
            start_time.format("%H:%M"),
            date
        ))),
        Err(e) => Err(e.into()),
    }
}

/// Creates one slot per `duration`-sized interval per date, skipping starts that already
/// exist. Start/end default to each date's business hours, duration to the configured
/// slot length.
pub fn create_slots_bulk(
    conn: &Connection,
    req: &BulkSlotRequest,
) -> Result<BulkSlotOutcome, AppError> {
    let start_time = req.start_time.map(to_minute);
    let end_time = req.end_time.map(to_minute);

    let mut errors = vec![];
    if req.dates.is_empty() {
        errors.push(FieldError::new("dates", "at least one date is required"));
    }
    if req.dates.len() > MAX_BULK_DATES {
        errors.push(FieldError::new(
            "dates",
            format!("at most {MAX_BULK_DATES} dates per request"),
        ));
    }
    if start_time.is_some() != end_time.is_some() {
        errors.push(FieldError::new(
            "start_time",
            "start_time and end_time must be given together",
        ));
    }
    if let (Some(start), Some(end)) = (start_time, end_time) {
        if end <= start {
            errors.push(FieldError::new("end_time", "must be after start_time"));
        }
    }
    if let Some(d) = req.duration_minutes {
        if !(1..=1440).contains(&d) {
            errors.push(FieldError::new("duration_minutes", "must be between 1 and 1440"));
        }
    }
    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }

    let settings = queries::get_settings(conn)?;
    let duration = req
        .duration_minutes
        .unwrap_or(settings.slot_duration_minutes);

    let tx = conn.unchecked_transaction()?;
    let mut outcome = BulkSlotOutcome {
        created: 0,
        skipped: 0,
    };

    for date in &req.dates {
        let window = match (start_time, end_time) {
            (Some(start), Some(end)) => Some((start, end)),
            _ => settings.business_hours.window_for(date),
        };
        let Some((start, end)) = window else {
            tracing::debug!(%date, "studio closed, no slots generated");
            continue;
        };

        for (slot_start, slot_end) in intervals(start, end, duration) {
            if queries::insert_slot_if_absent(&tx, &new_slot(*date, slot_start, slot_end))? {
                outcome.created += 1;
            } else {
                outcome.skipped += 1;
            }
        }
    }

    tx.commit()?;
    tracing::info!(created = outcome.created, skipped = outcome.skipped, "bulk slot creation");
    Ok(outcome)
}

pub fn set_blocked(conn: &Connection, slot_id: &str, blocked: bool) -> Result<Slot, AppError> {
    let changed = queries::set_slot_blocked(conn, slot_id, blocked)?;
    let slot = queries::get_slot(conn, slot_id)?
        .ok_or_else(|| AppError::NotFound(format!("slot {slot_id}")))?;

    if changed == 0 && blocked {
        return Err(AppError::Conflict(
            "slot has a confirmed booking and cannot be blocked".to_string(),
        ));
    }

    tracing::info!(slot_id, blocked, "slot block toggled");
    Ok(slot)
}

pub fn delete_slot(conn: &Connection, slot_id: &str) -> Result<(), AppError> {
    if queries::delete_slot_if_idle(conn, slot_id)? {
        tracing::info!(slot_id, "slot deleted");
        return Ok(());
    }

    match queries::get_slot(conn, slot_id)? {
        None => Err(AppError::NotFound(format!("slot {slot_id}"))),
        Some(_) => Err(AppError::Conflict(
            "slot has an active booking".to_string(),
        )),
    }
}

fn new_slot(date: NaiveDate, start_time: NaiveTime, end_time: NaiveTime) -> Slot {
    Slot {
        id: uuid::Uuid::new_v4().to_string(),
        date,
        start_time,
        end_time,
        is_blocked: false,
        created_at: Utc::now().naive_utc(),
    }
}

/// Back-to-back intervals of `duration` minutes that fit entirely inside `[start, end)`.
pub fn intervals(start: NaiveTime, end: NaiveTime, duration: i64) -> Vec<(NaiveTime, NaiveTime)> {
    let to_minutes = |t: NaiveTime| i64::from(t.num_seconds_from_midnight() / 60);
    let from_minutes = |m: i64| NaiveTime::from_hms_opt((m / 60) as u32, (m % 60) as u32, 0);

    let end_m = to_minutes(end);
    let mut cur = to_minutes(start);
    let mut result = vec![];
    if duration <= 0 {
        return result;
    }

    while cur + duration <= end_m {
        if let (Some(s), Some(e)) = (from_minutes(cur), from_minutes(cur + duration)) {
            result.push((s, e));
        }
        cur += duration;
    }
    result
}
