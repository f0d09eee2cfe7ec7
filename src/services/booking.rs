use chrono::Utc;
use rusqlite::Connection;

use crate::db::{self, queries};
use crate::errors::{AppError, FieldError};
use crate::models::{
    Booking, BookingStatus, PaymentStatus, Principal, FALLBACK_PRICE,
};

const MAX_BAND_NAME_LEN: usize = 120;
const MAX_NOTES_LEN: usize = 2000;

#[derive(Debug, Clone, Default)]
pub struct NewBooking {
    pub slot_id: String,
    pub rental_type: String,
    pub band_name: Option<String>,
    pub notes: Option<String>,
}

/// Requests a slot for `requester`. Checks run in a fixed order: slot exists, slot
/// unblocked, slot free, rental type priced. The insert itself re-asserts the slot
/// guards and the store's unique index settles concurrent requests.
pub fn create_booking(
    conn: &Connection,
    requester: &Principal,
    req: &NewBooking,
) -> Result<Booking, AppError> {
    validate_new_booking(requester, req)?;

    let slot = queries::get_slot(conn, &req.slot_id)?
        .ok_or_else(|| AppError::NotFound(format!("slot {}", req.slot_id)))?;
    if slot.is_blocked {
        return Err(AppError::Conflict("slot blocked".to_string()));
    }
    if queries::slot_has_booking_with_status(
        conn,
        &slot.id,
        &[BookingStatus::Pending, BookingStatus::Confirmed],
    )? {
        return Err(slot_taken());
    }

    let (rental_type, price) = resolve_price(conn, &req.rental_type)?;

    let now = Utc::now().naive_utc();
    let booking = Booking {
        id: uuid::Uuid::new_v4().to_string(),
        slot_id: slot.id.clone(),
        slot_date: slot.date,
        start_time: slot.start_time,
        end_time: slot.end_time,
        user_id: requester.id.clone(),
        user_name: requester.name.trim().to_string(),
        user_email: requester.email.trim().to_string(),
        rental_type,
        price,
        payment_status: PaymentStatus::Pending,
        booking_status: BookingStatus::Pending,
        band_name: non_empty(req.band_name.as_deref()),
        notes: non_empty(req.notes.as_deref()),
        created_at: now,
        updated_at: now,
    };

    match queries::create_booking_on_open_slot(conn, &booking) {
        Ok(true) => {}
        Ok(false) => {
            // Slot was deleted or blocked after the checks above.
            return match queries::get_slot(conn, &slot.id)? {
                None => Err(AppError::NotFound(format!("slot {}", slot.id))),
                Some(_) => Err(AppError::Conflict("slot blocked".to_string())),
            };
        }
        Err(e) if db::is_unique_violation(&e) => {
            tracing::info!(slot_id = %slot.id, user_id = %requester.id, "lost race for slot");
            return Err(slot_taken());
        }
        Err(e) => return Err(e.into()),
    }

    tracing::info!(
        booking_id = %booking.id,
        slot_id = %booking.slot_id,
        user_id = %booking.user_id,
        rental_type = %booking.rental_type,
        price = booking.price,
        "booking requested"
    );
    Ok(booking)
}

/// Rate name and price snapshot for a rental type, matched case-insensitively. An unknown
/// type is a validation error; an unreadable or empty rate table falls back to
/// [`FALLBACK_PRICE`] under the caller's name and logs a distinct warning.
pub fn resolve_price(conn: &Connection, rental_type: &str) -> Result<(String, i64), AppError> {
    let settings = match queries::get_settings(conn) {
        Ok(s) => s,
        Err(e) if db::is_transient(&e) => return Err(e.into()),
        Err(e) => {
            tracing::warn!(
                price_fallback = true,
                rental_type,
                error = %e,
                "rate table unreadable, using fallback price"
            );
            return Ok((rental_type.trim().to_string(), FALLBACK_PRICE));
        }
    };

    if settings.rate_table.is_empty() {
        tracing::warn!(
            price_fallback = true,
            rental_type,
            "rate table is empty, using fallback price"
        );
        return Ok((rental_type.trim().to_string(), FALLBACK_PRICE));
    }

    match settings.rate_for(rental_type) {
        Some(rate) => Ok((rate.name.clone(), rate.base_price)),
        None => Err(AppError::invalid(
            "rental_type",
            format!("unknown rental type: {}", rental_type.trim()),
        )),
    }
}

/// Confirms a pending booking and marks it paid. Approving twice is a conflict, as is
/// approving while the slot is blocked.
pub fn approve_booking(
    conn: &Connection,
    booking_id: &str,
    approver: &Principal,
) -> Result<Booking, AppError> {
    if !approver.is_admin() {
        return Err(AppError::Forbidden);
    }

    let applied = queries::confirm_booking_on_open_slot(conn, booking_id)?;

    let booking = load_booking(conn, booking_id)?;
    if !applied {
        return Err(match booking.booking_status {
            BookingStatus::Pending => AppError::Conflict("slot blocked".to_string()),
            BookingStatus::Confirmed => AppError::Conflict("already confirmed".to_string()),
            other => AppError::Conflict(format!("booking is {}", other.as_str())),
        });
    }

    tracing::info!(booking_id, approver_id = %approver.id, "booking approved");
    Ok(booking)
}

/// Rejects a pending or confirmed booking (the latter frees its slot). Rejecting again
/// records the new reason; cancelled bookings stay cancelled.
pub fn reject_booking(
    conn: &Connection,
    booking_id: &str,
    reason: Option<&str>,
) -> Result<Booking, AppError> {
    let reason = non_empty(reason);
    if reason.as_ref().is_some_and(|r| r.len() > MAX_NOTES_LEN) {
        return Err(AppError::invalid("reason", "too long"));
    }
    let note = reason.as_ref().map(|r| format!("Rejection reason: {r}"));

    let applied = queries::transition_booking(
        conn,
        booking_id,
        &[
            BookingStatus::Pending,
            BookingStatus::Confirmed,
            BookingStatus::Rejected,
        ],
        BookingStatus::Rejected,
        None,
        note.as_deref(),
    )?;

    let booking = load_booking(conn, booking_id)?;
    if !applied {
        return Err(AppError::Conflict("already cancelled".to_string()));
    }

    tracing::info!(booking_id, has_reason = reason.is_some(), "booking rejected");
    Ok(booking)
}

/// Cancels a booking on behalf of its owner. The slot frees up implicitly.
pub fn cancel_booking(
    conn: &Connection,
    booking_id: &str,
    requester: &Principal,
) -> Result<Booking, AppError> {
    let existing = load_booking(conn, booking_id)?;
    if existing.user_id != requester.id {
        return Err(AppError::Forbidden);
    }

    let applied = queries::transition_booking(
        conn,
        booking_id,
        &[BookingStatus::Pending, BookingStatus::Confirmed],
        BookingStatus::Cancelled,
        None,
        None,
    )?;

    let booking = load_booking(conn, booking_id)?;
    if !applied {
        return Err(match booking.booking_status {
            BookingStatus::Cancelled => AppError::Conflict("already cancelled".to_string()),
            other => AppError::Conflict(format!("booking is {}", other.as_str())),
        });
    }

    tracing::info!(booking_id, user_id = %requester.id, "booking cancelled");
    Ok(booking)
}

pub fn get_booking(conn: &Connection, booking_id: &str) -> Result<Booking, AppError> {
    load_booking(conn, booking_id)
}

pub fn list_for_user(conn: &Connection, user_id: &str) -> Result<Vec<Booking>, AppError> {
    Ok(queries::get_bookings_for_user(conn, user_id)?)
}

pub fn list_bookings(
    conn: &Connection,
    status: Option<BookingStatus>,
    limit: i64,
) -> Result<Vec<Booking>, AppError> {
    Ok(queries::get_all_bookings(conn, status, limit.clamp(1, 500))?)
}

fn load_booking(conn: &Connection, booking_id: &str) -> Result<Booking, AppError> {
    queries::get_booking_by_id(conn, booking_id)?
        .ok_or_else(|| AppError::NotFound(format!("booking {booking_id}")))
}

fn slot_taken() -> AppError {
    AppError::Conflict("slot already booked/requested".to_string())
}

fn non_empty(s: Option<&str>) -> Option<String> {
    s.map(str::trim).filter(|s| !s.is_empty()).map(str::to_string)
}

fn validate_new_booking(requester: &Principal, req: &NewBooking) -> Result<(), AppError> {
    let mut errors = vec![];
    if req.slot_id.trim().is_empty() {
        errors.push(FieldError::new("slot_id", "is required"));
    }
    if req.rental_type.trim().is_empty() {
        errors.push(FieldError::new("rental_type", "is required"));
    }
    if req.band_name.as_ref().is_some_and(|b| b.len() > MAX_BAND_NAME_LEN) {
        errors.push(FieldError::new("band_name", "too long"));
    }
    if req.notes.as_ref().is_some_and(|n| n.len() > MAX_NOTES_LEN) {
        errors.push(FieldError::new("notes", "too long"));
    }
    if requester.name.trim().is_empty() {
        errors.push(FieldError::new("user_name", "is required"));
    }
    if !requester.email.contains('@') {
        errors.push(FieldError::new("user_email", "must be an email address"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(AppError::Validation(errors))
    }
}
