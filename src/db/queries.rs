use anyhow::Context;
use chrono::{NaiveDate, NaiveDateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use crate::models::slot::{format_date, format_time, parse_date, parse_time};
use crate::models::{
    AdminSettings, Booking, BookingStatus, PaymentStatus, Slot, SlotAvailability, SlotRevenue,
};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

fn now_str() -> String {
    Utc::now().naive_utc().format(TIMESTAMP_FORMAT).to_string()
}

fn parse_timestamp(s: &str) -> anyhow::Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT)
        .with_context(|| format!("invalid timestamp in store: {s}"))
}

fn parse_stored_date(s: &str) -> anyhow::Result<NaiveDate> {
    parse_date(s).ok_or_else(|| anyhow::anyhow!("invalid date in store: {s}"))
}

fn parse_stored_time(s: &str) -> anyhow::Result<chrono::NaiveTime> {
    parse_time(s).ok_or_else(|| anyhow::anyhow!("invalid time in store: {s}"))
}

// ── Slots ──

const SLOT_COLUMNS: &str = "s.id, s.date, s.start_time, s.end_time, s.is_blocked, s.created_at";

pub fn insert_slot(conn: &Connection, slot: &Slot) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO slots (id, date, start_time, end_time, is_blocked, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            slot.id,
            format_date(&slot.date),
            format_time(&slot.start_time),
            format_time(&slot.end_time),
            slot.is_blocked as i32,
            slot.created_at.format(TIMESTAMP_FORMAT).to_string(),
        ],
    )?;
    Ok(())
}

/// Returns false when a slot with the same (date, start_time) already exists.
pub fn insert_slot_if_absent(conn: &Connection, slot: &Slot) -> anyhow::Result<bool> {
    let count = conn.execute(
        "INSERT INTO slots (id, date, start_time, end_time, is_blocked, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)
         ON CONFLICT(date, start_time) DO NOTHING",
        params![
            slot.id,
            format_date(&slot.date),
            format_time(&slot.start_time),
            format_time(&slot.end_time),
            slot.is_blocked as i32,
            slot.created_at.format(TIMESTAMP_FORMAT).to_string(),
        ],
    )?;
    Ok(count > 0)
}

pub fn get_slot(conn: &Connection, id: &str) -> anyhow::Result<Option<Slot>> {
    let result = conn
        .query_row(
            &format!("SELECT {SLOT_COLUMNS} FROM slots s WHERE s.id = ?1"),
            params![id],
            |row| Ok(parse_slot_row(row)),
        )
        .optional()?;

    result.transpose()
}

pub fn list_slot_availability(
    conn: &Connection,
    start: &NaiveDate,
    end: &NaiveDate,
    include_blocked: bool,
) -> anyhow::Result<Vec<SlotAvailability>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {SLOT_COLUMNS},
            (SELECT b.id FROM bookings b
             WHERE b.slot_id = s.id AND b.booking_status = 'confirmed' LIMIT 1),
            (SELECT COUNT(*) FROM bookings b
             WHERE b.slot_id = s.id AND b.booking_status = 'pending')
         FROM slots s
         WHERE s.date >= ?1 AND s.date <= ?2 AND (?3 = 1 OR s.is_blocked = 0)
         ORDER BY s.date ASC, s.start_time ASC"
    ))?;

    let rows = stmt.query_map(
        params![format_date(start), format_date(end), include_blocked as i32],
        |row| {
            let confirmed: Option<String> = row.get(6)?;
            let pending_count: i64 = row.get(7)?;
            Ok(parse_slot_row(row).map(|slot| SlotAvailability {
                slot,
                is_booked: confirmed.is_some(),
                confirmed_booking_id: confirmed,
                pending_count,
            }))
        },
    )?;

    let mut slots = vec![];
    for row in rows {
        slots.push(row??);
    }
    Ok(slots)
}

/// Blocking is refused in the same statement when a confirmed booking holds the slot.
/// Returns the number of rows changed.
pub fn set_slot_blocked(conn: &Connection, id: &str, blocked: bool) -> anyhow::Result<usize> {
    let count = if blocked {
        conn.execute(
            "UPDATE slots SET is_blocked = 1
             WHERE id = ?1 AND NOT EXISTS (
                 SELECT 1 FROM bookings
                 WHERE slot_id = ?1 AND booking_status = 'confirmed'
             )",
            params![id],
        )?
    } else {
        conn.execute(
            "UPDATE slots SET is_blocked = 0 WHERE id = ?1",
            params![id],
        )?
    };
    Ok(count)
}

/// Deletes the slot unless an active booking references it.
pub fn delete_slot_if_idle(conn: &Connection, id: &str) -> anyhow::Result<bool> {
    let count = conn.execute(
        "DELETE FROM slots
         WHERE id = ?1 AND NOT EXISTS (
             SELECT 1 FROM bookings
             WHERE slot_id = ?1 AND booking_status IN ('pending', 'confirmed')
         )",
        params![id],
    )?;
    Ok(count > 0)
}

pub fn slot_has_booking_with_status(
    conn: &Connection,
    slot_id: &str,
    statuses: &[BookingStatus],
) -> anyhow::Result<bool> {
    let placeholders = statuses
        .iter()
        .map(|s| format!("'{}'", s.as_str()))
        .collect::<Vec<_>>()
        .join(", ");
    let count: i64 = conn.query_row(
        &format!(
            "SELECT COUNT(*) FROM bookings WHERE slot_id = ?1 AND booking_status IN ({placeholders})"
        ),
        params![slot_id],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

fn parse_slot_row(row: &rusqlite::Row) -> anyhow::Result<Slot> {
    let date_str: String = row.get(1)?;
    let start_str: String = row.get(2)?;
    let end_str: String = row.get(3)?;
    let created_at_str: String = row.get(5)?;

    Ok(Slot {
        id: row.get(0)?,
        date: parse_stored_date(&date_str)?,
        start_time: parse_stored_time(&start_str)?,
        end_time: parse_stored_time(&end_str)?,
        is_blocked: row.get::<_, i32>(4)? != 0,
        created_at: parse_timestamp(&created_at_str)?,
    })
}

// ── Bookings ──

const BOOKING_COLUMNS: &str = "id, slot_id, slot_date, start_time, end_time, user_id, user_name, user_email, \
     rental_type, price, payment_status, booking_status, band_name, notes, created_at, updated_at";

/// Test fixture: writes the row as given, without the open-slot guard.
#[cfg(test)]
pub(crate) fn insert_booking_unchecked(conn: &Connection, booking: &Booking) -> anyhow::Result<()> {
    conn.execute(
        &format!(
            "INSERT INTO bookings ({BOOKING_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)"
        ),
        params![
            booking.id,
            booking.slot_id,
            format_date(&booking.slot_date),
            format_time(&booking.start_time),
            format_time(&booking.end_time),
            booking.user_id,
            booking.user_name,
            booking.user_email,
            booking.rental_type,
            booking.price,
            booking.payment_status.as_str(),
            booking.booking_status.as_str(),
            booking.band_name,
            booking.notes,
            booking.created_at.format(TIMESTAMP_FORMAT).to_string(),
            booking.updated_at.format(TIMESTAMP_FORMAT).to_string(),
        ],
    )?;
    Ok(())
}

/// Inserts the booking only while its slot exists and is unblocked; the partial unique
/// index rejects a second active booking. Returns false when the slot guard failed.
pub fn create_booking_on_open_slot(conn: &Connection, booking: &Booking) -> anyhow::Result<bool> {
    let count = conn.execute(
        &format!(
            "INSERT INTO bookings ({BOOKING_COLUMNS})
             SELECT ?1, s.id, s.date, s.start_time, s.end_time, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12
             FROM slots s WHERE s.id = ?13 AND s.is_blocked = 0"
        ),
        params![
            booking.id,
            booking.user_id,
            booking.user_name,
            booking.user_email,
            booking.rental_type,
            booking.price,
            booking.payment_status.as_str(),
            booking.booking_status.as_str(),
            booking.band_name,
            booking.notes,
            booking.created_at.format(TIMESTAMP_FORMAT).to_string(),
            booking.updated_at.format(TIMESTAMP_FORMAT).to_string(),
            booking.slot_id,
        ],
    )?;
    Ok(count > 0)
}

pub fn get_booking_by_id(conn: &Connection, id: &str) -> anyhow::Result<Option<Booking>> {
    let result = conn
        .query_row(
            &format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = ?1"),
            params![id],
            |row| Ok(parse_booking_row(row)),
        )
        .optional()?;

    result.transpose()
}

pub fn get_bookings_for_user(conn: &Connection, user_id: &str) -> anyhow::Result<Vec<Booking>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {BOOKING_COLUMNS} FROM bookings WHERE user_id = ?1
         ORDER BY slot_date DESC, start_time DESC"
    ))?;

    let rows = stmt.query_map(params![user_id], |row| Ok(parse_booking_row(row)))?;

    let mut bookings = vec![];
    for row in rows {
        bookings.push(row??);
    }
    Ok(bookings)
}

pub fn get_all_bookings(
    conn: &Connection,
    status_filter: Option<BookingStatus>,
    limit: i64,
) -> anyhow::Result<Vec<Booking>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {BOOKING_COLUMNS} FROM bookings
         WHERE (?1 IS NULL OR booking_status = ?1)
         ORDER BY slot_date DESC, start_time DESC LIMIT ?2"
    ))?;

    let rows = stmt.query_map(
        params![status_filter.map(|s| s.as_str()), limit],
        |row| Ok(parse_booking_row(row)),
    )?;

    let mut bookings = vec![];
    for row in rows {
        bookings.push(row??);
    }
    Ok(bookings)
}

/// Conditional status change: applies only while the booking is in one of `from`.
/// Returns false when no row matched (missing booking or status moved on).
pub fn transition_booking(
    conn: &Connection,
    id: &str,
    from: &[BookingStatus],
    to: BookingStatus,
    payment: Option<PaymentStatus>,
    append_note: Option<&str>,
) -> anyhow::Result<bool> {
    let allowed = from
        .iter()
        .map(|s| format!("'{}'", s.as_str()))
        .collect::<Vec<_>>()
        .join(", ");

    let count = conn.execute(
        &format!(
            "UPDATE bookings SET
                booking_status = ?1,
                payment_status = COALESCE(?2, payment_status),
                notes = CASE
                    WHEN ?3 IS NULL THEN notes
                    WHEN notes IS NULL OR notes = '' THEN ?3
                    ELSE notes || char(10) || ?3
                END,
                updated_at = ?4
             WHERE id = ?5 AND booking_status IN ({allowed})"
        ),
        params![
            to.as_str(),
            payment.map(|p| p.as_str()),
            append_note,
            now_str(),
            id,
        ],
    )?;
    Ok(count > 0)
}

/// PENDING -> CONFIRMED + PAID, only while the booking's slot is unblocked.
pub fn confirm_booking_on_open_slot(conn: &Connection, id: &str) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE bookings SET booking_status = 'confirmed', payment_status = 'paid', updated_at = ?1
         WHERE id = ?2 AND booking_status = 'pending'
           AND NOT EXISTS (
               SELECT 1 FROM slots WHERE slots.id = bookings.slot_id AND slots.is_blocked = 1
           )",
        params![now_str(), id],
    )?;
    Ok(count > 0)
}

fn parse_booking_row(row: &rusqlite::Row) -> anyhow::Result<Booking> {
    let slot_date_str: String = row.get(2)?;
    let start_str: String = row.get(3)?;
    let end_str: String = row.get(4)?;
    let payment_str: String = row.get(10)?;
    let status_str: String = row.get(11)?;
    let created_at_str: String = row.get(14)?;
    let updated_at_str: String = row.get(15)?;

    Ok(Booking {
        id: row.get(0)?,
        slot_id: row.get(1)?,
        slot_date: parse_stored_date(&slot_date_str)?,
        start_time: parse_stored_time(&start_str)?,
        end_time: parse_stored_time(&end_str)?,
        user_id: row.get(5)?,
        user_name: row.get(6)?,
        user_email: row.get(7)?,
        rental_type: row.get(8)?,
        price: row.get(9)?,
        payment_status: PaymentStatus::parse(&payment_str)
            .ok_or_else(|| anyhow::anyhow!("invalid payment status in store: {payment_str}"))?,
        booking_status: BookingStatus::parse(&status_str)
            .ok_or_else(|| anyhow::anyhow!("invalid booking status in store: {status_str}"))?,
        band_name: row.get(12)?,
        notes: row.get(13)?,
        created_at: parse_timestamp(&created_at_str)?,
        updated_at: parse_timestamp(&updated_at_str)?,
    })
}

// ── Revenue ──

const REVENUE_FILTER: &str = "booking_status = 'confirmed' AND payment_status = 'paid' \
     AND slot_date >= ?1 AND slot_date <= ?2";

/// (total revenue, booking count) over paid, confirmed bookings.
pub fn revenue_totals(
    conn: &Connection,
    start: &NaiveDate,
    end: &NaiveDate,
) -> anyhow::Result<(i64, i64)> {
    let totals = conn.query_row(
        &format!("SELECT COALESCE(SUM(price), 0), COUNT(*) FROM bookings WHERE {REVENUE_FILTER}"),
        params![format_date(start), format_date(end)],
        |row| Ok((row.get(0)?, row.get(1)?)),
    )?;
    Ok(totals)
}

pub fn revenue_by_slot(
    conn: &Connection,
    start: &NaiveDate,
    end: &NaiveDate,
) -> anyhow::Result<Vec<SlotRevenue>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT slot_date, start_time, COUNT(*) AS n, COALESCE(SUM(price), 0)
         FROM bookings WHERE {REVENUE_FILTER}
         GROUP BY slot_date, start_time
         ORDER BY n DESC, slot_date ASC, start_time ASC"
    ))?;

    let rows = stmt.query_map(params![format_date(start), format_date(end)], |row| {
        let date_str: String = row.get(0)?;
        let start_str: String = row.get(1)?;
        let count: i64 = row.get(2)?;
        let revenue: i64 = row.get(3)?;
        Ok((date_str, start_str, count, revenue))
    })?;

    let mut result = vec![];
    for row in rows {
        let (date_str, start_str, count, revenue) = row?;
        result.push(SlotRevenue {
            date: parse_stored_date(&date_str)?,
            start_time: parse_stored_time(&start_str)?,
            count,
            revenue,
        });
    }
    Ok(result)
}

// ── Admin Settings ──

/// Seeds the singleton row. Safe to call repeatedly; returns true only when it created the row.
pub fn ensure_settings(conn: &Connection) -> anyhow::Result<bool> {
    let defaults = AdminSettings::default();
    let count = conn.execute(
        "INSERT INTO admin_settings (id, rate_table, business_hours, slot_duration_minutes,
            admin_emails, whatsapp_recipients, upi_id, upi_name, gst_enabled, gst_rate)
         VALUES (1, ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
         ON CONFLICT(id) DO NOTHING",
        params![
            serde_json::to_string(&defaults.rate_table)?,
            serde_json::to_string(&defaults.business_hours)?,
            defaults.slot_duration_minutes,
            serde_json::to_string(&defaults.admin_emails)?,
            serde_json::to_string(&defaults.whatsapp_recipients)?,
            defaults.upi_id,
            defaults.upi_name,
            defaults.gst_enabled as i32,
            defaults.gst_rate,
        ],
    )?;
    Ok(count > 0)
}

pub fn get_settings(conn: &Connection) -> anyhow::Result<AdminSettings> {
    let row = conn
        .query_row(
            "SELECT rate_table, business_hours, slot_duration_minutes, admin_emails,
                whatsapp_recipients, upi_id, upi_name, gst_enabled, gst_rate
             FROM admin_settings WHERE id = 1",
            [],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, i64>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, String>(5)?,
                    row.get::<_, String>(6)?,
                    row.get::<_, i32>(7)?,
                    row.get::<_, f64>(8)?,
                ))
            },
        )
        .optional()?;

    let Some((rates, hours, duration, admins, whatsapp, upi_id, upi_name, gst_enabled, gst_rate)) =
        row
    else {
        anyhow::bail!("admin settings have not been initialised");
    };

    Ok(AdminSettings {
        rate_table: serde_json::from_str(&rates).context("invalid rate table in store")?,
        business_hours: serde_json::from_str(&hours).context("invalid business hours in store")?,
        slot_duration_minutes: duration,
        admin_emails: serde_json::from_str(&admins).context("invalid admin emails in store")?,
        whatsapp_recipients: serde_json::from_str(&whatsapp)
            .context("invalid whatsapp recipients in store")?,
        upi_id,
        upi_name,
        gst_enabled: gst_enabled != 0,
        gst_rate,
    })
}

pub fn save_settings(conn: &Connection, settings: &AdminSettings) -> anyhow::Result<()> {
    conn.execute(
        "UPDATE admin_settings SET
            rate_table = ?1,
            business_hours = ?2,
            slot_duration_minutes = ?3,
            admin_emails = ?4,
            whatsapp_recipients = ?5,
            upi_id = ?6,
            upi_name = ?7,
            gst_enabled = ?8,
            gst_rate = ?9,
            updated_at = datetime('now')
         WHERE id = 1",
        params![
            serde_json::to_string(&settings.rate_table)?,
            serde_json::to_string(&settings.business_hours)?,
            settings.slot_duration_minutes,
            serde_json::to_string(&settings.admin_emails)?,
            serde_json::to_string(&settings.whatsapp_recipients)?,
            settings.upi_id,
            settings.upi_name,
            settings.gst_enabled as i32,
            settings.gst_rate,
        ],
    )?;
    Ok(())
}
