use chrono::NaiveDate;
use rusqlite::Connection;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::RevenueReport;

/// Revenue over confirmed, paid bookings whose slot date falls in `[start, end]`.
pub fn compute_revenue(
    conn: &Connection,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<RevenueReport, AppError> {
    if start > end {
        return Err(AppError::invalid("end_date", "must not be before start_date"));
    }

    let (total_revenue, booking_count) = queries::revenue_totals(conn, &start, &end)?;
    let by_slot = queries::revenue_by_slot(conn, &start, &end)?;

    let average_price = if booking_count > 0 {
        total_revenue as f64 / booking_count as f64
    } else {
        0.0
    };

    Ok(RevenueReport {
        start_date: start,
        end_date: end,
        total_revenue,
        booking_count,
        average_price,
        by_slot,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::models::{Booking, BookingStatus, PaymentStatus};
    use chrono::{NaiveTime, Utc};

    fn setup_db() -> Connection {
        db::init_db(":memory:").unwrap()
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn insert(
        conn: &Connection,
        day: &str,
        start: &str,
        price: i64,
        status: BookingStatus,
        payment: PaymentStatus,
    ) {
        let now = Utc::now().naive_utc();
        let start_time = NaiveTime::parse_from_str(start, "%H:%M").unwrap();
        let booking = Booking {
            id: uuid::Uuid::new_v4().to_string(),
            // Distinct slot per row keeps the active-booking index out of the way
            slot_id: uuid::Uuid::new_v4().to_string(),
            slot_date: date(day),
            start_time,
            end_time: start_time + chrono::Duration::minutes(60),
            user_id: "u1".to_string(),
            user_name: "Asha".to_string(),
            user_email: "asha@example.com".to_string(),
            rental_type: "rehearsal".to_string(),
            price,
            payment_status: payment,
            booking_status: status,
            band_name: None,
            notes: None,
            created_at: now,
            updated_at: now,
        };
        queries::insert_booking_unchecked(conn, &booking).unwrap();
    }

    #[test]
    fn test_only_confirmed_and_paid_count() {
        let conn = setup_db();
        insert(&conn, "2024-06-01", "10:00", 500, BookingStatus::Confirmed, PaymentStatus::Paid);
        insert(&conn, "2024-06-01", "11:00", 700, BookingStatus::Pending, PaymentStatus::Pending);
        insert(&conn, "2024-06-01", "12:00", 900, BookingStatus::Confirmed, PaymentStatus::Pending);
        insert(&conn, "2024-06-01", "13:00", 800, BookingStatus::Cancelled, PaymentStatus::Paid);
        insert(&conn, "2024-06-01", "14:00", 600, BookingStatus::Rejected, PaymentStatus::Paid);

        let report = compute_revenue(&conn, date("2024-06-01"), date("2024-06-01")).unwrap();
        assert_eq!(report.total_revenue, 500);
        assert_eq!(report.booking_count, 1);
        assert_eq!(report.average_price, 500.0);
    }

    #[test]
    fn test_range_and_busiest_slots() {
        let conn = setup_db();
        insert(&conn, "2024-06-01", "10:00", 500, BookingStatus::Confirmed, PaymentStatus::Paid);
        insert(&conn, "2024-06-01", "10:00", 1200, BookingStatus::Confirmed, PaymentStatus::Paid);
        insert(&conn, "2024-06-02", "18:00", 800, BookingStatus::Confirmed, PaymentStatus::Paid);
        insert(&conn, "2024-06-05", "18:00", 800, BookingStatus::Confirmed, PaymentStatus::Paid);

        let report = compute_revenue(&conn, date("2024-06-01"), date("2024-06-02")).unwrap();
        assert_eq!(report.total_revenue, 2500);
        assert_eq!(report.booking_count, 3);
        assert!((report.average_price - 2500.0 / 3.0).abs() < 1e-9);

        assert_eq!(report.by_slot.len(), 2);
        assert_eq!(report.by_slot[0].date, date("2024-06-01"));
        assert_eq!(report.by_slot[0].count, 2);
        assert_eq!(report.by_slot[0].revenue, 1700);
        assert_eq!(report.by_slot[1].count, 1);
    }

    #[test]
    fn test_empty_range() {
        let conn = setup_db();
        let report = compute_revenue(&conn, date("2024-01-01"), date("2024-01-31")).unwrap();
        assert_eq!(report.total_revenue, 0);
        assert_eq!(report.booking_count, 0);
        assert_eq!(report.average_price, 0.0);
        assert!(report.by_slot.is_empty());
    }

    #[test]
    fn test_backwards_range_rejected() {
        let conn = setup_db();
        assert!(matches!(
            compute_revenue(&conn, date("2024-02-01"), date("2024-01-01")),
            Err(AppError::Validation(_))
        ));
    }
}
