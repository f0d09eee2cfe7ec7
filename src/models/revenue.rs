use chrono::{NaiveDate, NaiveTime};
use serde::Serialize;

use super::slot::hhmm;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SlotRevenue {
    pub date: NaiveDate,
    #[serde(with = "hhmm")]
    pub start_time: NaiveTime,
    pub count: i64,
    pub revenue: i64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RevenueReport {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub total_revenue: i64,
    pub booking_count: i64,
    pub average_price: f64,
    /// Busiest (date, start time) pairs first.
    pub by_slot: Vec<SlotRevenue>,
}
