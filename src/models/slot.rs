use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const TIME_FORMAT: &str = "%H:%M";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Slot {
    pub id: String,
    pub date: NaiveDate,
    #[serde(with = "hhmm")]
    pub start_time: NaiveTime,
    #[serde(with = "hhmm")]
    pub end_time: NaiveTime,
    pub is_blocked: bool,
    pub created_at: NaiveDateTime,
}

/// A slot as seen by availability queries.
#[derive(Debug, Clone, Serialize)]
pub struct SlotAvailability {
    #[serde(flatten)]
    pub slot: Slot,
    pub is_booked: bool,
    pub confirmed_booking_id: Option<String>,
    pub pending_count: i64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DateQuery {
    Single(NaiveDate),
    Range(NaiveDate, NaiveDate),
}

impl DateQuery {
    /// Inclusive bounds.
    pub fn bounds(&self) -> (NaiveDate, NaiveDate) {
        match *self {
            DateQuery::Single(d) => (d, d),
            DateQuery::Range(start, end) => (start, end),
        }
    }
}

pub fn format_date(d: &NaiveDate) -> String {
    d.format(DATE_FORMAT).to_string()
}

pub fn format_time(t: &NaiveTime) -> String {
    t.format(TIME_FORMAT).to_string()
}

pub fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), DATE_FORMAT).ok()
}

/// Accepts `HH:MM`, and `HH:MM:SS` from older clients. Seconds are dropped.
pub fn parse_time(s: &str) -> Option<NaiveTime> {
    let s = s.trim();
    NaiveTime::parse_from_str(s, TIME_FORMAT)
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M:%S"))
        .ok()
        .map(to_minute)
}

/// Slot times are stored at minute precision.
pub fn to_minute(t: NaiveTime) -> NaiveTime {
    NaiveTime::from_hms_opt(t.hour(), t.minute(), 0).unwrap_or(t)
}

pub(crate) mod hhmm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(t: &NaiveTime, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&super::format_time(t))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(d)?;
        super::parse_time(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid time: {raw}")))
    }
}
