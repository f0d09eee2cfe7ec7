use chrono::{Datelike, NaiveDate, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};

use super::slot::parse_time;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OpeningWindow {
    pub day: String,
    pub start: String,
    pub end: String,
}

/// Weekly opening windows, e.g. `mon 10:00-22:00`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct BusinessHours {
    pub windows: Vec<OpeningWindow>,
}

const DAY_ORDER: [&str; 7] = ["mon", "tue", "wed", "thu", "fri", "sat", "sun"];

impl BusinessHours {
    pub fn daily(start: &str, end: &str) -> Self {
        Self {
            windows: DAY_ORDER
                .iter()
                .map(|d| OpeningWindow {
                    day: d.to_string(),
                    start: start.to_string(),
                    end: end.to_string(),
                })
                .collect(),
        }
    }

    pub fn from_json(s: &str) -> anyhow::Result<Self> {
        let hours: BusinessHours = serde_json::from_str(s)?;
        hours.validate()?;
        Ok(hours)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        for window in &self.windows {
            parse_weekday(&window.day)?;
            let start = parse_time(&window.start)
                .ok_or_else(|| anyhow::anyhow!("invalid time: {}", window.start))?;
            let end = parse_time(&window.end)
                .ok_or_else(|| anyhow::anyhow!("invalid time: {}", window.end))?;
            if end <= start {
                anyhow::bail!("window on {} ends before it starts", window.day);
            }
        }
        Ok(())
    }

    /// Opening window for the weekday of `date`, if the studio is open that day.
    pub fn window_for(&self, date: &NaiveDate) -> Option<(NaiveTime, NaiveTime)> {
        let weekday = weekday_key(date.weekday());
        self.windows
            .iter()
            .find(|w| w.day.to_lowercase() == weekday)
            .and_then(|w| Some((parse_time(&w.start)?, parse_time(&w.end)?)))
    }

    pub fn to_human_readable(&self) -> String {
        let mut sorted = self.windows.clone();
        sorted.sort_by_key(|w| {
            DAY_ORDER
                .iter()
                .position(|d| *d == w.day.to_lowercase())
                .unwrap_or(DAY_ORDER.len())
        });

        sorted
            .iter()
            .map(|w| format!("{}: {}-{}", capitalize(&w.day), w.start, w.end))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

fn weekday_key(day: Weekday) -> &'static str {
    DAY_ORDER[day.num_days_from_monday() as usize]
}

fn capitalize(s: &str) -> String {
    let mut c = s.chars();
    match c.next() {
        None => String::new(),
        Some(f) => f.to_uppercase().to_string() + &c.as_str().to_lowercase(),
    }
}

fn parse_weekday(s: &str) -> anyhow::Result<()> {
    if DAY_ORDER.contains(&s.to_lowercase().as_str()) {
        Ok(())
    } else {
        Err(anyhow::anyhow!("invalid weekday: {s}"))
    }
}
