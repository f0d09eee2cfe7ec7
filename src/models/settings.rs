use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::business_hours::BusinessHours;
use crate::errors::FieldError;

/// Charged when a rental type cannot be priced from the rate table.
pub const FALLBACK_PRICE: i64 = 500;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PricedItem {
    pub name: String,
    pub price: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RentalRate {
    pub name: String,
    pub base_price: i64,
    #[serde(default)]
    pub items: Vec<PricedItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AdminSettings {
    pub rate_table: Vec<RentalRate>,
    pub business_hours: BusinessHours,
    pub slot_duration_minutes: i64,
    pub admin_emails: Vec<String>,
    pub whatsapp_recipients: Vec<String>,
    pub upi_id: String,
    pub upi_name: String,
    pub gst_enabled: bool,
    pub gst_rate: f64,
}

impl Default for AdminSettings {
    fn default() -> Self {
        Self {
            rate_table: vec![
                RentalRate {
                    name: "rehearsal".to_string(),
                    base_price: 500,
                    items: vec![],
                },
                RentalRate {
                    name: "recording".to_string(),
                    base_price: 1200,
                    items: vec![PricedItem {
                        name: "mixing".to_string(),
                        price: 800,
                    }],
                },
                RentalRate {
                    name: "podcast".to_string(),
                    base_price: 800,
                    items: vec![],
                },
            ],
            business_hours: BusinessHours::daily("10:00", "22:00"),
            slot_duration_minutes: 60,
            admin_emails: vec![],
            whatsapp_recipients: vec![],
            upi_id: String::new(),
            upi_name: String::new(),
            gst_enabled: false,
            gst_rate: 18.0,
        }
    }
}

impl AdminSettings {
    /// Rental type lookup is case-insensitive and ignores surrounding whitespace.
    pub fn rate_for(&self, rental_type: &str) -> Option<&RentalRate> {
        let wanted = rental_type.trim();
        self.rate_table
            .iter()
            .find(|r| r.name.eq_ignore_ascii_case(wanted))
    }

    pub fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut errors = vec![];

        let mut seen = HashSet::new();
        for rate in &self.rate_table {
            let name = rate.name.trim().to_lowercase();
            if name.is_empty() {
                errors.push(FieldError::new("rate_table", "rental type name is required"));
            } else if !seen.insert(name) {
                errors.push(FieldError::new(
                    "rate_table",
                    format!("duplicate rental type: {}", rate.name),
                ));
            }
            if rate.base_price < 0 || rate.items.iter().any(|i| i.price < 0) {
                errors.push(FieldError::new(
                    "rate_table",
                    format!("negative price for {}", rate.name),
                ));
            }
        }

        if let Err(e) = self.business_hours.validate() {
            errors.push(FieldError::new("business_hours", e.to_string()));
        }
        if !(1..=1440).contains(&self.slot_duration_minutes) {
            errors.push(FieldError::new(
                "slot_duration_minutes",
                "must be between 1 and 1440",
            ));
        }
        if !(0.0..=100.0).contains(&self.gst_rate) {
            errors.push(FieldError::new("gst_rate", "must be between 0 and 100"));
        }
        if self.admin_emails.iter().any(|e| !e.contains('@')) {
            errors.push(FieldError::new("admin_emails", "invalid email address"));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
