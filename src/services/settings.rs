use rusqlite::Connection;
use serde::Deserialize;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::{AdminSettings, BusinessHours, RentalRate};

/// Partial update; absent fields keep their stored value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SettingsPatch {
    pub rate_table: Option<Vec<RentalRate>>,
    pub business_hours: Option<BusinessHours>,
    pub slot_duration_minutes: Option<i64>,
    pub admin_emails: Option<Vec<String>>,
    pub whatsapp_recipients: Option<Vec<String>>,
    pub upi_id: Option<String>,
    pub upi_name: Option<String>,
    pub gst_enabled: Option<bool>,
    pub gst_rate: Option<f64>,
}

pub fn get_settings(conn: &Connection) -> Result<AdminSettings, AppError> {
    Ok(queries::get_settings(conn)?)
}

pub fn update_settings(conn: &Connection, patch: SettingsPatch) -> Result<AdminSettings, AppError> {
    let mut settings = queries::get_settings(conn)?;

    if let Some(rates) = patch.rate_table {
        settings.rate_table = rates
            .into_iter()
            .map(|r| RentalRate {
                name: r.name.trim().to_string(),
                ..r
            })
            .collect();
    }
    if let Some(hours) = patch.business_hours {
        settings.business_hours = hours;
    }
    if let Some(duration) = patch.slot_duration_minutes {
        settings.slot_duration_minutes = duration;
    }
    if let Some(emails) = patch.admin_emails {
        settings.admin_emails = clean_list(emails);
    }
    if let Some(numbers) = patch.whatsapp_recipients {
        settings.whatsapp_recipients = clean_list(numbers);
    }
    if let Some(upi_id) = patch.upi_id {
        settings.upi_id = upi_id.trim().to_string();
    }
    if let Some(upi_name) = patch.upi_name {
        settings.upi_name = upi_name.trim().to_string();
    }
    if let Some(enabled) = patch.gst_enabled {
        settings.gst_enabled = enabled;
    }
    if let Some(rate) = patch.gst_rate {
        settings.gst_rate = rate;
    }

    settings.validate().map_err(AppError::Validation)?;
    queries::save_settings(conn, &settings)?;

    tracing::info!(
        rental_types = settings.rate_table.len(),
        admins = settings.admin_emails.len(),
        "admin settings updated"
    );
    Ok(settings)
}

fn clean_list(items: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = vec![];
    for item in items {
        let item = item.trim().to_string();
        if !item.is_empty() && !out.contains(&item) {
            out.push(item);
        }
    }
    out
}
