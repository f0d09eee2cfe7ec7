use crate::models::Booking;

/// iCalendar invite for a booking's slot interval. Times are studio-local (floating).
pub fn generate_invite(booking: &Booking, studio_name: &str, attendees: &[String]) -> String {
    let dtstart = booking.starts_at().format("%Y%m%dT%H%M%S").to_string();
    let dtend = booking.ends_at().format("%Y%m%dT%H%M%S").to_string();
    let dtstamp = booking.updated_at.format("%Y%m%dT%H%M%S").to_string();
    let uid = format!("{}@studiobook", booking.id);

    let summary = escape_text(&match &booking.band_name {
        Some(band) => format!("{} session at {studio_name} ({band})", booking.rental_type),
        None => format!("{} session at {studio_name}", booking.rental_type),
    });
    let description = escape_text(booking.notes.as_deref().unwrap_or("No additional notes"));

    let mut attendee_lines = String::new();
    for email in attendees {
        attendee_lines.push_str(&format!("ATTENDEE;RSVP=FALSE:mailto:{email}\r\n"));
    }

    format!(
        "BEGIN:VCALENDAR\r\n\
         VERSION:2.0\r\n\
         PRODID:-//Studiobook//Booking Engine//EN\r\n\
         METHOD:REQUEST\r\n\
         BEGIN:VEVENT\r\n\
         UID:{uid}\r\n\
         DTSTAMP:{dtstamp}\r\n\
         DTSTART:{dtstart}\r\n\
         DTEND:{dtend}\r\n\
         SUMMARY:{summary}\r\n\
         DESCRIPTION:{description}\r\n\
         {attendee_lines}\
         STATUS:CONFIRMED\r\n\
         END:VEVENT\r\n\
         END:VCALENDAR\r\n"
    )
}

fn escape_text(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace(';', "\\;")
        .replace(',', "\\,")
        .replace('\n', "\\n")
}
