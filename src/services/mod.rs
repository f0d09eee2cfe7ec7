pub mod booking;
pub mod calendar;
pub mod mail;
pub mod messaging;
pub mod notify;
pub mod revenue;
pub mod settings;
pub mod slots;
