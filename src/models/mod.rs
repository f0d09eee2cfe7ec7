pub mod booking;
pub mod business_hours;
pub mod notice;
pub mod principal;
pub mod revenue;
pub mod settings;
pub mod slot;

pub use booking::{Booking, BookingStatus, PaymentStatus};
pub use business_hours::{BusinessHours, OpeningWindow};
pub use notice::{Notice, NoticeKind};
pub use principal::{Principal, Role};
pub use revenue::{RevenueReport, SlotRevenue};
pub use settings::{AdminSettings, PricedItem, RentalRate, FALLBACK_PRICE};
pub use slot::{DateQuery, Slot, SlotAvailability};
