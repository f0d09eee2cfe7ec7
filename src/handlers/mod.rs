pub mod admin;
pub mod auth;
pub mod bookings;
pub mod calendar;
pub mod health;
pub mod slots;

use std::sync::Arc;

use axum::routing::{delete, get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route("/api/slots", get(slots::list_available))
        .route("/api/settings", get(admin::public_settings))
        .route("/api/bookings", post(bookings::create_booking))
        .route("/api/bookings/mine", get(bookings::my_bookings))
        .route("/api/bookings/:id/cancel", post(bookings::cancel_booking))
        .route(
            "/api/admin/slots",
            get(slots::list_all).post(slots::create_slot),
        )
        .route("/api/admin/slots/bulk", post(slots::create_bulk))
        .route("/api/admin/slots/:id", delete(slots::delete_slot))
        .route("/api/admin/slots/:id/block", post(slots::set_blocked))
        .route("/api/admin/bookings", get(admin::get_bookings))
        .route(
            "/api/admin/bookings/:id/approve",
            post(admin::approve_booking),
        )
        .route(
            "/api/admin/bookings/:id/reject",
            post(admin::reject_booking),
        )
        .route(
            "/api/admin/settings",
            get(admin::get_settings).post(admin::update_settings),
        )
        .route("/api/admin/revenue", get(admin::get_revenue))
        .route("/calendar/:booking_id", get(calendar::download_ics))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
