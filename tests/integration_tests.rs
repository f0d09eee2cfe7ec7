use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use tower::ServiceExt;

use studiobook::config::AppConfig;
use studiobook::db;
use studiobook::handlers;
use studiobook::models::Notice;
use studiobook::services::mail::Mailer;
use studiobook::services::messaging::MessagingProvider;
use studiobook::services::notify::Notifier;
use studiobook::state::AppState;

// ── Mock Providers ──

type Outbox = Arc<Mutex<Vec<(String, String)>>>;

struct MockMailer {
    sent: Outbox,
}

#[async_trait]
impl Mailer for MockMailer {
    async fn send(&self, to: &str, notice: &Notice) -> anyhow::Result<()> {
        self.sent
            .lock()
            .unwrap()
            .push((to.to_string(), notice.kind.as_str().to_string()));
        Ok(())
    }
}

struct MockMessaging {
    sent: Outbox,
}

#[async_trait]
impl MessagingProvider for MockMessaging {
    async fn send_notice(&self, to: &str, notice: &Notice) -> anyhow::Result<()> {
        self.sent
            .lock()
            .unwrap()
            .push((to.to_string(), notice.kind.as_str().to_string()));
        Ok(())
    }
}

// ── Helpers ──

fn test_config() -> AppConfig {
    AppConfig {
        port: 3000,
        database_url: ":memory:".to_string(),
        admin_token: "test-token".to_string(),
        studio_name: "Test Studio".to_string(),
        store_timeout_secs: 1,
        mail_api_url: "".to_string(),
        mail_api_key: "".to_string(),
        mail_from: "".to_string(),
        twilio_account_sid: "".to_string(),
        twilio_auth_token: "".to_string(),
        twilio_whatsapp_from: "".to_string(),
    }
}

fn test_state_with_outboxes() -> (Arc<AppState>, Outbox, Outbox) {
    let config = test_config();
    let conn = db::init_db(":memory:").unwrap();
    let mail = Outbox::default();
    let whatsapp = Outbox::default();
    let notifier = Notifier::new(
        Arc::new(MockMailer {
            sent: Arc::clone(&mail),
        }),
        Arc::new(MockMessaging {
            sent: Arc::clone(&whatsapp),
        }),
        config.studio_name.clone(),
    );
    let state = Arc::new(AppState {
        db: Arc::new(Mutex::new(conn)),
        config,
        notifier,
    });
    (state, mail, whatsapp)
}

fn test_state() -> Arc<AppState> {
    test_state_with_outboxes().0
}

fn test_app(state: Arc<AppState>) -> Router {
    handlers::router(state)
}

fn admin_request(method: &str, uri: &str, body: Option<&str>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("Authorization", "Bearer test-token");
    match body {
        Some(json) => builder
            .header("Content-Type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

fn user_request(user: &str, method: &str, uri: &str, body: Option<&str>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("X-User-Id", user)
        .header("X-User-Name", format!("User {user}"))
        .header("X-User-Email", format!("{user}@example.com"));
    match body {
        Some(json) => builder
            .header("Content-Type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn send(state: &Arc<AppState>, req: Request<Body>) -> (StatusCode, serde_json::Value) {
    let res = test_app(state.clone()).oneshot(req).await.unwrap();
    let status = res.status();
    let body = axum::body::to_bytes(res.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if body.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null)
    };
    (status, json)
}

async fn create_slot(state: &Arc<AppState>, date: &str, start: &str, end: &str) -> String {
    let body = format!(r#"{{"date":"{date}","start_time":"{start}","end_time":"{end}"}}"#);
    let (status, json) = send(state, admin_request("POST", "/api/admin/slots", Some(&body))).await;
    assert_eq!(status, StatusCode::CREATED);
    json["id"].as_str().unwrap().to_string()
}

async fn request_booking(
    state: &Arc<AppState>,
    user: &str,
    slot_id: &str,
    rental_type: &str,
) -> (StatusCode, serde_json::Value) {
    let body = format!(r#"{{"slot_id":"{slot_id}","rental_type":"{rental_type}"}}"#);
    send(state, user_request(user, "POST", "/api/bookings", Some(&body))).await
}

async fn wait_for(outbox: &Outbox, count: usize) -> Vec<(String, String)> {
    for _ in 0..50 {
        if outbox.lock().unwrap().len() >= count {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    outbox.lock().unwrap().clone()
}

// ── Health ──

#[tokio::test]
async fn test_health() {
    let state = test_state();
    let (status, json) = send(
        &state,
        Request::builder().uri("/health").body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["ok"], true);
}

// ── Auth ──

#[tokio::test]
async fn test_requires_identity() {
    let state = test_state();
    let (status, json) = send(
        &state,
        Request::builder()
            .uri("/api/slots?date=2030-06-01")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["retryable"], false);
}

#[tokio::test]
async fn test_admin_wrong_token() {
    let state = test_state();
    let req = Request::builder()
        .uri("/api/admin/bookings")
        .header("Authorization", "Bearer wrong-token")
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&state, req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_user_cannot_use_admin_endpoints() {
    let state = test_state();

    let (status, _) = send(&state, user_request("u1", "GET", "/api/admin/bookings", None)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let body = r#"{"date":"2030-06-01","start_time":"10:00","end_time":"11:00"}"#;
    let (status, _) = send(&state, user_request("u1", "POST", "/api/admin/slots", Some(body))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(
        &state,
        user_request("u1", "POST", "/api/admin/bookings/whatever/approve", None),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

// ── Slots ──

#[tokio::test]
async fn test_slot_listing_and_blocking() {
    let state = test_state();
    let slot_id = create_slot(&state, "2030-06-01", "10:00", "11:00").await;
    create_slot(&state, "2030-06-01", "11:00", "12:00").await;

    let (status, json) = send(&state, user_request("u1", "GET", "/api/slots?date=2030-06-01", None)).await;
    assert_eq!(status, StatusCode::OK);
    let slots = json.as_array().unwrap();
    assert_eq!(slots.len(), 2);
    assert_eq!(slots[0]["start_time"], "10:00");
    assert_eq!(slots[0]["is_booked"], false);
    assert_eq!(slots[0]["pending_count"], 0);

    let (status, json) = send(
        &state,
        admin_request(
            "POST",
            &format!("/api/admin/slots/{slot_id}/block"),
            Some(r#"{"blocked":true}"#),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["is_blocked"], true);

    // Blocked slots are hidden from users but not from admins.
    let (_, json) = send(&state, user_request("u1", "GET", "/api/slots?date=2030-06-01", None)).await;
    assert_eq!(json.as_array().unwrap().len(), 1);
    let (_, json) = send(&state, admin_request("GET", "/api/admin/slots?date=2030-06-01", None)).await;
    assert_eq!(json.as_array().unwrap().len(), 2);

    let (status, _) = request_booking(&state, "u1", &slot_id, "rehearsal").await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_duplicate_slot_conflicts() {
    let state = test_state();
    create_slot(&state, "2030-06-01", "10:00", "11:00").await;

    let body = r#"{"date":"2030-06-01","start_time":"10:00","end_time":"11:00"}"#;
    let (status, _) = send(&state, admin_request("POST", "/api/admin/slots", Some(body))).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_create_slot_validation() {
    let state = test_state();
    let body = r#"{"date":"June 1st","start_time":"10:00"}"#;
    let (status, json) = send(&state, admin_request("POST", "/api/admin/slots", Some(body))).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    let fields: Vec<&str> = json["fields"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["field"].as_str().unwrap())
        .collect();
    assert!(fields.contains(&"date"));
    assert!(fields.contains(&"end_time"));
}

#[tokio::test]
async fn test_availability_range_validation() {
    let state = test_state();
    let (status, _) = send(
        &state,
        user_request(
            "u1",
            "GET",
            "/api/slots?start_date=2030-06-10&end_date=2030-06-01",
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) = send(&state, user_request("u1", "GET", "/api/slots", None)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_bulk_creation_is_idempotent() {
    let state = test_state();
    let body = r#"{"dates":["2030-06-01","2030-06-02"],"start_time":"10:00","end_time":"14:00","duration_minutes":60}"#;

    let (status, json) = send(&state, admin_request("POST", "/api/admin/slots/bulk", Some(body))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["created"], 8);
    assert_eq!(json["skipped"], 0);

    let (status, json) = send(&state, admin_request("POST", "/api/admin/slots/bulk", Some(body))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["created"], 0);
    assert_eq!(json["skipped"], 8);
}

#[tokio::test]
async fn test_delete_slot() {
    let state = test_state();
    let slot_id = create_slot(&state, "2030-06-01", "10:00", "11:00").await;

    let (status, json) = request_booking(&state, "u1", &slot_id, "rehearsal").await;
    assert_eq!(status, StatusCode::CREATED);
    let booking_id = json["id"].as_str().unwrap().to_string();

    let uri = format!("/api/admin/slots/{slot_id}");
    let (status, _) = send(&state, admin_request("DELETE", &uri, None)).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = send(
        &state,
        user_request("u1", "POST", &format!("/api/bookings/{booking_id}/cancel"), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&state, admin_request("DELETE", &uri, None)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&state, admin_request("DELETE", &uri, None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // The cancelled booking keeps its slot details.
    let (_, json) = send(&state, user_request("u1", "GET", "/api/bookings/mine", None)).await;
    assert_eq!(json[0]["slot_date"], "2030-06-01");
    assert_eq!(json[0]["start_time"], "10:00");
}

// ── Booking lifecycle ──

#[tokio::test]
async fn test_full_booking_lifecycle() {
    let state = test_state();
    let slot_id = create_slot(&state, "2030-06-01", "10:00", "11:00").await;

    // A requests
    let (status, json) = request_booking(&state, "alice", &slot_id, "recording").await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["booking_status"], "pending");
    assert_eq!(json["payment_status"], "pending");
    assert_eq!(json["price"], 1200);
    assert_eq!(json["user_email"], "alice@example.com");
    let booking_id = json["id"].as_str().unwrap().to_string();

    // B cannot request while A is pending
    let (status, _) = request_booking(&state, "bob", &slot_id, "rehearsal").await;
    assert_eq!(status, StatusCode::CONFLICT);

    // Admin approves
    let approve = format!("/api/admin/bookings/{booking_id}/approve");
    let (status, json) = send(&state, admin_request("POST", &approve, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["booking_status"], "confirmed");
    assert_eq!(json["payment_status"], "paid");

    let (status, json) = send(&state, admin_request("POST", &approve, None)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["error"], "conflict: already confirmed");

    // Availability reflects the confirmation
    let (_, json) = send(&state, user_request("carol", "GET", "/api/slots?date=2030-06-01", None)).await;
    assert_eq!(json[0]["is_booked"], true);
    assert_eq!(json[0]["confirmed_booking_id"], booking_id.as_str());

    // C is turned away, the slot cannot be blocked
    let (status, _) = request_booking(&state, "carol", &slot_id, "rehearsal").await;
    assert_eq!(status, StatusCode::CONFLICT);
    let (status, _) = send(
        &state,
        admin_request(
            "POST",
            &format!("/api/admin/slots/{slot_id}/block"),
            Some(r#"{"blocked":true}"#),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    // Only the owner may cancel
    let cancel = format!("/api/bookings/{booking_id}/cancel");
    let (status, _) = send(&state, user_request("carol", "POST", &cancel, None)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, json) = send(&state, user_request("alice", "POST", &cancel, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["booking_status"], "cancelled");
    let (status, _) = send(&state, user_request("alice", "POST", &cancel, None)).await;
    assert_eq!(status, StatusCode::CONFLICT);

    // Slot is free again
    let (status, json) = request_booking(&state, "dave", &slot_id, "podcast").await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["price"], 800);
}

#[tokio::test]
async fn test_reject_with_reason() {
    let state = test_state();
    let slot_id = create_slot(&state, "2030-06-01", "10:00", "11:00").await;
    let (_, json) = request_booking(&state, "alice", &slot_id, "rehearsal").await;
    let booking_id = json["id"].as_str().unwrap().to_string();

    let (status, json) = send(
        &state,
        admin_request(
            "POST",
            &format!("/api/admin/bookings/{booking_id}/reject"),
            Some(r#"{"reason":"maintenance"}"#),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["booking_status"], "rejected");
    assert!(json["notes"]
        .as_str()
        .unwrap()
        .contains("Rejection reason: maintenance"));

    // A rejected booking cannot be cancelled and no longer holds the slot.
    let (status, _) = send(
        &state,
        user_request("alice", "POST", &format!("/api/bookings/{booking_id}/cancel"), None),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    let (status, _) = request_booking(&state, "bob", &slot_id, "rehearsal").await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_reject_without_body() {
    let state = test_state();
    let slot_id = create_slot(&state, "2030-06-01", "10:00", "11:00").await;
    let (_, json) = request_booking(&state, "alice", &slot_id, "rehearsal").await;
    let booking_id = json["id"].as_str().unwrap().to_string();

    let (status, json) = send(
        &state,
        admin_request("POST", &format!("/api/admin/bookings/{booking_id}/reject"), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["booking_status"], "rejected");
}

#[tokio::test]
async fn test_booking_unknown_slot_and_type() {
    let state = test_state();
    let (status, _) = request_booking(&state, "alice", "no-such-slot", "rehearsal").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let slot_id = create_slot(&state, "2030-06-01", "10:00", "11:00").await;
    let (status, json) = request_booking(&state, "alice", &slot_id, "karaoke").await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json["fields"][0]["field"], "rental_type");

    let (status, _) = request_booking(&state, "alice", "", "rehearsal").await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_admin_booking_list_filter() {
    let state = test_state();
    let s1 = create_slot(&state, "2030-06-01", "10:00", "11:00").await;
    let s2 = create_slot(&state, "2030-06-01", "11:00", "12:00").await;
    let (_, json) = request_booking(&state, "alice", &s1, "rehearsal").await;
    let first = json["id"].as_str().unwrap().to_string();
    request_booking(&state, "bob", &s2, "rehearsal").await;
    send(
        &state,
        admin_request("POST", &format!("/api/admin/bookings/{first}/approve"), None),
    )
    .await;

    let (_, json) = send(&state, admin_request("GET", "/api/admin/bookings", None)).await;
    assert_eq!(json.as_array().unwrap().len(), 2);

    let (_, json) = send(
        &state,
        admin_request("GET", "/api/admin/bookings?status=confirmed", None),
    )
    .await;
    let list = json.as_array().unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["id"], first.as_str());

    let (status, _) = send(
        &state,
        admin_request("GET", "/api/admin/bookings?status=lost", None),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

// ── Notifications ──

#[tokio::test]
async fn test_notifications_fan_out() {
    let (state, mail, whatsapp) = test_state_with_outboxes();
    send(
        &state,
        admin_request(
            "POST",
            "/api/admin/settings",
            Some(r#"{"admin_emails":["owner@studio.test"],"whatsapp_recipients":["+15550001111"]}"#),
        ),
    )
    .await;
    let slot_id = create_slot(&state, "2030-06-01", "10:00", "11:00").await;

    let (_, json) = request_booking(&state, "alice", &slot_id, "rehearsal").await;
    let booking_id = json["id"].as_str().unwrap().to_string();

    let sent = wait_for(&mail, 2).await;
    assert!(sent.contains(&("alice@example.com".to_string(), "booking_requested".to_string())));
    assert!(sent.contains(&("owner@studio.test".to_string(), "booking_requested".to_string())));
    let texts = wait_for(&whatsapp, 1).await;
    assert_eq!(texts[0].0, "+15550001111");

    mail.lock().unwrap().clear();
    send(
        &state,
        admin_request("POST", &format!("/api/admin/bookings/{booking_id}/approve"), None),
    )
    .await;
    let sent = wait_for(&mail, 2).await;
    assert_eq!(sent.len(), 2);
    assert!(sent.iter().all(|(_, kind)| kind == "booking_approved"));
}

// ── Settings ──

#[tokio::test]
async fn test_settings_update_and_public_view() {
    let state = test_state();

    let (status, json) = send(
        &state,
        admin_request(
            "POST",
            "/api/admin/settings",
            Some(r#"{"upi_id":"studio@upi","slot_duration_minutes":90}"#),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["upi_id"], "studio@upi");
    assert_eq!(json["slot_duration_minutes"], 90);
    // untouched fields keep their values
    assert_eq!(json["rate_table"].as_array().unwrap().len(), 3);

    let (status, json) = send(&state, user_request("u1", "GET", "/api/settings", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["upi_id"], "studio@upi");
    assert!(json.get("admin_emails").is_none());
    assert!(json["business_hours_text"].as_str().is_some());

    let (status, _) = send(
        &state,
        admin_request(
            "POST",
            "/api/admin/settings",
            Some(r#"{"slot_duration_minutes":0}"#),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

// ── Revenue ──

#[tokio::test]
async fn test_revenue_report() {
    let state = test_state();
    let s1 = create_slot(&state, "2030-06-01", "10:00", "11:00").await;
    let s2 = create_slot(&state, "2030-06-02", "10:00", "11:00").await;
    let s3 = create_slot(&state, "2030-06-03", "10:00", "11:00").await;

    for (user, slot, kind) in [("a", &s1, "rehearsal"), ("b", &s2, "recording")] {
        let (_, json) = request_booking(&state, user, slot, kind).await;
        let id = json["id"].as_str().unwrap().to_string();
        send(
            &state,
            admin_request("POST", &format!("/api/admin/bookings/{id}/approve"), None),
        )
        .await;
    }
    // pending bookings do not count
    request_booking(&state, "c", &s3, "podcast").await;

    let (status, json) = send(
        &state,
        admin_request(
            "GET",
            "/api/admin/revenue?start_date=2030-06-01&end_date=2030-06-30",
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["total_revenue"], 1700);
    assert_eq!(json["booking_count"], 2);
    assert_eq!(json["average_price"], 850.0);
    assert_eq!(json["by_slot"].as_array().unwrap().len(), 2);

    let (status, _) = send(
        &state,
        admin_request("GET", "/api/admin/revenue?start_date=2030-06-01", None),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

// ── Calendar ──

#[tokio::test]
async fn test_calendar_download() {
    let state = test_state();
    let slot_id = create_slot(&state, "2030-06-01", "10:00", "11:00").await;
    let (_, json) = request_booking(&state, "alice", &slot_id, "rehearsal").await;
    let booking_id = json["id"].as_str().unwrap().to_string();
    let uri = format!("/calendar/{booking_id}.ics");

    // pending bookings have no invite yet
    let (status, _) = send(&state, user_request("alice", "GET", &uri, None)).await;
    assert_eq!(status, StatusCode::CONFLICT);

    send(
        &state,
        admin_request("POST", &format!("/api/admin/bookings/{booking_id}/approve"), None),
    )
    .await;

    let res = test_app(state.clone())
        .oneshot(user_request("alice", "GET", &uri, None))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(
        res.headers().get("content-type").unwrap(),
        "text/calendar; charset=utf-8"
    );
    let body = axum::body::to_bytes(res.into_body(), usize::MAX)
        .await
        .unwrap();
    let ics = String::from_utf8(body.to_vec()).unwrap();
    assert!(ics.contains("BEGIN:VCALENDAR"));
    assert!(ics.contains("DTSTART:20300601T100000"));
    assert!(ics.contains("mailto:alice@example.com"));

    let (status, _) = send(&state, user_request("mallory", "GET", &uri, None)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_calendar_attendees_deduplicated() {
    let state = test_state();
    send(
        &state,
        admin_request(
            "POST",
            "/api/admin/settings",
            Some(r#"{"admin_emails":["ALICE@example.com","owner@studio.test"]}"#),
        ),
    )
    .await;
    let slot_id = create_slot(&state, "2030-06-01", "10:00", "11:00").await;
    let (_, json) = request_booking(&state, "alice", &slot_id, "rehearsal").await;
    let booking_id = json["id"].as_str().unwrap().to_string();
    send(
        &state,
        admin_request("POST", &format!("/api/admin/bookings/{booking_id}/approve"), None),
    )
    .await;

    let res = test_app(state.clone())
        .oneshot(user_request("alice", "GET", &format!("/calendar/{booking_id}"), None))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = axum::body::to_bytes(res.into_body(), usize::MAX)
        .await
        .unwrap();
    let ics = String::from_utf8(body.to_vec()).unwrap().to_lowercase();

    assert_eq!(ics.matches("attendee;").count(), 2);
    assert_eq!(ics.matches("mailto:alice@example.com").count(), 1);
    assert!(ics.contains("mailto:owner@studio.test"));
}
