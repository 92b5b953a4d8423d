use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use caldera_api::{app, Adapters, AppState};
use caldera_core::booking::{BookingStatus, PaymentStatus};
use caldera_core::catalog::Package;
use caldera_core::inventory::NoopPartnerInventory;
use caldera_core::mailer::{EmailMessage, EmailSender};
use caldera_core::payment::signature_header;
use caldera_core::repository::BookingRepository;
use caldera_core::CoreResult;
use caldera_store::app_config::Config;
use caldera_store::memory::{fixtures, InMemoryStore};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

const WEBHOOK_SECRET: &str = "whsec_api_test";

#[derive(Default)]
struct RecordingSender {
    sent: Mutex<Vec<EmailMessage>>,
}

#[async_trait]
impl EmailSender for RecordingSender {
    async fn send(&self, message: &EmailMessage) -> CoreResult<String> {
        let mut sent = self.sent.lock().unwrap();
        sent.push(message.clone());
        Ok(format!("msg_{}", sent.len()))
    }
}

struct Harness {
    store: Arc<InMemoryStore>,
    email: Arc<RecordingSender>,
    router: Router,
    package: Package,
}

fn config(environment: &str) -> Config {
    serde_json::from_value(json!({
        "server": { "port": 4000, "base_url": "https://caldera.travel", "environment": environment },
        "database": { "url": "postgres://unused" },
        "payments": { "webhook_secret": WEBHOOK_SECRET },
        "email": { "api_key": "re_test" },
    }))
    .unwrap()
}

fn harness_with(environment: &str) -> Harness {
    let store = Arc::new(InMemoryStore::new());
    let email = Arc::new(RecordingSender::default());

    let destination = store.seed_destination(fixtures::destination("serengeti"));
    let package = store.seed_package(fixtures::package(destination.id, "great-migration", 1000.0));
    store.seed_item(fixtures::item(package.id, "Accommodation", &[("Suite", 500.0)]));

    let adapters = Adapters {
        catalog: store.clone(),
        bookings: store.clone(),
        reviews: store.clone(),
        inventory: Arc::new(NoopPartnerInventory),
        email: email.clone(),
    };
    let state = AppState::new(adapters, &config(environment)).unwrap();

    Harness {
        store,
        email,
        router: app(state),
        package,
    }
}

fn harness() -> Harness {
    harness_with("development")
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, axum::http::HeaderMap, Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };
    (status, headers, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_health() {
    let h = harness();
    let (status, _, body) = send(&h.router, get("/api/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);
    assert_eq!(body["environment"], "development");
    assert!(body["uptime"].as_f64().unwrap() >= 0.0);
}

#[tokio::test]
async fn test_list_packages_sets_cache_header() {
    let h = harness();
    let (status, headers, body) = send(&h.router, get("/api/catalog/packages?limit=5")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[header::CACHE_CONTROL], "s-maxage=60");
    assert_eq!(body["total"], 1);
    assert_eq!(body["limit"], 5);
    assert_eq!(body["hasMore"], false);
    assert_eq!(body["packages"][0]["slug"], "great-migration");
}

#[tokio::test]
async fn test_package_detail_and_composition() {
    let h = harness();

    let (status, headers, body) = send(&h.router, get("/api/catalog/packages/great-migration")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[header::CACHE_CONTROL], "s-maxage=300");
    assert_eq!(body["id"], h.package.id.to_string());

    let uri = format!("/api/catalog/packages/{}/composition", h.package.id);
    let (status, headers, body) = send(&h.router, get(&uri)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[header::CACHE_CONTROL], "s-maxage=600");
    assert_eq!(body["items"][0]["options"][0]["name"], "Suite");
}

#[tokio::test]
async fn test_unknown_destination_is_404_envelope() {
    let h = harness();
    let (status, _, body) = send(&h.router, get("/api/catalog/destinations/atlantis")).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["ok"], false);
    assert_eq!(body["statusCode"], 404);
    assert!(body["message"].as_str().unwrap().contains("atlantis"));
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn test_invalid_query_is_400() {
    let h = harness();
    let (status, _, body) = send(&h.router, get("/api/catalog/packages?limit=500")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["statusCode"], 400);

    let (status, _, _) = send(&h.router, get("/api/catalog/packages?featured=maybe")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _, body) = send(&h.router, get("/api/catalog/packages?durationMin=3000000000")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("durationMin"));
}

#[tokio::test]
async fn test_offset_past_the_end_returns_empty_page() {
    let h = harness();
    let uri = format!("/api/catalog/destinations?offset={}", i64::MAX);
    let (status, _, body) = send(&h.router, get(&uri)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["destinations"], serde_json::json!([]));
    assert_eq!(body["total"], 1);
    assert_eq!(body["offset"], i64::MAX);
    assert_eq!(body["hasMore"], false);
}

#[tokio::test]
async fn test_create_booking_then_fetch_and_list() {
    let h = harness();
    let user_id = Uuid::new_v4();

    let (status, _, created) = send(
        &h.router,
        post_json(
            "/api/bookings",
            json!({
                "packageId": h.package.id,
                "userId": user_id,
                "startDate": "2025-07-01",
                "travelers": 2,
            }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert!(created["tx_ref"].as_str().unwrap().starts_with("NT_"));
    assert_eq!(created["total_usd"], 1000.0);
    assert_eq!(created["pricing_breakdown"]["currency"], "USD");
    assert!(created["qr_code_url"]
        .as_str()
        .unwrap()
        .starts_with("data:image/svg+xml;base64,"));

    let booking_id = created["bookingId"].as_str().unwrap();
    let (status, _, booking) = send(&h.router, get(&format!("/api/bookings/{booking_id}"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(booking["status"], "pending");
    assert_eq!(booking["end_date"], "2025-07-06");

    let (status, _, list) = send(&h.router, get(&format!("/api/bookings?userId={user_id}"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list["total"], 1);
    assert_eq!(list["bookings"][0]["id"], booking_id);

    let (_, _, metrics) = send(&h.router, get("/metrics")).await;
    assert!(metrics.as_str().unwrap().contains("caldera_bookings_created_total 1"));
}

#[tokio::test]
async fn test_create_booking_rejects_bad_input() {
    let h = harness();

    let (status, _, _) = send(
        &h.router,
        post_json(
            "/api/bookings",
            json!({
                "packageId": h.package.id,
                "userId": Uuid::new_v4(),
                "startDate": "07/01/2025",
                "travelers": 2,
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let malformed = Request::builder()
        .method("POST")
        .uri("/api/bookings")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, _, body) = send(&h.router, malformed).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["ok"], false);
}

#[tokio::test]
async fn test_booking_id_must_be_uuid() {
    let h = harness();
    let (status, _, _) = send(&h.router, get("/api/bookings/not-a-uuid")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _, _) = send(&h.router, get(&format!("/api/bookings/{}", Uuid::new_v4()))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_signed_webhook_confirms_booking() {
    let h = harness();
    let booking = h.store.seed_booking(fixtures::booking(Uuid::new_v4(), h.package.id));

    let payload = json!({
        "id": "evt_api",
        "type": "payment_intent.succeeded",
        "data": { "object": { "id": "pi_api", "metadata": { "tx_ref": booking.id } } }
    })
    .to_string();
    let now = chrono::Utc::now().timestamp();
    let signature = signature_header(payload.as_bytes(), now, WEBHOOK_SECRET).unwrap();

    let request = Request::builder()
        .method("POST")
        .uri("/api/webhooks/stripe")
        .header("stripe-signature", signature)
        .body(Body::from(payload))
        .unwrap();
    let (status, _, body) = send(&h.router, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "received": true }));

    let stored = h.store.find_booking(booking.id).await.unwrap().unwrap();
    assert_eq!(stored.payment_status, PaymentStatus::Paid);
    assert_eq!(stored.status, BookingStatus::Confirmed);
}

#[tokio::test]
async fn test_webhook_signature_errors() {
    let h = harness();
    let payload = json!({ "id": "evt", "type": "charge.succeeded", "data": { "object": {} } }).to_string();

    let unsigned = Request::builder()
        .method("POST")
        .uri("/api/webhooks/stripe")
        .body(Body::from(payload.clone()))
        .unwrap();
    let (status, _, body) = send(&h.router, unsigned).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Missing Stripe signature header");

    let forged = Request::builder()
        .method("POST")
        .uri("/api/webhooks/stripe")
        .header("stripe-signature", format!("t={},v1=deadbeef", chrono::Utc::now().timestamp()))
        .body(Body::from(payload))
        .unwrap();
    let (status, _, body) = send(&h.router, forged).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid webhook signature");
}

#[tokio::test]
async fn test_review_for_completed_booking() {
    let h = harness();
    let user_id = Uuid::new_v4();
    let mut completed = fixtures::booking(user_id, h.package.id);
    completed.status = BookingStatus::Completed;
    let booking = h.store.seed_booking(completed);

    let review = json!({
        "bookingId": booking.id,
        "userId": user_id,
        "packageId": h.package.id,
        "rating": 4,
        "comment": "Unforgettable",
    });
    let (status, _, created) = send(&h.router, post_json("/api/reviews", review.clone())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["rating"], 4);

    let (status, _, _) = send(&h.router, post_json("/api/reviews", review)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let uri = format!("/api/reviews?packageId={}", h.package.id);
    let (status, _, list) = send(&h.router, get(&uri)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list["total"], 1);
    assert_eq!(list["averageRating"], 4.0);
}

#[tokio::test]
async fn test_mailer_endpoints() {
    let h = harness();

    let (status, _, body) = send(
        &h.router,
        post_json(
            "/api/mailer/send-password-reset",
            json!({ "email": "jane@example.com", "resetToken": "tok123" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], "msg_1");

    let sent = h.email.sent.lock().unwrap().clone();
    assert_eq!(sent.len(), 1);
    assert!(sent[0].html.contains("https://caldera.travel/reset-password?token=tok123"));

    let (status, _, _) = send(
        &h.router,
        post_json(
            "/api/mailer/send-welcome",
            json!({ "email": "not-an-email", "fullName": "Jane" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_cors_in_production_allows_only_base_url() {
    let h = harness_with("production");

    let request = Request::builder()
        .uri("/api/health")
        .header(header::ORIGIN, "https://caldera.travel")
        .body(Body::empty())
        .unwrap();
    let (_, headers, _) = send(&h.router, request).await;
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "https://caldera.travel");

    let request = Request::builder()
        .uri("/api/health")
        .header(header::ORIGIN, "https://evil.example")
        .body(Body::empty())
        .unwrap();
    let (_, headers, _) = send(&h.router, request).await;
    assert!(headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
}
