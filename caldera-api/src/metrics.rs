use axum::{extract::State, http::header, response::IntoResponse};
use prometheus::{opts, Encoder, IntCounter, IntCounterVec, Registry, TextEncoder};

use crate::error::AppError;
use crate::state::AppState;

/// Counters exported at `/metrics`. Each state owns its registry so tests can
/// build routers side by side.
pub struct ApiMetrics {
    registry: Registry,
    bookings_created: IntCounter,
    webhook_events: IntCounterVec,
}

impl ApiMetrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let bookings_created = IntCounter::with_opts(opts!(
            "caldera_bookings_created_total",
            "Bookings created through the API"
        ))?;
        let webhook_events = IntCounterVec::new(
            opts!(
                "caldera_webhook_events_total",
                "Verified payment webhook events by outcome"
            ),
            &["event_type", "outcome"],
        )?;

        registry.register(Box::new(bookings_created.clone()))?;
        registry.register(Box::new(webhook_events.clone()))?;

        Ok(Self {
            registry,
            bookings_created,
            webhook_events,
        })
    }

    pub fn record_booking_created(&self) {
        self.bookings_created.inc();
    }

    pub fn record_webhook_event(&self, event_type: &str, outcome: &str) {
        self.webhook_events.with_label_values(&[event_type, outcome]).inc();
    }

    pub fn render(&self) -> Result<String, prometheus::Error> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

/// GET /metrics
pub async fn export(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let body = state.metrics.render()?;
    Ok(([(header::CONTENT_TYPE, prometheus::TEXT_FORMAT)], body))
}
