use std::sync::Arc;

use caldera_core::payment::{verify_signature, PaymentEvent, DEFAULT_TOLERANCE_SECS};
use caldera_core::repository::BookingRepository;
use caldera_core::{CoreError, CoreResult};
use caldera_shared::models::events::PaymentRecordedEvent;
use uuid::Uuid;

use crate::lifecycle::PaymentOutcome;

/// How a verified event was handled. Used for logging and metrics labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookDisposition {
    Applied(PaymentOutcome),
    MissingReference,
    BookingNotFound,
    Unhandled,
    Failed,
}

impl WebhookDisposition {
    pub fn as_str(&self) -> &'static str {
        match self {
            WebhookDisposition::Applied(PaymentOutcome::Paid) => "paid",
            WebhookDisposition::Applied(PaymentOutcome::Failed) => "failed",
            WebhookDisposition::Applied(PaymentOutcome::Refunded) => "refunded",
            WebhookDisposition::MissingReference => "missing_reference",
            WebhookDisposition::BookingNotFound => "booking_not_found",
            WebhookDisposition::Unhandled => "unhandled",
            WebhookDisposition::Failed => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookReceipt {
    pub event_id: String,
    pub event_type: String,
    pub disposition: WebhookDisposition,
}

/// Verifies and applies payment provider webhooks.
pub struct WebhookProcessor {
    bookings: Arc<dyn BookingRepository>,
    secret: Option<String>,
    tolerance_secs: i64,
}

impl WebhookProcessor {
    pub fn new(bookings: Arc<dyn BookingRepository>, secret: Option<String>) -> Self {
        Self {
            bookings,
            secret: secret.filter(|s| !s.is_empty()),
            tolerance_secs: DEFAULT_TOLERANCE_SECS,
        }
    }

    pub fn with_tolerance(mut self, tolerance_secs: i64) -> Self {
        self.tolerance_secs = tolerance_secs;
        self
    }

    /// Verifies the signature, then applies the event.
    ///
    /// Signature and configuration problems are returned as errors. Anything
    /// that goes wrong while applying a verified event is logged and reported
    /// through the receipt only, so the provider always gets an acknowledgement.
    pub async fn handle(&self, payload: &[u8], signature: Option<&str>, now: i64) -> CoreResult<WebhookReceipt> {
        let signature = signature
            .filter(|s| !s.is_empty())
            .ok_or_else(|| CoreError::ValidationError("Missing Stripe signature header".to_string()))?;
        let secret = self
            .secret
            .as_deref()
            .ok_or_else(|| CoreError::InternalError("Stripe webhook secret not configured".to_string()))?;

        if let Err(e) = verify_signature(payload, signature, secret, self.tolerance_secs, now) {
            tracing::error!(error = %e, "webhook signature verification failed");
            return Err(CoreError::ValidationError("Invalid webhook signature".to_string()));
        }

        let event: PaymentEvent = serde_json::from_slice(payload).map_err(|e| {
            tracing::error!(error = %e, "webhook payload is not a valid event");
            CoreError::ValidationError("Invalid webhook payload".to_string())
        })?;

        tracing::info!(event_id = %event.id, event_type = %event.event_type, "processing payment event");
        let disposition = self.apply(&event).await;

        Ok(WebhookReceipt {
            event_id: event.id,
            event_type: event.event_type,
            disposition,
        })
    }

    async fn apply(&self, event: &PaymentEvent) -> WebhookDisposition {
        let Some(outcome) = PaymentOutcome::from_event_type(&event.event_type) else {
            tracing::info!(event_type = %event.event_type, "unhandled event type");
            return WebhookDisposition::Unhandled;
        };

        let Some(tx_ref) = event.transaction_reference() else {
            tracing::warn!(event_type = %event.event_type, "payment event has no transaction reference");
            return WebhookDisposition::MissingReference;
        };

        // The reference doubles as the booking id.
        let Ok(booking_id) = Uuid::parse_str(tx_ref) else {
            tracing::warn!(%tx_ref, "no booking found for transaction reference");
            return WebhookDisposition::BookingNotFound;
        };

        let updated = self
            .bookings
            .record_payment(booking_id, outcome.payment_status(), outcome.booking_status())
            .await;

        match updated {
            Ok(Some(booking)) => {
                let recorded = PaymentRecordedEvent {
                    booking_id: booking.id,
                    event_type: event.event_type.clone(),
                    payment_status: booking.payment_status.to_string(),
                    booking_status: booking.status.to_string(),
                    timestamp: chrono::Utc::now().timestamp(),
                };
                match serde_json::to_string(&recorded) {
                    Ok(payload) => tracing::info!(event = %payload, "booking payment status updated"),
                    Err(e) => tracing::warn!(error = %e, "failed to serialize payment event"),
                }
                if outcome == PaymentOutcome::Paid {
                    tracing::info!(booking_id = %booking.id, "booking confirmation email triggered");
                }
                WebhookDisposition::Applied(outcome)
            }
            Ok(None) => {
                tracing::warn!(%tx_ref, "no booking found for transaction reference");
                WebhookDisposition::BookingNotFound
            }
            Err(e) => {
                tracing::error!(%tx_ref, error = %e, "failed to update booking payment status");
                WebhookDisposition::Failed
            }
        }
    }
}
