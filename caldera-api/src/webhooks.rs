use axum::{
    body::Bytes,
    extract::State,
    http::HeaderMap,
    routing::post,
    Json, Router,
};
use caldera_core::payment::SIGNATURE_HEADER;
use caldera_order::models::WebhookAck;

use crate::error::AppError;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/webhooks/stripe", post(handle_stripe_webhook))
}

/// POST /api/webhooks/stripe
/// Receives payment status updates. The raw body is needed for the signature.
async fn handle_stripe_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookAck>, AppError> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok());

    let receipt = state
        .webhooks
        .handle(&body, signature, chrono::Utc::now().timestamp())
        .await?;

    state
        .metrics
        .record_webhook_event(&receipt.event_type, receipt.disposition.as_str());
    tracing::info!(
        event_id = %receipt.event_id,
        event_type = %receipt.event_type,
        outcome = receipt.disposition.as_str(),
        "webhook acknowledged"
    );

    Ok(Json(WebhookAck { received: true }))
}
