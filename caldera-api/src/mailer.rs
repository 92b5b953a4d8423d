use axum::{extract::State, routing::post, Json, Router};
use caldera_order::models::{BookingConfirmationRequest, EmailReceipt, PasswordResetRequest, WelcomeRequest};

use crate::error::AppError;
use crate::extract::AppJson;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/mailer/send-booking-confirmation", post(send_booking_confirmation))
        .route("/mailer/send-welcome", post(send_welcome))
        .route("/mailer/send-password-reset", post(send_password_reset))
}

async fn send_booking_confirmation(
    State(state): State<AppState>,
    AppJson(req): AppJson<BookingConfirmationRequest>,
) -> Result<Json<EmailReceipt>, AppError> {
    Ok(Json(state.mailer.send_booking_confirmation(req).await?))
}

async fn send_welcome(
    State(state): State<AppState>,
    AppJson(req): AppJson<WelcomeRequest>,
) -> Result<Json<EmailReceipt>, AppError> {
    Ok(Json(state.mailer.send_welcome(req).await?))
}

async fn send_password_reset(
    State(state): State<AppState>,
    AppJson(req): AppJson<PasswordResetRequest>,
) -> Result<Json<EmailReceipt>, AppError> {
    Ok(Json(state.mailer.send_password_reset(req).await?))
}
