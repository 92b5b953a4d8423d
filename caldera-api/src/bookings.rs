use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use caldera_core::booking::Booking;
use caldera_order::models::{BookingList, BookingQuery, CreateBookingRequest, CreateBookingResponse};
use tracing::info;
use uuid::Uuid;

use crate::error::AppError;
use crate::extract::{AppJson, AppPath, AppQuery};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/bookings", post(create_booking).get(list_bookings))
        .route("/bookings/{id}", get(get_booking))
}

/// POST /api/bookings
async fn create_booking(
    State(state): State<AppState>,
    AppJson(req): AppJson<CreateBookingRequest>,
) -> Result<(StatusCode, Json<CreateBookingResponse>), AppError> {
    let created = state.bookings.create_booking(req).await?;
    state.metrics.record_booking_created();
    info!(booking_id = %created.booking_id, tx_ref = %created.tx_ref, "booking created");
    Ok((StatusCode::CREATED, Json(created)))
}

/// GET /api/bookings/{id}
async fn get_booking(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<Booking>, AppError> {
    Ok(Json(state.bookings.get_booking(id).await?))
}

/// GET /api/bookings?userId=...
async fn list_bookings(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<BookingQuery>,
) -> Result<Json<BookingList>, AppError> {
    Ok(Json(state.bookings.list_user_bookings(query).await?))
}
