use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use caldera_core::review::Review;
use caldera_order::models::{CreateReviewRequest, ReviewList, ReviewQuery};

use crate::error::AppError;
use crate::extract::{AppJson, AppQuery};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/reviews", post(create_review).get(list_reviews))
}

/// POST /api/reviews
async fn create_review(
    State(state): State<AppState>,
    AppJson(req): AppJson<CreateReviewRequest>,
) -> Result<(StatusCode, Json<Review>), AppError> {
    let review = state.reviews.create_review(req).await?;
    Ok((StatusCode::CREATED, Json(review)))
}

/// GET /api/reviews?packageId=...
async fn list_reviews(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<ReviewQuery>,
) -> Result<Json<ReviewList>, AppError> {
    Ok(Json(state.reviews.list_package_reviews(query).await?))
}
