use std::sync::Arc;

use caldera_core::booking::BookingStatus;
use caldera_core::repository::{BookingRepository, CatalogRepository, ReviewRepository};
use caldera_core::review::{average_rating, NewReview, Review};
use caldera_core::{CoreError, CoreResult};
use caldera_shared::PageRequest;
use uuid::Uuid;

use crate::models::{parse_uuid, CreateReviewRequest, ReviewList, ReviewQuery, MAX_COMMENT_CHARS};

const NOT_REVIEWABLE: &str =
    "Cannot review this booking. Booking must be completed and not already reviewed.";

pub struct ReviewService {
    catalog: Arc<dyn CatalogRepository>,
    bookings: Arc<dyn BookingRepository>,
    reviews: Arc<dyn ReviewRepository>,
}

impl ReviewService {
    pub fn new(
        catalog: Arc<dyn CatalogRepository>,
        bookings: Arc<dyn BookingRepository>,
        reviews: Arc<dyn ReviewRepository>,
    ) -> Self {
        Self {
            catalog,
            bookings,
            reviews,
        }
    }

    pub async fn create_review(&self, request: CreateReviewRequest) -> CoreResult<Review> {
        let booking_id = parse_uuid("booking ID", &request.booking_id)?;
        let user_id = parse_uuid("user ID", &request.user_id)?;
        let package_id = parse_uuid("package ID", &request.package_id)?;
        if !(1..=5).contains(&request.rating) {
            return Err(CoreError::ValidationError(
                "Rating must be between 1 and 5".to_string(),
            ));
        }
        let comment = request.comment.filter(|c| !c.trim().is_empty());
        if comment.as_ref().is_some_and(|c| c.chars().count() > MAX_COMMENT_CHARS) {
            return Err(CoreError::ValidationError(format!(
                "Comment must be at most {MAX_COMMENT_CHARS} characters"
            )));
        }

        if !self.can_review(booking_id, user_id).await? {
            return Err(CoreError::ValidationError(NOT_REVIEWABLE.to_string()));
        }

        if self.catalog.find_published_package(package_id).await?.is_none() {
            return Err(CoreError::NotFound(format!(
                "Package with ID '{package_id}' not found or not published"
            )));
        }

        let review = self
            .reviews
            .insert_review(NewReview {
                booking_id,
                package_id,
                // Range checked above.
                rating: request.rating as u8,
                comment,
            })
            .await?;

        if let Err(e) = self.refresh_package_rating(package_id).await {
            tracing::warn!(%package_id, error = %e, "failed to refresh package rating");
        }

        Ok(review)
    }

    pub async fn list_package_reviews(&self, query: ReviewQuery) -> CoreResult<ReviewList> {
        let package_id = query
            .package_id
            .as_deref()
            .ok_or_else(|| CoreError::ValidationError("packageId is required".to_string()))
            .and_then(|id| parse_uuid("package ID", id))?;
        let page = PageRequest::from_parts(query.limit, query.offset).map_err(CoreError::ValidationError)?;

        let (reviews, page) = self.reviews.list_reviews(package_id, page).await?;
        let ratings = self.reviews.ratings_for_package(package_id).await?;

        Ok(ReviewList {
            reviews,
            average_rating: average_rating(&ratings).unwrap_or(0.0),
            page,
        })
    }

    async fn can_review(&self, booking_id: Uuid, user_id: Uuid) -> CoreResult<bool> {
        let Some(booking) = self.bookings.find_booking(booking_id).await? else {
            return Ok(false);
        };
        if booking.user_id != user_id || booking.status != BookingStatus::Completed {
            return Ok(false);
        }
        Ok(!self.reviews.has_review_for_booking(booking_id).await?)
    }

    async fn refresh_package_rating(&self, package_id: Uuid) -> CoreResult<()> {
        let ratings = self.reviews.ratings_for_package(package_id).await?;
        let Some(average) = average_rating(&ratings) else {
            return Ok(());
        };
        self.catalog
            .update_package_rating(package_id, average, ratings.len() as i64)
            .await
    }
}
