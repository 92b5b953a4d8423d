use async_trait::async_trait;
use caldera_core::repository::ReviewRepository;
use caldera_core::review::{NewReview, Review};
use caldera_core::{CoreError, CoreResult};
use caldera_shared::{PageMeta, PageRequest};
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::store_error;

pub struct PgReviewRepository {
    pool: PgPool,
}

impl PgReviewRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct ReviewRow {
    id: Uuid,
    booking_id: Uuid,
    package_id: Uuid,
    rating: i16,
    comment: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<ReviewRow> for Review {
    type Error = CoreError;

    fn try_from(row: ReviewRow) -> Result<Self, Self::Error> {
        Ok(Review {
            id: row.id,
            booking_id: row.booking_id,
            package_id: row.package_id,
            rating: rating_from_db(row.rating)?,
            comment: row.comment,
            created_at: row.created_at,
        })
    }
}

fn rating_from_db(rating: i16) -> CoreResult<u8> {
    u8::try_from(rating).map_err(|_| CoreError::StoreError(format!("invalid rating {rating}")))
}

const REVIEW_COLUMNS: &str = "id, booking_id, package_id, rating, comment, created_at";

#[async_trait]
impl ReviewRepository for PgReviewRepository {
    async fn insert_review(&self, review: NewReview) -> CoreResult<Review> {
        let sql = format!(
            "INSERT INTO reviews (id, booking_id, package_id, rating, comment) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {REVIEW_COLUMNS}"
        );
        let row: ReviewRow = sqlx::query_as(&sql)
            .bind(Uuid::new_v4())
            .bind(review.booking_id)
            .bind(review.package_id)
            .bind(i16::from(review.rating))
            .bind(review.comment)
            .fetch_one(&self.pool)
            .await
            .map_err(store_error)?;
        row.try_into()
    }

    async fn has_review_for_booking(&self, booking_id: Uuid) -> CoreResult<bool> {
        sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM reviews WHERE booking_id = $1)")
            .bind(booking_id)
            .fetch_one(&self.pool)
            .await
            .map_err(store_error)
    }

    async fn list_reviews(&self, package_id: Uuid, page: PageRequest) -> CoreResult<(Vec<Review>, PageMeta)> {
        let sql = format!(
            "SELECT {REVIEW_COLUMNS} FROM reviews WHERE package_id = $1 \
             ORDER BY created_at DESC LIMIT $2 OFFSET $3"
        );
        let rows: Vec<ReviewRow> = sqlx::query_as(&sql)
            .bind(package_id)
            .bind(page.limit)
            .bind(page.offset)
            .fetch_all(&self.pool)
            .await
            .map_err(store_error)?;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM reviews WHERE package_id = $1")
            .bind(package_id)
            .fetch_one(&self.pool)
            .await
            .map_err(store_error)?;

        let reviews = rows
            .into_iter()
            .map(Review::try_from)
            .collect::<CoreResult<Vec<_>>>()?;
        Ok((reviews, page.meta(total)))
    }

    async fn ratings_for_package(&self, package_id: Uuid) -> CoreResult<Vec<u8>> {
        let ratings: Vec<i16> = sqlx::query_scalar("SELECT rating FROM reviews WHERE package_id = $1")
            .bind(package_id)
            .fetch_all(&self.pool)
            .await
            .map_err(store_error)?;
        ratings.into_iter().map(rating_from_db).collect()
    }
}
