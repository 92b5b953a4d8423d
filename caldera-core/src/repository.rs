use async_trait::async_trait;
use caldera_shared::{PageMeta, PageRequest};
use uuid::Uuid;

use crate::booking::{Booking, BookingFilter, BookingStatus, NewBooking, PaymentStatus};
use crate::catalog::{Destination, DestinationFilter, Package, PackageFilter, PackageItem, PackageOption};
use crate::review::{NewReview, Review};
use crate::CoreResult;

/// Read access to published travel content, plus the one derived field we write back.
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    async fn list_destinations(
        &self,
        filter: &DestinationFilter,
        page: PageRequest,
    ) -> CoreResult<(Vec<Destination>, PageMeta)>;

    /// Published destination by slug (or id).
    async fn find_destination(&self, slug: &str) -> CoreResult<Option<Destination>>;

    async fn list_packages(
        &self,
        filter: &PackageFilter,
        page: PageRequest,
    ) -> CoreResult<(Vec<Package>, PageMeta)>;

    /// Published package by slug (or id).
    async fn find_package(&self, slug: &str) -> CoreResult<Option<Package>>;

    /// Published package by id; unpublished rows are treated as missing.
    async fn find_published_package(&self, id: Uuid) -> CoreResult<Option<Package>>;

    /// Options whose id is in `ids`. Unknown ids are simply absent from the result.
    async fn find_options(&self, ids: &[Uuid]) -> CoreResult<Vec<PackageOption>>;

    async fn list_package_items(&self, package_id: Uuid) -> CoreResult<Vec<PackageItem>>;

    /// Stores the derived rating summary on the package row.
    async fn update_package_rating(&self, package_id: Uuid, rating: f64, review_count: i64) -> CoreResult<()>;
}

#[async_trait]
pub trait BookingRepository: Send + Sync {
    async fn insert_booking(&self, booking: NewBooking) -> CoreResult<Booking>;

    async fn find_booking(&self, id: Uuid) -> CoreResult<Option<Booking>>;

    /// Newest first.
    async fn list_bookings(
        &self,
        filter: &BookingFilter,
        page: PageRequest,
    ) -> CoreResult<(Vec<Booking>, PageMeta)>;

    async fn set_qr_code(&self, id: Uuid, qr_code_url: &str) -> CoreResult<()>;

    /// Applies a payment transition. Returns `None` when no booking has this id.
    async fn record_payment(
        &self,
        id: Uuid,
        payment_status: PaymentStatus,
        status: BookingStatus,
    ) -> CoreResult<Option<Booking>>;
}

#[async_trait]
pub trait ReviewRepository: Send + Sync {
    async fn insert_review(&self, review: NewReview) -> CoreResult<Review>;

    async fn has_review_for_booking(&self, booking_id: Uuid) -> CoreResult<bool>;

    /// Newest first.
    async fn list_reviews(&self, package_id: Uuid, page: PageRequest) -> CoreResult<(Vec<Review>, PageMeta)>;

    async fn ratings_for_package(&self, package_id: Uuid) -> CoreResult<Vec<u8>>;
}
