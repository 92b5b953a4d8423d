//! In-process repositories backed by vectors. Used by tests and local demos.

use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use caldera_core::booking::{Booking, BookingFilter, BookingStatus, NewBooking, PaymentStatus};
use caldera_core::catalog::{
    Destination, DestinationFilter, Package, PackageFilter, PackageItem, PackageOption,
};
use caldera_core::repository::{BookingRepository, CatalogRepository, ReviewRepository};
use caldera_core::review::{NewReview, Review};
use caldera_core::{CoreError, CoreResult};
use caldera_shared::{PageMeta, PageRequest};
use chrono::Utc;
use uuid::Uuid;

#[derive(Default)]
struct Tables {
    destinations: Vec<Destination>,
    packages: Vec<Package>,
    items: Vec<PackageItem>,
    bookings: Vec<Booking>,
    reviews: Vec<Review>,
}

#[derive(Default)]
pub struct InMemoryStore {
    tables: RwLock<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, Tables> {
        self.tables.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Tables> {
        self.tables.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn seed_destination(&self, destination: Destination) -> Destination {
        self.write().destinations.push(destination.clone());
        destination
    }

    pub fn seed_package(&self, package: Package) -> Package {
        self.write().packages.push(package.clone());
        package
    }

    pub fn seed_item(&self, item: PackageItem) -> PackageItem {
        self.write().items.push(item.clone());
        item
    }

    pub fn seed_booking(&self, booking: Booking) -> Booking {
        self.write().bookings.push(booking.clone());
        booking
    }
}

/// Newest first; later insertions win ties.
fn newest_first<T: Clone>(rows: &[T], created_at: impl Fn(&T) -> chrono::DateTime<Utc>) -> Vec<T> {
    let mut out: Vec<T> = rows.iter().rev().cloned().collect();
    out.sort_by(|a, b| created_at(b).cmp(&created_at(a)));
    out
}

fn paged<T: Clone>(rows: Vec<T>, page: PageRequest) -> (Vec<T>, PageMeta) {
    (page.slice(&rows), page.meta(rows.len() as i64))
}

#[async_trait]
impl CatalogRepository for InMemoryStore {
    async fn list_destinations(
        &self,
        filter: &DestinationFilter,
        page: PageRequest,
    ) -> CoreResult<(Vec<Destination>, PageMeta)> {
        let tables = self.read();
        let matching: Vec<Destination> = newest_first(&tables.destinations, |d| d.created_at)
            .into_iter()
            .filter(|d| filter.matches(d))
            .collect();
        Ok(paged(matching, page))
    }

    async fn find_destination(&self, slug: &str) -> CoreResult<Option<Destination>> {
        Ok(self
            .read()
            .destinations
            .iter()
            .find(|d| d.is_published && (d.slug == slug || d.id.to_string() == slug))
            .cloned())
    }

    async fn list_packages(
        &self,
        filter: &PackageFilter,
        page: PageRequest,
    ) -> CoreResult<(Vec<Package>, PageMeta)> {
        let tables = self.read();
        let matching: Vec<Package> = newest_first(&tables.packages, |p| p.created_at)
            .into_iter()
            .filter(|p| filter.matches(p))
            .collect();
        Ok(paged(matching, page))
    }

    async fn find_package(&self, slug: &str) -> CoreResult<Option<Package>> {
        Ok(self
            .read()
            .packages
            .iter()
            .find(|p| p.is_published && p.matches_slug(slug))
            .cloned())
    }

    async fn find_published_package(&self, id: Uuid) -> CoreResult<Option<Package>> {
        Ok(self
            .read()
            .packages
            .iter()
            .find(|p| p.is_published && p.id == id)
            .cloned())
    }

    async fn find_options(&self, ids: &[Uuid]) -> CoreResult<Vec<PackageOption>> {
        Ok(self
            .read()
            .items
            .iter()
            .flat_map(|item| item.options.iter())
            .filter(|opt| ids.contains(&opt.id))
            .cloned()
            .collect())
    }

    async fn list_package_items(&self, package_id: Uuid) -> CoreResult<Vec<PackageItem>> {
        Ok(self
            .read()
            .items
            .iter()
            .filter(|item| item.package_id == package_id)
            .cloned()
            .collect())
    }

    async fn update_package_rating(&self, package_id: Uuid, rating: f64, review_count: i64) -> CoreResult<()> {
        if let Some(pkg) = self.write().packages.iter_mut().find(|p| p.id == package_id) {
            pkg.rating = Some(rating);
            pkg.review_count = Some(review_count);
        }
        Ok(())
    }
}

#[async_trait]
impl BookingRepository for InMemoryStore {
    async fn insert_booking(&self, booking: NewBooking) -> CoreResult<Booking> {
        let mut tables = self.write();
        if !tables.packages.iter().any(|p| p.id == booking.package_id) {
            return Err(CoreError::StoreError(format!(
                "package {} does not exist",
                booking.package_id
            )));
        }
        let row = Booking {
            id: Uuid::new_v4(),
            user_id: booking.user_id,
            package_id: booking.package_id,
            start_date: booking.start_date,
            end_date: booking.end_date,
            traveler_count: booking.traveler_count,
            total_price: booking.total_price,
            status: booking.status,
            payment_status: booking.payment_status,
            qr_code_url: None,
            created_at: Utc::now(),
        };
        tables.bookings.push(row.clone());
        Ok(row)
    }

    async fn find_booking(&self, id: Uuid) -> CoreResult<Option<Booking>> {
        Ok(self.read().bookings.iter().find(|b| b.id == id).cloned())
    }

    async fn list_bookings(
        &self,
        filter: &BookingFilter,
        page: PageRequest,
    ) -> CoreResult<(Vec<Booking>, PageMeta)> {
        let tables = self.read();
        let matching: Vec<Booking> = newest_first(&tables.bookings, |b| b.created_at)
            .into_iter()
            .filter(|b| filter.matches(b))
            .collect();
        Ok(paged(matching, page))
    }

    async fn set_qr_code(&self, id: Uuid, qr_code_url: &str) -> CoreResult<()> {
        if let Some(b) = self.write().bookings.iter_mut().find(|b| b.id == id) {
            b.qr_code_url = Some(qr_code_url.to_string());
        }
        Ok(())
    }

    async fn record_payment(
        &self,
        id: Uuid,
        payment_status: PaymentStatus,
        status: BookingStatus,
    ) -> CoreResult<Option<Booking>> {
        let mut tables = self.write();
        Ok(tables.bookings.iter_mut().find(|b| b.id == id).map(|b| {
            b.payment_status = payment_status;
            b.status = status;
            b.clone()
        }))
    }
}

#[async_trait]
impl ReviewRepository for InMemoryStore {
    async fn insert_review(&self, review: NewReview) -> CoreResult<Review> {
        let mut tables = self.write();
        if tables.reviews.iter().any(|r| r.booking_id == review.booking_id) {
            return Err(CoreError::StoreError(format!(
                "booking {} already reviewed",
                review.booking_id
            )));
        }
        let row = Review {
            id: Uuid::new_v4(),
            booking_id: review.booking_id,
            package_id: review.package_id,
            rating: review.rating,
            comment: review.comment,
            created_at: Utc::now(),
        };
        tables.reviews.push(row.clone());
        Ok(row)
    }

    async fn has_review_for_booking(&self, booking_id: Uuid) -> CoreResult<bool> {
        Ok(self.read().reviews.iter().any(|r| r.booking_id == booking_id))
    }

    async fn list_reviews(&self, package_id: Uuid, page: PageRequest) -> CoreResult<(Vec<Review>, PageMeta)> {
        let tables = self.read();
        let matching: Vec<Review> = newest_first(&tables.reviews, |r| r.created_at)
            .into_iter()
            .filter(|r| r.package_id == package_id)
            .collect();
        Ok(paged(matching, page))
    }

    async fn ratings_for_package(&self, package_id: Uuid) -> CoreResult<Vec<u8>> {
        Ok(self
            .read()
            .reviews
            .iter()
            .filter(|r| r.package_id == package_id)
            .map(|r| r.rating)
            .collect())
    }
}

/// Builders for published sample rows.
pub mod fixtures {
    use caldera_core::booking::{Booking, BookingStatus, PaymentStatus};
    use caldera_core::catalog::{Destination, ItineraryDay, Package, PackageItem, PackageOption};
    use caldera_core::Money;
    use chrono::{NaiveDate, Utc};
    use uuid::Uuid;

    pub fn destination(slug: &str) -> Destination {
        Destination {
            id: Uuid::new_v4(),
            slug: slug.to_string(),
            name: slug.replace('-', " "),
            description: format!("Curated stays in {slug}"),
            location: "Africa".to_string(),
            image_gallery: vec![format!("https://images.example/{slug}.jpg")],
            rating: None,
            review_count: None,
            featured: false,
            is_published: true,
            created_at: Utc::now(),
        }
    }

    pub fn package(destination_id: Uuid, slug: &str, base_price_dollars: f64) -> Package {
        Package {
            id: Uuid::new_v4(),
            destination_id,
            slug: slug.to_string(),
            title: slug.replace('-', " "),
            description: String::new(),
            category: "adventure".to_string(),
            duration_days: 5,
            group_size_limit: 12,
            inclusions: vec!["Private guide".to_string()],
            exclusions: vec!["International flights".to_string()],
            itinerary: vec![ItineraryDay {
                day: 1,
                title: "Arrival".to_string(),
                activities: vec!["Welcome dinner".to_string()],
            }],
            base_price: Money::from_dollars(base_price_dollars),
            discount_percent: None,
            featured: false,
            luxury_certified: true,
            is_published: true,
            rating: None,
            review_count: None,
            created_at: Utc::now(),
        }
    }

    pub fn item(package_id: Uuid, name: &str, options: &[(&str, f64)]) -> PackageItem {
        let item_id = Uuid::new_v4();
        PackageItem {
            id: item_id,
            package_id,
            name: name.to_string(),
            category: name.to_lowercase(),
            options: options
                .iter()
                .map(|(opt_name, price)| PackageOption {
                    id: Uuid::new_v4(),
                    item_id,
                    name: opt_name.to_string(),
                    price: Money::from_dollars(*price),
                })
                .collect(),
        }
    }

    pub fn booking(user_id: Uuid, package_id: Uuid) -> Booking {
        let start = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap_or_default();
        Booking {
            id: Uuid::new_v4(),
            user_id,
            package_id,
            start_date: start,
            end_date: start + chrono::Days::new(5),
            traveler_count: 2,
            total_price: Money::from_dollars(2000.0),
            status: BookingStatus::Pending,
            payment_status: PaymentStatus::Pending,
            qr_code_url: None,
            created_at: Utc::now(),
        }
    }
}
