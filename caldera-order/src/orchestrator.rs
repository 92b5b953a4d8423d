use std::sync::Arc;

use caldera_catalog::pricing::{calc_total, OptionLine, PricingInput};
use caldera_core::booking::{Booking, BookingFilter, BookingStatus, NewBooking, PaymentStatus};
use caldera_core::inventory::PartnerInventory;
use caldera_core::repository::{BookingRepository, CatalogRepository};
use caldera_core::{CoreError, CoreResult};
use caldera_shared::models::events::BookingCreatedEvent;
use caldera_shared::PageRequest;
use chrono::{Days, NaiveDate};
use rand::distributions::Alphanumeric;
use rand::Rng;
use uuid::Uuid;

use crate::fulfillment::QrGenerator;
use crate::models::{
    parse_date, parse_uuid, BookingList, BookingQuery, CreateBookingRequest, CreateBookingResponse,
    PricingBreakdownView, MAX_TRAVELERS,
};

const TX_REF_PREFIX: &str = "NT_";
const TX_REF_LEN: usize = 16;

/// Toggles for optional booking extras.
#[derive(Debug, Clone, Copy)]
pub struct BookingFeatures {
    pub concierge: bool,
}

impl Default for BookingFeatures {
    fn default() -> Self {
        Self { concierge: true }
    }
}

/// A create request after validation.
#[derive(Debug, Clone, PartialEq)]
struct BookingDraft {
    package_id: Uuid,
    user_id: Uuid,
    start_date: NaiveDate,
    end_date: Option<NaiveDate>,
    travelers: u32,
    option_ids: Vec<Uuid>,
}

/// Drives booking creation across the catalog, booking store, QR rendering
/// and partner inventory.
///
/// Steps after the insert are not compensated: a failure there leaves a
/// pending booking behind.
pub struct BookingOrchestrator {
    catalog: Arc<dyn CatalogRepository>,
    bookings: Arc<dyn BookingRepository>,
    inventory: Arc<dyn PartnerInventory>,
    qr: QrGenerator,
    features: BookingFeatures,
}

impl BookingOrchestrator {
    pub fn new(
        catalog: Arc<dyn CatalogRepository>,
        bookings: Arc<dyn BookingRepository>,
        inventory: Arc<dyn PartnerInventory>,
    ) -> Self {
        Self {
            catalog,
            bookings,
            inventory,
            qr: QrGenerator::default(),
            features: BookingFeatures::default(),
        }
    }

    pub fn with_features(mut self, features: BookingFeatures) -> Self {
        self.features = features;
        self
    }

    pub fn with_qr(mut self, qr: QrGenerator) -> Self {
        self.qr = qr;
        self
    }

    pub async fn create_booking(&self, request: CreateBookingRequest) -> CoreResult<CreateBookingResponse> {
        let draft = self.validate(&request)?;

        let package = self
            .catalog
            .find_published_package(draft.package_id)
            .await?
            .ok_or_else(|| {
                CoreError::NotFound(format!(
                    "Package with ID '{}' not found or not published",
                    draft.package_id
                ))
            })?;

        if draft.travelers > package.group_size_limit {
            return Err(CoreError::Conflict(format!(
                "Package allows at most {} travelers",
                package.group_size_limit
            )));
        }

        let end_date = match draft.end_date {
            Some(end) => end,
            None => draft
                .start_date
                .checked_add_days(Days::new(u64::from(package.duration_days)))
                .ok_or_else(|| CoreError::ValidationError("startDate is out of range".to_string()))?,
        };

        let selected_options: Vec<OptionLine> = if draft.option_ids.is_empty() {
            Vec::new()
        } else {
            self.catalog
                .find_options(&draft.option_ids)
                .await?
                .into_iter()
                .map(|opt| OptionLine {
                    id: opt.id,
                    name: opt.name,
                    price: opt.price,
                    qty: Some(1),
                })
                .collect()
        };

        let pricing = calc_total(PricingInput {
            base_price: package.base_price,
            discount_percent: package.discount_percent,
            selected_options,
            travelers: draft.travelers,
        });

        let tx_ref = generate_tx_ref();

        let booking = self
            .bookings
            .insert_booking(NewBooking {
                user_id: draft.user_id,
                package_id: package.id,
                start_date: draft.start_date,
                end_date,
                traveler_count: draft.travelers,
                total_price: pricing.total,
                status: BookingStatus::Pending,
                payment_status: PaymentStatus::Pending,
            })
            .await?;

        let qr = self.qr.for_booking(booking.id)?;

        if let Err(e) = self.bookings.set_qr_code(booking.id, &qr.data_url).await {
            tracing::warn!(booking_id = %booking.id, error = %e, "failed to store booking QR code");
        }

        if let Err(e) = self
            .inventory
            .freeze_assignments(booking.id, package.id, draft.start_date, end_date)
            .await
        {
            tracing::warn!(booking_id = %booking.id, error = %e, "partner assignment freeze failed");
        }

        let event = BookingCreatedEvent {
            booking_id: booking.id,
            package_id: package.id,
            user_id: draft.user_id,
            tx_ref: tx_ref.clone(),
            total_cents: pricing.total.cents(),
            travelers: draft.travelers,
            timestamp: chrono::Utc::now().timestamp(),
        };
        match serde_json::to_string(&event) {
            Ok(payload) => tracing::info!(event = %payload, "booking created"),
            Err(e) => tracing::warn!(error = %e, "failed to serialize booking event"),
        }

        Ok(CreateBookingResponse {
            booking_id: booking.id,
            tx_ref,
            total_usd: pricing.total,
            pricing_breakdown: PricingBreakdownView {
                base: pricing.breakdown.base,
                options: pricing.breakdown.options,
                discount: pricing.breakdown.discount,
                taxes: pricing.breakdown.taxes,
                total: pricing.total,
                currency: pricing.currency,
            },
            qr_code_url: qr.data_url,
        })
    }

    pub async fn get_booking(&self, id: Uuid) -> CoreResult<Booking> {
        self.bookings
            .find_booking(id)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("Booking with ID '{id}' not found")))
    }

    pub async fn list_user_bookings(&self, query: BookingQuery) -> CoreResult<BookingList> {
        let user_id = query
            .user_id
            .as_deref()
            .ok_or_else(|| CoreError::ValidationError("userId is required".to_string()))
            .and_then(|id| parse_uuid("user ID", id))?;
        let status = query
            .status
            .as_deref()
            .map(str::parse::<BookingStatus>)
            .transpose()
            .map_err(CoreError::ValidationError)?;
        let payment_status = query
            .payment_status
            .as_deref()
            .map(str::parse::<PaymentStatus>)
            .transpose()
            .map_err(CoreError::ValidationError)?;
        let page = PageRequest::from_parts(query.limit, query.offset).map_err(CoreError::ValidationError)?;

        let filter = BookingFilter {
            user_id,
            status,
            payment_status,
        };
        let (bookings, page) = self.bookings.list_bookings(&filter, page).await?;
        Ok(BookingList { bookings, page })
    }

    fn validate(&self, request: &CreateBookingRequest) -> CoreResult<BookingDraft> {
        let package_id = parse_uuid("package ID", &request.package_id)?;
        let user_id = parse_uuid("user ID", &request.user_id)?;
        let start_date = parse_date("Start date", &request.start_date)?;
        let end_date = request
            .end_date
            .as_deref()
            .map(|d| parse_date("End date", d))
            .transpose()?;

        if request.travelers < 1 {
            return Err(CoreError::ValidationError("Must have at least 1 traveler".to_string()));
        }
        if request.travelers > MAX_TRAVELERS {
            return Err(CoreError::ValidationError(format!(
                "Maximum {MAX_TRAVELERS} travelers allowed"
            )));
        }
        if let Some(end) = end_date {
            if end < start_date {
                return Err(CoreError::ValidationError(
                    "End date must not be before start date".to_string(),
                ));
            }
        }
        if request.concierge == Some(true) && !self.features.concierge {
            return Err(CoreError::ValidationError(
                "Concierge service is not available".to_string(),
            ));
        }

        let option_ids = request
            .selected_option_ids
            .as_deref()
            .unwrap_or_default()
            .iter()
            .map(|id| parse_uuid("option ID", id))
            .collect::<CoreResult<Vec<_>>>()?;

        Ok(BookingDraft {
            package_id,
            user_id,
            start_date,
            end_date,
            // Bounded to 1..=50 above.
            travelers: request.travelers as u32,
            option_ids,
        })
    }
}

/// `NT_` followed by 16 uppercase alphanumerics.
pub fn generate_tx_ref() -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(TX_REF_LEN)
        .map(|b| char::from(b).to_ascii_uppercase())
        .collect();
    format!("{TX_REF_PREFIX}{suffix}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use caldera_core::inventory::NoopPartnerInventory;
    use caldera_core::Money;
    use caldera_store::memory::{fixtures, InMemoryStore};

    struct Fixture {
        store: Arc<InMemoryStore>,
        orchestrator: BookingOrchestrator,
        package_id: Uuid,
    }

    fn setup() -> Fixture {
        let store = Arc::new(InMemoryStore::new());
        let dest = store.seed_destination(fixtures::destination("tanzania"));
        let mut pkg = fixtures::package(dest.id, "serengeti", 2000.0);
        pkg.discount_percent = Some(10.0);
        pkg.duration_days = 7;
        pkg.group_size_limit = 8;
        let pkg = store.seed_package(pkg);
        let orchestrator = BookingOrchestrator::new(store.clone(), store.clone(), Arc::new(NoopPartnerInventory));
        Fixture {
            store,
            orchestrator,
            package_id: pkg.id,
        }
    }

    fn request(package_id: Uuid) -> CreateBookingRequest {
        CreateBookingRequest {
            package_id: package_id.to_string(),
            start_date: "2025-03-01".to_string(),
            end_date: None,
            travelers: 2,
            concierge: None,
            selected_option_ids: None,
            user_id: Uuid::new_v4().to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_booking_prices_and_persists() {
        let fx = setup();
        let resp = fx.orchestrator.create_booking(request(fx.package_id)).await.unwrap();

        assert_eq!(resp.total_usd, Money::from_dollars(1800.0));
        assert_eq!(resp.pricing_breakdown.discount, Money::from_dollars(200.0));
        assert_eq!(resp.pricing_breakdown.currency, "USD");
        assert!(resp.qr_code_url.starts_with("data:image/svg+xml;base64,"));

        let booking = fx.orchestrator.get_booking(resp.booking_id).await.unwrap();
        assert_eq!(booking.status, BookingStatus::Pending);
        assert_eq!(booking.payment_status, PaymentStatus::Pending);
        assert_eq!(booking.end_date, NaiveDate::from_ymd_opt(2025, 3, 8).unwrap());
        assert_eq!(booking.qr_code_url.as_deref(), Some(resp.qr_code_url.as_str()));
        assert_eq!(booking.total_price, resp.total_usd);
    }

    #[tokio::test]
    async fn test_selected_options_are_priced_and_unknown_ids_ignored() {
        let fx = setup();
        let item = fx
            .store
            .seed_item(fixtures::item(fx.package_id, "Accommodation", &[("Suite", 500.0)]));
        let mut req = request(fx.package_id);
        req.selected_option_ids = Some(vec![item.options[0].id.to_string(), Uuid::new_v4().to_string()]);

        let resp = fx.orchestrator.create_booking(req).await.unwrap();
        assert_eq!(resp.pricing_breakdown.options.len(), 1);
        assert_eq!(resp.pricing_breakdown.options[0].qty, Some(1));
        // (2000 + 500) * 0.9
        assert_eq!(resp.total_usd, Money::from_dollars(2250.0));
    }

    #[tokio::test]
    async fn test_explicit_end_date_is_kept() {
        let fx = setup();
        let mut req = request(fx.package_id);
        req.end_date = Some("2025-03-04".to_string());
        let resp = fx.orchestrator.create_booking(req).await.unwrap();
        let booking = fx.orchestrator.get_booking(resp.booking_id).await.unwrap();
        assert_eq!(booking.end_date, NaiveDate::from_ymd_opt(2025, 3, 4).unwrap());
    }

    #[tokio::test]
    async fn test_validation_failures() {
        let fx = setup();
        let cases: Vec<Box<dyn Fn(&mut CreateBookingRequest)>> = vec![
            Box::new(|r| r.package_id = "not-a-uuid".to_string()),
            Box::new(|r| r.user_id = "nope".to_string()),
            Box::new(|r| r.start_date = "03/01/2025".to_string()),
            Box::new(|r| r.travelers = 0),
            Box::new(|r| r.travelers = 51),
            Box::new(|r| r.end_date = Some("2025-02-01".to_string())),
            Box::new(|r| r.selected_option_ids = Some(vec!["bad".to_string()])),
        ];
        for mutate in cases {
            let mut req = request(fx.package_id);
            mutate(&mut req);
            let err = fx.orchestrator.create_booking(req).await.unwrap_err();
            assert!(matches!(err, CoreError::ValidationError(_)), "{err:?}");
        }
    }

    #[tokio::test]
    async fn test_unpublished_package_is_not_found() {
        let fx = setup();
        let dest = fx.store.seed_destination(fixtures::destination("peru"));
        let mut hidden = fixtures::package(dest.id, "inca-trail", 3000.0);
        hidden.is_published = false;
        let hidden = fx.store.seed_package(hidden);

        let err = fx.orchestrator.create_booking(request(hidden.id)).await.unwrap_err();
        assert!(matches!(err, CoreError::NotFound(_)));
        let err = fx.orchestrator.create_booking(request(Uuid::new_v4())).await.unwrap_err();
        assert!(matches!(err, CoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_group_size_limit_is_a_conflict() {
        let fx = setup();
        let mut req = request(fx.package_id);
        req.travelers = 9;
        let err = fx.orchestrator.create_booking(req).await.unwrap_err();
        assert!(matches!(err, CoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_concierge_respects_feature_flag() {
        let fx = setup();
        let orchestrator = BookingOrchestrator::new(fx.store.clone(), fx.store.clone(), Arc::new(NoopPartnerInventory))
            .with_features(BookingFeatures { concierge: false });
        let mut req = request(fx.package_id);
        req.concierge = Some(true);
        assert!(matches!(
            orchestrator.create_booking(req.clone()).await.unwrap_err(),
            CoreError::ValidationError(_)
        ));
        assert!(fx.orchestrator.create_booking(req).await.is_ok());
    }

    struct FailingInventory;

    #[async_trait]
    impl PartnerInventory for FailingInventory {
        async fn freeze_assignments(&self, _: Uuid, _: Uuid, _: NaiveDate, _: NaiveDate) -> CoreResult<()> {
            Err(CoreError::ExternalError("partner down".to_string()))
        }
    }

    #[tokio::test]
    async fn test_inventory_failure_is_not_fatal() {
        let fx = setup();
        let orchestrator = BookingOrchestrator::new(fx.store.clone(), fx.store.clone(), Arc::new(FailingInventory));
        assert!(orchestrator.create_booking(request(fx.package_id)).await.is_ok());
    }

    #[tokio::test]
    async fn test_list_user_bookings_filters() {
        let fx = setup();
        let req = request(fx.package_id);
        let user_id = req.user_id.clone();
        let first = fx.orchestrator.create_booking(req.clone()).await.unwrap();
        fx.orchestrator.create_booking(req).await.unwrap();
        fx.orchestrator.create_booking(request(fx.package_id)).await.unwrap();

        fx.store
            .record_payment(first.booking_id, PaymentStatus::Paid, BookingStatus::Confirmed)
            .await
            .unwrap();

        let all = fx
            .orchestrator
            .list_user_bookings(BookingQuery {
                user_id: Some(user_id.clone()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(all.page.total, 2);
        assert!(!all.page.has_more);

        let paid = fx
            .orchestrator
            .list_user_bookings(BookingQuery {
                user_id: Some(user_id),
                payment_status: Some("paid".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(paid.bookings.len(), 1);
        assert_eq!(paid.bookings[0].id, first.booking_id);

        let err = fx
            .orchestrator
            .list_user_bookings(BookingQuery::default())
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::ValidationError(_)));
    }

    #[test]
    fn test_tx_ref_format() {
        let tx_ref = generate_tx_ref();
        assert!(tx_ref.starts_with("NT_"));
        let suffix = &tx_ref[3..];
        assert_eq!(suffix.len(), 16);
        assert!(suffix.chars().all(|c| c.is_ascii_digit() || c.is_ascii_uppercase()));
    }
}
