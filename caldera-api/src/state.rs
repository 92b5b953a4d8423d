use std::sync::Arc;
use std::time::Instant;

use caldera_catalog::CatalogService;
use caldera_core::inventory::PartnerInventory;
use caldera_core::mailer::EmailSender;
use caldera_core::repository::{BookingRepository, CatalogRepository, ReviewRepository};
use caldera_order::{BookingFeatures, BookingOrchestrator, MailerService, ReviewService, WebhookProcessor};
use caldera_store::app_config::Config;

use crate::metrics::ApiMetrics;

/// Storage and outbound adapters the services are built on.
#[derive(Clone)]
pub struct Adapters {
    pub catalog: Arc<dyn CatalogRepository>,
    pub bookings: Arc<dyn BookingRepository>,
    pub reviews: Arc<dyn ReviewRepository>,
    pub inventory: Arc<dyn PartnerInventory>,
    pub email: Arc<dyn EmailSender>,
}

#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<CatalogService>,
    pub bookings: Arc<BookingOrchestrator>,
    pub reviews: Arc<ReviewService>,
    pub webhooks: Arc<WebhookProcessor>,
    pub mailer: Arc<MailerService>,
    pub metrics: Arc<ApiMetrics>,
    pub started_at: Instant,
    pub environment: String,
    /// Only origin allowed by CORS in production; any origin otherwise.
    pub allowed_origin: Option<String>,
}

impl AppState {
    pub fn new(adapters: Adapters, config: &Config) -> Result<Self, prometheus::Error> {
        let bookings = BookingOrchestrator::new(
            adapters.catalog.clone(),
            adapters.bookings.clone(),
            adapters.inventory,
        )
        .with_features(BookingFeatures {
            concierge: config.features.concierge,
        });

        let webhooks = WebhookProcessor::new(adapters.bookings.clone(), config.payments.webhook_secret.clone())
            .with_tolerance(config.payments.signature_tolerance_secs);

        Ok(Self {
            catalog: Arc::new(CatalogService::new(adapters.catalog.clone())),
            bookings: Arc::new(bookings),
            reviews: Arc::new(ReviewService::new(
                adapters.catalog,
                adapters.bookings,
                adapters.reviews,
            )),
            webhooks: Arc::new(webhooks),
            mailer: Arc::new(MailerService::new(adapters.email, config.server.base_url.clone())),
            metrics: Arc::new(ApiMetrics::new()?),
            started_at: Instant::now(),
            environment: config.server.environment.clone(),
            allowed_origin: config
                .server
                .is_production()
                .then(|| config.server.base_url.clone()),
        })
    }
}
