pub mod app_config;
pub mod booking_repo;
pub mod catalog_repo;
pub mod database;
pub mod email;
pub mod memory;
pub mod review_repo;

pub use app_config::Config;
pub use booking_repo::PgBookingRepository;
pub use catalog_repo::PgCatalogRepository;
pub use database::DbClient;
pub use email::ResendEmailSender;
pub use memory::InMemoryStore;
pub use review_repo::PgReviewRepository;
