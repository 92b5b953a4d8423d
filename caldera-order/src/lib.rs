pub mod fulfillment;
pub mod lifecycle;
pub mod models;
pub mod notifications;
pub mod orchestrator;
pub mod reviews;
pub mod templates;
pub mod webhook;

pub use fulfillment::{QrGenerator, QrOptions};
pub use lifecycle::PaymentOutcome;
pub use notifications::MailerService;
pub use orchestrator::{BookingFeatures, BookingOrchestrator};
pub use reviews::ReviewService;
pub use webhook::{WebhookDisposition, WebhookProcessor, WebhookReceipt};
