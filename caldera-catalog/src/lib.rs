pub mod catalog;
pub mod pricing;

pub use catalog::CatalogService;
pub use pricing::{calc_total, OptionLine, PricingBreakdown, PricingInput, PricingResult};
