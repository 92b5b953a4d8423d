pub mod models;
pub mod pagination;
pub mod pii;

pub use pagination::{PageMeta, PageRequest};
pub use pii::Masked;
