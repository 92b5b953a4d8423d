pub mod booking;
pub mod catalog;
pub mod inventory;
pub mod mailer;
pub mod money;
pub mod payment;
pub mod repository;
pub mod review;

pub use money::Money;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    ValidationError(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("Storage error: {0}")]
    StoreError(String),
    #[error("External service error: {0}")]
    ExternalError(String),
    #[error("Internal service error: {0}")]
    InternalError(String),
}

impl CoreError {
    /// Client-side failures: the request can be fixed by the caller.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            CoreError::ValidationError(_) | CoreError::NotFound(_) | CoreError::Conflict(_)
        )
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
