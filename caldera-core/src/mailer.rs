use async_trait::async_trait;
use caldera_shared::Masked;
use serde::{Deserialize, Serialize};

use crate::CoreResult;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EmailMessage {
    pub to: Masked<String>,
    pub subject: String,
    pub html: String,
    /// Overrides the configured sender when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
}

/// Outbound transactional email.
#[async_trait]
pub trait EmailSender: Send + Sync {
    /// Returns the provider's message id.
    async fn send(&self, message: &EmailMessage) -> CoreResult<String>;
}
