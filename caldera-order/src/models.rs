use caldera_catalog::pricing::OptionLine;
use caldera_core::booking::Booking;
use caldera_core::review::Review;
use caldera_core::{CoreError, CoreResult, Money};
use caldera_shared::PageMeta;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const MAX_TRAVELERS: i64 = 50;
pub const MAX_COMMENT_CHARS: usize = 1000;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingRequest {
    pub package_id: String,
    pub start_date: String,
    #[serde(default)]
    pub end_date: Option<String>,
    pub travelers: i64,
    #[serde(default)]
    pub concierge: Option<bool>,
    #[serde(default)]
    pub selected_option_ids: Option<Vec<String>>,
    pub user_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PricingBreakdownView {
    pub base: Money,
    pub options: Vec<OptionLine>,
    pub discount: Money,
    pub taxes: Money,
    pub total: Money,
    pub currency: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CreateBookingResponse {
    #[serde(rename = "bookingId")]
    pub booking_id: Uuid,
    pub tx_ref: String,
    pub total_usd: Money,
    pub pricing_breakdown: PricingBreakdownView,
    pub qr_code_url: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingQuery {
    pub user_id: Option<String>,
    pub status: Option<String>,
    pub payment_status: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BookingList {
    pub bookings: Vec<Booking>,
    #[serde(flatten)]
    pub page: PageMeta,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateReviewRequest {
    pub booking_id: String,
    pub user_id: String,
    pub package_id: String,
    pub rating: i64,
    #[serde(default)]
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewQuery {
    pub package_id: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReviewList {
    pub reviews: Vec<Review>,
    #[serde(rename = "averageRating")]
    pub average_rating: f64,
    #[serde(flatten)]
    pub page: PageMeta,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingConfirmationRequest {
    pub to: String,
    #[serde(default)]
    pub full_name: Option<String>,
    pub booking_id: String,
    pub tx_ref: String,
    #[serde(rename = "totalUSD")]
    pub total_usd: Money,
    pub package_title: String,
    pub start_date: String,
    pub end_date: String,
    pub travelers: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WelcomeRequest {
    pub email: String,
    pub full_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordResetRequest {
    pub email: String,
    pub reset_token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EmailReceipt {
    pub id: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct WebhookAck {
    pub received: bool,
}

pub fn parse_uuid(field: &str, value: &str) -> CoreResult<Uuid> {
    Uuid::parse_str(value.trim()).map_err(|_| CoreError::ValidationError(format!("Invalid {field}")))
}

/// Strict `YYYY-MM-DD` calendar date.
pub fn parse_date(field: &str, value: &str) -> CoreResult<NaiveDate> {
    let shaped = value.len() == 10
        && value.bytes().enumerate().all(|(i, b)| match i {
            4 | 7 => b == b'-',
            _ => b.is_ascii_digit(),
        });
    if !shaped {
        return Err(CoreError::ValidationError(format!(
            "{field} must be in YYYY-MM-DD format"
        )));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| CoreError::ValidationError(format!("{field} is not a valid calendar date")))
}

pub fn require_email(field: &str, value: &str) -> CoreResult<()> {
    match value.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(()),
        _ => Err(CoreError::ValidationError(format!("{field} must be a valid email address"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date_is_strict() {
        assert!(parse_date("startDate", "2025-03-01").is_ok());
        assert!(parse_date("startDate", "2025-3-1").is_err());
        assert!(parse_date("startDate", "2025-02-30").is_err());
        assert!(parse_date("startDate", "01/03/2025").is_err());
    }

    #[test]
    fn test_create_booking_request_uses_camel_case() {
        let req: CreateBookingRequest = serde_json::from_str(
            r#"{"packageId":"p","startDate":"2025-01-01","travelers":2,"userId":"u","selectedOptionIds":["o"]}"#,
        )
        .unwrap();
        assert_eq!(req.travelers, 2);
        assert_eq!(req.selected_option_ids.unwrap(), vec!["o".to_string()]);
        assert!(req.end_date.is_none());
    }

    #[test]
    fn test_require_email() {
        assert!(require_email("to", "guest@example.com").is_ok());
        assert!(require_email("to", "guest").is_err());
        assert!(require_email("to", "@example.com").is_err());
    }
}
