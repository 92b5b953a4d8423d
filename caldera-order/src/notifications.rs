use std::sync::Arc;

use caldera_core::mailer::{EmailMessage, EmailSender};
use caldera_core::{CoreError, CoreResult};
use caldera_shared::Masked;

use crate::fulfillment::{booking_payload, QrGenerator};
use crate::models::{require_email, BookingConfirmationRequest, EmailReceipt, PasswordResetRequest, WelcomeRequest};
use crate::templates::{self, ConfirmationView, BRAND};

/// Templated transactional email on top of an [`EmailSender`].
pub struct MailerService {
    sender: Arc<dyn EmailSender>,
    qr: QrGenerator,
    app_base_url: String,
}

impl MailerService {
    pub fn new(sender: Arc<dyn EmailSender>, app_base_url: impl Into<String>) -> Self {
        Self {
            sender,
            qr: QrGenerator::default(),
            app_base_url: app_base_url.into(),
        }
    }

    pub async fn send_email(
        &self,
        to: &str,
        subject: &str,
        html: String,
        from: Option<String>,
    ) -> CoreResult<EmailReceipt> {
        let message = EmailMessage {
            to: Masked::new(to.to_string()),
            subject: subject.to_string(),
            html,
            from,
        };
        let recipient = message.to.redacted_email();

        match self.sender.send(&message).await {
            Ok(id) => {
                tracing::info!(to = %recipient, message_id = %id, "email sent");
                Ok(EmailReceipt { id })
            }
            Err(e) => {
                tracing::error!(to = %recipient, error = %e, "failed to send email");
                Err(match e {
                    CoreError::ExternalError(msg) => CoreError::ExternalError(format!("Email sending failed: {msg}")),
                    other => other,
                })
            }
        }
    }

    pub async fn send_booking_confirmation(&self, request: BookingConfirmationRequest) -> CoreResult<EmailReceipt> {
        require_email("to", &request.to)?;
        if request.booking_id.trim().is_empty() || request.tx_ref.trim().is_empty() {
            return Err(CoreError::ValidationError(
                "bookingId and txRef are required".to_string(),
            ));
        }
        if request.travelers == 0 {
            return Err(CoreError::ValidationError("travelers must be at least 1".to_string()));
        }

        let qr = self.qr.generate(&format_booking_payload(&request.booking_id))?;
        let html = templates::booking_confirmation(&ConfirmationView {
            full_name: request.full_name.as_deref(),
            booking_id: &request.booking_id,
            tx_ref: &request.tx_ref,
            package_title: &request.package_title,
            start_date: &request.start_date,
            end_date: &request.end_date,
            travelers: request.travelers,
            total: request.total_usd,
            qr_code_url: &qr.data_url,
        });

        self.send_email(
            &request.to,
            &format!("Booking Confirmation - {}", request.package_title),
            html,
            None,
        )
        .await
    }

    pub async fn send_welcome(&self, request: WelcomeRequest) -> CoreResult<EmailReceipt> {
        require_email("email", &request.email)?;
        let html = templates::welcome(&request.full_name);
        self.send_email(
            &request.email,
            &format!("Welcome to {BRAND} - Your Luxury Travel Journey Begins"),
            html,
            None,
        )
        .await
    }

    pub async fn send_password_reset(&self, request: PasswordResetRequest) -> CoreResult<EmailReceipt> {
        require_email("email", &request.email)?;
        if request.reset_token.trim().is_empty() {
            return Err(CoreError::ValidationError("resetToken is required".to_string()));
        }
        let html = templates::password_reset(&self.reset_url(&request.reset_token));
        self.send_email(
            &request.email,
            &format!("Password Reset Request - {BRAND}"),
            html,
            None,
        )
        .await
    }

    pub fn reset_url(&self, token: &str) -> String {
        format!(
            "{}/reset-password?token={}",
            self.app_base_url.trim_end_matches('/'),
            token
        )
    }
}

/// The confirmation endpoint takes the booking id as free text.
fn format_booking_payload(booking_id: &str) -> String {
    match uuid::Uuid::parse_str(booking_id) {
        Ok(id) => booking_payload(id),
        Err(_) => format!("booking:{booking_id}"),
    }
}
