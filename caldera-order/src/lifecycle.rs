use caldera_core::booking::{BookingStatus, PaymentStatus};

/// What a payment provider event means for a booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentOutcome {
    Paid,
    Failed,
    Refunded,
}

impl PaymentOutcome {
    /// Maps a provider event type; `None` for events we do not act on.
    pub fn from_event_type(event_type: &str) -> Option<Self> {
        match event_type {
            "payment_intent.succeeded" | "charge.succeeded" => Some(PaymentOutcome::Paid),
            "payment_intent.payment_failed" | "charge.failed" => Some(PaymentOutcome::Failed),
            "charge.refunded" => Some(PaymentOutcome::Refunded),
            _ => None,
        }
    }

    pub fn payment_status(self) -> PaymentStatus {
        match self {
            PaymentOutcome::Paid => PaymentStatus::Paid,
            PaymentOutcome::Failed => PaymentStatus::Failed,
            PaymentOutcome::Refunded => PaymentStatus::Refunded,
        }
    }

    /// Failed payments leave the booking open for another attempt.
    pub fn booking_status(self) -> BookingStatus {
        match self {
            PaymentOutcome::Paid => BookingStatus::Confirmed,
            PaymentOutcome::Failed => BookingStatus::Pending,
            PaymentOutcome::Refunded => BookingStatus::Cancelled,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_mapping() {
        let cases = [
            ("payment_intent.succeeded", PaymentStatus::Paid, BookingStatus::Confirmed),
            ("charge.succeeded", PaymentStatus::Paid, BookingStatus::Confirmed),
            ("payment_intent.payment_failed", PaymentStatus::Failed, BookingStatus::Pending),
            ("charge.failed", PaymentStatus::Failed, BookingStatus::Pending),
            ("charge.refunded", PaymentStatus::Refunded, BookingStatus::Cancelled),
        ];
        for (event, payment, booking) in cases {
            let outcome = PaymentOutcome::from_event_type(event).unwrap();
            assert_eq!(outcome.payment_status(), payment, "{event}");
            assert_eq!(outcome.booking_status(), booking, "{event}");
        }
    }

    #[test]
    fn test_unhandled_events() {
        assert_eq!(PaymentOutcome::from_event_type("customer.created"), None);
        assert_eq!(PaymentOutcome::from_event_type(""), None);
    }
}
