use uuid::Uuid;

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct BookingCreatedEvent {
    pub booking_id: Uuid,
    pub package_id: Uuid,
    pub user_id: Uuid,
    pub tx_ref: String,
    pub total_cents: i64,
    pub travelers: u32,
    pub timestamp: i64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct PaymentRecordedEvent {
    pub booking_id: Uuid,
    pub event_type: String,
    pub payment_status: String,
    pub booking_status: String,
    pub timestamp: i64,
}
