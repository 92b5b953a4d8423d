use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use crate::CoreResult;

/// Holds partner allotments (rooms, vehicles, guides) for a booked stay.
#[async_trait]
pub trait PartnerInventory: Send + Sync {
    async fn freeze_assignments(
        &self,
        booking_id: Uuid,
        package_id: Uuid,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> CoreResult<()>;
}

/// Accepts every request. Used until a partner integration is wired in.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopPartnerInventory;

#[async_trait]
impl PartnerInventory for NoopPartnerInventory {
    async fn freeze_assignments(
        &self,
        booking_id: Uuid,
        package_id: Uuid,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> CoreResult<()> {
        tracing::debug!(
            %booking_id,
            %package_id,
            %start_date,
            %end_date,
            "partner assignment freeze skipped"
        );
        Ok(())
    }
}
