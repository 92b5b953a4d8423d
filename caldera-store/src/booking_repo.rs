use async_trait::async_trait;
use caldera_core::booking::{Booking, BookingFilter, BookingStatus, NewBooking, PaymentStatus};
use caldera_core::repository::BookingRepository;
use caldera_core::{CoreError, CoreResult, Money};
use caldera_shared::{PageMeta, PageRequest};
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::store_error;

pub struct PgBookingRepository {
    pool: PgPool,
}

impl PgBookingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct BookingRow {
    id: Uuid,
    user_id: Uuid,
    package_id: Uuid,
    start_date: NaiveDate,
    end_date: NaiveDate,
    traveler_count: i32,
    total_price_cents: i64,
    status: String,
    payment_status: String,
    qr_code_url: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<BookingRow> for Booking {
    type Error = CoreError;

    fn try_from(row: BookingRow) -> Result<Self, Self::Error> {
        Ok(Booking {
            id: row.id,
            user_id: row.user_id,
            package_id: row.package_id,
            start_date: row.start_date,
            end_date: row.end_date,
            traveler_count: u32::try_from(row.traveler_count)
                .map_err(|_| CoreError::StoreError(format!("invalid traveler_count {}", row.traveler_count)))?,
            total_price: Money::from_cents(row.total_price_cents),
            status: row.status.parse::<BookingStatus>().map_err(CoreError::StoreError)?,
            payment_status: row.payment_status.parse::<PaymentStatus>().map_err(CoreError::StoreError)?,
            qr_code_url: row.qr_code_url,
            created_at: row.created_at,
        })
    }
}

const BOOKING_COLUMNS: &str = "id, user_id, package_id, start_date, end_date, traveler_count, \
     total_price_cents, status, payment_status, qr_code_url, created_at";

const BOOKING_WHERE: &str = "user_id = $1 \
     AND ($2::text IS NULL OR status = $2) \
     AND ($3::text IS NULL OR payment_status = $3)";

#[async_trait]
impl BookingRepository for PgBookingRepository {
    async fn insert_booking(&self, booking: NewBooking) -> CoreResult<Booking> {
        let sql = format!(
            "INSERT INTO bookings (id, user_id, package_id, start_date, end_date, traveler_count, \
             total_price_cents, status, payment_status) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) RETURNING {BOOKING_COLUMNS}"
        );
        let row: BookingRow = sqlx::query_as(&sql)
            .bind(Uuid::new_v4())
            .bind(booking.user_id)
            .bind(booking.package_id)
            .bind(booking.start_date)
            .bind(booking.end_date)
            .bind(booking.traveler_count as i32)
            .bind(booking.total_price.cents())
            .bind(booking.status.as_str())
            .bind(booking.payment_status.as_str())
            .fetch_one(&self.pool)
            .await
            .map_err(store_error)?;
        row.try_into()
    }

    async fn find_booking(&self, id: Uuid) -> CoreResult<Option<Booking>> {
        let sql = format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = $1");
        let row: Option<BookingRow> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(store_error)?;
        row.map(Booking::try_from).transpose()
    }

    async fn list_bookings(
        &self,
        filter: &BookingFilter,
        page: PageRequest,
    ) -> CoreResult<(Vec<Booking>, PageMeta)> {
        let status = filter.status.map(|s| s.as_str());
        let payment_status = filter.payment_status.map(|s| s.as_str());

        let list_sql = format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE {BOOKING_WHERE} \
             ORDER BY created_at DESC LIMIT $4 OFFSET $5"
        );
        let rows: Vec<BookingRow> = sqlx::query_as(&list_sql)
            .bind(filter.user_id)
            .bind(status)
            .bind(payment_status)
            .bind(page.limit)
            .bind(page.offset)
            .fetch_all(&self.pool)
            .await
            .map_err(store_error)?;

        let count_sql = format!("SELECT COUNT(*) FROM bookings WHERE {BOOKING_WHERE}");
        let total: i64 = sqlx::query_scalar(&count_sql)
            .bind(filter.user_id)
            .bind(status)
            .bind(payment_status)
            .fetch_one(&self.pool)
            .await
            .map_err(store_error)?;

        let bookings = rows
            .into_iter()
            .map(Booking::try_from)
            .collect::<CoreResult<Vec<_>>>()?;
        Ok((bookings, page.meta(total)))
    }

    async fn set_qr_code(&self, id: Uuid, qr_code_url: &str) -> CoreResult<()> {
        sqlx::query("UPDATE bookings SET qr_code_url = $2 WHERE id = $1")
            .bind(id)
            .bind(qr_code_url)
            .execute(&self.pool)
            .await
            .map_err(store_error)?;
        Ok(())
    }

    async fn record_payment(
        &self,
        id: Uuid,
        payment_status: PaymentStatus,
        status: BookingStatus,
    ) -> CoreResult<Option<Booking>> {
        let sql = format!(
            "UPDATE bookings SET payment_status = $2, status = $3 WHERE id = $1 RETURNING {BOOKING_COLUMNS}"
        );
        let row: Option<BookingRow> = sqlx::query_as(&sql)
            .bind(id)
            .bind(payment_status.as_str())
            .bind(status.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(store_error)?;
        row.map(Booking::try_from).transpose()
    }
}
