use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use evently_domain::admission;
use evently_domain::booking::{Booking, BookingDetails, BookingStatus};
use evently_domain::cancellation;
use evently_domain::error::{Error, Result};
use evently_domain::event::Event;
use evently_domain::ids;
use evently_domain::repository::BookingLedger;

use crate::database::storage_err;
use crate::event_repo::{fetch_event, EventRow};

pub struct PgBookingLedger {
    pool: PgPool,
}

impl PgBookingLedger {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const BOOKING_COLUMNS: &str =
    "id, code, user_id, event_id, seats, total_amount, status, booked_at, cancelled_at";

#[derive(sqlx::FromRow)]
struct BookingRow {
    id: Uuid,
    code: String,
    user_id: Uuid,
    event_id: Uuid,
    seats: i32,
    total_amount: i64,
    status: String,
    booked_at: DateTime<Utc>,
    cancelled_at: Option<DateTime<Utc>>,
}

impl TryFrom<BookingRow> for Booking {
    type Error = Error;

    fn try_from(row: BookingRow) -> Result<Self> {
        Ok(Booking {
            id: row.id,
            code: row.code,
            user_id: row.user_id,
            event_id: row.event_id,
            seats: row.seats,
            total_amount: row.total_amount,
            status: row.status.parse()?,
            booked_at: row.booked_at,
            cancelled_at: row.cancelled_at,
        })
    }
}

#[async_trait]
impl BookingLedger for PgBookingLedger {
    async fn admit(
        &self,
        user_id: Uuid,
        event_id: Uuid,
        seats: i32,
        now: DateTime<Utc>,
    ) -> Result<BookingDetails> {
        let mut tx = self.pool.begin().await.map_err(storage_err)?;

        // Locking the event row serializes concurrent admissions per event:
        // the availability read below cannot interleave with another
        // request's insert for the same event.
        let row = sqlx::query_as::<_, EventRow>(
            "SELECT id, code, title, description, category, location, location_type, \
                    date, start_time, end_time, capacity, price, image, created_by, created_at \
             FROM events WHERE id = $1 FOR UPDATE",
        )
        .bind(event_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(storage_err)?;
        let event: Option<Event> = row.map(Event::try_from).transpose()?;

        let confirmed_seats: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(seats), 0) FROM bookings \
             WHERE event_id = $1 AND status = 'confirmed'",
        )
        .bind(event_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(storage_err)?;

        let already_booked: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM bookings \
             WHERE event_id = $1 AND user_id = $2 AND status = 'confirmed')",
        )
        .bind(event_id)
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(storage_err)?;

        admission::check_admission(seats, event.as_ref(), confirmed_seats, already_booked, now)?;
        let event = event.ok_or(Error::EventNotFound)?;

        let booking = Booking {
            id: Uuid::new_v4(),
            code: ids::booking_code(),
            user_id,
            event_id,
            seats,
            total_amount: admission::total_amount(event.price, seats),
            status: BookingStatus::Confirmed,
            booked_at: now,
            cancelled_at: None,
        };

        sqlx::query(&format!(
            "INSERT INTO bookings ({BOOKING_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)"
        ))
        .bind(booking.id)
        .bind(&booking.code)
        .bind(booking.user_id)
        .bind(booking.event_id)
        .bind(booking.seats)
        .bind(booking.total_amount)
        .bind(booking.status.to_string())
        .bind(booking.booked_at)
        .bind(booking.cancelled_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| match &e {
            // The partial unique index on (user_id, event_id) is the backstop
            // for the duplicate rule.
            sqlx::Error::Database(db) if db.is_unique_violation() => Error::DuplicateBooking,
            _ => storage_err(e),
        })?;

        tx.commit().await.map_err(storage_err)?;

        Ok(BookingDetails { booking, event })
    }

    async fn cancel(
        &self,
        booking_id: Uuid,
        requester: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Booking> {
        let mut tx = self.pool.begin().await.map_err(storage_err)?;

        // Row lock prevents a double-cancel race. No event lock is needed:
        // cancellation only frees seats, so racing an admission can never
        // overcommit capacity.
        let row = sqlx::query_as::<_, BookingRow>(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = $1 FOR UPDATE"
        ))
        .bind(booking_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(storage_err)?;
        let booking: Booking = row.ok_or(Error::BookingNotFound)?.try_into()?;

        let event = fetch_event(&mut *tx, booking.event_id)
            .await?
            .ok_or(Error::EventNotFound)?;

        cancellation::check_cancellation(&booking, &event, requester, now)?;

        sqlx::query("UPDATE bookings SET status = 'cancelled', cancelled_at = $2 WHERE id = $1")
            .bind(booking.id)
            .bind(now)
            .execute(&mut *tx)
            .await
            .map_err(storage_err)?;

        tx.commit().await.map_err(storage_err)?;

        Ok(Booking {
            status: BookingStatus::Cancelled,
            cancelled_at: Some(now),
            ..booking
        })
    }

    async fn find(&self, id: Uuid) -> Result<Option<BookingDetails>> {
        let row = sqlx::query_as::<_, BookingRow>(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_err)?;

        let Some(row) = row else {
            return Ok(None);
        };
        let booking: Booking = row.try_into()?;

        let event = fetch_event(&self.pool, booking.event_id)
            .await?
            .ok_or(Error::EventNotFound)?;

        Ok(Some(BookingDetails { booking, event }))
    }

    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<BookingDetails>> {
        let rows = sqlx::query_as::<_, BookingRow>(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings \
             WHERE user_id = $1 ORDER BY booked_at DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(storage_err)?;

        let mut details = Vec::with_capacity(rows.len());
        for row in rows {
            let booking: Booking = row.try_into()?;
            let event = fetch_event(&self.pool, booking.event_id)
                .await?
                .ok_or(Error::EventNotFound)?;
            details.push(BookingDetails { booking, event });
        }
        Ok(details)
    }

    async fn attendees(&self, event_id: Uuid) -> Result<Vec<Booking>> {
        let rows = sqlx::query_as::<_, BookingRow>(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings \
             WHERE event_id = $1 AND status = 'confirmed' ORDER BY booked_at ASC"
        ))
        .bind(event_id)
        .fetch_all(&self.pool)
        .await
        .map_err(storage_err)?;

        rows.into_iter().map(Booking::try_from).collect()
    }

    async fn confirmed_seats(&self, event_id: Uuid) -> Result<i64> {
        sqlx::query_scalar(
            "SELECT COALESCE(SUM(seats), 0) FROM bookings \
             WHERE event_id = $1 AND status = 'confirmed'",
        )
        .bind(event_id)
        .fetch_one(&self.pool)
        .await
        .map_err(storage_err)
    }
}
