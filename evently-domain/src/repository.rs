//! Seams to the persistence layer. The API holds these as trait objects so
//! the Postgres store and the in-memory store used by tests are
//! interchangeable.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::booking::{Booking, BookingDetails};
use crate::error::Result;
use crate::event::{Event, EventFilter, EventPatch, NewEvent, PageOf, PageRequest};

#[async_trait]
pub trait EventCatalog: Send + Sync {
    async fn create(&self, new: NewEvent, created_by: Uuid) -> Result<Event>;

    async fn find(&self, id: Uuid) -> Result<Option<Event>>;

    /// Applies a partial update. Fails with `EventNotFound` if the event is
    /// gone; authorization is the caller's concern.
    async fn update(&self, id: Uuid, patch: EventPatch) -> Result<Event>;

    /// Deletes the event, atomically refusing with `EventHasBookings` when
    /// any booking, confirmed or cancelled, still references it.
    async fn delete(&self, id: Uuid) -> Result<()>;

    async fn list(&self, filter: &EventFilter, page: PageRequest) -> Result<PageOf<Event>>;
}

#[async_trait]
pub trait BookingLedger: Send + Sync {
    /// The admission service: runs the full check sequence and persists a
    /// confirmed booking as a single atomic unit per event. Two concurrent
    /// calls near the capacity boundary must never overcommit.
    async fn admit(
        &self,
        user_id: Uuid,
        event_id: Uuid,
        seats: i32,
        now: DateTime<Utc>,
    ) -> Result<BookingDetails>;

    /// The cancellation service: transitions a booking to cancelled under the
    /// eligibility rules, freeing its seats for future admissions.
    async fn cancel(
        &self,
        booking_id: Uuid,
        requester: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Booking>;

    async fn find(&self, id: Uuid) -> Result<Option<BookingDetails>>;

    /// Caller's bookings, newest first.
    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<BookingDetails>>;

    /// Confirmed bookings for an event.
    async fn attendees(&self, event_id: Uuid) -> Result<Vec<Booking>>;

    /// Availability input: sum of seats across confirmed bookings. Always
    /// recomputed from the ledger, never cached.
    async fn confirmed_seats(&self, event_id: Uuid) -> Result<i64>;
}
