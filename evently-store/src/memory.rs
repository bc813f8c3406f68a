//! In-memory implementation of the catalog and ledger. A single mutex over
//! the whole state gives the same atomicity the Postgres store gets from its
//! per-event row lock. Used by the HTTP-level tests; also handy for demos
//! without a database.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use uuid::Uuid;

use evently_domain::admission;
use evently_domain::booking::{Booking, BookingDetails, BookingStatus};
use evently_domain::cancellation;
use evently_domain::error::{Error, Result};
use evently_domain::event::{Event, EventFilter, EventPatch, NewEvent, PageOf, PageRequest};
use evently_domain::ids;
use evently_domain::repository::{BookingLedger, EventCatalog};

#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

#[derive(Default)]
struct Inner {
    events: HashMap<Uuid, Event>,
    bookings: HashMap<Uuid, Booking>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Inner {
    fn confirmed_seats(&self, event_id: Uuid) -> i64 {
        self.bookings
            .values()
            .filter(|b| b.event_id == event_id && b.status == BookingStatus::Confirmed)
            .map(|b| i64::from(b.seats))
            .sum()
    }

    fn already_booked(&self, event_id: Uuid, user_id: Uuid) -> bool {
        self.bookings.values().any(|b| {
            b.event_id == event_id
                && b.user_id == user_id
                && b.status == BookingStatus::Confirmed
        })
    }
}

fn matches(event: &Event, filter: &EventFilter) -> bool {
    if let Some(category) = filter.category {
        if event.category != category {
            return false;
        }
    }
    if let Some(location_type) = filter.location_type {
        if event.location_type != location_type {
            return false;
        }
    }
    if let Some(day) = filter.day {
        if event.date.date_naive() != day {
            return false;
        }
    }
    true
}

#[async_trait]
impl EventCatalog for MemoryStore {
    async fn create(&self, new: NewEvent, created_by: Uuid) -> Result<Event> {
        new.validate()?;

        let event = Event {
            id: Uuid::new_v4(),
            code: ids::event_code(),
            title: new.title,
            description: new.description,
            category: new.category,
            location: new.location,
            location_type: new.location_type,
            date: new.date,
            start_time: new.start_time,
            end_time: new.end_time,
            capacity: new.capacity,
            price: new.price,
            image: new.image,
            created_by,
            created_at: Utc::now(),
        };

        self.lock().events.insert(event.id, event.clone());
        Ok(event)
    }

    async fn find(&self, id: Uuid) -> Result<Option<Event>> {
        Ok(self.lock().events.get(&id).cloned())
    }

    async fn update(&self, id: Uuid, patch: EventPatch) -> Result<Event> {
        patch.validate()?;

        let mut inner = self.lock();
        let event = inner.events.get_mut(&id).ok_or(Error::EventNotFound)?;

        if let Some(title) = patch.title {
            event.title = title;
        }
        if let Some(description) = patch.description {
            event.description = description;
        }
        if let Some(category) = patch.category {
            event.category = category;
        }
        if let Some(location) = patch.location {
            event.location = location;
        }
        if let Some(location_type) = patch.location_type {
            event.location_type = location_type;
        }
        if let Some(date) = patch.date {
            event.date = date;
        }
        if let Some(start_time) = patch.start_time {
            event.start_time = start_time;
        }
        if let Some(end_time) = patch.end_time {
            event.end_time = end_time;
        }
        if let Some(capacity) = patch.capacity {
            event.capacity = capacity;
        }
        if let Some(price) = patch.price {
            event.price = price;
        }
        if let Some(image) = patch.image {
            event.image = Some(image);
        }

        Ok(event.clone())
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        let mut inner = self.lock();
        if !inner.events.contains_key(&id) {
            return Err(Error::EventNotFound);
        }
        if inner.bookings.values().any(|b| b.event_id == id) {
            return Err(Error::EventHasBookings);
        }
        inner.events.remove(&id);
        Ok(())
    }

    async fn list(&self, filter: &EventFilter, page: PageRequest) -> Result<PageOf<Event>> {
        let inner = self.lock();
        let mut all: Vec<Event> = inner
            .events
            .values()
            .filter(|e| matches(e, filter))
            .cloned()
            .collect();
        all.sort_by_key(|e| e.date);

        let total = all.len() as u64;
        let items = all
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.limit as usize)
            .collect();

        Ok(PageOf { items, total })
    }
}

#[async_trait]
impl BookingLedger for MemoryStore {
    async fn admit(
        &self,
        user_id: Uuid,
        event_id: Uuid,
        seats: i32,
        now: DateTime<Utc>,
    ) -> Result<BookingDetails> {
        // One lock across check and insert keeps the admission atomic.
        let mut inner = self.lock();

        let event = inner.events.get(&event_id).cloned();
        let confirmed_seats = inner.confirmed_seats(event_id);
        let already_booked = inner.already_booked(event_id, user_id);

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

        inner.bookings.insert(booking.id, booking.clone());
        Ok(BookingDetails { booking, event })
    }

    async fn cancel(
        &self,
        booking_id: Uuid,
        requester: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Booking> {
        let mut inner = self.lock();

        let booking = inner
            .bookings
            .get(&booking_id)
            .cloned()
            .ok_or(Error::BookingNotFound)?;
        let event = inner
            .events
            .get(&booking.event_id)
            .cloned()
            .ok_or(Error::EventNotFound)?;

        cancellation::check_cancellation(&booking, &event, requester, now)?;

        let booking = inner
            .bookings
            .get_mut(&booking_id)
            .ok_or(Error::BookingNotFound)?;
        booking.status = BookingStatus::Cancelled;
        booking.cancelled_at = Some(now);

        Ok(booking.clone())
    }

    async fn find(&self, id: Uuid) -> Result<Option<BookingDetails>> {
        let inner = self.lock();
        let Some(booking) = inner.bookings.get(&id).cloned() else {
            return Ok(None);
        };
        let event = inner
            .events
            .get(&booking.event_id)
            .cloned()
            .ok_or(Error::EventNotFound)?;
        Ok(Some(BookingDetails { booking, event }))
    }

    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<BookingDetails>> {
        let inner = self.lock();
        let mut bookings: Vec<Booking> = inner
            .bookings
            .values()
            .filter(|b| b.user_id == user_id)
            .cloned()
            .collect();
        bookings.sort_by(|a, b| b.booked_at.cmp(&a.booked_at));

        bookings
            .into_iter()
            .map(|booking| {
                let event = inner
                    .events
                    .get(&booking.event_id)
                    .cloned()
                    .ok_or(Error::EventNotFound)?;
                Ok(BookingDetails { booking, event })
            })
            .collect()
    }

    async fn attendees(&self, event_id: Uuid) -> Result<Vec<Booking>> {
        let inner = self.lock();
        let mut attendees: Vec<Booking> = inner
            .bookings
            .values()
            .filter(|b| b.event_id == event_id && b.status == BookingStatus::Confirmed)
            .cloned()
            .collect();
        attendees.sort_by_key(|b| b.booked_at);
        Ok(attendees)
    }

    async fn confirmed_seats(&self, event_id: Uuid) -> Result<i64> {
        Ok(self.lock().confirmed_seats(event_id))
    }
}
