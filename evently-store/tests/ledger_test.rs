//! Ledger behavior exercised through the repository traits against the
//! in-memory store, including the concurrent-admission property.

use chrono::{Duration, Utc};
use std::sync::Arc;
use uuid::Uuid;

use evently_domain::booking::BookingStatus;
use evently_domain::error::Error;
use evently_domain::event::{Category, EventFilter, LocationType, NewEvent, PageRequest};
use evently_domain::repository::{BookingLedger, EventCatalog};
use evently_store::MemoryStore;

fn upcoming_event(capacity: i32, price: i64) -> NewEvent {
    NewEvent {
        title: "Rust Conf".into(),
        description: "Two days of talks".into(),
        category: Category::Tech,
        location: "Berlin".into(),
        location_type: LocationType::InPerson,
        date: Utc::now() + Duration::days(7),
        start_time: "09:00".into(),
        end_time: "18:00".into(),
        capacity,
        price,
        image: None,
    }
}

#[tokio::test]
async fn booking_lifecycle_frees_seats_on_cancel() {
    // The spec's core scenario: capacity 2, price 100.
    let store = MemoryStore::new();
    let organizer = Uuid::new_v4();
    let event = store.create(upcoming_event(2, 100), organizer).await.unwrap();

    let user_a = Uuid::new_v4();
    let user_b = Uuid::new_v4();
    let now = Utc::now();

    // A books both seats.
    let details = store.admit(user_a, event.id, 2, now).await.unwrap();
    assert_eq!(details.booking.total_amount, 200);
    assert_eq!(store.confirmed_seats(event.id).await.unwrap(), 2);

    // B is turned away with the remaining count in the message.
    let err = store.admit(user_b, event.id, 1, now).await.unwrap_err();
    assert_eq!(err, Error::CapacityExceeded { available: 0 });
    assert_eq!(err.to_string(), "Only 0 seats available");

    // Availability is recomputed per read and stable without writes.
    assert_eq!(store.confirmed_seats(event.id).await.unwrap(), 2);
    assert_eq!(store.confirmed_seats(event.id).await.unwrap(), 2);

    // A cancels; both seats come back.
    let cancelled = store.cancel(details.booking.id, user_a, now).await.unwrap();
    assert_eq!(cancelled.status, BookingStatus::Cancelled);
    assert!(cancelled.cancelled_at.is_some());
    assert_eq!(store.confirmed_seats(event.id).await.unwrap(), 0);

    // B now gets in.
    let details = store.admit(user_b, event.id, 1, now).await.unwrap();
    assert_eq!(details.booking.total_amount, 100);
}

#[tokio::test]
async fn duplicate_booking_is_rejected() {
    let store = MemoryStore::new();
    let event = store
        .create(upcoming_event(10, 50), Uuid::new_v4())
        .await
        .unwrap();
    let user = Uuid::new_v4();
    let now = Utc::now();

    store.admit(user, event.id, 1, now).await.unwrap();
    assert_eq!(
        store.admit(user, event.id, 1, now).await.unwrap_err(),
        Error::DuplicateBooking
    );

    // A cancelled booking does not count against the duplicate rule.
    let bookings = store.list_for_user(user).await.unwrap();
    store.cancel(bookings[0].booking.id, user, now).await.unwrap();
    store.admit(user, event.id, 2, now).await.unwrap();
}

#[tokio::test]
async fn invalid_seat_count_never_reaches_the_ledger() {
    let store = MemoryStore::new();
    let event = store
        .create(upcoming_event(10, 50), Uuid::new_v4())
        .await
        .unwrap();

    for seats in [0, 3] {
        assert_eq!(
            store
                .admit(Uuid::new_v4(), event.id, seats, Utc::now())
                .await
                .unwrap_err(),
            Error::InvalidSeatCount
        );
    }
    assert_eq!(store.confirmed_seats(event.id).await.unwrap(), 0);
}

#[tokio::test]
async fn cancellation_is_blocked_once_the_event_started() {
    let store = MemoryStore::new();
    let user = Uuid::new_v4();
    let event = store
        .create(upcoming_event(10, 50), Uuid::new_v4())
        .await
        .unwrap();

    let before_start = event.date - Duration::hours(1);
    let after_start = event.date + Duration::hours(1);

    let details = store.admit(user, event.id, 1, before_start).await.unwrap();
    assert_eq!(
        store
            .cancel(details.booking.id, user, after_start)
            .await
            .unwrap_err(),
        Error::EventAlreadyStarted
    );
}

#[tokio::test]
async fn delete_is_blocked_by_any_booking() {
    let store = MemoryStore::new();
    let organizer = Uuid::new_v4();
    let user = Uuid::new_v4();
    let now = Utc::now();

    let event = store.create(upcoming_event(5, 0), organizer).await.unwrap();
    let details = store.admit(user, event.id, 1, now).await.unwrap();

    assert_eq!(
        store.delete(event.id).await.unwrap_err(),
        Error::EventHasBookings
    );

    // Even a cancelled booking keeps the event undeletable.
    store.cancel(details.booking.id, user, now).await.unwrap();
    assert_eq!(
        store.delete(event.id).await.unwrap_err(),
        Error::EventHasBookings
    );

    let empty = store.create(upcoming_event(5, 0), organizer).await.unwrap();
    store.delete(empty.id).await.unwrap();
    assert!(EventCatalog::find(&store, empty.id).await.unwrap().is_none());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn concurrent_admissions_never_overcommit() {
    // Many parallel requests near the boundary: the confirmed-seat sum must
    // never exceed capacity, and every seat that was available must be sold.
    const CAPACITY: i32 = 5;
    const ATTEMPTS: usize = 40;

    let store = Arc::new(MemoryStore::new());
    let event = store
        .create(upcoming_event(CAPACITY, 10), Uuid::new_v4())
        .await
        .unwrap();
    let now = Utc::now();

    let mut handles = Vec::new();
    for i in 0..ATTEMPTS {
        let store = Arc::clone(&store);
        let event_id = event.id;
        let seats = (i % 2 + 1) as i32;
        handles.push(tokio::spawn(async move {
            store.admit(Uuid::new_v4(), event_id, seats, now).await
        }));
    }

    let mut admitted = 0_i64;
    for handle in handles {
        if let Ok(details) = handle.await.unwrap() {
            admitted += i64::from(details.booking.seats);
        }
    }

    let confirmed = store.confirmed_seats(event.id).await.unwrap();
    assert_eq!(confirmed, admitted);
    assert!(confirmed <= i64::from(CAPACITY));
    // With 40 attempts for 5 seats, the pool must be exhausted: nothing more
    // than a single seat could possibly remain unsold.
    assert!(confirmed >= i64::from(CAPACITY) - 1);

    // One more attempt fails with the exact remaining count.
    let err = store
        .admit(Uuid::new_v4(), event.id, 2, now)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::CapacityExceeded { .. }));
}

#[tokio::test]
async fn listing_filters_and_paginates() {
    let store = MemoryStore::new();
    let organizer = Uuid::new_v4();

    for i in 0..3 {
        let mut event = upcoming_event(10, 0);
        event.date = Utc::now() + Duration::days(i + 1);
        store.create(event, organizer).await.unwrap();
    }
    let mut online = upcoming_event(10, 0);
    online.category = Category::Music;
    online.location_type = LocationType::Online;
    let online = store.create(online, organizer).await.unwrap();

    let page = store
        .list(&EventFilter::default(), PageRequest::new(Some(1), Some(2)))
        .await
        .unwrap();
    assert_eq!(page.total, 4);
    assert_eq!(page.items.len(), 2);

    let filter = EventFilter {
        category: Some(Category::Music),
        ..Default::default()
    };
    let page = store.list(&filter, PageRequest::default()).await.unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].id, online.id);

    let filter = EventFilter {
        day: Some(online.date.date_naive()),
        location_type: Some(LocationType::Online),
        ..Default::default()
    };
    let page = store.list(&filter, PageRequest::default()).await.unwrap();
    assert_eq!(page.total, 1);
}
