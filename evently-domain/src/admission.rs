//! The admission rule sequence: the one piece of this system where ordering
//! and atomicity actually matter. The checks are pure; ledger implementations
//! run them inside their per-event critical section so that two concurrent
//! requests cannot both pass the capacity or duplicate check.

use chrono::{DateTime, Utc};

use crate::error::Error;
use crate::event::Event;

pub const MIN_SEATS: i32 = 1;
pub const MAX_SEATS: i32 = 2;

/// Applies the admission preconditions in order, returning the first failure:
///
/// 1. requested seats within {1, 2}
/// 2. event exists
/// 3. event has not already started
/// 4. enough seats remain
/// 5. no confirmed booking by this user yet
///
/// `confirmed_seats` and `already_booked` must be read under the same lock or
/// transaction that will persist the booking.
pub fn check_admission(
    requested_seats: i32,
    event: Option<&Event>,
    confirmed_seats: i64,
    already_booked: bool,
    now: DateTime<Utc>,
) -> Result<(), Error> {
    if !(MIN_SEATS..=MAX_SEATS).contains(&requested_seats) {
        return Err(Error::InvalidSeatCount);
    }

    let event = event.ok_or(Error::EventNotFound)?;

    if event.is_expired(now) {
        return Err(Error::EventExpired);
    }

    let available = i64::from(event.capacity) - confirmed_seats;
    if available < i64::from(requested_seats) {
        return Err(Error::CapacityExceeded {
            available: available.max(0) as i32,
        });
    }

    if already_booked {
        return Err(Error::DuplicateBooking);
    }

    Ok(())
}

/// Amount frozen into the booking at creation time.
pub fn total_amount(price: i64, seats: i32) -> i64 {
    price * i64::from(seats)
}
