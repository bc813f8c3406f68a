//! Cancellation eligibility. One rule, applied consistently: a booking can be
//! cancelled strictly before its event starts, never after, regardless of
//! whether the event has since completed.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::booking::{Booking, BookingStatus};
use crate::error::Error;
use crate::event::Event;

/// Applies the cancellation preconditions in order, returning the first
/// failure. Existence of the booking is checked by the caller (the ledger),
/// which owns the lookup.
pub fn check_cancellation(
    booking: &Booking,
    event: &Event,
    requester: Uuid,
    now: DateTime<Utc>,
) -> Result<(), Error> {
    if booking.user_id != requester {
        return Err(Error::NotAuthorized {
            action: "cancel this booking",
        });
    }

    if event.has_started(now) {
        return Err(Error::EventAlreadyStarted);
    }

    if booking.status == BookingStatus::Cancelled {
        return Err(Error::AlreadyCancelled);
    }

    Ok(())
}
