use thiserror::Error;

/// Every failure the booking domain can produce. The API layer maps each
/// variant to an HTTP status; messages are surfaced to the caller verbatim.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    #[error("You can book only 1 or 2 seats per event")]
    InvalidSeatCount,

    #[error("Event not found")]
    EventNotFound,

    #[error("Cannot book for past events")]
    EventExpired,

    #[error("Only {available} seats available")]
    CapacityExceeded { available: i32 },

    #[error("You have already booked this event")]
    DuplicateBooking,

    #[error("Booking not found")]
    BookingNotFound,

    #[error("Not authorized to {action}")]
    NotAuthorized { action: &'static str },

    #[error("Cannot cancel booking after event has started")]
    EventAlreadyStarted,

    #[error("Booking is already cancelled")]
    AlreadyCancelled,

    #[error("Cannot delete event with existing bookings")]
    EventHasBookings,

    #[error("{0}")]
    Validation(String),

    #[error("storage error: {0}")]
    Storage(String),
}

pub type Result<T> = std::result::Result<T, Error>;
