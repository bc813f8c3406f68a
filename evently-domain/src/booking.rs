use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::Error;
use crate::event::Event;

/// A seat reservation. Append-mostly: bookings are cancelled, never deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: Uuid,
    /// Human-readable code, e.g. `BKG-LQ3F9A-K2M`.
    pub code: String,
    pub user_id: Uuid,
    pub event_id: Uuid,
    pub seats: i32,
    /// `event.price × seats` at creation time. Never recomputed, even if the
    /// event price changes later.
    pub total_amount: i64,
    pub status: BookingStatus,
    pub booked_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancelled_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Confirmed,
    Cancelled,
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BookingStatus::Confirmed => f.write_str("confirmed"),
            BookingStatus::Cancelled => f.write_str("cancelled"),
        }
    }
}

impl FromStr for BookingStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "confirmed" => Ok(BookingStatus::Confirmed),
            "cancelled" => Ok(BookingStatus::Cancelled),
            other => Err(Error::Storage(format!("unknown booking status: {other}"))),
        }
    }
}

/// A booking enriched with its event, as returned to callers.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingDetails {
    #[serde(flatten)]
    pub booking: Booking,
    pub event: Event,
}

/// Request body for `POST /bookings`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingRequest {
    pub event_id: Uuid,
    pub seats: i32,
}
