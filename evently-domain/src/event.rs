use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::Error;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: Uuid,
    /// Human-readable code, e.g. `EVT-JAN2026-X7Q`.
    pub code: String,
    pub title: String,
    pub description: String,
    pub category: Category,
    pub location: String,
    pub location_type: LocationType,
    pub date: DateTime<Utc>,
    pub start_time: String,
    pub end_time: String,
    pub capacity: i32,
    /// Minor currency units. Frozen into bookings at admission time.
    pub price: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

impl Event {
    /// Virtual status, derived from the event's calendar day vs. today.
    /// Never stored, so it cannot go stale.
    pub fn status(&self, today: NaiveDate) -> EventStatus {
        let event_day = self.date.date_naive();
        if event_day < today {
            EventStatus::Completed
        } else if event_day == today {
            EventStatus::Ongoing
        } else {
            EventStatus::Upcoming
        }
    }

    /// Booking is closed once the event's start has passed.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.date
    }

    /// Cancellation is allowed strictly before the event starts.
    pub fn has_started(&self, now: DateTime<Utc>) -> bool {
        now >= self.date
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventStatus {
    Upcoming,
    Ongoing,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Category {
    Music,
    Tech,
    Business,
    Arts,
    Sports,
    Education,
    Other,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Category::Music => "Music",
            Category::Tech => "Tech",
            Category::Business => "Business",
            Category::Arts => "Arts",
            Category::Sports => "Sports",
            Category::Education => "Education",
            Category::Other => "Other",
        };
        f.write_str(s)
    }
}

impl FromStr for Category {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Music" => Ok(Category::Music),
            "Tech" => Ok(Category::Tech),
            "Business" => Ok(Category::Business),
            "Arts" => Ok(Category::Arts),
            "Sports" => Ok(Category::Sports),
            "Education" => Ok(Category::Education),
            "Other" => Ok(Category::Other),
            other => Err(Error::Validation(format!("Invalid category: {other}"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LocationType {
    Online,
    #[serde(rename = "In-Person")]
    InPerson,
}

impl fmt::Display for LocationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LocationType::Online => f.write_str("Online"),
            LocationType::InPerson => f.write_str("In-Person"),
        }
    }
}

impl FromStr for LocationType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Online" => Ok(LocationType::Online),
            "In-Person" => Ok(LocationType::InPerson),
            other => Err(Error::Validation(format!("Invalid location type: {other}"))),
        }
    }
}

/// Payload for creating an event. The catalog assigns id, code and timestamps.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEvent {
    pub title: String,
    pub description: String,
    pub category: Category,
    pub location: String,
    pub location_type: LocationType,
    pub date: DateTime<Utc>,
    pub start_time: String,
    pub end_time: String,
    pub capacity: i32,
    #[serde(default)]
    pub price: i64,
    #[serde(default)]
    pub image: Option<String>,
}

impl NewEvent {
    pub fn validate(&self) -> Result<(), Error> {
        if self.title.trim().is_empty() {
            return Err(Error::Validation("Please provide event title".into()));
        }
        if self.title.len() > 100 {
            return Err(Error::Validation(
                "Title cannot be more than 100 characters".into(),
            ));
        }
        if self.description.trim().is_empty() {
            return Err(Error::Validation("Please provide event description".into()));
        }
        if self.description.len() > 1000 {
            return Err(Error::Validation(
                "Description cannot be more than 1000 characters".into(),
            ));
        }
        if self.location.trim().is_empty() {
            return Err(Error::Validation("Please provide event location".into()));
        }
        if self.capacity < 1 {
            return Err(Error::Validation("Capacity must be at least 1".into()));
        }
        if self.price < 0 {
            return Err(Error::Validation("Price cannot be negative".into()));
        }
        Ok(())
    }
}

/// Partial update; `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<Category>,
    pub location: Option<String>,
    pub location_type: Option<LocationType>,
    pub date: Option<DateTime<Utc>>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub capacity: Option<i32>,
    pub price: Option<i64>,
    pub image: Option<String>,
}

impl EventPatch {
    pub fn validate(&self) -> Result<(), Error> {
        if let Some(title) = &self.title {
            if title.trim().is_empty() || title.len() > 100 {
                return Err(Error::Validation("Please provide a valid title".into()));
            }
        }
        if let Some(capacity) = self.capacity {
            if capacity < 1 {
                return Err(Error::Validation("Capacity must be at least 1".into()));
            }
        }
        if let Some(price) = self.price {
            if price < 0 {
                return Err(Error::Validation("Price cannot be negative".into()));
            }
        }
        Ok(())
    }
}

/// Catalog listing filters. `None` means no constraint on that axis.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    pub category: Option<Category>,
    pub location_type: Option<LocationType>,
    /// Single-day window: events whose `date` falls on this calendar day.
    pub day: Option<NaiveDate>,
}

#[derive(Debug, Clone, Copy)]
pub struct PageRequest {
    /// 1-based.
    pub page: u32,
    pub limit: u32,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self { page: 1, limit: 10 }
    }
}

impl PageRequest {
    pub fn new(page: Option<u32>, limit: Option<u32>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            limit: limit.unwrap_or(10).clamp(1, 100),
        }
    }

    pub fn offset(&self) -> i64 {
        i64::from(self.page - 1) * i64::from(self.limit)
    }

    pub fn total_pages(&self, total: u64) -> u64 {
        total.div_ceil(u64::from(self.limit))
    }
}

/// One page of results together with the unpaginated total.
#[derive(Debug, Clone)]
pub struct PageOf<T> {
    pub items: Vec<T>,
    pub total: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn event_on(date: DateTime<Utc>) -> Event {
        Event {
            id: Uuid::new_v4(),
            code: "EVT-JAN2026-ABC".into(),
            title: "Rust Meetup".into(),
            description: "Monthly meetup".into(),
            category: Category::Tech,
            location: "Berlin".into(),
            location_type: LocationType::InPerson,
            date,
            start_time: "18:00".into(),
            end_time: "21:00".into(),
            capacity: 50,
            price: 0,
            image: None,
            created_by: Uuid::new_v4(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn status_follows_calendar_day() {
        let today = Utc.with_ymd_and_hms(2026, 3, 10, 0, 0, 0).unwrap();
        let morning = Utc.with_ymd_and_hms(2026, 3, 10, 8, 0, 0).unwrap();

        assert_eq!(
            event_on(today - Duration::days(1)).status(today.date_naive()),
            EventStatus::Completed
        );
        assert_eq!(
            event_on(morning).status(today.date_naive()),
            EventStatus::Ongoing
        );
        assert_eq!(
            event_on(today + Duration::days(3)).status(today.date_naive()),
            EventStatus::Upcoming
        );
    }

    #[test]
    fn expiry_uses_full_timestamp() {
        let start = Utc.with_ymd_and_hms(2026, 3, 10, 18, 0, 0).unwrap();
        let event = event_on(start);
        assert!(!event.is_expired(start - Duration::hours(1)));
        assert!(event.is_expired(start + Duration::seconds(1)));
        // At the exact start instant the event has started but is not expired.
        assert!(!event.is_expired(start));
        assert!(event.has_started(start));
    }

    #[test]
    fn new_event_validation() {
        let mut req = NewEvent {
            title: "Rust Meetup".into(),
            description: "Monthly meetup".into(),
            category: Category::Tech,
            location: "Berlin".into(),
            location_type: LocationType::InPerson,
            date: Utc::now(),
            start_time: "18:00".into(),
            end_time: "21:00".into(),
            capacity: 10,
            price: 100,
            image: None,
        };
        assert!(req.validate().is_ok());

        req.capacity = 0;
        assert!(matches!(req.validate(), Err(Error::Validation(_))));

        req.capacity = 10;
        req.price = -1;
        assert!(matches!(req.validate(), Err(Error::Validation(_))));

        req.price = 0;
        req.title = "   ".into();
        assert!(matches!(req.validate(), Err(Error::Validation(_))));
    }

    #[test]
    fn location_type_round_trips_wire_name() {
        assert_eq!(
            serde_json::to_string(&LocationType::InPerson).unwrap(),
            "\"In-Person\""
        );
        assert_eq!("In-Person".parse::<LocationType>().unwrap(), LocationType::InPerson);
        assert!("Hybrid".parse::<LocationType>().is_err());
    }

    #[test]
    fn page_request_clamps_and_paginates() {
        let page = PageRequest::new(None, None);
        assert_eq!(page.page, 1);
        assert_eq!(page.limit, 10);
        assert_eq!(page.offset(), 0);

        let page = PageRequest::new(Some(3), Some(250));
        assert_eq!(page.limit, 100);
        assert_eq!(page.offset(), 200);

        assert_eq!(PageRequest::new(None, Some(10)).total_pages(25), 3);
        assert_eq!(PageRequest::new(None, Some(10)).total_pages(0), 0);
    }
}
