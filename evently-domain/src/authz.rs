//! Capability checks. Authorization decisions are made against the
//! `{role, owner}` pair in one place instead of ad hoc comparisons in
//! handlers.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::booking::Booking;
use crate::event::Event;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::User => f.write_str("user"),
            Role::Admin => f.write_str("admin"),
        }
    }
}

/// The authenticated caller, as established by the auth middleware.
#[derive(Debug, Clone, Copy)]
pub struct Actor {
    pub id: Uuid,
    pub role: Role,
}

impl Actor {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Creator or admin may update/delete an event.
    pub fn can_manage(&self, event: &Event) -> bool {
        self.is_admin() || event.created_by == self.id
    }

    /// Owner or admin may view a booking.
    pub fn can_view(&self, booking: &Booking) -> bool {
        self.is_admin() || booking.user_id == self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::booking::BookingStatus;
    use crate::event::{Category, LocationType};
    use chrono::Utc;

    fn event_created_by(owner: Uuid) -> Event {
        Event {
            id: Uuid::new_v4(),
            code: "EVT-JAN2026-ABC".into(),
            title: "Talk".into(),
            description: "A talk".into(),
            category: Category::Business,
            location: "Online".into(),
            location_type: LocationType::Online,
            date: Utc::now(),
            start_time: "09:00".into(),
            end_time: "10:00".into(),
            capacity: 5,
            price: 0,
            image: None,
            created_by: owner,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn creator_and_admin_manage_events() {
        let owner = Uuid::new_v4();
        let event = event_created_by(owner);

        let creator = Actor { id: owner, role: Role::User };
        let admin = Actor { id: Uuid::new_v4(), role: Role::Admin };
        let stranger = Actor { id: Uuid::new_v4(), role: Role::User };

        assert!(creator.can_manage(&event));
        assert!(admin.can_manage(&event));
        assert!(!stranger.can_manage(&event));
    }

    #[test]
    fn owner_and_admin_view_bookings() {
        let owner = Uuid::new_v4();
        let booking = Booking {
            id: Uuid::new_v4(),
            code: "BKG-LQ3F9A-K2M".into(),
            user_id: owner,
            event_id: Uuid::new_v4(),
            seats: 1,
            total_amount: 0,
            status: BookingStatus::Confirmed,
            booked_at: Utc::now(),
            cancelled_at: None,
        };

        assert!(Actor { id: owner, role: Role::User }.can_view(&booking));
        assert!(Actor { id: Uuid::new_v4(), role: Role::Admin }.can_view(&booking));
        assert!(!Actor { id: Uuid::new_v4(), role: Role::User }.can_view(&booking));
    }
}
