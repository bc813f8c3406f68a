use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use evently_domain::error::Error;
use evently_domain::event::{Event, EventFilter, EventPatch, EventStatus, NewEvent, PageRequest};

use crate::auth::{require_admin, AuthUser};
use crate::error::AppError;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/events", get(list_events).post(create_event))
        .route(
            "/events/{id}",
            get(get_event).put(update_event).delete(delete_event),
        )
        .route("/events/{id}/attendees", get(get_attendees))
}

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListEventsQuery {
    category: Option<String>,
    location_type: Option<String>,
    /// Single calendar day, `YYYY-MM-DD`.
    date: Option<NaiveDate>,
    page: Option<u32>,
    limit: Option<u32>,
}

impl ListEventsQuery {
    fn filter(&self) -> Result<EventFilter, Error> {
        // `all` is how the UI spells "no filter".
        let category = match self.category.as_deref() {
            None | Some("all") => None,
            Some(s) => Some(s.parse()?),
        };
        let location_type = match self.location_type.as_deref() {
            None | Some("all") => None,
            Some(s) => Some(s.parse()?),
        };
        Ok(EventFilter {
            category,
            location_type,
            day: self.date,
        })
    }
}

/// An event as presented to clients: stored fields plus the derived status
/// and, where requested, the computed availability.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EventView {
    #[serde(flatten)]
    event: Event,
    status: EventStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    available_seats: Option<i64>,
}

impl EventView {
    fn new(event: Event) -> Self {
        let status = event.status(Utc::now().date_naive());
        Self {
            event,
            status,
            available_seats: None,
        }
    }

    fn with_availability(event: Event, available_seats: i64) -> Self {
        Self {
            available_seats: Some(available_seats),
            ..Self::new(event)
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AttendeeView {
    user_id: Uuid,
    seats: i32,
    booked_at: DateTime<Utc>,
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /events — public, filtered, paginated.
async fn list_events(
    State(state): State<AppState>,
    Query(query): Query<ListEventsQuery>,
) -> Result<Json<Value>, AppError> {
    let filter = query.filter()?;
    let page = PageRequest::new(query.page, query.limit);

    let result = state.catalog.list(&filter, page).await?;
    let views: Vec<EventView> = result.items.into_iter().map(EventView::new).collect();

    Ok(Json(json!({
        "success": true,
        "count": views.len(),
        "total": result.total,
        "pagination": {
            "page": page.page,
            "pages": page.total_pages(result.total),
        },
        "data": views,
    })))
}

/// GET /events/{id} — public; includes computed availability.
async fn get_event(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let event = state.catalog.find(id).await?.ok_or(Error::EventNotFound)?;

    // Always recomputed from the ledger, never cached.
    let confirmed = state.ledger.confirmed_seats(id).await?;
    let available = i64::from(event.capacity) - confirmed;

    Ok(Json(json!({
        "success": true,
        "data": EventView::with_availability(event, available),
    })))
}

/// POST /events — admin only.
async fn create_event(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Json(req): Json<NewEvent>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    require_admin(&actor)?;

    let event = state.catalog.create(req, actor.id).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "data": EventView::new(event),
        })),
    ))
}

/// PUT /events/{id} — creator or admin.
async fn update_event(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(id): Path<Uuid>,
    Json(patch): Json<EventPatch>,
) -> Result<Json<Value>, AppError> {
    let event = state.catalog.find(id).await?.ok_or(Error::EventNotFound)?;
    if !actor.can_manage(&event) {
        return Err(Error::NotAuthorized {
            action: "update this event",
        }
        .into());
    }

    let updated = state.catalog.update(id, patch).await?;

    Ok(Json(json!({
        "success": true,
        "data": EventView::new(updated),
    })))
}

/// DELETE /events/{id} — creator or admin; refused while bookings exist.
async fn delete_event(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let event = state.catalog.find(id).await?.ok_or(Error::EventNotFound)?;
    if !actor.can_manage(&event) {
        return Err(Error::NotAuthorized {
            action: "delete this event",
        }
        .into());
    }

    state.catalog.delete(id).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Event deleted successfully",
    })))
}

/// GET /events/{id}/attendees — admin only.
async fn get_attendees(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    require_admin(&actor)?;

    let event = state.catalog.find(id).await?.ok_or(Error::EventNotFound)?;
    let attendees = state.ledger.attendees(id).await?;

    let total_attendees: i64 = attendees.iter().map(|b| i64::from(b.seats)).sum();
    let views: Vec<AttendeeView> = attendees
        .into_iter()
        .map(|b| AttendeeView {
            user_id: b.user_id,
            seats: b.seats,
            booked_at: b.booked_at,
        })
        .collect();

    Ok(Json(json!({
        "success": true,
        "data": {
            "event": event.title,
            "totalAttendees": total_attendees,
            "attendees": views,
        },
    })))
}
