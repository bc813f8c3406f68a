use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use chrono::Utc;
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;

use evently_domain::booking::BookingRequest;
use evently_domain::error::Error;

use crate::auth::AuthUser;
use crate::error::AppError;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/bookings", post(create_booking))
        .route("/bookings/my-bookings", get(my_bookings))
        .route("/bookings/{id}", get(get_booking))
        .route("/bookings/{id}/cancel", put(cancel_booking))
}

/// POST /bookings — the admission path. All checks and the insert happen
/// atomically inside the ledger.
async fn create_booking(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Json(req): Json<BookingRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let details = state
        .ledger
        .admit(actor.id, req.event_id, req.seats, Utc::now())
        .await?;

    // Best-effort side log; never fails the request.
    info!(
        user_id = %actor.id,
        booking_code = %details.booking.code,
        event_id = %req.event_id,
        seats = req.seats,
        "new booking created"
    );

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "data": details,
        })),
    ))
}

/// GET /bookings/my-bookings — caller's bookings, newest first.
async fn my_bookings(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
) -> Result<Json<Value>, AppError> {
    let bookings = state.ledger.list_for_user(actor.id).await?;

    Ok(Json(json!({
        "success": true,
        "count": bookings.len(),
        "data": bookings,
    })))
}

/// GET /bookings/{id} — owner or admin.
async fn get_booking(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let details = state
        .ledger
        .find(id)
        .await?
        .ok_or(Error::BookingNotFound)?;

    if !actor.can_view(&details.booking) {
        return Err(Error::NotAuthorized {
            action: "view this booking",
        }
        .into());
    }

    Ok(Json(json!({
        "success": true,
        "data": details,
    })))
}

/// PUT /bookings/{id}/cancel — owner only; eligibility enforced by the
/// cancellation rules inside the ledger.
async fn cancel_booking(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let booking = state.ledger.cancel(id, actor.id, Utc::now()).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Booking cancelled successfully",
        "data": booking,
    })))
}
