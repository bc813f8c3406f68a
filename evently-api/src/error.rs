use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use evently_domain::Error;

/// API-side failure wrapper. Every error leaves the service as the JSON
/// envelope `{"success": false, "message": …}` with the status the failure
/// kind dictates.
#[derive(Debug)]
pub enum AppError {
    Unauthorized(&'static str),
    Forbidden(String),
    Domain(Error),
}

impl From<Error> for AppError {
    fn from(err: Error) -> Self {
        AppError::Domain(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg.to_string()),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            AppError::Domain(err) => match &err {
                Error::EventNotFound | Error::BookingNotFound => {
                    (StatusCode::NOT_FOUND, err.to_string())
                }
                Error::NotAuthorized { .. } => (StatusCode::FORBIDDEN, err.to_string()),
                Error::Storage(detail) => {
                    // Transient storage faults are not the caller's business;
                    // log the detail, return a generic error.
                    tracing::error!("storage failure: {detail}");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "Internal Server Error".to_string(),
                    )
                }
                // Validation and business-rule violations.
                _ => (StatusCode::BAD_REQUEST, err.to_string()),
            },
        };

        let body = Json(json!({
            "success": false,
            "message": message,
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn domain_errors_map_to_expected_statuses() {
        assert_eq!(status_of(Error::EventNotFound.into()), StatusCode::NOT_FOUND);
        assert_eq!(status_of(Error::BookingNotFound.into()), StatusCode::NOT_FOUND);
        assert_eq!(
            status_of(Error::NotAuthorized { action: "cancel this booking" }.into()),
            StatusCode::FORBIDDEN
        );
        assert_eq!(status_of(Error::InvalidSeatCount.into()), StatusCode::BAD_REQUEST);
        assert_eq!(
            status_of(Error::CapacityExceeded { available: 0 }.into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(status_of(Error::DuplicateBooking.into()), StatusCode::BAD_REQUEST);
        assert_eq!(status_of(Error::EventExpired.into()), StatusCode::BAD_REQUEST);
        assert_eq!(status_of(Error::EventAlreadyStarted.into()), StatusCode::BAD_REQUEST);
        assert_eq!(status_of(Error::AlreadyCancelled.into()), StatusCode::BAD_REQUEST);
        assert_eq!(status_of(Error::EventHasBookings.into()), StatusCode::BAD_REQUEST);
        assert_eq!(
            status_of(Error::Storage("connection reset".into()).into()),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
