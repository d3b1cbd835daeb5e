use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use lodgic_core::BookingError;
use serde_json::json;

#[derive(Debug)]
pub enum AppError {
    ValidationError(String),
    NotFoundError(String),
    ConflictError(String),
    LockHeld(String),
    ServiceUnavailable(String),
    InternalServerError(String),
    Anyhow(anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFoundError(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::ConflictError(msg) => (StatusCode::CONFLICT, msg),
            AppError::LockHeld(msg) => (StatusCode::CONFLICT, msg),
            AppError::ServiceUnavailable(msg) => {
                tracing::error!("Upstream unavailable: {}", msg);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "Service temporarily unavailable".to_string(),
                )
            }
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                )
            }
            AppError::Anyhow(err) => {
                tracing::error!("Internal Server Error: {}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

impl From<BookingError> for AppError {
    fn from(err: BookingError) -> Self {
        match err {
            BookingError::InvalidRange => AppError::ValidationError(err.to_string()),
            BookingError::RoomNotFound(_) | BookingError::ReservationNotFound(_) => {
                AppError::NotFoundError(err.to_string())
            }
            BookingError::LockHeld => AppError::LockHeld(
                "A booking for this room and date range is in progress, please try again"
                    .to_string(),
            ),
            BookingError::Conflict => {
                AppError::ConflictError("Room no longer available".to_string())
            }
            BookingError::Store(e) => AppError::ServiceUnavailable(e.to_string()),
            BookingError::Cache(e) => AppError::ServiceUnavailable(e.to_string()),
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::Anyhow(err)
    }
}
