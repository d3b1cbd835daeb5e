use crate::error::AppError;
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::NaiveDate;
use lodgic_core::BookingError;
use lodgic_domain::{NewReservation, Reservation, ReservationStatus, StayRange};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct CreateReservationRequest {
    pub room_id: Uuid,
    pub guest_email: String,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
}

#[derive(Debug, Serialize)]
pub struct ReservationResponse {
    pub reservation_id: Uuid,
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/reservations", post(create_reservation))
        .route("/v1/reservations/{id}", get(get_reservation))
        .route("/v1/reservations/{id}/status", post(update_status))
}

async fn create_reservation(
    State(state): State<AppState>,
    Json(req): Json<CreateReservationRequest>,
) -> Result<(StatusCode, Json<ReservationResponse>), AppError> {
    let range = StayRange::new(req.check_in, req.check_out).map_err(BookingError::from)?;

    let reservation = state
        .booking
        .create_reservation(NewReservation {
            room_id: req.room_id,
            guest_email: req.guest_email,
            range,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ReservationResponse {
            reservation_id: reservation.id,
            status: reservation.status.to_string(),
        }),
    ))
}

async fn get_reservation(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Reservation>, AppError> {
    let reservation = state
        .reservations
        .find_by_id(id)
        .await
        .map_err(BookingError::from)?
        .ok_or_else(|| AppError::NotFoundError(format!("Reservation not found: {}", id)))?;

    Ok(Json(reservation))
}

/// Status transitions (cancel, check-in, check-out). Reservations are never
/// deleted; cancellation is a status change.
async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateStatusRequest>,
) -> Result<Json<ReservationResponse>, AppError> {
    let status: ReservationStatus = req
        .status
        .parse()
        .map_err(|_| AppError::ValidationError(format!("Unknown status: {}", req.status)))?;

    if !matches!(
        status,
        ReservationStatus::CANCELLED
            | ReservationStatus::CHECKED_IN
            | ReservationStatus::CHECKED_OUT
    ) {
        return Err(AppError::ValidationError(format!(
            "Status {} cannot be set directly",
            status
        )));
    }

    let updated = state
        .reservations
        .update_status(id, status)
        .await
        .map_err(BookingError::from)?;
    if !updated {
        return Err(AppError::NotFoundError(format!(
            "Reservation not found: {}",
            id
        )));
    }

    Ok(Json(ReservationResponse {
        reservation_id: id,
        status: status.to_string(),
    }))
}
