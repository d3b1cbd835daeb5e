use crate::error::AppError;
use crate::state::AppState;
use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use chrono::NaiveDate;
use lodgic_core::BookingError;
use lodgic_domain::{Room, StayRange};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct AvailabilityQuery {
    pub room_type: String,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub guests: i32,
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/v1/rooms/available", get(search_available_rooms))
}

async fn search_available_rooms(
    State(state): State<AppState>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<Json<Vec<Room>>, AppError> {
    let range =
        StayRange::new(query.check_in, query.check_out).map_err(BookingError::from)?;

    let rooms = state
        .checker
        .find_available_rooms(&query.room_type, &range, query.guests)
        .await?;

    Ok(Json(rooms))
}
