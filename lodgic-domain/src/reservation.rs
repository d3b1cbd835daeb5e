use crate::range::StayRange;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reservation {
    pub id: Uuid,
    pub room_id: Uuid,
    pub guest_email: String,
    pub range: StayRange,
    pub status: ReservationStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ReservationStatus {
    PENDING,
    CONFIRMED,
    CHECKED_IN,
    CHECKED_OUT,
    CANCELLED,
}

impl ReservationStatus {
    /// Statuses that occupy the room for overlap purposes.
    pub const BLOCKING: [ReservationStatus; 2] =
        [ReservationStatus::CONFIRMED, ReservationStatus::CHECKED_IN];

    pub fn is_blocking(&self) -> bool {
        Self::BLOCKING.contains(self)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ReservationStatus::PENDING => "PENDING",
            ReservationStatus::CONFIRMED => "CONFIRMED",
            ReservationStatus::CHECKED_IN => "CHECKED_IN",
            ReservationStatus::CHECKED_OUT => "CHECKED_OUT",
            ReservationStatus::CANCELLED => "CANCELLED",
        }
    }
}

impl std::fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Unknown reservation status: {0}")]
pub struct ParseStatusError(String);

impl FromStr for ReservationStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(ReservationStatus::PENDING),
            "CONFIRMED" => Ok(ReservationStatus::CONFIRMED),
            "CHECKED_IN" => Ok(ReservationStatus::CHECKED_IN),
            "CHECKED_OUT" => Ok(ReservationStatus::CHECKED_OUT),
            "CANCELLED" => Ok(ReservationStatus::CANCELLED),
            other => Err(ParseStatusError(other.to_string())),
        }
    }
}

/// Data for a reservation about to be written by the booking core.
#[derive(Debug, Clone, Deserialize)]
pub struct NewReservation {
    pub room_id: Uuid,
    pub guest_email: String,
    pub range: StayRange,
}
