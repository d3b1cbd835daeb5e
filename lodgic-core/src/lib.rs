pub mod availability;
pub mod booking;
pub mod coordinator;
pub mod memory;
pub mod repository;

use uuid::Uuid;

/// Failures from the persistent reservation store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Reservation store unavailable: {0}")]
    Unavailable(String),
    #[error("Store rejected an overlapping reservation")]
    Conflict,
}

/// Failures from the distributed cache/lock service.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("Cache service unavailable: {0}")]
    Unavailable(String),
    #[error("Cached payload rejected: {0}")]
    Payload(String),
}

#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    #[error("Invalid stay range: check-out must be after check-in")]
    InvalidRange,
    #[error("Room not found: {0}")]
    RoomNotFound(Uuid),
    #[error("Reservation not found: {0}")]
    ReservationNotFound(Uuid),
    #[error("A booking is already in progress for this room and date range")]
    LockHeld,
    #[error("Room no longer available for the requested range")]
    Conflict,
    #[error(transparent)]
    Store(StoreError),
    #[error(transparent)]
    Cache(#[from] CacheError),
}

impl From<StoreError> for BookingError {
    fn from(err: StoreError) -> Self {
        match err {
            // The store's own overlap constraint fired: the safety net for
            // races the lock cannot see. Same outcome for the caller as a
            // failed availability check.
            StoreError::Conflict => BookingError::Conflict,
            other => BookingError::Store(other),
        }
    }
}

impl From<lodgic_domain::RangeError> for BookingError {
    fn from(_: lodgic_domain::RangeError) -> Self {
        BookingError::InvalidRange
    }
}

pub type CoreResult<T> = Result<T, BookingError>;
