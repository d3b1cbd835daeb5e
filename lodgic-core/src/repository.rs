use crate::{CacheError, StoreError};
use async_trait::async_trait;
use lodgic_domain::{NewReservation, Reservation, ReservationStatus, Room, StayRange};
use std::time::Duration;
use uuid::Uuid;

/// Repository trait for reservation data access.
///
/// `create` must enforce the store's own overlap invariant (transaction or
/// exclusion constraint) and report violations as `StoreError::Conflict`;
/// the lock coordinator is an optimization on top, not the source of truth.
#[async_trait]
pub trait ReservationStore: Send + Sync {
    async fn find_conflicting(
        &self,
        room_id: Uuid,
        range: &StayRange,
        statuses: &[ReservationStatus],
    ) -> Result<Vec<Reservation>, StoreError>;

    async fn create(&self, data: &NewReservation) -> Result<Reservation, StoreError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Reservation>, StoreError>;

    /// Returns false when no reservation with that id exists.
    async fn update_status(
        &self,
        id: Uuid,
        status: ReservationStatus,
    ) -> Result<bool, StoreError>;
}

/// Repository trait for room catalog access.
#[async_trait]
pub trait RoomStore: Send + Sync {
    async fn find_room(&self, id: Uuid) -> Result<Option<Room>, StoreError>;

    async fn list_rooms(
        &self,
        room_type: &str,
        min_capacity: i32,
    ) -> Result<Vec<Room>, StoreError>;
}

/// Distributed cache and lock primitive, injected rather than reached via a
/// module-level client. One implementation backs both the availability cache
/// and the booking locks.
#[async_trait]
pub trait LockService: Send + Sync {
    /// Atomic create-if-absent with TTL. Returns true when the key was set by
    /// this call, false when it already existed.
    async fn set_if_absent(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> Result<bool, CacheError>;

    async fn delete(&self, key: &str) -> Result<(), CacheError>;

    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    async fn set_with_ttl(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> Result<(), CacheError>;
}
