//! In-memory store and lock service, used by tests and local development.
//! The production backends live in lodgic-store (Postgres, Redis).

use crate::repository::{LockService, ReservationStore, RoomStore};
use crate::{CacheError, StoreError};
use async_trait::async_trait;
use chrono::Utc;
use lodgic_domain::{NewReservation, Reservation, ReservationStatus, Room, StayRange};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};
use uuid::Uuid;

#[derive(Default)]
pub struct MemoryStore {
    rooms: Mutex<Vec<Room>>,
    reservations: Mutex<Vec<Reservation>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_room(&self, room: Room) {
        self.rooms.lock().unwrap().push(room);
    }

    fn blocking_overlap(reservations: &[Reservation], room_id: Uuid, range: &StayRange) -> bool {
        reservations.iter().any(|r| {
            r.room_id == room_id && r.status.is_blocking() && r.range.overlaps(range)
        })
    }
}

#[async_trait]
impl ReservationStore for MemoryStore {
    async fn find_conflicting(
        &self,
        room_id: Uuid,
        range: &StayRange,
        statuses: &[ReservationStatus],
    ) -> Result<Vec<Reservation>, StoreError> {
        let reservations = self.reservations.lock().unwrap();
        Ok(reservations
            .iter()
            .filter(|r| {
                r.room_id == room_id
                    && statuses.contains(&r.status)
                    && r.range.overlaps(range)
            })
            .cloned()
            .collect())
    }

    async fn create(&self, data: &NewReservation) -> Result<Reservation, StoreError> {
        let mut reservations = self.reservations.lock().unwrap();
        // Mirror of the Postgres exclusion constraint: reject an insert that
        // would confirm an overlapping blocking reservation.
        if Self::blocking_overlap(&reservations, data.room_id, &data.range) {
            return Err(StoreError::Conflict);
        }
        let now = Utc::now();
        let reservation = Reservation {
            id: Uuid::new_v4(),
            room_id: data.room_id,
            guest_email: data.guest_email.clone(),
            range: data.range,
            status: ReservationStatus::CONFIRMED,
            created_at: now,
            updated_at: now,
        };
        reservations.push(reservation.clone());
        Ok(reservation)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Reservation>, StoreError> {
        let reservations = self.reservations.lock().unwrap();
        Ok(reservations.iter().find(|r| r.id == id).cloned())
    }

    async fn update_status(
        &self,
        id: Uuid,
        status: ReservationStatus,
    ) -> Result<bool, StoreError> {
        let mut reservations = self.reservations.lock().unwrap();
        match reservations.iter_mut().find(|r| r.id == id) {
            Some(r) => {
                r.status = status;
                r.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait]
impl RoomStore for MemoryStore {
    async fn find_room(&self, id: Uuid) -> Result<Option<Room>, StoreError> {
        let rooms = self.rooms.lock().unwrap();
        Ok(rooms.iter().find(|r| r.id == id).cloned())
    }

    async fn list_rooms(
        &self,
        room_type: &str,
        min_capacity: i32,
    ) -> Result<Vec<Room>, StoreError> {
        let rooms = self.rooms.lock().unwrap();
        Ok(rooms
            .iter()
            .filter(|r| r.room_type == room_type && r.capacity >= min_capacity)
            .cloned()
            .collect())
    }
}

/// In-memory LockService with real TTL expiry, matching Redis SET NX EX
/// semantics closely enough for the coordinator and cache tests.
#[derive(Default)]
pub struct MemoryLocks {
    entries: Mutex<HashMap<String, (String, Instant)>>,
    unavailable: AtomicBool,
}

impl MemoryLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate a cache outage; every subsequent call errors.
    pub fn set_unavailable(&self, down: bool) {
        self.unavailable.store(down, Ordering::SeqCst);
    }

    fn check_up(&self) -> Result<(), CacheError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(CacheError::Unavailable("memory cache marked down".into()));
        }
        Ok(())
    }

    fn expired(expiry: &Instant) -> bool {
        Instant::now() >= *expiry
    }
}

#[async_trait]
impl LockService for MemoryLocks {
    async fn set_if_absent(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> Result<bool, CacheError> {
        self.check_up()?;
        let mut entries = self.entries.lock().unwrap();
        if let Some((_, expiry)) = entries.get(key) {
            if !Self::expired(expiry) {
                return Ok(false);
            }
        }
        entries.insert(key.to_string(), (value.to_string(), Instant::now() + ttl));
        Ok(true)
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.check_up()?;
        self.entries.lock().unwrap().remove(key);
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        self.check_up()?;
        let entries = self.entries.lock().unwrap();
        Ok(entries.get(key).and_then(|(value, expiry)| {
            if Self::expired(expiry) {
                None
            } else {
                Some(value.clone())
            }
        }))
    }

    async fn set_with_ttl(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> Result<(), CacheError> {
        self.check_up()?;
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), (value.to_string(), Instant::now() + ttl));
        Ok(())
    }
}
