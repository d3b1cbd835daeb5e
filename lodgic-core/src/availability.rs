use crate::repository::{LockService, ReservationStore, RoomStore};
use crate::{CacheError, CoreResult};
use lodgic_domain::{ReservationStatus, Room, StayRange};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;
use uuid::Uuid;

pub const CACHE_SCHEMA_VERSION: u32 = 1;

const GENERATION_KEY: &str = "availability:gen";

/// Versioned cache payload. Entries that fail to deserialize or carry an
/// unknown schema_version are a typed error treated as a cache miss, never
/// a crash.
#[derive(Debug, Serialize, Deserialize)]
pub struct CachedRoomList {
    pub schema_version: u32,
    pub cached_at: i64,
    pub rooms: Vec<Room>,
}

/// Answers "is room R free for [check_in, check_out)?" against the
/// reservation store, with a short-TTL Redis-backed cache for the bulk
/// search path. Pure reads; nothing here mutates reservations.
#[derive(Clone)]
pub struct AvailabilityChecker {
    reservations: Arc<dyn ReservationStore>,
    rooms: Arc<dyn RoomStore>,
    cache: Arc<dyn LockService>,
    cache_ttl: Duration,
}

impl AvailabilityChecker {
    pub fn new(
        reservations: Arc<dyn ReservationStore>,
        rooms: Arc<dyn RoomStore>,
        cache: Arc<dyn LockService>,
        cache_ttl: Duration,
    ) -> Self {
        Self {
            reservations,
            rooms,
            cache,
            cache_ttl,
        }
    }

    /// True when no CONFIRMED or CHECKED_IN reservation overlaps the range.
    pub async fn is_room_available(&self, room_id: Uuid, range: &StayRange) -> CoreResult<bool> {
        if self.rooms.find_room(room_id).await?.is_none() {
            return Err(crate::BookingError::RoomNotFound(room_id));
        }
        self.range_is_free(room_id, range).await
    }

    /// Availability check without the room-existence lookup, for callers that
    /// already resolved the room (the booking path does, under its lock).
    pub(crate) async fn range_is_free(
        &self,
        room_id: Uuid,
        range: &StayRange,
    ) -> CoreResult<bool> {
        let conflicts = self
            .reservations
            .find_conflicting(room_id, range, &ReservationStatus::BLOCKING)
            .await?;
        Ok(conflicts.is_empty())
    }

    /// Rooms of `room_type` with capacity >= `min_guests` that are free for
    /// the range, ordered by price then room number.
    pub async fn find_available_rooms(
        &self,
        room_type: &str,
        range: &StayRange,
        min_guests: i32,
    ) -> CoreResult<Vec<Room>> {
        let key = self.cache_key(room_type, range, min_guests).await;

        match self.cache.get(&key).await {
            Ok(Some(raw)) => match decode_cached(&raw) {
                Ok(rooms) => return Ok(rooms),
                Err(e) => warn!("Discarding availability cache entry {}: {}", key, e),
            },
            Ok(None) => {}
            Err(e) => warn!("Availability cache read failed, querying store: {}", e),
        }

        let candidates = self.rooms.list_rooms(room_type, min_guests).await?;
        let mut available = Vec::with_capacity(candidates.len());
        for room in candidates {
            if self.range_is_free(room.id, range).await? {
                available.push(room);
            }
        }
        available.sort_by(|a, b| {
            a.price_amount
                .cmp(&b.price_amount)
                .then_with(|| a.room_number.cmp(&b.room_number))
        });

        let payload = CachedRoomList {
            schema_version: CACHE_SCHEMA_VERSION,
            cached_at: chrono::Utc::now().timestamp(),
            rooms: available.clone(),
        };
        match serde_json::to_string(&payload) {
            Ok(raw) => {
                if let Err(e) = self.cache.set_with_ttl(&key, &raw, self.cache_ttl).await {
                    warn!("Availability cache write failed: {}", e);
                }
            }
            Err(e) => warn!("Failed to serialize availability cache payload: {}", e),
        }

        Ok(available)
    }

    /// Bump the cache generation so no tuple cached before a successful
    /// booking can be served afterwards. Entries under the old generation
    /// simply age out within their own TTL.
    pub async fn invalidate(&self) {
        let generation = Uuid::new_v4().to_string();
        if let Err(e) = self
            .cache
            .set_with_ttl(GENERATION_KEY, &generation, self.cache_ttl)
            .await
        {
            warn!("Failed to bump availability cache generation: {}", e);
        }
    }

    async fn cache_key(&self, room_type: &str, range: &StayRange, min_guests: i32) -> String {
        let generation = match self.cache.get(GENERATION_KEY).await {
            Ok(Some(generation)) => generation,
            Ok(None) => "0".to_string(),
            Err(e) => {
                warn!("Failed to read availability cache generation: {}", e);
                "0".to_string()
            }
        };
        format!(
            "availability:{}:{}:{}:{}:{}",
            generation, room_type, range.check_in, range.check_out, min_guests
        )
    }
}

fn decode_cached(raw: &str) -> Result<Vec<Room>, CacheError> {
    let payload: CachedRoomList =
        serde_json::from_str(raw).map_err(|e| CacheError::Payload(e.to_string()))?;
    if payload.schema_version != CACHE_SCHEMA_VERSION {
        return Err(CacheError::Payload(format!(
            "unsupported schema_version {}",
            payload.schema_version
        )));
    }
    Ok(payload.rooms)
}
