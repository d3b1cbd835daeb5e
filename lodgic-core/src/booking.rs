use crate::availability::AvailabilityChecker;
use crate::coordinator::BookingLockCoordinator;
use crate::repository::{ReservationStore, RoomStore};
use crate::{BookingError, CoreResult};
use lodgic_domain::{NewReservation, Reservation};
use std::sync::Arc;
use tracing::info;

/// Write path of the booking core: lock the nights, re-check availability,
/// persist the reservation, bump the availability cache generation.
pub struct BookingService {
    checker: AvailabilityChecker,
    coordinator: BookingLockCoordinator,
    reservations: Arc<dyn ReservationStore>,
    rooms: Arc<dyn RoomStore>,
}

impl BookingService {
    pub fn new(
        checker: AvailabilityChecker,
        coordinator: BookingLockCoordinator,
        reservations: Arc<dyn ReservationStore>,
        rooms: Arc<dyn RoomStore>,
    ) -> Self {
        Self {
            checker,
            coordinator,
            reservations,
            rooms,
        }
    }

    pub async fn create_reservation(&self, request: NewReservation) -> CoreResult<Reservation> {
        // Resolve the room before taking any lock.
        if self.rooms.find_room(request.room_id).await?.is_none() {
            return Err(BookingError::RoomNotFound(request.room_id));
        }

        let checker = self.checker.clone();
        let store = self.reservations.clone();
        let range = request.range;
        let room_id = request.room_id;

        let reservation = self
            .coordinator
            .with_reservation_lock(room_id, &range, move || async move {
                if !checker.range_is_free(room_id, &range).await? {
                    return Err(BookingError::Conflict);
                }
                // The store runs its own overlap constraint inside this
                // insert; a StoreError::Conflict here is the safety net, not
                // the normal path.
                let reservation = store.create(&request).await?;
                Ok(reservation)
            })
            .await?;

        info!(
            "Reservation {} confirmed for room {} [{} .. {})",
            reservation.id, reservation.room_id, range.check_in, range.check_out
        );

        self.checker.invalidate().await;

        Ok(reservation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coordinator::lock_key;
    use crate::memory::{MemoryLocks, MemoryStore};
    use crate::repository::LockService;
    use lodgic_domain::{Room, StayRange};
    use std::time::Duration;
    use uuid::Uuid;

    fn range(check_in: &str, check_out: &str) -> StayRange {
        StayRange::new(check_in.parse().unwrap(), check_out.parse().unwrap()).unwrap()
    }

    fn request(room_id: Uuid, stay: StayRange) -> NewReservation {
        NewReservation {
            room_id,
            guest_email: "guest@example.com".to_string(),
            range: stay,
        }
    }

    fn service(store: Arc<MemoryStore>, locks: Arc<MemoryLocks>) -> BookingService {
        let checker = AvailabilityChecker::new(
            store.clone(),
            store.clone(),
            locks.clone(),
            Duration::from_secs(120),
        );
        let coordinator = BookingLockCoordinator::new(locks, Duration::from_secs(300));
        BookingService::new(checker, coordinator, store.clone(), store)
    }

    fn seeded_room(store: &MemoryStore) -> Uuid {
        let room = Room {
            id: Uuid::new_v4(),
            room_number: "101".to_string(),
            room_type: "double".to_string(),
            capacity: 2,
            price_amount: 120_00,
            price_currency: "USD".to_string(),
        };
        let id = room.id;
        store.add_room(room);
        id
    }

    #[tokio::test]
    async fn test_booking_succeeds_and_persists_confirmed() {
        let store = Arc::new(MemoryStore::new());
        let locks = Arc::new(MemoryLocks::new());
        let room_id = seeded_room(&store);
        let svc = service(store.clone(), locks);

        let reservation = svc
            .create_reservation(request(room_id, range("2024-06-01", "2024-06-05")))
            .await
            .unwrap();
        assert!(reservation.status.is_blocking());

        let found = store.find_by_id(reservation.id).await.unwrap();
        assert!(found.is_some());
    }

    #[tokio::test]
    async fn test_overlapping_booking_is_rejected_as_conflict() {
        let store = Arc::new(MemoryStore::new());
        let locks = Arc::new(MemoryLocks::new());
        let room_id = seeded_room(&store);
        let svc = service(store, locks);

        svc.create_reservation(request(room_id, range("2024-06-01", "2024-06-05")))
            .await
            .unwrap();

        let result = svc
            .create_reservation(request(room_id, range("2024-06-03", "2024-06-07")))
            .await;
        assert!(matches!(result, Err(BookingError::Conflict)));
    }

    #[tokio::test]
    async fn test_back_to_back_bookings_both_succeed() {
        let store = Arc::new(MemoryStore::new());
        let locks = Arc::new(MemoryLocks::new());
        let room_id = seeded_room(&store);
        let svc = service(store, locks);

        svc.create_reservation(request(room_id, range("2024-06-01", "2024-06-05")))
            .await
            .unwrap();
        svc.create_reservation(request(room_id, range("2024-06-05", "2024-06-07")))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_unknown_room_is_rejected_before_locking() {
        let store = Arc::new(MemoryStore::new());
        let locks = Arc::new(MemoryLocks::new());
        let svc = service(store, locks.clone());
        let room_id = Uuid::new_v4();
        let stay = range("2024-06-01", "2024-06-03");

        let result = svc.create_reservation(request(room_id, stay)).await;
        assert!(matches!(result, Err(BookingError::RoomNotFound(_))));

        // No lock key was left behind.
        for night in stay.days() {
            assert!(locks.get(&lock_key(room_id, night)).await.unwrap().is_none());
        }
    }

    #[tokio::test]
    async fn test_booking_in_progress_surfaces_lock_held() {
        let store = Arc::new(MemoryStore::new());
        let locks = Arc::new(MemoryLocks::new());
        let room_id = seeded_room(&store);
        let svc = service(store, locks.clone());

        locks
            .set_if_absent(
                &lock_key(room_id, "2024-06-02".parse().unwrap()),
                "other-request",
                Duration::from_secs(300),
            )
            .await
            .unwrap();

        let result = svc
            .create_reservation(request(room_id, range("2024-06-01", "2024-06-04")))
            .await;
        assert!(matches!(result, Err(BookingError::LockHeld)));
    }

    #[tokio::test]
    async fn test_successful_booking_invalidates_cached_search() {
        let store = Arc::new(MemoryStore::new());
        let locks = Arc::new(MemoryLocks::new());
        let room_id = seeded_room(&store);
        let checker = AvailabilityChecker::new(
            store.clone(),
            store.clone(),
            locks.clone(),
            Duration::from_secs(120),
        );
        let svc = service(store, locks);
        let stay = range("2024-06-01", "2024-06-05");

        let before = checker.find_available_rooms("double", &stay, 2).await.unwrap();
        assert_eq!(before.len(), 1);

        svc.create_reservation(request(room_id, stay)).await.unwrap();

        // Even well within the TTL the booked room no longer appears.
        let after = checker.find_available_rooms("double", &stay, 2).await.unwrap();
        assert!(after.is_empty());
    }
}
