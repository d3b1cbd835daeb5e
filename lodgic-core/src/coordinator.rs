use crate::repository::LockService;
use crate::{BookingError, CoreResult};
use chrono::NaiveDate;
use lodgic_domain::StayRange;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;
use uuid::Uuid;

/// One lock key per occupied night. Day granularity means two requests for
/// overlapping-but-different ranges on the same room contend on their shared
/// nights instead of slipping past an exact-tuple key.
pub fn lock_key(room_id: Uuid, night: NaiveDate) -> String {
    format!("lock:{}:{}", room_id, night)
}

/// Serializes the check-then-create sequence per (room, night) so concurrent
/// requests cannot both observe availability and both insert overlapping
/// reservations.
#[derive(Clone)]
pub struct BookingLockCoordinator {
    locks: Arc<dyn LockService>,
    ttl: Duration,
}

impl BookingLockCoordinator {
    pub fn new(locks: Arc<dyn LockService>, ttl: Duration) -> Self {
        Self { locks, ttl }
    }

    /// Runs `body` while holding every night lock of the range.
    ///
    /// Fail-fast: if any night is already locked the call returns `LockHeld`
    /// immediately; the caller is an interactive request, not a batch job, so
    /// there is no retry loop here. Inability to talk to the lock service
    /// fails closed as `Cache` — the body never runs without mutual exclusion.
    pub async fn with_reservation_lock<T, F, Fut>(
        &self,
        room_id: Uuid,
        range: &StayRange,
        body: F,
    ) -> CoreResult<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = CoreResult<T>>,
    {
        let token = Uuid::new_v4().to_string();
        let mut acquired: Vec<String> = Vec::with_capacity(range.nights() as usize);

        for night in range.days() {
            let key = lock_key(room_id, night);
            match self.locks.set_if_absent(&key, &token, self.ttl).await {
                Ok(true) => acquired.push(key),
                Ok(false) => {
                    self.release(&acquired).await;
                    return Err(BookingError::LockHeld);
                }
                Err(e) => {
                    self.release(&acquired).await;
                    return Err(BookingError::Cache(e));
                }
            }
        }

        let result = body().await;

        // Best-effort release on every outcome; the TTL bounds how long a
        // failed delete can block other bookings.
        self.release(&acquired).await;

        result
    }

    async fn release(&self, keys: &[String]) {
        for key in keys {
            if let Err(e) = self.locks.delete(key).await {
                warn!("Failed to release booking lock {}: {}", key, e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryLocks;
    use lodgic_domain::StayRange;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn range(check_in: &str, check_out: &str) -> StayRange {
        StayRange::new(check_in.parse().unwrap(), check_out.parse().unwrap()).unwrap()
    }

    fn coordinator(locks: Arc<MemoryLocks>, ttl: Duration) -> BookingLockCoordinator {
        BookingLockCoordinator::new(locks, ttl)
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_identical_ranges_admit_exactly_one_winner() {
        let locks = Arc::new(MemoryLocks::new());
        let coord = coordinator(locks, Duration::from_secs(300));
        let room_id = Uuid::new_v4();
        let executions = Arc::new(AtomicUsize::new(0));
        let barrier = Arc::new(tokio::sync::Barrier::new(8));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let coord = coord.clone();
            let executions = executions.clone();
            let barrier = barrier.clone();
            handles.push(tokio::spawn(async move {
                barrier.wait().await;
                coord
                    .with_reservation_lock(room_id, &range("2024-06-01", "2024-06-05"), || async {
                        executions.fetch_add(1, Ordering::SeqCst);
                        // Hold the lock long enough for every other task to
                        // attempt acquisition.
                        tokio::time::sleep(Duration::from_millis(100)).await;
                        Ok(())
                    })
                    .await
            }));
        }

        let mut winners = 0;
        let mut held = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(()) => winners += 1,
                Err(BookingError::LockHeld) => held += 1,
                Err(e) => panic!("unexpected error: {}", e),
            }
        }

        assert_eq!(winners, 1);
        assert_eq!(held, 7);
        assert_eq!(executions.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_overlapping_ranges_contend_on_shared_nights() {
        let locks = Arc::new(MemoryLocks::new());
        let coord = coordinator(locks.clone(), Duration::from_secs(300));
        let room_id = Uuid::new_v4();

        // Hold [01, 03) open by acquiring its nights directly.
        for night in range("2024-06-01", "2024-06-03").days() {
            locks
                .set_if_absent(&lock_key(room_id, night), "other", Duration::from_secs(300))
                .await
                .unwrap();
        }

        // [02, 04) shares the night of the 2nd.
        let result = coord
            .with_reservation_lock(room_id, &range("2024-06-02", "2024-06-04"), || async {
                Ok(())
            })
            .await;
        assert!(matches!(result, Err(BookingError::LockHeld)));

        // A back-to-back range shares no night and proceeds.
        let result = coord
            .with_reservation_lock(room_id, &range("2024-06-03", "2024-06-05"), || async {
                Ok(())
            })
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_partial_acquisition_is_rolled_back() {
        let locks = Arc::new(MemoryLocks::new());
        let coord = coordinator(locks.clone(), Duration::from_secs(300));
        let room_id = Uuid::new_v4();

        // Block only the last night of the requested range.
        locks
            .set_if_absent(
                &lock_key(room_id, "2024-06-03".parse().unwrap()),
                "other",
                Duration::from_secs(300),
            )
            .await
            .unwrap();

        let result = coord
            .with_reservation_lock(room_id, &range("2024-06-01", "2024-06-04"), || async {
                Ok(())
            })
            .await;
        assert!(matches!(result, Err(BookingError::LockHeld)));

        // The first two nights must have been released again.
        let result = coord
            .with_reservation_lock(room_id, &range("2024-06-01", "2024-06-03"), || async {
                Ok(())
            })
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_lock_expires_after_ttl_without_release() {
        let locks = Arc::new(MemoryLocks::new());
        let room_id = Uuid::new_v4();
        let night: NaiveDate = "2024-06-01".parse().unwrap();
        let key = lock_key(room_id, night);

        let first = locks
            .set_if_absent(&key, "holder", Duration::from_millis(50))
            .await
            .unwrap();
        assert!(first);

        let blocked = locks
            .set_if_absent(&key, "second", Duration::from_millis(50))
            .await
            .unwrap();
        assert!(!blocked);

        tokio::time::sleep(Duration::from_millis(80)).await;

        let after_expiry = locks
            .set_if_absent(&key, "second", Duration::from_millis(50))
            .await
            .unwrap();
        assert!(after_expiry);
    }

    #[tokio::test]
    async fn test_lock_service_outage_fails_closed() {
        let locks = Arc::new(MemoryLocks::new());
        locks.set_unavailable(true);
        let coord = coordinator(locks, Duration::from_secs(300));
        let ran = Arc::new(AtomicUsize::new(0));
        let ran_inner = ran.clone();

        let result = coord
            .with_reservation_lock(Uuid::new_v4(), &range("2024-06-01", "2024-06-02"), || async move {
                ran_inner.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
            .await;
        assert!(matches!(result, Err(BookingError::Cache(_))));
        // The body must never run without mutual exclusion.
        assert_eq!(ran.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_body_error_still_releases_locks() {
        let locks = Arc::new(MemoryLocks::new());
        let coord = coordinator(locks, Duration::from_secs(300));
        let room_id = Uuid::new_v4();
        let stay = range("2024-06-01", "2024-06-03");

        let result: CoreResult<()> = coord
            .with_reservation_lock(room_id, &stay, || async { Err(BookingError::Conflict) })
            .await;
        assert!(matches!(result, Err(BookingError::Conflict)));

        let retry = coord
            .with_reservation_lock(room_id, &stay, || async { Ok(()) })
            .await;
        assert!(retry.is_ok());
    }
}
