use lodgic_api::{app, AppState};
use lodgic_core::availability::AvailabilityChecker;
use lodgic_core::booking::BookingService;
use lodgic_core::repository::{LockService, ReservationStore, RoomStore};
use lodgic_store::{DbClient, PostgresReservationStore, PostgresRoomStore, RedisCache};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lodgic_api=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = lodgic_store::app_config::Config::load().expect("Failed to load config");
    tracing::info!("Starting Lodgic API on port {}", config.server.port);

    let db = DbClient::new(&config.database.url)
        .await
        .expect("Failed to connect to Postgres");
    db.migrate().await.expect("Failed to run migrations");

    let redis = RedisCache::new(&config.redis.url)
        .await
        .expect("Failed to connect to Redis");
    let cache: Arc<dyn LockService> = Arc::new(redis);

    let reservations: Arc<dyn ReservationStore> =
        Arc::new(PostgresReservationStore::new(db.pool.clone()));
    let rooms: Arc<dyn RoomStore> = Arc::new(PostgresRoomStore::new(db.pool.clone()));

    let checker = AvailabilityChecker::new(
        reservations.clone(),
        rooms.clone(),
        cache.clone(),
        Duration::from_secs(config.business_rules.availability_cache_seconds),
    );
    let coordinator = lodgic_core::coordinator::BookingLockCoordinator::new(
        cache,
        Duration::from_secs(config.business_rules.reservation_lock_seconds),
    );
    let booking = Arc::new(BookingService::new(
        checker.clone(),
        coordinator,
        reservations.clone(),
        rooms,
    ));

    let state = AppState {
        checker,
        booking,
        reservations,
    };

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app(state)).await.unwrap();
}
