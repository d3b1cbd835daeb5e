pub mod app_config;
pub mod database;
pub mod redis_cache;
pub mod reservation_repo;
pub mod room_repo;

pub use database::DbClient;
pub use redis_cache::RedisCache;
pub use reservation_repo::PostgresReservationStore;
pub use room_repo::PostgresRoomStore;
