use async_trait::async_trait;
use lodgic_core::repository::RoomStore;
use lodgic_core::StoreError;
use lodgic_domain::Room;
use sqlx::PgPool;
use uuid::Uuid;

pub struct PostgresRoomStore {
    pub pool: PgPool,
}

impl PostgresRoomStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct RoomRow {
    id: Uuid,
    room_number: String,
    room_type: String,
    capacity: i32,
    price_amount: i32,
    price_currency: String,
}

impl From<RoomRow> for Room {
    fn from(row: RoomRow) -> Self {
        Room {
            id: row.id,
            room_number: row.room_number,
            room_type: row.room_type,
            capacity: row.capacity,
            price_amount: row.price_amount,
            price_currency: row.price_currency,
        }
    }
}

fn store_error(e: sqlx::Error) -> StoreError {
    StoreError::Unavailable(e.to_string())
}

#[async_trait]
impl RoomStore for PostgresRoomStore {
    async fn find_room(&self, id: Uuid) -> Result<Option<Room>, StoreError> {
        let row: Option<RoomRow> = sqlx::query_as(
            "SELECT id, room_number, room_type, capacity, price_amount, price_currency \
             FROM rooms WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_error)?;

        Ok(row.map(Room::from))
    }

    async fn list_rooms(
        &self,
        room_type: &str,
        min_capacity: i32,
    ) -> Result<Vec<Room>, StoreError> {
        let rows: Vec<RoomRow> = sqlx::query_as(
            "SELECT id, room_number, room_type, capacity, price_amount, price_currency \
             FROM rooms WHERE room_type = $1 AND capacity >= $2 \
             ORDER BY price_amount, room_number",
        )
        .bind(room_type)
        .bind(min_capacity)
        .fetch_all(&self.pool)
        .await
        .map_err(store_error)?;

        Ok(rows.into_iter().map(Room::from).collect())
    }
}
