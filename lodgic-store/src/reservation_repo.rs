use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use lodgic_core::repository::ReservationStore;
use lodgic_core::StoreError;
use lodgic_domain::{NewReservation, Reservation, ReservationStatus, StayRange};
use sqlx::PgPool;
use uuid::Uuid;

const SELECT_RESERVATION: &str =
    "SELECT id, room_id, guest_email, check_in, check_out, status, created_at, updated_at \
     FROM reservations";

pub struct PostgresReservationStore {
    pub pool: PgPool,
}

impl PostgresReservationStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct ReservationRow {
    id: Uuid,
    room_id: Uuid,
    guest_email: String,
    check_in: NaiveDate,
    check_out: NaiveDate,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ReservationRow {
    fn into_domain(self) -> Result<Reservation, StoreError> {
        let status: ReservationStatus = self
            .status
            .parse()
            .map_err(|e: lodgic_domain::reservation::ParseStatusError| {
                StoreError::Unavailable(e.to_string())
            })?;
        let range = StayRange::new(self.check_in, self.check_out)
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        Ok(Reservation {
            id: self.id,
            room_id: self.room_id,
            guest_email: self.guest_email,
            range,
            status,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

fn store_error(e: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db) = &e {
        // 23P01 exclusion_violation, 23505 unique_violation: the overlap
        // constraint fired.
        if matches!(db.code().as_deref(), Some("23P01") | Some("23505")) {
            return StoreError::Conflict;
        }
    }
    StoreError::Unavailable(e.to_string())
}

#[async_trait]
impl ReservationStore for PostgresReservationStore {
    async fn find_conflicting(
        &self,
        room_id: Uuid,
        range: &StayRange,
        statuses: &[ReservationStatus],
    ) -> Result<Vec<Reservation>, StoreError> {
        let statuses: Vec<String> = statuses.iter().map(|s| s.to_string()).collect();

        let rows: Vec<ReservationRow> = sqlx::query_as(&format!(
            "{} WHERE room_id = $1 AND check_in < $2 AND check_out > $3 AND status = ANY($4)",
            SELECT_RESERVATION
        ))
        .bind(room_id)
        .bind(range.check_out)
        .bind(range.check_in)
        .bind(&statuses)
        .fetch_all(&self.pool)
        .await
        .map_err(store_error)?;

        rows.into_iter().map(ReservationRow::into_domain).collect()
    }

    async fn create(&self, data: &NewReservation) -> Result<Reservation, StoreError> {
        let mut tx = self.pool.begin().await.map_err(store_error)?;

        let id = Uuid::new_v4();
        let now = Utc::now();

        // Insert PENDING, then confirm inside the same transaction. The
        // exclusion constraint is checked when the row turns CONFIRMED.
        sqlx::query(
            "INSERT INTO reservations \
             (id, room_id, guest_email, check_in, check_out, status, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(id)
        .bind(data.room_id)
        .bind(&data.guest_email)
        .bind(data.range.check_in)
        .bind(data.range.check_out)
        .bind(ReservationStatus::PENDING.to_string())
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(store_error)?;

        sqlx::query("UPDATE reservations SET status = $2, updated_at = $3 WHERE id = $1")
            .bind(id)
            .bind(ReservationStatus::CONFIRMED.to_string())
            .bind(now)
            .execute(&mut *tx)
            .await
            .map_err(store_error)?;

        tx.commit().await.map_err(store_error)?;

        Ok(Reservation {
            id,
            room_id: data.room_id,
            guest_email: data.guest_email.clone(),
            range: data.range,
            status: ReservationStatus::CONFIRMED,
            created_at: now,
            updated_at: now,
        })
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Reservation>, StoreError> {
        let row: Option<ReservationRow> =
            sqlx::query_as(&format!("{} WHERE id = $1", SELECT_RESERVATION))
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(store_error)?;

        row.map(ReservationRow::into_domain).transpose()
    }

    async fn update_status(
        &self,
        id: Uuid,
        status: ReservationStatus,
    ) -> Result<bool, StoreError> {
        let result =
            sqlx::query("UPDATE reservations SET status = $2, updated_at = $3 WHERE id = $1")
                .bind(id)
                .bind(status.to_string())
                .bind(Utc::now())
                .execute(&self.pool)
                .await
                .map_err(store_error)?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_maps_into_domain_reservation() {
        let now = Utc::now();
        let row = ReservationRow {
            id: Uuid::new_v4(),
            room_id: Uuid::new_v4(),
            guest_email: "guest@example.com".to_string(),
            check_in: "2024-06-01".parse().unwrap(),
            check_out: "2024-06-05".parse().unwrap(),
            status: "CONFIRMED".to_string(),
            created_at: now,
            updated_at: now,
        };

        let reservation = row.into_domain().unwrap();
        assert_eq!(reservation.status, ReservationStatus::CONFIRMED);
        assert_eq!(reservation.range.nights(), 4);
    }

    #[test]
    fn test_row_with_unknown_status_is_rejected() {
        let now = Utc::now();
        let row = ReservationRow {
            id: Uuid::new_v4(),
            room_id: Uuid::new_v4(),
            guest_email: "guest@example.com".to_string(),
            check_in: "2024-06-01".parse().unwrap(),
            check_out: "2024-06-05".parse().unwrap(),
            status: "BOOKED".to_string(),
            created_at: now,
            updated_at: now,
        };

        assert!(row.into_domain().is_err());
    }
}
