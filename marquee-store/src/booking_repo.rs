use async_trait::async_trait;
use chrono::{DateTime, Utc};
use marquee_core::booking::{Booking, BookingRequest};
use marquee_core::repository::{BookingRepository, StoreError};
use sqlx::PgPool;
use uuid::Uuid;

/// Postgres-backed booking store. `booking_seats` carries a UNIQUE
/// (slot, seat) constraint, so even a writer that bypassed the in-process
/// guard cannot violate seat disjointness.
pub struct PgBookingStore {
    pool: PgPool,
}

impl PgBookingStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct BookingRow {
    id: Uuid,
    movie: String,
    slot: String,
    created_at: DateTime<Utc>,
}

fn backend(err: sqlx::Error) -> StoreError {
    StoreError::Backend(err.to_string())
}

fn seat_insert_error(err: sqlx::Error, seats: &[String]) -> StoreError {
    if let sqlx::Error::Database(db) = &err {
        // 23505: a concurrent commit claimed one of the (slot, seat) pairs
        // between our pre-check and this insert.
        if db.code().as_deref() == Some("23505") {
            return StoreError::SeatTaken(seats.to_vec());
        }
    }
    backend(err)
}

#[async_trait]
impl BookingRepository for PgBookingStore {
    async fn append(&self, request: &BookingRequest) -> Result<Booking, StoreError> {
        let seats: Vec<String> = request.seats.iter().cloned().collect();
        let mut tx = self.pool.begin().await.map_err(backend)?;

        // Precise conflict listing for the caller; the unique constraint
        // stays the authority under racing commits.
        let occupied: Vec<String> = sqlx::query_scalar(
            "SELECT seat FROM booking_seats WHERE slot = $1 AND seat = ANY($2) ORDER BY seat",
        )
        .bind(&request.slot)
        .bind(&seats)
        .fetch_all(&mut *tx)
        .await
        .map_err(backend)?;
        if !occupied.is_empty() {
            return Err(StoreError::SeatTaken(occupied));
        }

        let id = Uuid::new_v4();
        let created_at: DateTime<Utc> = sqlx::query_scalar(
            "INSERT INTO bookings (id, movie, slot) VALUES ($1, $2, $3) RETURNING created_at",
        )
        .bind(id)
        .bind(&request.movie)
        .bind(&request.slot)
        .fetch_one(&mut *tx)
        .await
        .map_err(backend)?;

        for seat in &seats {
            sqlx::query("INSERT INTO booking_seats (booking_id, slot, seat) VALUES ($1, $2, $3)")
                .bind(id)
                .bind(&request.slot)
                .bind(seat)
                .execute(&mut *tx)
                .await
                .map_err(|err| seat_insert_error(err, &seats))?;
        }

        tx.commit().await.map_err(backend)?;

        Ok(Booking {
            id,
            movie: request.movie.clone(),
            slot: request.slot.clone(),
            seats,
            created_at,
        })
    }

    async fn latest(&self) -> Result<Option<Booking>, StoreError> {
        let row: Option<BookingRow> = sqlx::query_as(
            "SELECT id, movie, slot, created_at FROM bookings ORDER BY created_at DESC, seq DESC LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;

        let Some(row) = row else {
            return Ok(None);
        };

        let seats: Vec<String> =
            sqlx::query_scalar("SELECT seat FROM booking_seats WHERE booking_id = $1 ORDER BY seat")
                .bind(row.id)
                .fetch_all(&self.pool)
                .await
                .map_err(backend)?;

        Ok(Some(Booking {
            id: row.id,
            movie: row.movie,
            slot: row.slot,
            seats,
            created_at: row.created_at,
        }))
    }

    async fn claimed_seats(&self) -> Result<Vec<(String, String)>, StoreError> {
        sqlx::query_as("SELECT slot, seat FROM booking_seats")
            .fetch_all(&self.pool)
            .await
            .map_err(backend)
    }
}
