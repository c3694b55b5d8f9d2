use crate::booking::{Booking, BookingRequest};
use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The durable uniqueness backstop rejected the write: some seat is
    /// already recorded for the slot.
    #[error("seat(s) already recorded for this slot: {}", .0.join(", "))]
    SeatTaken(Vec<String>),

    #[error("storage backend failure: {0}")]
    Backend(String),
}

/// Durable record of bookings. Exclusively owns the persisted
/// representation; writes happen only for guard-approved requests.
#[async_trait]
pub trait BookingRepository: Send + Sync {
    /// Persists a validated, guard-approved booking as one atomic record,
    /// assigning `id` and `created_at`.
    async fn append(&self, request: &BookingRequest) -> Result<Booking, StoreError>;

    /// The booking with the greatest `created_at`, ties broken by insertion
    /// order. `None` when the store is empty.
    async fn latest(&self) -> Result<Option<Booking>, StoreError>;

    /// Every (slot, seat) pair held by a committed booking. Used to hydrate
    /// the seat inventory at startup.
    async fn claimed_seats(&self) -> Result<Vec<(String, String)>, StoreError>;
}

/// In-memory reference store. Backs tests and the no-database dev mode.
#[derive(Default)]
pub struct MemoryBookingStore {
    bookings: Mutex<Vec<Booking>>,
}

impl MemoryBookingStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BookingRepository for MemoryBookingStore {
    async fn append(&self, request: &BookingRequest) -> Result<Booking, StoreError> {
        let mut bookings = self.bookings.lock().await;

        // created_at must never decrease across appends, even if the wall
        // clock does.
        let mut created_at = Utc::now();
        if let Some(last) = bookings.last() {
            created_at = created_at.max(last.created_at);
        }

        let booking = Booking {
            id: Uuid::new_v4(),
            movie: request.movie.clone(),
            slot: request.slot.clone(),
            seats: request.seats.iter().cloned().collect(),
            created_at,
        };
        bookings.push(booking.clone());
        Ok(booking)
    }

    async fn latest(&self) -> Result<Option<Booking>, StoreError> {
        // Insertion order is the tie-break, so the last element is the
        // most recent.
        Ok(self.bookings.lock().await.last().cloned())
    }

    async fn claimed_seats(&self) -> Result<Vec<(String, String)>, StoreError> {
        let bookings = self.bookings.lock().await;
        Ok(bookings
            .iter()
            .flat_map(|b| {
                b.seats
                    .iter()
                    .map(|seat| (b.slot.clone(), seat.clone()))
            })
            .collect())
    }
}
