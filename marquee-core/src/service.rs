use crate::booking::{Booking, BookingRequest, CreateBookingRequest, FieldError};
use crate::inventory::{InventoryError, SeatInventory};
use crate::repository::{BookingRepository, StoreError};
use crate::validate::validate_booking_request;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    #[error("booking request failed validation")]
    Validation(Vec<FieldError>),

    #[error("seat(s) already booked: {}", .0.join(", "))]
    SeatConflict(Vec<String>),

    #[error(transparent)]
    Storage(#[from] StoreError),
}

/// Orchestrates validate → reserve → append. Holds no per-request state;
/// the seat inventory is the only cross-request synchronization point.
pub struct BookingService {
    inventory: Arc<dyn SeatInventory>,
    store: Arc<dyn BookingRepository>,
    release_retry_attempts: u32,
}

impl BookingService {
    pub fn new(
        inventory: Arc<dyn SeatInventory>,
        store: Arc<dyn BookingRepository>,
        release_retry_attempts: u32,
    ) -> Self {
        Self {
            inventory,
            store,
            release_retry_attempts,
        }
    }

    pub async fn create_booking(
        &self,
        raw: CreateBookingRequest,
    ) -> Result<Booking, BookingError> {
        let request = match validate_booking_request(&raw) {
            Ok(request) => request,
            Err(errors) => {
                debug!(?errors, "booking request rejected by validator");
                return Err(BookingError::Validation(errors));
            }
        };

        // The grant-and-append section runs detached from the request
        // future: a request dropped on client timeout must either commit
        // fully or leave no claim behind.
        let inventory = Arc::clone(&self.inventory);
        let store = Arc::clone(&self.store);
        let attempts = self.release_retry_attempts;
        let commit = tokio::spawn(async move {
            reserve_and_append(inventory, store, attempts, request).await
        });

        match commit.await {
            Ok(result) => result,
            Err(err) => Err(BookingError::Storage(StoreError::Backend(format!(
                "booking commit task failed: {err}"
            )))),
        }
    }

    pub async fn last_booking(&self) -> Result<Option<Booking>, StoreError> {
        self.store.latest().await
    }
}

async fn reserve_and_append(
    inventory: Arc<dyn SeatInventory>,
    store: Arc<dyn BookingRepository>,
    release_retry_attempts: u32,
    request: BookingRequest,
) -> Result<Booking, BookingError> {
    match inventory.reserve(&request.slot, &request.seats).await {
        Ok(()) => {}
        Err(InventoryError::Conflict(occupied)) => {
            debug!(slot = %request.slot, ?occupied, "seat conflict");
            return Err(BookingError::SeatConflict(occupied));
        }
        Err(InventoryError::Unavailable(msg)) => {
            return Err(BookingError::Storage(StoreError::Backend(msg)));
        }
    }

    match store.append(&request).await {
        Ok(booking) => {
            info!(booking_id = %booking.id, slot = %booking.slot, "booking committed");
            Ok(booking)
        }
        Err(err) => {
            // The grant must not outlive a failed write.
            release_claims(
                inventory.as_ref(),
                release_retry_attempts,
                &request.slot,
                &request.seats,
            )
            .await;
            match err {
                StoreError::SeatTaken(seats) => {
                    debug!(slot = %request.slot, ?seats, "seat conflict at durable backstop");
                    Err(BookingError::SeatConflict(seats))
                }
                other => Err(BookingError::Storage(other)),
            }
        }
    }
}

async fn release_claims(
    inventory: &dyn SeatInventory,
    release_retry_attempts: u32,
    slot: &str,
    seats: &BTreeSet<String>,
) {
    for attempt in 1..=release_retry_attempts {
        match inventory.release(slot, seats).await {
            Ok(()) => return,
            Err(err) => {
                warn!(%slot, attempt, "seat claim release failed: {err}");
            }
        }
    }
    error!(%slot, ?seats, "seat claims could not be released, quarantining");
    inventory.quarantine(slot, seats).await;
}
