use async_trait::async_trait;
use dashmap::DashMap;
use std::collections::{BTreeSet, HashSet};
use tracing::{debug, error};

#[derive(Debug, thiserror::Error)]
pub enum InventoryError {
    #[error("seat(s) already held: {}", .0.join(", "))]
    Conflict(Vec<String>),

    #[error("inventory backend unavailable: {0}")]
    Unavailable(String),
}

/// Owns the atomic reserve-or-reject decision for seat claims. The seat
/// inventory per slot is the only shared mutable state in the system and
/// must be mutated through this trait only.
#[async_trait]
pub trait SeatInventory: Send + Sync {
    /// Claims every requested seat for the slot, or claims nothing.
    /// `Conflict` carries the sorted subset of requested seats already held.
    async fn reserve(&self, slot: &str, seats: &BTreeSet<String>) -> Result<(), InventoryError>;

    /// Compensating action: returns claimed seats to the pool after a failed
    /// durable write.
    async fn release(&self, slot: &str, seats: &BTreeSet<String>) -> Result<(), InventoryError>;

    /// Marks seats provisionally unavailable when compensation cannot
    /// complete. Quarantined seats stay unclaimable until an operator
    /// reconciles them.
    async fn quarantine(&self, slot: &str, seats: &BTreeSet<String>);
}

#[derive(Debug, Default)]
struct SlotSeats {
    held: HashSet<String>,
    quarantined: HashSet<String>,
}

impl SlotSeats {
    fn occupied(&self, seat: &str) -> bool {
        self.held.contains(seat) || self.quarantined.contains(seat)
    }
}

/// Arena of seat claims keyed by slot. Each slot's claim set lives under its
/// own map entry, so requests for distinct slots do not contend on a single
/// lock; the check-and-claim for one slot happens while that entry is held
/// exclusively, making a multi-seat grant a single indivisible operation.
#[derive(Default)]
pub struct InMemorySeatInventory {
    slots: DashMap<String, SlotSeats>,
}

impl InMemorySeatInventory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds claims from bookings already committed to the store, so a
    /// restarted process cannot re-grant persisted seats.
    pub fn preload(&self, claims: impl IntoIterator<Item = (String, String)>) {
        for (slot, seat) in claims {
            self.slots.entry(slot).or_default().held.insert(seat);
        }
    }
}

#[async_trait]
impl SeatInventory for InMemorySeatInventory {
    async fn reserve(&self, slot: &str, seats: &BTreeSet<String>) -> Result<(), InventoryError> {
        let mut entry = self.slots.entry(slot.to_string()).or_default();

        // Sorted because the request set is ordered.
        let occupied: Vec<String> = seats
            .iter()
            .filter(|seat| entry.occupied(seat))
            .cloned()
            .collect();
        if !occupied.is_empty() {
            return Err(InventoryError::Conflict(occupied));
        }

        entry.held.extend(seats.iter().cloned());
        debug!(%slot, count = seats.len(), "seats claimed");
        Ok(())
    }

    async fn release(&self, slot: &str, seats: &BTreeSet<String>) -> Result<(), InventoryError> {
        if let Some(mut entry) = self.slots.get_mut(slot) {
            for seat in seats {
                entry.held.remove(seat);
            }
        }
        debug!(%slot, count = seats.len(), "seat claims released");
        Ok(())
    }

    async fn quarantine(&self, slot: &str, seats: &BTreeSet<String>) {
        let mut entry = self.slots.entry(slot.to_string()).or_default();
        for seat in seats {
            entry.held.remove(seat);
            entry.quarantined.insert(seat.clone());
        }
        error!(%slot, seats = ?seats, "seats quarantined pending operator reconciliation");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn seat_set(seats: &[&str]) -> BTreeSet<String> {
        seats.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_overlapping_reserve_reports_occupied_seats() {
        let inventory = InMemorySeatInventory::new();
        inventory
            .reserve("slot-1", &seat_set(&["A1", "A2"]))
            .await
            .unwrap();

        let err = inventory
            .reserve("slot-1", &seat_set(&["A2", "A3"]))
            .await
            .unwrap_err();
        match err {
            InventoryError::Conflict(occupied) => assert_eq!(occupied, vec!["A2"]),
            other => panic!("expected conflict, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_rejected_reserve_claims_nothing() {
        let inventory = InMemorySeatInventory::new();
        inventory.reserve("slot-1", &seat_set(&["A2"])).await.unwrap();

        // A3 must not be claimed by the failed A2+A3 request.
        inventory
            .reserve("slot-1", &seat_set(&["A2", "A3"]))
            .await
            .unwrap_err();
        inventory.reserve("slot-1", &seat_set(&["A3"])).await.unwrap();
    }

    #[tokio::test]
    async fn test_slots_are_independent() {
        let inventory = InMemorySeatInventory::new();
        inventory.reserve("slot-1", &seat_set(&["A1"])).await.unwrap();
        inventory.reserve("slot-2", &seat_set(&["A1"])).await.unwrap();
    }

    #[tokio::test]
    async fn test_release_returns_seats_to_pool() {
        let inventory = InMemorySeatInventory::new();
        let seats = seat_set(&["A1", "A2"]);
        inventory.reserve("slot-1", &seats).await.unwrap();
        inventory.release("slot-1", &seats).await.unwrap();
        inventory.reserve("slot-1", &seats).await.unwrap();
    }

    #[tokio::test]
    async fn test_quarantined_seats_stay_unclaimable() {
        let inventory = InMemorySeatInventory::new();
        let seats = seat_set(&["A1"]);
        inventory.reserve("slot-1", &seats).await.unwrap();
        inventory.quarantine("slot-1", &seats).await;

        // Release only frees held claims, not quarantined ones.
        inventory.release("slot-1", &seats).await.unwrap();
        let err = inventory.reserve("slot-1", &seats).await.unwrap_err();
        assert!(matches!(err, InventoryError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_preload_blocks_persisted_seats() {
        let inventory = InMemorySeatInventory::new();
        inventory.preload(vec![("slot-1".to_string(), "A1".to_string())]);
        let err = inventory
            .reserve("slot-1", &seat_set(&["A1"]))
            .await
            .unwrap_err();
        assert!(matches!(err, InventoryError::Conflict(_)));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_racing_reserves_grant_exactly_one() {
        let inventory = Arc::new(InMemorySeatInventory::new());

        let mut handles = Vec::new();
        for _ in 0..16 {
            let inventory = Arc::clone(&inventory);
            handles.push(tokio::spawn(async move {
                inventory.reserve("slot-1", &seat_set(&["H7"])).await.is_ok()
            }));
        }

        let mut granted = 0;
        for handle in handles {
            if handle.await.unwrap() {
                granted += 1;
            }
        }
        assert_eq!(granted, 1);
    }
}
