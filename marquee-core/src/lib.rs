pub mod booking;
pub mod inventory;
pub mod repository;
pub mod service;
pub mod validate;

pub use booking::{Booking, BookingRequest, CreateBookingRequest, FieldError};
pub use inventory::{InMemorySeatInventory, InventoryError, SeatInventory};
pub use repository::{BookingRepository, MemoryBookingStore, StoreError};
pub use service::{BookingError, BookingService};
