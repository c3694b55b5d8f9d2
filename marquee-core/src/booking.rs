use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

/// A committed seat reservation. Immutable once written.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: Uuid,
    pub movie: String,
    pub slot: String,
    /// Sorted, duplicate-free by construction.
    pub seats: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// Raw request body for POST /booking. Every field is optional so the
/// validator can report all missing fields at once; unknown fields are
/// ignored by serde.
#[derive(Debug, Default, Deserialize)]
pub struct CreateBookingRequest {
    pub movie: Option<String>,
    pub seats: Option<Vec<String>>,
    pub slot: Option<String>,
}

/// A validated, normalized booking request: trimmed identifiers and the
/// seats as an ordered set.
#[derive(Debug, Clone, PartialEq)]
pub struct BookingRequest {
    pub movie: String,
    pub slot: String,
    pub seats: BTreeSet<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}
