use crate::booking::{BookingRequest, CreateBookingRequest, FieldError};
use std::collections::BTreeSet;

/// Validates and normalizes a raw booking request. Pure function: no I/O,
/// no side effects. Collects every violated field rather than stopping at
/// the first.
pub fn validate_booking_request(
    req: &CreateBookingRequest,
) -> Result<BookingRequest, Vec<FieldError>> {
    let mut errors = Vec::new();

    let movie = match req.movie.as_deref().map(str::trim) {
        Some(m) if !m.is_empty() => Some(m.to_string()),
        _ => {
            errors.push(FieldError::new("movie", "movie identifier is required"));
            None
        }
    };

    let slot = match req.slot.as_deref().map(str::trim) {
        Some(s) if !s.is_empty() => Some(s.to_string()),
        _ => {
            errors.push(FieldError::new("slot", "slot identifier is required"));
            None
        }
    };

    let seats = match req.seats.as_deref() {
        None | Some([]) => {
            errors.push(FieldError::new("seats", "at least one seat is required"));
            None
        }
        Some(raw_seats) => {
            let mut seats = BTreeSet::new();
            let mut seat_errors = false;
            for raw in raw_seats {
                let seat = raw.trim();
                if seat.is_empty() {
                    errors.push(FieldError::new("seats", "seat identifiers must be non-empty"));
                    seat_errors = true;
                } else if !seats.insert(seat.to_string()) {
                    errors.push(FieldError::new(
                        "seats",
                        format!("duplicate seat identifier: {}", seat),
                    ));
                    seat_errors = true;
                }
            }
            if seat_errors {
                None
            } else {
                Some(seats)
            }
        }
    };

    match (movie, slot, seats) {
        (Some(movie), Some(slot), Some(seats)) if errors.is_empty() => {
            Ok(BookingRequest { movie, slot, seats })
        }
        _ => Err(errors),
    }
}
