use axum::{
    extract::{Json, State},
    http::StatusCode,
    routing::{get, post},
    Router,
};
use marquee_core::{Booking, CreateBookingRequest};
use serde::Serialize;
use tracing::info;

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Serialize)]
struct BookingSavedResponse {
    message: &'static str,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/booking", post(create_booking))
        .route("/booking/last", get(get_last_booking))
}

async fn create_booking(
    State(state): State<AppState>,
    Json(req): Json<CreateBookingRequest>,
) -> Result<(StatusCode, Json<BookingSavedResponse>), ApiError> {
    let booking = state.service.create_booking(req).await?;
    info!("Booking saved: {}", booking.id);

    Ok((
        StatusCode::CREATED,
        Json(BookingSavedResponse {
            message: "Booking saved successfully",
        }),
    ))
}

async fn get_last_booking(State(state): State<AppState>) -> Result<Json<Booking>, ApiError> {
    match state.service.last_booking().await? {
        Some(booking) => Ok(Json(booking)),
        None => Err(ApiError::NotFound("No booking found".to_string())),
    }
}
