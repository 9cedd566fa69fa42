use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;

use super::ApiError;
use crate::models::{BookingForm, BookingRecord};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/bookings", post(create_booking))
        .route("/bookings/current", get(current_booking))
        .route("/bookings/{booking_id}", get(get_booking))
}

// POST /api/bookings
async fn create_booking(
    State(state): State<Arc<AppState>>,
    Json(form): Json<BookingForm>,
) -> Result<impl IntoResponse, ApiError> {
    let record = state.tickets.submit(&form).await?;
    Ok((StatusCode::CREATED, Json(BookingRecord::clone(&record))))
}

// GET /api/bookings/current
async fn current_booking(
    State(state): State<Arc<AppState>>,
) -> Result<Json<BookingRecord>, ApiError> {
    state
        .tickets
        .current()
        .await
        .map(|record| Json(BookingRecord::clone(&record)))
        .ok_or_else(|| ApiError::NotFound("no booking yet".to_string()))
}

// GET /api/bookings/{booking_id} - из хранилища сессии
async fn get_booking(
    State(state): State<Arc<AppState>>,
    Path(booking_id): Path<String>,
) -> Result<Json<BookingRecord>, ApiError> {
    match state.tickets.lookup(&booking_id).await? {
        Some(record) => Ok(Json(record)),
        None => Err(ApiError::NotFound(format!("booking {} not found", booking_id))),
    }
}
