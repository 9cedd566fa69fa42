pub mod bookings;
pub mod fares;
pub mod ticket;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;

use crate::error::{ExportError, SessionError, TicketError};
use crate::notify::Toast;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .merge(fares::routes())
        .merge(bookings::routes())
        .merge(ticket::routes())
        .route("/notifications", get(notifications))
        .route("/notifications/{id}/dismiss", post(dismiss_notification))
        .route("/health", get(|| async { "OK" }))
}

// GET /api/notifications
async fn notifications(State(state): State<Arc<AppState>>) -> Json<Vec<Toast>> {
    Json(state.tickets.notifier().active())
}

// POST /api/notifications/{id}/dismiss
async fn dismiss_notification(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> StatusCode {
    if state.tickets.notifier().dismiss(id) {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}

/// Ошибка HTTP-слоя: статус + JSON `{"error": ..}`.
#[derive(Debug)]
pub enum ApiError {
    Ticket(TicketError),
    NotFound(String),
}

impl From<TicketError> for ApiError {
    fn from(err: TicketError) -> Self {
        ApiError::Ticket(err)
    }
}

impl From<SessionError> for ApiError {
    fn from(err: SessionError) -> Self {
        ApiError::Ticket(err.into())
    }
}

impl From<ExportError> for ApiError {
    fn from(err: ExportError) -> Self {
        ApiError::Ticket(err.into())
    }
}

fn export_status(err: &ExportError) -> StatusCode {
    match err {
        ExportError::NotRendered | ExportError::NoBookingId | ExportError::PopupBlocked(_) => {
            StatusCode::CONFLICT
        }
        ExportError::DocumentUnavailable => StatusCode::NOT_IMPLEMENTED,
        ExportError::Clipboard(_) => StatusCode::FORBIDDEN,
        ExportError::Rasterize(_)
        | ExportError::Encode(_)
        | ExportError::Document(_)
        | ExportError::Print(_)
        | ExportError::Task(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, json!({ "error": msg })),
            ApiError::Ticket(TicketError::Validation(err)) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                json!({ "error": err.to_string(), "fields": err.fields }),
            ),
            ApiError::Ticket(TicketError::Export(err)) => {
                let status = export_status(&err);
                if status.is_server_error() && status != StatusCode::NOT_IMPLEMENTED {
                    tracing::error!("Export failed: {}", err);
                }
                (status, json!({ "error": err.to_string() }))
            }
            ApiError::Ticket(err) => {
                tracing::error!("Internal Server Error: {}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "Internal Server Error" }),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}
