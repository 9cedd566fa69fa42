use axum::{
    extract::{Path, State},
    http::header,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

use super::ApiError;
use crate::error::ExportError;
use crate::export::{Artifact, PrintOutcome};
use crate::render::html;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/ticket", get(ticket_fragment))
        .route("/ticket/page", get(ticket_page))
        .route("/ticket/ticket.png", get(download_png))
        .route("/ticket/ticket.pdf", get(download_pdf))
        .route("/ticket/print", post(print_ticket))
        .route("/ticket/copy-id", post(copy_booking_id))
        .route("/print/{view_id}", get(print_view))
        .route("/clipboard", get(read_clipboard))
}

fn attachment(artifact: Artifact) -> Response {
    let disposition = format!("attachment; filename=\"{}\"", artifact.file_name);
    (
        [
            (header::CONTENT_TYPE, artifact.content_type.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        artifact.bytes,
    )
        .into_response()
}

// GET /api/ticket
async fn ticket_fragment(State(state): State<Arc<AppState>>) -> Result<Html<String>, ApiError> {
    let rendered = state
        .tickets
        .rendered()
        .await
        .ok_or(ExportError::NotRendered)?;
    Ok(Html(rendered.html.clone()))
}

// GET /api/ticket/page - отдельная страница со стилями билета
async fn ticket_page(State(state): State<Arc<AppState>>) -> Result<Html<String>, ApiError> {
    let rendered = state
        .tickets
        .rendered()
        .await
        .ok_or(ExportError::NotRendered)?;
    let title = format!("Ticket {}", rendered.booking_id());
    Ok(Html(html::page_document(&title, &rendered.html)))
}

// GET /api/ticket/ticket.png
async fn download_png(State(state): State<Arc<AppState>>) -> Result<Response, ApiError> {
    Ok(attachment(state.tickets.export_png().await?))
}

// GET /api/ticket/ticket.pdf
async fn download_pdf(State(state): State<Arc<AppState>>) -> Result<Response, ApiError> {
    Ok(attachment(state.tickets.export_pdf().await?))
}

// POST /api/ticket/print
async fn print_ticket(State(state): State<Arc<AppState>>) -> Result<Json<PrintOutcome>, ApiError> {
    Ok(Json(state.tickets.print().await?))
}

// GET /api/print/{view_id}
async fn print_view(
    State(state): State<Arc<AppState>>,
    Path(view_id): Path<Uuid>,
) -> Result<Html<String>, ApiError> {
    state
        .print_spool
        .view(view_id)
        .map(|view| Html(view.html))
        .ok_or_else(|| ApiError::NotFound(format!("print view {} not found", view_id)))
}

// POST /api/ticket/copy-id
async fn copy_booking_id(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    let booking_id = state.tickets.copy_booking_id().await?;
    Ok(Json(json!({ "booking_id": booking_id })))
}

// GET /api/clipboard
async fn read_clipboard(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(json!({ "text": state.clipboard.read_text() }))
}
