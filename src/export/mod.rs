//! Экспорт отрисованного билета: PNG, PDF, печать и копирование номера брони.
//!
//! Все экспорты работают с текущим билетом и идут строго по одному
//! (общий `export_lock`). Растеризация и сборка PDF выполняются в пуле
//! блокирующих задач tokio.

pub mod clipboard;
pub mod document;
pub mod print;
pub mod raster;

use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::error::ExportError;
use crate::render::{html, RenderedTicket};

use clipboard::Clipboard;
use document::DocumentWriter;
use print::{PrintHost, PrintView};
use raster::Rasterizer;

pub const PNG_CONTENT_TYPE: &str = "image/png";
pub const PDF_CONTENT_TYPE: &str = "application/pdf";

const FALLBACK_ID: &str = "booking";

/// Готовый файл для скачивания.
#[derive(Debug, Clone, PartialEq)]
pub struct Artifact {
    pub file_name: String,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

/// `<Brand>_Ticket_<id>.<ext>`, пробелы заменяются на `_`.
pub fn artifact_name(brand_prefix: &str, booking_id: Option<&str>, ext: &str) -> String {
    let id = booking_id
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .unwrap_or(FALLBACK_ID);
    let name = format!("{}_Ticket_{}", brand_prefix.trim(), id);
    let name: String = name
        .chars()
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .collect();
    format!("{}.{}", name, ext)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum PrintOutcome {
    Opened { location: String },
    DirectPrint { location: String },
}

pub struct ExportPipeline {
    rasterizer: Arc<dyn Rasterizer>,
    writer: Option<Arc<dyn DocumentWriter>>,
    print_host: Arc<dyn PrintHost>,
    clipboard: Arc<dyn Clipboard>,
    brand_prefix: String,
    fallback_direct_print: bool,
    export_lock: Mutex<()>,
}

impl ExportPipeline {
    pub fn new(
        rasterizer: Arc<dyn Rasterizer>,
        print_host: Arc<dyn PrintHost>,
        clipboard: Arc<dyn Clipboard>,
        brand_prefix: &str,
    ) -> Self {
        Self {
            rasterizer,
            writer: None,
            print_host,
            clipboard,
            brand_prefix: brand_prefix.to_string(),
            fallback_direct_print: true,
            export_lock: Mutex::new(()),
        }
    }

    pub fn with_document_writer(mut self, writer: Arc<dyn DocumentWriter>) -> Self {
        self.writer = Some(writer);
        self
    }

    pub fn with_direct_print_fallback(mut self, enabled: bool) -> Self {
        self.fallback_direct_print = enabled;
        self
    }

    async fn rasterize(&self, ticket: Arc<RenderedTicket>) -> Result<image::RgbaImage, ExportError> {
        let rasterizer = self.rasterizer.clone();
        tokio::task::spawn_blocking(move || rasterizer.rasterize(&ticket))
            .await
            .map_err(|e| ExportError::Task(e.to_string()))?
    }

    pub async fn export_png(&self, ticket: Option<Arc<RenderedTicket>>) -> Result<Artifact, ExportError> {
        let ticket = ticket.ok_or(ExportError::NotRendered)?;
        let _guard = self.export_lock.lock().await;

        let file_name = artifact_name(&self.brand_prefix, Some(ticket.booking_id()), "png");
        let image = self.rasterize(ticket).await?;
        let bytes = tokio::task::spawn_blocking(move || raster::encode_png(image))
            .await
            .map_err(|e| ExportError::Task(e.to_string()))??;

        info!("Exported {} ({} bytes)", file_name, bytes.len());
        Ok(Artifact {
            file_name,
            content_type: PNG_CONTENT_TYPE,
            bytes,
        })
    }

    pub async fn export_pdf(&self, ticket: Option<Arc<RenderedTicket>>) -> Result<Artifact, ExportError> {
        let ticket = ticket.ok_or(ExportError::NotRendered)?;
        let writer = self.writer.clone().ok_or(ExportError::DocumentUnavailable)?;
        let _guard = self.export_lock.lock().await;

        let file_name = artifact_name(&self.brand_prefix, Some(ticket.booking_id()), "pdf");
        let title = ticket.fragment.header.title();
        let image = self.rasterize(ticket).await?;
        let bytes = tokio::task::spawn_blocking(move || writer.write(&title, &image))
            .await
            .map_err(|e| ExportError::Task(e.to_string()))??;

        info!("Exported {} ({} bytes)", file_name, bytes.len());
        Ok(Artifact {
            file_name,
            content_type: PDF_CONTENT_TYPE,
            bytes,
        })
    }

    /// Открывает окно печати; если оно заблокировано, печатает текущую страницу
    /// (когда это разрешено настройкой).
    pub async fn print(&self, ticket: Option<Arc<RenderedTicket>>) -> Result<PrintOutcome, ExportError> {
        let ticket = ticket.ok_or(ExportError::NotRendered)?;
        let _guard = self.export_lock.lock().await;

        let title = format!("{} Ticket {}", self.brand_prefix, ticket.booking_id());
        let view = PrintView::new(title.clone(), html::print_document(&title, &ticket.html));

        match self.print_host.open(view.clone()) {
            Ok(location) => Ok(PrintOutcome::Opened { location }),
            Err(_) if self.fallback_direct_print => {
                warn!("Print window blocked for {}, printing current page", ticket.booking_id());
                let location = self.print_host.print_current_page(view)?;
                Ok(PrintOutcome::DirectPrint { location })
            }
            Err(blocked) => Err(blocked.into()),
        }
    }

    pub async fn copy_booking_id(&self, ticket: Option<Arc<RenderedTicket>>) -> Result<String, ExportError> {
        let booking_id = ticket
            .as_deref()
            .map(|t| t.booking_id().trim().to_string())
            .filter(|id| !id.is_empty())
            .ok_or(ExportError::NoBookingId)?;

        self.clipboard.write_text(&booking_id)?;
        info!("Booking id {} copied to clipboard", booking_id);
        Ok(booking_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn artifact_names_follow_brand_and_id() {
        assert_eq!(
            artifact_name("HolidayTrip", Some("HT-20261016-123456"), "png"),
            "HolidayTrip_Ticket_HT-20261016-123456.png"
        );
        assert_eq!(
            artifact_name("Holiday Trip", Some("HT 1"), "pdf"),
            "Holiday_Trip_Ticket_HT_1.pdf"
        );
        assert_eq!(artifact_name("HolidayTrip", None, "png"), "HolidayTrip_Ticket_booking.png");
        assert_eq!(artifact_name("HolidayTrip", Some("  "), "pdf"), "HolidayTrip_Ticket_booking.pdf");
    }
}
