use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::error::{SessionError, TicketError};
use crate::export::clipboard::{Clipboard, SessionClipboard};
use crate::export::document::{DocumentWriter, PdfWriter};
use crate::export::print::{PrintHost, SpoolPrintHost};
use crate::export::raster::{CardRasterizer, Rasterizer};
use crate::export::{Artifact, ExportPipeline, PrintOutcome};
use crate::models::{BookingForm, BookingRecord, RateTable};
use crate::notify::Notifier;
use crate::render::{RenderedTicket, TicketBoard, TicketRenderer};
use crate::services::pricing::PricingResolver;
use crate::services::record::{Clock, RecordBuilder, SystemClock};
use crate::services::validation::BookingValidator;
use crate::session::SessionStore;

/// Текущее состояние страницы бронирования: последняя запись, её билет и экспорт.
///
/// Успешная отправка формы заменяет запись и билет целиком. Ошибка на любом
/// шаге оставляет прежнее состояние нетронутым.
pub struct BookingTicketService {
    pricing: PricingResolver,
    validator: BookingValidator,
    records: RecordBuilder,
    renderer: TicketRenderer,
    container_id: String,
    board: RwLock<TicketBoard>,
    current: RwLock<Option<Arc<BookingRecord>>>,
    exports: ExportPipeline,
    session: SessionStore,
    notifier: Arc<Notifier>,
}

impl BookingTicketService {
    pub fn builder(config: &Config, rates: Arc<RateTable>) -> TicketServiceBuilder {
        TicketServiceBuilder::new(config, rates)
    }

    pub fn pricing(&self) -> &PricingResolver {
        &self.pricing
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    pub async fn submit(&self, form: &BookingForm) -> Result<Arc<BookingRecord>, TicketError> {
        if let Err(err) = self.validator.validate(form) {
            warn!("Booking rejected: {}", err);
            self.notifier.error(capitalize(&err.to_string()));
            return Err(err.into());
        }

        let price = self.pricing.resolve_price(&form.category, &form.class);
        let distance = self.pricing.rates().distance_km(&form.origin, &form.destination);
        let record = Arc::new(self.records.build(form, price, distance)?);

        {
            let mut board = self.board.write().await;
            if let Err(err) = self.renderer.render(record.clone(), &mut board, &self.container_id) {
                error!("Failed to render ticket {}: {}", record.booking_id, err);
                self.notifier.error(format!("Could not render ticket: {}", err));
                return Err(err.into());
            }
            *self.current.write().await = Some(record.clone());
        }

        if let Err(err) = self.session.save(&record).await {
            warn!("Booking {} not saved to session: {}", record.booking_id, err);
        }

        info!(
            "Booking {} confirmed: {} {} {} total {}",
            record.booking_id,
            record.trip.category,
            record.trip.provider,
            record.trip.class,
            record.fare.total
        );
        self.notifier
            .success(format!("Booking confirmed! ID: {}", record.booking_id));
        Ok(record)
    }

    pub async fn current(&self) -> Option<Arc<BookingRecord>> {
        self.current.read().await.clone()
    }

    pub async fn rendered(&self) -> Option<Arc<RenderedTicket>> {
        self.board.read().await.rendered(&self.container_id)
    }

    pub async fn lookup(&self, booking_id: &str) -> Result<Option<BookingRecord>, SessionError> {
        self.session.load(booking_id).await
    }

    pub async fn export_png(&self) -> Result<Artifact, TicketError> {
        let result = self.exports.export_png(self.rendered().await).await;
        self.report(result, |a| format!("Ticket downloaded as {}", a.file_name))
    }

    pub async fn export_pdf(&self) -> Result<Artifact, TicketError> {
        let result = self.exports.export_pdf(self.rendered().await).await;
        self.report(result, |a| format!("Ticket saved as {}", a.file_name))
    }

    pub async fn print(&self) -> Result<PrintOutcome, TicketError> {
        match self.exports.print(self.rendered().await).await {
            Ok(outcome @ PrintOutcome::Opened { .. }) => {
                self.notifier.info("Print dialog opened");
                Ok(outcome)
            }
            Ok(outcome @ PrintOutcome::DirectPrint { .. }) => {
                self.notifier
                    .confirm("Print window was blocked. Printing this page instead.");
                Ok(outcome)
            }
            Err(err) => {
                warn!("Print failed: {}", err);
                self.notifier.error(capitalize(&err.to_string()));
                Err(err.into())
            }
        }
    }

    pub async fn copy_booking_id(&self) -> Result<String, TicketError> {
        let result = self.exports.copy_booking_id(self.rendered().await).await;
        self.report(result, |id| format!("Booking ID {} copied", id))
    }

    fn report<T>(
        &self,
        result: Result<T, crate::error::ExportError>,
        success: impl FnOnce(&T) -> String,
    ) -> Result<T, TicketError> {
        match result {
            Ok(value) => {
                self.notifier.success(success(&value));
                Ok(value)
            }
            Err(err) => {
                warn!("Export failed: {}", err);
                self.notifier.error(capitalize(&err.to_string()));
                Err(err.into())
            }
        }
    }
}

fn capitalize(message: &str) -> String {
    let mut chars = message.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Собирает сервис из конфигурации; любую внешнюю часть можно подменить.
pub struct TicketServiceBuilder {
    config: Config,
    rates: Arc<RateTable>,
    clock: Arc<dyn Clock>,
    rasterizer: Option<Arc<dyn Rasterizer>>,
    writer: Option<Option<Arc<dyn DocumentWriter>>>,
    print_host: Option<Arc<dyn PrintHost>>,
    clipboard: Option<Arc<dyn Clipboard>>,
    session: Option<SessionStore>,
    notifier: Option<Arc<Notifier>>,
}

impl TicketServiceBuilder {
    fn new(config: &Config, rates: Arc<RateTable>) -> Self {
        Self {
            config: config.clone(),
            rates,
            clock: Arc::new(SystemClock),
            rasterizer: None,
            writer: None,
            print_host: None,
            clipboard: None,
            session: None,
            notifier: None,
        }
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn rasterizer(mut self, rasterizer: Arc<dyn Rasterizer>) -> Self {
        self.rasterizer = Some(rasterizer);
        self
    }

    pub fn document_writer(mut self, writer: Arc<dyn DocumentWriter>) -> Self {
        self.writer = Some(Some(writer));
        self
    }

    pub fn without_document_writer(mut self) -> Self {
        self.writer = Some(None);
        self
    }

    pub fn print_host(mut self, host: Arc<dyn PrintHost>) -> Self {
        self.print_host = Some(host);
        self
    }

    pub fn clipboard(mut self, clipboard: Arc<dyn Clipboard>) -> Self {
        self.clipboard = Some(clipboard);
        self
    }

    pub fn session(mut self, session: SessionStore) -> Self {
        self.session = Some(session);
        self
    }

    pub fn notifier(mut self, notifier: Arc<Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn build(self) -> BookingTicketService {
        let Config {
            ticket,
            export,
            notify,
            validation,
            ..
        } = self.config;

        let scale = export.effective_raster_scale();
        let rasterizer = self
            .rasterizer
            .unwrap_or_else(|| Arc::new(CardRasterizer::new(scale)));
        let writer = self.writer.unwrap_or_else(|| {
            let pdf: Arc<dyn DocumentWriter> = Arc::new(PdfWriter::new(
                export.page_format,
                export.page_margin_mm,
                scale,
            ));
            Some(pdf)
        });
        let print_host = self.print_host.unwrap_or_else(|| {
            Arc::new(SpoolPrintHost::new(export.print_spool_capacity, export.print_popups))
        });
        let clipboard = self
            .clipboard
            .unwrap_or_else(|| Arc::new(SessionClipboard::new(export.clipboard_enabled)));

        let mut exports = ExportPipeline::new(rasterizer, print_host, clipboard, &ticket.brand_prefix)
            .with_direct_print_fallback(export.fallback_direct_print);
        if let Some(writer) = writer {
            exports = exports.with_document_writer(writer);
        }

        BookingTicketService {
            pricing: PricingResolver::new(self.rates, ticket.tax_rate),
            validator: BookingValidator::new(validation.strict_contact),
            records: RecordBuilder::new(&ticket, self.clock),
            renderer: TicketRenderer::new(&ticket),
            board: RwLock::new(TicketBoard::with_container(&ticket.container_id)),
            container_id: ticket.container_id,
            current: RwLock::new(None),
            exports,
            session: self.session.unwrap_or_else(SessionStore::memory),
            notifier: self
                .notifier
                .unwrap_or_else(|| Arc::new(Notifier::new(&notify))),
        }
    }
}
