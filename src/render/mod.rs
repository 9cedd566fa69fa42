//! Рендер билета в визуальный фрагмент.
//!
//! `TicketRenderer` строит фрагмент и QR-код для записи и кладёт результат в
//! контейнер `TicketBoard`. Контейнер меняется целиком: сначала собирается
//! новый билет, потом он заменяет старый. При ошибке старый билет остаётся.

pub mod code;
pub mod format;
pub mod fragment;
pub mod html;

use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use crate::config::TicketConfig;
use crate::error::RenderError;
use crate::models::BookingRecord;

use code::ScanCode;
use format::{format_datetime, format_distance, or_tba, CurrencyFormat};
use fragment::{DetailItem, Footer, IdentityBlock, RouteBlock, TicketFragment, TripHeader};

pub const STATUS_CONFIRMED: &str = "CONFIRMED";
const CODE_SIZE_PX: u32 = 160;

/// Результат рендера, хранится в контейнере до следующего рендера.
#[derive(Debug)]
pub struct RenderedTicket {
    pub record: Arc<BookingRecord>,
    pub fragment: TicketFragment,
    pub code: ScanCode,
    pub html: String,
}

impl RenderedTicket {
    pub fn booking_id(&self) -> &str {
        &self.record.booking_id
    }
}

/// Набор именованных контейнеров страницы, в которые рендерятся билеты.
#[derive(Debug, Default)]
pub struct TicketBoard {
    containers: HashMap<String, Option<Arc<RenderedTicket>>>,
}

impl TicketBoard {
    pub fn with_container(id: &str) -> Self {
        let mut board = Self::default();
        board.add_container(id);
        board
    }

    pub fn add_container(&mut self, id: &str) {
        self.containers.entry(id.to_string()).or_insert(None);
    }

    pub fn has_container(&self, id: &str) -> bool {
        self.containers.contains_key(id)
    }

    pub fn rendered(&self, id: &str) -> Option<Arc<RenderedTicket>> {
        self.containers.get(id).cloned().flatten()
    }

    fn slot_mut(&mut self, id: &str) -> Result<&mut Option<Arc<RenderedTicket>>, RenderError> {
        self.containers
            .get_mut(id)
            .ok_or_else(|| RenderError::ContainerMissing(id.to_string()))
    }
}

#[derive(Debug, Clone)]
pub struct TicketRenderer {
    currency: CurrencyFormat,
    default_note: String,
    issuer: String,
}

impl TicketRenderer {
    pub fn new(config: &TicketConfig) -> Self {
        Self {
            currency: config.currency(),
            default_note: config.default_note.clone(),
            issuer: config.issuer.clone(),
        }
    }

    pub fn fragment(&self, record: &BookingRecord) -> TicketFragment {
        let trip = &record.trip;
        let fare = &record.fare;

        let details = vec![
            detail("Depart", format_datetime(Some(&trip.depart))),
            detail("Arrive", format_datetime(trip.arrive.as_ref())),
            detail("Duration", or_tba(trip.duration.as_deref())),
            detail("Class", or_tba(Some(trip.class.as_str()))),
            detail("Price", self.currency.format_amount(fare.price)),
            detail("Taxes", self.currency.format_amount(fare.taxes)),
        ];

        let notes = match record.notes.as_deref().map(str::trim) {
            Some(n) if !n.is_empty() => n.to_string(),
            _ => self.default_note.clone(),
        };

        TicketFragment {
            identity: IdentityBlock {
                passenger: record.passenger.name.clone(),
                booking_id: record.booking_id.clone(),
                phone: record.passenger.phone.clone(),
                email: record.passenger.email.clone(),
            },
            route: RouteBlock {
                origin: or_tba(Some(trip.origin.as_str())),
                destination: or_tba(Some(trip.destination.as_str())),
                distance: format_distance(trip.distance_km),
                map_link: record.map_link.clone(),
            },
            header: TripHeader {
                category: trip.category.clone(),
                provider: trip.provider.clone(),
                class: trip.class.clone(),
            },
            status: STATUS_CONFIRMED.to_string(),
            details,
            total: self.currency.format_amount(fare.total),
            notes,
            footer: Footer {
                issuer: self.issuer.clone(),
                reference: record.booking_id.clone(),
            },
            logo: record.logo.clone(),
        }
    }

    /// Рендерит запись в контейнер `container_id`, заменяя прежний билет и QR-код.
    pub fn render(
        &self,
        record: Arc<BookingRecord>,
        board: &mut TicketBoard,
        container_id: &str,
    ) -> Result<Arc<RenderedTicket>, RenderError> {
        if !board.has_container(container_id) {
            return Err(RenderError::ContainerMissing(container_id.to_string()));
        }

        let fragment = self.fragment(&record);
        let code = ScanCode::new(&record.verification_payload)?;
        let html = html::fragment_html(&fragment, &code.svg(CODE_SIZE_PX));

        let rendered = Arc::new(RenderedTicket {
            record,
            fragment,
            code,
            html,
        });

        *board.slot_mut(container_id)? = Some(rendered.clone());
        debug!("Ticket {} rendered into '{}'", rendered.booking_id(), container_id);
        Ok(rendered)
    }
}

fn detail(label: &str, value: String) -> DetailItem {
    DetailItem {
        label: label.to_string(),
        value,
    }
}
