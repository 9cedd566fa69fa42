pub mod config;
pub mod controllers;
pub mod error;
pub mod export;
pub mod models;
pub mod notify;
pub mod redis_client;
pub mod render;
pub mod services;
pub mod session;

use std::sync::Arc;
use tracing::{info, warn};

use export::clipboard::SessionClipboard;
use export::print::SpoolPrintHost;
use models::RateTable;
use services::BookingTicketService;
use session::SessionStore;

// Shared state для всего приложения
pub struct AppState {
    pub config: config::Config,
    pub tickets: BookingTicketService,
    pub print_spool: Arc<SpoolPrintHost>,
    pub clipboard: Arc<SessionClipboard>,
}

impl AppState {
    pub async fn new(config: config::Config) -> anyhow::Result<Arc<Self>> {
        let rates = Arc::new(RateTable::load(config.app.rates_file.as_deref())?);

        // Redis необязателен: без него сессия живёт в памяти процесса
        let session = match &config.session.redis_url {
            Some(url) => match redis_client::RedisClient::new(url).await {
                Ok(redis) => SessionStore::redis(redis, config.session.ttl_seconds),
                Err(e) => {
                    warn!("Redis unavailable ({}), using in-memory session", e);
                    SessionStore::memory()
                }
            },
            None => SessionStore::memory(),
        };

        Ok(Arc::new(Self::with_session(config, rates, session)))
    }

    /// Состояние без внешних подключений (тесты и локальный запуск).
    pub fn with_session(config: config::Config, rates: Arc<RateTable>, session: SessionStore) -> Self {
        let print_spool = Arc::new(SpoolPrintHost::new(
            config.export.print_spool_capacity,
            config.export.print_popups,
        ));
        let clipboard = Arc::new(SessionClipboard::new(config.export.clipboard_enabled));

        let tickets = BookingTicketService::builder(&config, rates)
            .print_host(print_spool.clone())
            .clipboard(clipboard.clone())
            .session(session)
            .build();
        info!("Ticket service ready (container '{}')", config.ticket.container_id);

        Self {
            config,
            tickets,
            print_spool,
            clipboard,
        }
    }

    /// То же, что `with_session`, но с готовым сервисом билетов.
    pub fn from_parts(
        config: config::Config,
        tickets: BookingTicketService,
        print_spool: Arc<SpoolPrintHost>,
        clipboard: Arc<SessionClipboard>,
    ) -> Self {
        Self {
            config,
            tickets,
            print_spool,
            clipboard,
        }
    }
}
