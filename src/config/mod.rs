use serde::Deserialize;
use std::env;
use std::str::FromStr;

use crate::export::document::PageFormat;
use crate::render::format::{CurrencyFormat, DigitGrouping};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{key} has invalid value '{value}'")]
    Invalid { key: &'static str, value: String },
}

// Главная структура конфигурации - контейнер для всех настроек
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    pub app: AppConfig,
    pub session: SessionConfig,
    pub ticket: TicketConfig,
    pub export: ExportConfig,
    pub notify: NotifyConfig,
    pub validation: ValidationConfig,
}

// Настройки приложения
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub environment: String,
    pub rust_log: String,
    /// TOML с тарифами; без него используется встроенный config/rates.toml
    pub rates_file: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            environment: "development".to_string(),
            rust_log: "travel_ticket=debug,tower_http=debug".to_string(),
            rates_file: None,
        }
    }
}

// Хранилище сессии: память процесса или Redis с TTL
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    pub redis_url: Option<String>,
    pub ttl_seconds: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            redis_url: None,
            ttl_seconds: 1800,
        }
    }
}

// Оформление билета и расчёт стоимости
#[derive(Debug, Clone, Deserialize)]
pub struct TicketConfig {
    pub brand_prefix: String,
    pub id_prefix: String,
    pub issuer: String,
    pub default_note: String,
    pub logo_url: Option<String>,
    pub verify_secret: Option<String>,
    pub tax_rate: f64,
    pub currency_symbol: String,
    pub digit_grouping: DigitGrouping,
    pub container_id: String,
}

impl TicketConfig {
    pub fn currency(&self) -> CurrencyFormat {
        CurrencyFormat::new(&self.currency_symbol, self.digit_grouping)
    }
}

impl Default for TicketConfig {
    fn default() -> Self {
        Self {
            brand_prefix: "HolidayTrip".to_string(),
            id_prefix: "HT".to_string(),
            issuer: "HolidayTrip Travels".to_string(),
            default_note: "Please carry a valid photo ID and report 30 minutes before departure."
                .to_string(),
            logo_url: None,
            verify_secret: None,
            tax_rate: 0.05,
            currency_symbol: "₹".to_string(),
            digit_grouping: DigitGrouping::Indian,
            container_id: "ticket".to_string(),
        }
    }
}

// Экспорт: PDF-страница, растр, печать
#[derive(Debug, Clone, Deserialize)]
pub struct ExportConfig {
    pub page_format: PageFormat,
    pub page_margin_mm: f32,
    pub raster_scale: f32,
    pub fallback_direct_print: bool,
    pub print_popups: bool,
    pub print_spool_capacity: usize,
    pub clipboard_enabled: bool,
}

impl ExportConfig {
    pub const RASTER_SCALE_MIN: f32 = 0.5;
    pub const RASTER_SCALE_MAX: f32 = 4.0;

    /// Масштаб растра в допустимых пределах; одно значение на PNG и PDF.
    pub fn effective_raster_scale(&self) -> f32 {
        if self.raster_scale.is_finite() {
            self.raster_scale
                .clamp(Self::RASTER_SCALE_MIN, Self::RASTER_SCALE_MAX)
        } else {
            Self::default().raster_scale
        }
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            page_format: PageFormat::A4,
            page_margin_mm: 10.0,
            raster_scale: 2.0,
            fallback_direct_print: true,
            print_popups: true,
            print_spool_capacity: 32,
            clipboard_enabled: true,
        }
    }
}

// Всплывающие уведомления
#[derive(Debug, Clone, Deserialize)]
pub struct NotifyConfig {
    pub toast_duration_ms: u64,
    pub max_toasts: usize,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            toast_duration_ms: 5000,
            max_toasts: 5,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ValidationConfig {
    pub strict_contact: bool,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let app = AppConfig::default();
        let session = SessionConfig::default();
        let ticket = TicketConfig::default();
        let export = ExportConfig::default();
        let notify = NotifyConfig::default();

        Ok(Config {
            app: AppConfig {
                host: env::var("HOST").unwrap_or(app.host),
                port: parse_or("PORT", app.port)?,
                environment: env::var("ENVIRONMENT").unwrap_or(app.environment),
                rust_log: env::var("RUST_LOG").unwrap_or(app.rust_log),
                rates_file: optional("RATES_FILE"),
            },
            session: SessionConfig {
                redis_url: optional("REDIS_URL"),
                ttl_seconds: parse_or("SESSION_TTL_SECONDS", session.ttl_seconds)?,
            },
            ticket: TicketConfig {
                brand_prefix: env::var("BRAND_PREFIX").unwrap_or(ticket.brand_prefix),
                id_prefix: env::var("BOOKING_ID_PREFIX").unwrap_or(ticket.id_prefix),
                issuer: env::var("TICKET_ISSUER").unwrap_or(ticket.issuer),
                default_note: env::var("TICKET_DEFAULT_NOTE").unwrap_or(ticket.default_note),
                logo_url: optional("TICKET_LOGO_URL"),
                verify_secret: optional("VERIFY_SECRET"),
                tax_rate: parse_or("TAX_RATE", ticket.tax_rate)?,
                currency_symbol: env::var("CURRENCY_SYMBOL").unwrap_or(ticket.currency_symbol),
                digit_grouping: parse_or("DIGIT_GROUPING", ticket.digit_grouping)?,
                container_id: env::var("TICKET_CONTAINER_ID").unwrap_or(ticket.container_id),
            },
            export: ExportConfig {
                page_format: parse_or("PDF_PAGE_FORMAT", export.page_format)?,
                page_margin_mm: parse_or("PDF_PAGE_MARGIN_MM", export.page_margin_mm)?,
                raster_scale: parse_or("RASTER_SCALE", export.raster_scale)?,
                fallback_direct_print: parse_or("PRINT_FALLBACK_DIRECT", export.fallback_direct_print)?,
                print_popups: parse_or("PRINT_POPUPS", export.print_popups)?,
                print_spool_capacity: parse_or("PRINT_SPOOL_CAPACITY", export.print_spool_capacity)?,
                clipboard_enabled: parse_or("CLIPBOARD_ENABLED", export.clipboard_enabled)?,
            },
            notify: NotifyConfig {
                toast_duration_ms: parse_or("TOAST_DURATION_MS", notify.toast_duration_ms)?,
                max_toasts: parse_or("TOAST_MAX", notify.max_toasts)?,
            },
            validation: ValidationConfig {
                strict_contact: parse_or("STRICT_CONTACT_CHECKS", false)?,
            },
        })
    }
}

// Пустая строка считается отсутствующим значением
fn optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_or<T: FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match optional(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value: raw }),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_or_falls_back_to_default_when_unset() {
        let value: u16 = parse_or("TRAVEL_TICKET_TEST_UNSET_PORT", 8000).unwrap();
        assert_eq!(value, 8000);
    }

    #[test]
    fn defaults_keep_five_percent_tax_and_five_second_toasts() {
        let config = Config::default();
        assert_eq!(config.ticket.tax_rate, 0.05);
        assert_eq!(config.notify.toast_duration_ms, 5000);
        assert_eq!(config.ticket.id_prefix, "HT");
        assert_eq!(config.export.page_format, PageFormat::A4);
    }

    #[test]
    fn raster_scale_is_clamped_once() {
        let scale = |raster_scale| ExportConfig {
            raster_scale,
            ..ExportConfig::default()
        };

        assert_eq!(scale(2.0).effective_raster_scale(), 2.0);
        assert_eq!(scale(100.0).effective_raster_scale(), 4.0);
        assert_eq!(scale(0.01).effective_raster_scale(), 0.5);
        assert_eq!(scale(-3.0).effective_raster_scale(), 0.5);
        assert_eq!(scale(f32::NAN).effective_raster_scale(), 2.0);
    }
}
