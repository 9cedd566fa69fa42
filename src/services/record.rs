use chrono::{DateTime, FixedOffset, Local, NaiveDate, NaiveDateTime};
use sha2::{Digest, Sha256};
use std::sync::Arc;

use crate::config::TicketConfig;
use crate::error::ValidationError;
use crate::models::{BookingForm, BookingRecord, Fare, Passenger, Trip};

const PAYLOAD_PREFIX: &str = "Booking:";
const SIGNATURE_LEN: usize = 12;
const MAPS_DIRECTIONS_URL: &str = "https://www.google.com/maps/dir/";

const DATETIME_FORMATS: [&str; 3] = ["%Y-%m-%dT%H:%M", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];

/// Источник текущего времени (в тестах подменяется фиксированным).
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<FixedOffset>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<FixedOffset> {
        Local::now().fixed_offset()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<FixedOffset>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<FixedOffset> {
        self.0
    }
}

/// Значение поля даты из формы (datetime-local или просто дата).
pub fn parse_form_datetime(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// Длительность в целых часах и минутах; нет значения, если разница не положительная.
pub fn trip_duration(depart: NaiveDateTime, arrive: Option<NaiveDateTime>) -> Option<String> {
    let minutes = (arrive? - depart).num_minutes();
    if minutes <= 0 {
        return None;
    }
    Some(format!("{}h {}m", minutes / 60, minutes % 60))
}

/// `<prefix>-YYYYMMDD-<последние 6 цифр метки времени в мс>`
pub fn booking_id(prefix: &str, now: DateTime<FixedOffset>) -> String {
    format!(
        "{}-{}-{:06}",
        prefix,
        now.format("%Y%m%d"),
        now.timestamp_millis().rem_euclid(1_000_000)
    )
}

fn signature(booking_id: &str, secret: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(secret.as_bytes());
    hasher.update(booking_id.as_bytes());
    let hex = format!("{:x}", hasher.finalize());
    hex[..SIGNATURE_LEN].to_string()
}

pub fn verification_payload(booking_id: &str, secret: Option<&str>) -> String {
    match secret {
        Some(secret) => format!("{}{}#{}", PAYLOAD_PREFIX, booking_id, signature(booking_id, secret)),
        None => format!("{}{}", PAYLOAD_PREFIX, booking_id),
    }
}

/// Достаёт номер брони из содержимого QR-кода. С секретом подпись обязательна.
pub fn parse_verification_payload(payload: &str, secret: Option<&str>) -> Option<String> {
    let body = payload.trim().strip_prefix(PAYLOAD_PREFIX)?;
    let (booking_id, sig) = match body.split_once('#') {
        Some((id, sig)) => (id, Some(sig)),
        None => (body, None),
    };
    if booking_id.is_empty() {
        return None;
    }

    match (secret, sig) {
        (Some(secret), Some(sig)) if signature(booking_id, secret) == sig => {
            Some(booking_id.to_string())
        }
        (Some(_), _) => None,
        (None, _) => Some(booking_id.to_string()),
    }
}

pub fn map_link(origin: &str, destination: &str) -> Option<String> {
    let (origin, destination) = (origin.trim(), destination.trim());
    if origin.is_empty() || destination.is_empty() {
        return None;
    }
    let query = serde_urlencoded::to_string([
        ("api", "1"),
        ("origin", origin),
        ("destination", destination),
    ])
    .ok()?;
    Some(format!("{}?{}", MAPS_DIRECTIONS_URL, query))
}

/// Собирает запись брони из проверенной формы.
#[derive(Clone)]
pub struct RecordBuilder {
    clock: Arc<dyn Clock>,
    id_prefix: String,
    tax_rate: f64,
    verify_secret: Option<String>,
    logo: Option<String>,
}

impl RecordBuilder {
    pub fn new(config: &TicketConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            id_prefix: config.id_prefix.clone(),
            tax_rate: config.tax_rate,
            verify_secret: config.verify_secret.clone(),
            logo: config.logo_url.clone(),
        }
    }

    pub fn verify_secret(&self) -> Option<&str> {
        self.verify_secret.as_deref()
    }

    pub fn build(
        &self,
        form: &BookingForm,
        price: i64,
        distance_km: Option<u32>,
    ) -> Result<BookingRecord, ValidationError> {
        let depart = parse_form_datetime(&form.depart)
            .ok_or_else(|| ValidationError::new(vec!["depart".to_string()]))?;
        let arrive = parse_form_datetime(&form.arrive);

        let now = self.clock.now();
        let booking_id = booking_id(&self.id_prefix, now);
        let notes = Some(form.notes.trim())
            .filter(|n| !n.is_empty())
            .map(str::to_string);

        Ok(BookingRecord {
            verification_payload: verification_payload(&booking_id, self.verify_secret()),
            booking_id,
            passenger: Passenger {
                name: form.name.trim().to_string(),
                phone: form.phone.trim().to_string(),
                email: form.email.trim().to_string(),
            },
            trip: Trip {
                category: form.category.trim().to_string(),
                provider: form.provider.trim().to_string(),
                class: form.class.trim().to_string(),
                origin: form.origin.trim().to_string(),
                destination: form.destination.trim().to_string(),
                depart,
                arrive,
                duration: trip_duration(depart, arrive),
                distance_km,
            },
            fare: Fare::from_price(price, self.tax_rate),
            notes,
            map_link: map_link(&form.origin, &form.destination),
            logo: self.logo.clone(),
            created_at: now,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(ms: i64) -> DateTime<FixedOffset> {
        FixedOffset::east_opt(0)
            .unwrap()
            .timestamp_millis_opt(ms)
            .unwrap()
    }

    fn form() -> BookingForm {
        BookingForm {
            name: " Asha Rao ".to_string(),
            phone: "98765 43210".to_string(),
            email: "asha@example.com".to_string(),
            category: "Bus".to_string(),
            provider: "Volvo Travels".to_string(),
            class: "Premium".to_string(),
            origin: "Delhi".to_string(),
            destination: "Jaipur".to_string(),
            depart: "2026-11-02T09:30".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn booking_id_uses_date_and_trailing_millis() {
        // 2026-10-14T12:00:00.123Z
        let now = at(1_791_979_200_123);
        let id = booking_id("HT", now);

        assert_eq!(id, format!("HT-20261014-{:06}", 1_791_979_200_123i64 % 1_000_000));
        assert_eq!(id.len(), "HT-YYYYMMDD-".len() + 6);
    }

    #[test]
    fn booking_id_pads_small_remainders() {
        let id = booking_id("HT", at(1_791_979_000_042));
        assert!(id.ends_with("-000042"), "{}", id);
    }

    #[test]
    fn parses_form_date_variants() {
        assert!(parse_form_datetime("2026-11-02T09:30").is_some());
        assert!(parse_form_datetime("2026-11-02T09:30:15").is_some());
        assert!(parse_form_datetime("2026-11-02 09:30").is_some());
        assert_eq!(
            parse_form_datetime("2026-11-02"),
            NaiveDate::from_ymd_opt(2026, 11, 2).and_then(|d| d.and_hms_opt(0, 0, 0))
        );
        assert!(parse_form_datetime("02/11/2026").is_none());
        assert!(parse_form_datetime("").is_none());
    }

    #[test]
    fn duration_floors_to_absent() {
        let depart = parse_form_datetime("2026-11-02T09:30").unwrap();

        assert_eq!(
            trip_duration(depart, parse_form_datetime("2026-11-02T15:05")),
            Some("5h 35m".to_string())
        );
        assert_eq!(trip_duration(depart, Some(depart)), None);
        assert_eq!(trip_duration(depart, parse_form_datetime("2026-11-01T09:30")), None);
        assert_eq!(trip_duration(depart, None), None);
    }

    #[test]
    fn payload_round_trips_with_and_without_secret() {
        let plain = verification_payload("HT-20261102-123456", None);
        assert_eq!(plain, "Booking:HT-20261102-123456");
        assert_eq!(
            parse_verification_payload(&plain, None).as_deref(),
            Some("HT-20261102-123456")
        );

        let signed = verification_payload("HT-20261102-123456", Some("s3cret"));
        assert_eq!(
            parse_verification_payload(&signed, Some("s3cret")).as_deref(),
            Some("HT-20261102-123456")
        );
        assert_eq!(parse_verification_payload(&signed, Some("other")), None);
        assert_eq!(parse_verification_payload(&plain, Some("s3cret")), None);
        assert_eq!(parse_verification_payload("garbage", None), None);
    }

    #[test]
    fn map_link_needs_both_ends() {
        let link = map_link("New Delhi", "Jaipur").unwrap();
        assert!(link.starts_with(MAPS_DIRECTIONS_URL));
        assert!(link.contains("origin=New+Delhi"));
        assert_eq!(map_link("Delhi", " "), None);
    }

    #[test]
    fn build_fills_record() {
        let clock = Arc::new(FixedClock(at(1_791_979_200_123)));
        let builder = RecordBuilder::new(&TicketConfig::default(), clock);

        let record = builder.build(&form(), 2500, Some(280)).unwrap();

        assert!(record.booking_id.starts_with("HT-20261014-"));
        assert_eq!(record.passenger.name, "Asha Rao");
        assert_eq!(record.fare, Fare { price: 2500, taxes: 125, total: 2625 });
        assert_eq!(record.trip.arrive, None);
        assert_eq!(record.trip.duration, None);
        assert_eq!(record.trip.distance_km, Some(280));
        assert_eq!(record.notes, None);
        assert_eq!(
            record.verification_payload,
            format!("Booking:{}", record.booking_id)
        );
        assert!(record.map_link.is_some());
    }

    #[test]
    fn unparsable_arrive_is_left_absent() {
        let clock = Arc::new(FixedClock(at(0)));
        let builder = RecordBuilder::new(&TicketConfig::default(), clock);
        let mut form = form();
        form.arrive = "soon".to_string();

        let record = builder.build(&form, 0, None).unwrap();
        assert_eq!(record.trip.arrive, None);
        assert_eq!(record.trip.duration, None);
    }
}
