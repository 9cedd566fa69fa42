use chrono::{DateTime, FixedOffset, NaiveDateTime};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

/// Сырые значения формы бронирования, как их прислал клиент.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct BookingForm {
    #[validate(custom(function = "not_blank"))]
    pub name: String,
    #[validate(custom(function = "not_blank"))]
    pub phone: String,
    #[validate(custom(function = "not_blank"))]
    pub email: String,
    pub category: String,
    pub provider: String,
    #[serde(alias = "seat")]
    pub class: String,
    pub origin: String,
    pub destination: String,
    #[validate(custom(function = "not_blank"))]
    pub depart: String,
    pub arrive: String,
    pub notes: String,
}

// Пробелы не считаются значением
fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("required"));
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Passenger {
    pub name: String,
    pub phone: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trip {
    pub category: String,
    pub provider: String,
    pub class: String,
    pub origin: String,
    pub destination: String,
    pub depart: NaiveDateTime,
    pub arrive: Option<NaiveDateTime>,
    pub duration: Option<String>,
    pub distance_km: Option<u32>,
}

/// Цена, налог и итог. Итог всегда равен цене плюс налог.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fare {
    pub price: i64,
    pub taxes: i64,
    pub total: i64,
}

impl Fare {
    pub fn from_price(price: i64, tax_rate: f64) -> Self {
        let taxes = taxes_for(price, tax_rate);
        Self {
            price,
            taxes,
            total: price + taxes,
        }
    }
}

pub fn taxes_for(price: i64, tax_rate: f64) -> i64 {
    (price as f64 * tax_rate).round() as i64
}

/// Подтверждённая бронь. После рендера не меняется: новая отправка формы
/// создаёт новую запись.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookingRecord {
    pub booking_id: String,
    pub passenger: Passenger,
    pub trip: Trip,
    pub fare: Fare,
    pub notes: Option<String>,
    pub map_link: Option<String>,
    pub verification_payload: String,
    pub logo: Option<String>,
    pub created_at: DateTime<FixedOffset>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fare_total_is_price_plus_taxes() {
        let fare = Fare::from_price(2500, 0.05);
        assert_eq!(fare, Fare { price: 2500, taxes: 125, total: 2625 });

        let fare = Fare::from_price(70000, 0.05);
        assert_eq!(fare.taxes, 3500);
        assert_eq!(fare.total, 73500);
    }

    #[test]
    fn taxes_round_half_up() {
        // 10 * 0.05 = 0.5
        assert_eq!(taxes_for(10, 0.05), 1);
        assert_eq!(taxes_for(9, 0.05), 0);
        assert_eq!(taxes_for(0, 0.05), 0);
    }

    #[test]
    fn blank_required_fields_fail_validation() {
        let form = BookingForm {
            name: "   ".to_string(),
            phone: "98765 43210".to_string(),
            email: "".to_string(),
            depart: "2026-11-02T09:30".to_string(),
            ..Default::default()
        };

        let errors = form.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("name"));
        assert!(fields.contains_key("email"));
        assert!(!fields.contains_key("phone"));
        assert!(!fields.contains_key("depart"));
    }

    #[test]
    fn seat_is_accepted_as_class_alias() {
        let form: BookingForm =
            serde_json::from_str(r#"{"name":"A","seat":"Premium"}"#).unwrap();
        assert_eq!(form.class, "Premium");
        assert_eq!(form.phone, "");
    }
}
