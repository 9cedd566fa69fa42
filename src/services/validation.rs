use validator::{Validate, ValidateEmail};

use crate::error::ValidationError;
use crate::models::BookingForm;
use crate::services::record::parse_form_datetime;

// Порядок полей в сообщении совпадает с порядком в форме
const FIELD_ORDER: [&str; 4] = ["name", "phone", "email", "depart"];
const MIN_PHONE_DIGITS: usize = 7;

#[derive(Debug, Clone, Default)]
pub struct BookingValidator {
    strict_contact: bool,
}

impl BookingValidator {
    pub fn new(strict_contact: bool) -> Self {
        Self { strict_contact }
    }

    /// Проверяет обязательные поля. Ошибка перечисляет все неверные поля сразу.
    pub fn validate(&self, form: &BookingForm) -> Result<(), ValidationError> {
        let mut fields: Vec<String> = match form.validate() {
            Ok(()) => Vec::new(),
            Err(errors) => errors.field_errors().keys().map(|k| k.to_string()).collect(),
        };

        let has = |fields: &Vec<String>, name: &str| fields.iter().any(|f| f == name);

        if !has(&fields, "depart") && parse_form_datetime(&form.depart).is_none() {
            fields.push("depart".to_string());
        }

        if self.strict_contact {
            let email = form.email.trim().to_string();
            if !has(&fields, "email") && !email.validate_email() {
                fields.push("email".to_string());
            }
            let digits = form.phone.chars().filter(|c| c.is_ascii_digit()).count();
            if !has(&fields, "phone") && digits < MIN_PHONE_DIGITS {
                fields.push("phone".to_string());
            }
        }

        if fields.is_empty() {
            return Ok(());
        }

        fields.sort_by_key(|f| {
            FIELD_ORDER
                .iter()
                .position(|o| *o == f.as_str())
                .unwrap_or(usize::MAX)
        });
        Err(ValidationError::new(fields))
    }
}
