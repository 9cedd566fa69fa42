use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

pub const TBA: &str = "TBA";
pub const NOT_AVAILABLE: &str = "N/A";

/// Группировка разрядов: 1,234,567 или 12,34,567.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DigitGrouping {
    Western,
    Indian,
}

impl FromStr for DigitGrouping {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "western" => Ok(DigitGrouping::Western),
            "indian" => Ok(DigitGrouping::Indian),
            other => Err(format!("unknown digit grouping '{}'", other)),
        }
    }
}

/// Денежный формат без дробной части.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrencyFormat {
    symbol: String,
    grouping: DigitGrouping,
}

impl Default for CurrencyFormat {
    fn default() -> Self {
        Self::new("₹", DigitGrouping::Indian)
    }
}

impl CurrencyFormat {
    pub fn new(symbol: &str, grouping: DigitGrouping) -> Self {
        Self {
            symbol: symbol.to_string(),
            grouping,
        }
    }

    pub fn format_amount(&self, amount: i64) -> String {
        let digits = group_digits(amount.unsigned_abs(), self.grouping);
        if amount < 0 {
            format!("-{}{}", self.symbol, digits)
        } else {
            format!("{}{}", self.symbol, digits)
        }
    }
}

pub fn group_digits(value: u64, grouping: DigitGrouping) -> String {
    let digits = value.to_string();
    if digits.len() <= 3 {
        return digits;
    }

    let (head, tail) = digits.split_at(digits.len() - 3);
    let group = match grouping {
        DigitGrouping::Western => 3,
        DigitGrouping::Indian => 2,
    };

    let mut groups: Vec<&str> = Vec::new();
    let mut end = head.len();
    while end > 0 {
        let start = end.saturating_sub(group);
        groups.push(&head[start..end]);
        end = start;
    }
    groups.reverse();

    format!("{},{}", groups.join(","), tail)
}

pub fn format_datetime(value: Option<&NaiveDateTime>) -> String {
    match value {
        Some(dt) => dt.format("%d %b %Y, %H:%M").to_string(),
        None => TBA.to_string(),
    }
}

pub fn format_distance(distance_km: Option<u32>) -> String {
    match distance_km {
        Some(km) => format!("{} km", group_digits(u64::from(km), DigitGrouping::Western)),
        None => NOT_AVAILABLE.to_string(),
    }
}

pub fn or_tba(value: Option<&str>) -> String {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => TBA.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn indian_grouping() {
        let inr = CurrencyFormat::default();
        assert_eq!(inr.format_amount(2625), "₹2,625");
        assert_eq!(inr.format_amount(73500), "₹73,500");
        assert_eq!(inr.format_amount(1234567), "₹12,34,567");
        assert_eq!(inr.format_amount(999), "₹999");
        assert_eq!(inr.format_amount(-1500), "-₹1,500");
    }

    #[test]
    fn western_grouping() {
        let usd = CurrencyFormat::new("$", DigitGrouping::Western);
        assert_eq!(usd.format_amount(1234567), "$1,234,567");
    }

    #[test]
    fn unknown_distance_is_not_available() {
        assert_eq!(format_distance(None), NOT_AVAILABLE);
        assert_eq!(format_distance(Some(1410)), "1,410 km");
    }

    #[test]
    fn missing_datetime_is_tba() {
        assert_eq!(format_datetime(None), TBA);

        let dt = NaiveDate::from_ymd_opt(2026, 11, 2)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap();
        assert_eq!(format_datetime(Some(&dt)), "02 Nov 2026, 09:30");
    }

    #[test]
    fn grouping_parses_from_env_value() {
        assert_eq!("Indian".parse::<DigitGrouping>(), Ok(DigitGrouping::Indian));
        assert!("roman".parse::<DigitGrouping>().is_err());
    }
}
