use serde::Serialize;
use std::sync::Arc;

use crate::models::{Fare, RateTable};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FareClass {
    pub name: String,
    pub price: i64,
}

/// Допустимые перевозчики и классы выбранной категории.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CategoryChoices {
    pub providers: Vec<String>,
    pub classes: Vec<FareClass>,
}

impl CategoryChoices {
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty() && self.classes.is_empty()
    }
}

/// Цены по тарифной сетке.
#[derive(Debug, Clone)]
pub struct PricingResolver {
    rates: Arc<RateTable>,
    tax_rate: f64,
}

impl PricingResolver {
    pub fn new(rates: Arc<RateTable>, tax_rate: f64) -> Self {
        Self { rates, tax_rate }
    }

    pub fn rates(&self) -> &RateTable {
        &self.rates
    }

    pub fn tax_rate(&self) -> f64 {
        self.tax_rate
    }

    pub fn categories(&self) -> Vec<String> {
        self.rates.category_names()
    }

    /// Неизвестная категория даёт пустой выбор.
    pub fn choices(&self, category: &str) -> CategoryChoices {
        match self.rates.category(category) {
            Some(rates) => CategoryChoices {
                providers: rates.providers.clone(),
                classes: rates
                    .classes
                    .iter()
                    .map(|(name, price)| FareClass {
                        name: name.clone(),
                        price: *price,
                    })
                    .collect(),
            },
            None => CategoryChoices::default(),
        }
    }

    /// Цена класса или 0, если категория или класс не заданы либо неизвестны.
    pub fn resolve_price(&self, category: &str, class: &str) -> i64 {
        if category.trim().is_empty() || class.trim().is_empty() {
            return 0;
        }
        self.rates
            .category(category)
            .and_then(|rates| rates.price_of(class))
            .unwrap_or(0)
    }

    pub fn quote(&self, category: &str, class: &str) -> Fare {
        Fare::from_price(self.resolve_price(category, class), self.tax_rate)
    }

    pub fn selection(&self) -> FareSelection {
        FareSelection {
            resolver: self.clone(),
            category: None,
            provider: None,
            class: None,
            choices: CategoryChoices::default(),
        }
    }
}

/// Состояние выпадающих списков формы: категория -> перевозчик, класс.
#[derive(Debug, Clone)]
pub struct FareSelection {
    resolver: PricingResolver,
    category: Option<String>,
    provider: Option<String>,
    class: Option<String>,
    choices: CategoryChoices,
}

impl FareSelection {
    /// Смена категории заново заполняет списки и сбрасывает выбор перевозчика и класса.
    pub fn select_category(&mut self, category: &str) -> &CategoryChoices {
        self.choices = self.resolver.choices(category);
        self.category = (!category.trim().is_empty()).then(|| category.trim().to_string());
        self.provider = None;
        self.class = None;
        &self.choices
    }

    pub fn select_provider(&mut self, provider: &str) -> bool {
        let found = self.choices.providers.iter().find(|p| p.as_str() == provider.trim());
        self.provider = found.cloned();
        self.provider.is_some()
    }

    pub fn select_class(&mut self, class: &str) -> bool {
        let found = self
            .choices
            .classes
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(class.trim()));
        self.class = found.map(|c| c.name.clone());
        self.class.is_some()
    }

    pub fn choices(&self) -> &CategoryChoices {
        &self.choices
    }

    pub fn provider(&self) -> Option<&str> {
        self.provider.as_deref()
    }

    pub fn class(&self) -> Option<&str> {
        self.class.as_deref()
    }

    pub fn price(&self) -> i64 {
        match (&self.category, &self.class) {
            (Some(category), Some(class)) => self.resolver.resolve_price(category, class),
            _ => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn resolver() -> PricingResolver {
        let rates = RateTable::default()
            .with_category(
                "Bus",
                &["Volvo Travels", "GreenLine Coaches"],
                &[("Seater", 800), ("Sleeper", 1500), ("Premium", 2500)],
            )
            .with_category(
                "Flight",
                &["IndiGo", "Air India"],
                &[("Economy", 6500), ("First Class", 70000)],
            );
        PricingResolver::new(Arc::new(rates), 0.05)
    }

    #[test]
    fn category_populates_configured_choices() {
        let choices = resolver().choices("Bus");

        assert_eq!(choices.providers, ["Volvo Travels", "GreenLine Coaches"]);
        let classes: Vec<_> = choices.classes.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(classes, ["Premium", "Seater", "Sleeper"]);
    }

    #[test]
    fn unknown_category_is_empty_and_free() {
        let r = resolver();

        assert!(r.choices("Boat").is_empty());
        assert_eq!(r.resolve_price("Boat", "Premium"), 0);
        assert_eq!(r.resolve_price("", "Premium"), 0);
        assert_eq!(r.resolve_price("Bus", ""), 0);
        assert_eq!(r.resolve_price("Bus", "Cabin"), 0);
    }

    #[test]
    fn reference_quotes() {
        let r = resolver();

        let bus = r.quote("Bus", "Premium");
        assert_eq!((bus.price, bus.taxes, bus.total), (2500, 125, 2625));

        let flight = r.quote("Flight", "First Class");
        assert_eq!((flight.price, flight.taxes, flight.total), (70000, 3500, 73500));
    }

    #[test]
    fn changing_category_clears_selection() {
        let mut selection = resolver().selection();
        selection.select_category("Bus");
        assert!(selection.select_provider("Volvo Travels"));
        assert!(selection.select_class("Premium"));
        assert_eq!(selection.price(), 2500);

        selection.select_category("Flight");
        assert_eq!(selection.provider(), None);
        assert_eq!(selection.class(), None);
        assert_eq!(selection.price(), 0);

        // класс автобуса в категории самолётов недоступен
        assert!(!selection.select_class("Premium"));
        assert!(selection.select_class("First Class"));
        assert_eq!(selection.price(), 70000);

        let choices = selection.select_category("Boat");
        assert!(choices.is_empty());
        assert_eq!(selection.price(), 0);
    }

    proptest! {
        #[test]
        fn fare_invariants_hold(price in 0i64..10_000_000) {
            let fare = Fare::from_price(price, 0.05);
            prop_assert_eq!(fare.taxes, (price as f64 * 0.05).round() as i64);
            prop_assert_eq!(fare.total, fare.price + fare.taxes);
        }

        #[test]
        fn every_configured_class_resolves_to_its_price(idx in 0usize..3) {
            let r = resolver();
            let classes = r.choices("Bus").classes;
            let class = &classes[idx];
            prop_assert_eq!(r.resolve_price("Bus", &class.name), class.price);
        }
    }
}
