use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::info;

const BUNDLED_RATES: &str = include_str!("../../config/rates.toml");

#[derive(Debug, thiserror::Error)]
pub enum RateTableError {
    #[error("failed to read rate table {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse rate table: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("class '{class}' in category '{category}' must have a positive price")]
    NonPositivePrice { category: String, class: String },
}

/// Перевозчики и цены классов одной категории транспорта.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoryRates {
    #[serde(default)]
    pub providers: Vec<String>,
    #[serde(default)]
    pub classes: BTreeMap<String, i64>,
}

impl CategoryRates {
    pub fn price_of(&self, class: &str) -> Option<i64> {
        let class = class.trim();
        self.classes
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(class))
            .map(|(_, price)| *price)
    }
}

/// Известное расстояние между двумя городами.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub origin: String,
    pub destination: String,
    pub distance_km: u32,
}

impl Route {
    fn connects(&self, a: &str, b: &str) -> bool {
        (self.origin.eq_ignore_ascii_case(a) && self.destination.eq_ignore_ascii_case(b))
            || (self.origin.eq_ignore_ascii_case(b) && self.destination.eq_ignore_ascii_case(a))
    }
}

/// Статическая тарифная сетка, загружается один раз при старте.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RateTable {
    #[serde(default)]
    pub categories: BTreeMap<String, CategoryRates>,
    #[serde(default)]
    pub routes: Vec<Route>,
}

impl RateTable {
    /// Загружает тарифы из файла или, если путь не задан, встроенную сетку.
    /// Имена категорий и классов сохраняются как в файле.
    pub fn load(path: Option<&str>) -> Result<Self, RateTableError> {
        let table = match path {
            Some(path) => {
                let source = std::fs::read_to_string(path).map_err(|source| RateTableError::Read {
                    path: path.to_string(),
                    source,
                })?;
                Self::from_toml(&source)?
            }
            None => Self::from_toml(BUNDLED_RATES)?,
        };

        info!(
            "Rate table loaded: {} categories, {} routes",
            table.categories.len(),
            table.routes.len()
        );
        Ok(table)
    }

    pub fn bundled() -> Result<Self, RateTableError> {
        Self::load(None)
    }

    pub fn from_toml(source: &str) -> Result<Self, RateTableError> {
        let table: RateTable = toml::from_str(source)?;
        table.checked()
    }

    pub fn with_category(
        mut self,
        name: &str,
        providers: &[&str],
        classes: &[(&str, i64)],
    ) -> Self {
        self.categories.insert(
            name.to_string(),
            CategoryRates {
                providers: providers.iter().map(|p| p.to_string()).collect(),
                classes: classes.iter().map(|(c, p)| (c.to_string(), *p)).collect(),
            },
        );
        self
    }

    pub fn with_route(mut self, origin: &str, destination: &str, distance_km: u32) -> Self {
        self.routes.push(Route {
            origin: origin.to_string(),
            destination: destination.to_string(),
            distance_km,
        });
        self
    }

    pub fn category_names(&self) -> Vec<String> {
        self.categories.keys().cloned().collect()
    }

    pub fn category(&self, name: &str) -> Option<&CategoryRates> {
        let name = name.trim();
        self.categories
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, rates)| rates)
    }

    pub fn distance_km(&self, origin: &str, destination: &str) -> Option<u32> {
        let (origin, destination) = (origin.trim(), destination.trim());
        if origin.is_empty() || destination.is_empty() {
            return None;
        }
        self.routes
            .iter()
            .find(|route| route.connects(origin, destination))
            .map(|route| route.distance_km)
    }

    fn checked(self) -> Result<Self, RateTableError> {
        for (category, rates) in &self.categories {
            if let Some((class, _)) = rates.classes.iter().find(|(_, price)| **price <= 0) {
                return Err(RateTableError::NonPositivePrice {
                    category: category.clone(),
                    class: class.clone(),
                });
            }
        }
        Ok(self)
    }
}
