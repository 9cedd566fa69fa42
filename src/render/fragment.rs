use serde::Serialize;

/// Визуальный фрагмент билета: всё, что выводится на экран, печать и в экспорт.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TicketFragment {
    pub identity: IdentityBlock,
    pub route: RouteBlock,
    pub header: TripHeader,
    pub status: String,
    pub details: Vec<DetailItem>,
    pub total: String,
    pub notes: String,
    pub footer: Footer,
    pub logo: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IdentityBlock {
    pub passenger: String,
    pub booking_id: String,
    pub phone: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteBlock {
    pub origin: String,
    pub destination: String,
    pub distance: String,
    pub map_link: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TripHeader {
    pub category: String,
    pub provider: String,
    pub class: String,
}

impl TripHeader {
    pub fn title(&self) -> String {
        [&self.category, &self.provider, &self.class]
            .iter()
            .filter(|part| !part.is_empty())
            .map(|part| part.as_str())
            .collect::<Vec<_>>()
            .join(" · ")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetailItem {
    pub label: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Footer {
    pub issuer: String,
    pub reference: String,
}

impl TicketFragment {
    pub fn detail(&self, label: &str) -> Option<&str> {
        self.details
            .iter()
            .find(|item| item.label == label)
            .map(|item| item.value.as_str())
    }
}
