use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::services::pricing::CategoryChoices;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/categories", get(list_categories))
        .route("/categories/{category}", get(category_choices))
        .route("/price", get(price))
}

// GET /api/categories
async fn list_categories(State(state): State<Arc<AppState>>) -> Json<Vec<String>> {
    Json(state.tickets.pricing().categories())
}

// GET /api/categories/{category}
// Неизвестная категория - пустые списки, не ошибка
async fn category_choices(
    State(state): State<Arc<AppState>>,
    Path(category): Path<String>,
) -> Json<CategoryChoices> {
    Json(state.tickets.pricing().choices(&category))
}

#[derive(Debug, Deserialize)]
struct PriceQuery {
    #[serde(default)]
    category: String,
    #[serde(default)]
    class: String,
}

#[derive(Debug, Serialize)]
struct PriceResponse {
    category: String,
    class: String,
    price: i64,
    tax_rate: f64,
    taxes: i64,
    total: i64,
}

// GET /api/price?category=Bus&class=Premium
async fn price(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PriceQuery>,
) -> Json<PriceResponse> {
    let pricing = state.tickets.pricing();
    let fare = pricing.quote(&query.category, &query.class);
    Json(PriceResponse {
        category: query.category,
        class: query.class,
        price: fare.price,
        tax_rate: pricing.tax_rate(),
        taxes: fare.taxes,
        total: fare.total,
    })
}
