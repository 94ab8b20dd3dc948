//! Tariff calculator endpoints

use axum::{extract::State, response::Json};
use serde::Deserialize;

use crate::app::AppState;
use crate::http::error::AppError;
use crate::tariff::{LineItem, TariffCategory, TariffSummary};

/// Line items accepted per calculation
const MAX_LINE_ITEMS: usize = 200;

#[derive(Deserialize)]
pub struct CalculateRequest {
    items: Vec<LineItem>,
}

pub async fn tariff_categories_handler(State(state): State<AppState>) -> Json<Vec<TariffCategory>> {
    Json(state.tariffs.categories().to_vec())
}

pub async fn calculate_handler(
    State(state): State<AppState>,
    Json(req): Json<CalculateRequest>,
) -> Result<Json<TariffSummary>, AppError> {
    if req.items.len() > MAX_LINE_ITEMS {
        return Err(AppError::BadRequest(format!(
            "At most {} items per calculation",
            MAX_LINE_ITEMS
        )));
    }

    Ok(Json(state.tariffs.calculate(&req.items)?))
}
