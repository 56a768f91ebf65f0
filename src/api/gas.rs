// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{extract::State, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    distribution::{advise, DistributionError, GasLevel},
    error::ApiError,
    state::AppState,
};

#[derive(Debug, Serialize, ToSchema)]
pub struct GasPriceResponse {
    /// Gas price in wei, as a decimal string
    pub gas_price_wei: String,
    pub gas_price_gwei: f64,
    pub level: GasLevel,
    pub recommendation: String,
}

/// Current gas price with a low/moderate/high recommendation.
#[utoipa::path(
    get,
    path = "/v1/gas-price",
    tag = "Distributions",
    responses(
        (status = 200, description = "Current gas price", body = GasPriceResponse),
        (status = 503, description = "Blockchain network unavailable")
    )
)]
pub async fn get_gas_price(State(state): State<AppState>) -> Result<Json<GasPriceResponse>, ApiError> {
    let price = state
        .session
        .backend()
        .gas_price()
        .await
        .map_err(DistributionError::from)?;
    let advice = advise(price);

    Ok(Json(GasPriceResponse {
        gas_price_wei: advice.gas_price_wei.to_string(),
        gas_price_gwei: advice.gas_price_gwei,
        level: advice.level,
        recommendation: advice.level.recommendation().to_string(),
    }))
}
