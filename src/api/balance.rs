// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Session balance query.

use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::{
    blockchain::{Network, TokenBalance, TokenKind},
    distribution::validator::{sender_balance, token_metadata},
    error::ApiError,
    state::AppState,
};

/// Query parameters for balance request.
#[derive(Debug, Deserialize, IntoParams)]
pub struct BalanceQuery {
    /// ERC-20 contract address. Omit, or pass `native`, for ETH.
    pub token: Option<String>,
}

/// Balance response.
#[derive(Debug, Serialize, ToSchema)]
pub struct BalanceResponse {
    pub account: String,
    pub network: Network,
    #[serde(flatten)]
    pub balance: TokenBalance,
}

/// Get the session account's balance of ETH or an ERC-20 token.
#[utoipa::path(
    get,
    path = "/v1/balance",
    tag = "Session",
    params(BalanceQuery),
    responses(
        (status = 200, description = "Balance retrieved successfully", body = BalanceResponse),
        (status = 400, description = "Invalid token address"),
        (status = 503, description = "Blockchain network unavailable")
    )
)]
pub async fn get_balance(
    State(state): State<AppState>,
    Query(query): Query<BalanceQuery>,
) -> Result<Json<BalanceResponse>, ApiError> {
    let token = TokenKind::parse(query.token.as_deref()).map_err(ApiError::bad_request)?;
    let backend = state.session.backend();

    let metadata = token_metadata(backend, token).await?;
    let balance = sender_balance(backend, token).await?;

    Ok(Json(BalanceResponse {
        account: state.session.account().to_string(),
        network: state.session.network(),
        balance: TokenBalance::new(token, &metadata, balance),
    }))
}
