// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::{
    distribution::{fetch_history, history::DEFAULT_PER_PAGE, paginate, HistoryPage},
    error::ApiError,
    state::AppState,
};

#[derive(Debug, Deserialize, IntoParams)]
pub struct HistoryQuery {
    /// 1-based page number
    #[param(default = 1)]
    pub page: Option<usize>,
    #[param(default = 10, maximum = 100)]
    pub per_page: Option<usize>,
}

/// Distributions sent by the session account in the recent block window.
///
/// Rebuilt from contract events on every call, newest first.
#[utoipa::path(
    get,
    path = "/v1/history",
    tag = "Distributions",
    params(HistoryQuery),
    responses(
        (status = 200, description = "History page", body = HistoryPage),
        (status = 503, description = "Blockchain network unavailable")
    )
)]
pub async fn get_history(
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<HistoryPage>, ApiError> {
    let records = fetch_history(&state.session).await?;
    Ok(Json(paginate(
        records,
        query.page.unwrap_or(1),
        query.per_page.unwrap_or(DEFAULT_PER_PAGE),
    )))
}
