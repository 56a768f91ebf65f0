// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Connected session details.

use axum::{extract::State, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{blockchain::Network, state::AppState};

#[derive(Debug, Serialize, ToSchema)]
pub struct SessionResponse {
    /// Address that signs and pays for distributions
    pub account: String,
    pub network: Network,
    pub network_name: String,
    pub chain_id: u64,
    /// DistriButler contract on this network
    pub distributor: String,
    pub explorer_url: String,
    /// Whether a send is currently running
    pub attempt_in_progress: bool,
}

/// Describe the connected account and network.
#[utoipa::path(
    get,
    path = "/v1/session",
    tag = "Session",
    responses(
        (status = 200, description = "Session details", body = SessionResponse)
    )
)]
pub async fn get_session(State(state): State<AppState>) -> Json<SessionResponse> {
    let session = &state.session;
    let network = session.network();
    let config = network.config();
    Json(SessionResponse {
        account: session.account().to_string(),
        network,
        network_name: config.name.to_string(),
        chain_id: config.chain_id,
        distributor: session.distributor().to_string(),
        explorer_url: config.explorer_url.to_string(),
        attempt_in_progress: session.is_busy(),
    })
}
