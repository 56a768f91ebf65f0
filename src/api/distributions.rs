// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Distribution estimate, send and status endpoints.

use std::sync::Arc;

use alloy::primitives::TxHash;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use utoipa::ToSchema;

use crate::{
    blockchain::{Network, TokenKind},
    distribution::{
        estimate, recipients, spawn_submit, AttemptEvent, AttemptFailure, AttemptState,
        DistributionError, DistributionInput, DistributionRequest, GasSource, ListFormat,
        ResolvedRecipient, Session,
    },
    error::ApiError,
    state::AppState,
};

/// Recipients to distribute to.
///
/// Supply either `recipients` (a pasted list or CSV text) or the parallel
/// `addresses` and `amounts` arrays.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct DistributionBody {
    /// ERC-20 contract address; omit or `native` for ETH
    pub token: Option<String>,
    /// Expected network; rejected if it differs from the session's
    pub network: Option<String>,
    /// `address_or_name,amount` lines
    pub recipients: Option<String>,
    /// Format of `recipients`
    #[serde(default)]
    pub format: ListFormat,
    pub addresses: Option<Vec<String>>,
    pub amounts: Option<Vec<String>>,
}

impl DistributionBody {
    fn into_input(self, session: &Session) -> Result<DistributionInput, ApiError> {
        if let Some(raw) = self.network.as_deref() {
            let requested = raw.parse::<Network>().map_err(DistributionError::from)?;
            if requested != session.network() {
                return Err(ApiError::bad_request(format!(
                    "Session is connected to {}, not {requested}",
                    session.network()
                ))
                .with_code("NETWORK_MISMATCH"));
            }
        }

        let token = TokenKind::parse(self.token.as_deref())
            .map_err(|e| ApiError::bad_request(e).with_code("INVALID_TOKEN"))?;

        match (self.recipients, self.addresses, self.amounts) {
            (Some(_), Some(_), _) | (Some(_), _, Some(_)) => Err(ApiError::bad_request(
                "Provide either recipients text or addresses/amounts arrays, not both",
            )),
            (Some(text), None, None) => Ok(DistributionInput::from_entries(
                token,
                recipients::parse(&text, self.format),
            )),
            (None, addresses, amounts) => Ok(DistributionInput {
                token,
                identifiers: addresses.unwrap_or_default(),
                amounts: amounts.unwrap_or_default().into_iter().map(Some).collect(),
            }),
        }
    }
}

/// Validated figures shared by estimate and send responses.
#[derive(Debug, Serialize, ToSchema)]
pub struct RequestSummary {
    pub network: Network,
    /// `native` or the token contract address
    pub token: String,
    pub token_symbol: String,
    pub decimals: u8,
    pub recipient_count: usize,
    pub total_amount: String,
    pub fee_amount: String,
    pub total_with_fee: String,
}

impl From<&DistributionRequest> for RequestSummary {
    fn from(request: &DistributionRequest) -> Self {
        Self {
            network: request.network(),
            token: request.token().to_string(),
            token_symbol: request.symbol().to_string(),
            decimals: request.decimals(),
            recipient_count: request.recipient_count(),
            total_amount: request.format(request.total_amount()),
            fee_amount: request.format(request.fee_amount()),
            total_with_fee: request.format(request.total_with_fee()),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct GasEstimateResponse {
    pub gas_units: String,
    pub gas_price_wei: String,
    pub cost_wei: String,
    /// Estimated cost in ETH
    pub cost_eth: String,
    pub source: GasSource,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct EstimateResponse {
    #[serde(flatten)]
    pub summary: RequestSummary,
    pub gas: GasEstimateResponse,
    pub recipients: Vec<ResolvedRecipient>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

/// A distribution that has been broadcast.
#[derive(Debug, Serialize, ToSchema)]
pub struct SubmitResponse {
    #[serde(flatten)]
    pub summary: RequestSummary,
    pub tx_hash: String,
    pub explorer_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approval_tx_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
    /// States entered so far
    pub transitions: Vec<AttemptState>,
    /// `pending` until the transaction is mined
    pub status: AttemptState,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DistributionStatusResponse {
    pub tx_hash: String,
    pub explorer_url: String,
    /// `pending`, `confirmed` or `failed`
    pub status: AttemptState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_number: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gas_used: Option<u64>,
}

impl From<AttemptFailure> for ApiError {
    fn from(failure: AttemptFailure) -> Self {
        let mut api = ApiError::from(failure.error);
        let details = serde_json::json!({
            "transitions": failure.trail,
            "tx_hash": failure.tx_hash.map(|h| format!("{h:#x}")),
            "approval_tx_hash": failure.approval_tx_hash.map(|h| format!("{h:#x}")),
            "warning": failure.warning,
            "errors": api.details.take(),
        });
        api.with_details(details)
    }
}

/// Resolve, validate and price a distribution without sending it.
#[utoipa::path(
    post,
    path = "/v1/distributions/estimate",
    tag = "Distributions",
    request_body = DistributionBody,
    responses(
        (status = 200, description = "Distribution is valid; gas estimated", body = EstimateResponse),
        (status = 400, description = "Invalid recipients, amounts or network"),
        (status = 422, description = "Insufficient balance"),
        (status = 503, description = "Blockchain network unavailable")
    )
)]
pub async fn estimate_distribution(
    State(state): State<AppState>,
    Json(body): Json<DistributionBody>,
) -> Result<Json<EstimateResponse>, ApiError> {
    let input = body.into_input(&state.session)?;
    let report = estimate(&state.session, &input).await?;

    Ok(Json(EstimateResponse {
        summary: RequestSummary::from(&report.request),
        gas: GasEstimateResponse {
            gas_units: report.gas.gas_units.to_string(),
            gas_price_wei: report.gas.gas_price.to_string(),
            cost_wei: report.gas.cost_wei.to_string(),
            cost_eth: report.gas.cost,
            source: report.gas.source,
        },
        recipients: report.resolved,
        warning: report.warning,
    }))
}

/// Send a distribution and return once it has been broadcast.
///
/// The attempt keeps running after the response is sent; poll
/// `GET /v1/distributions/{tx_hash}` for the outcome. Only one send may run
/// at a time and a concurrent request gets 409.
#[utoipa::path(
    post,
    path = "/v1/distributions",
    tag = "Distributions",
    request_body = DistributionBody,
    responses(
        (status = 202, description = "Distribution broadcast and pending", body = SubmitResponse),
        (status = 400, description = "Invalid recipients, amounts or network"),
        (status = 409, description = "Another distribution is in progress"),
        (status = 422, description = "Insufficient balance or rejected approval"),
        (status = 503, description = "Submission failed")
    )
)]
pub async fn submit_distribution(
    State(state): State<AppState>,
    Json(body): Json<DistributionBody>,
) -> Result<(StatusCode, Json<SubmitResponse>), ApiError> {
    let input = body.into_input(&state.session)?;
    let (events_tx, mut events) = mpsc::unbounded_channel();
    let handle = spawn_submit(Arc::clone(&state.session), input, Some(events_tx))?;

    let mut transitions = vec![AttemptState::Idle];
    let mut prepared = None;
    let mut approval_tx_hash = None;
    let mut tx_hash = None;

    while let Some(event) = events.recv().await {
        match event {
            AttemptEvent::Transition(next) => {
                transitions.push(next);
                if next == AttemptState::Pending {
                    break;
                }
            }
            AttemptEvent::Prepared { request, warning } => prepared = Some((request, warning)),
            AttemptEvent::ApprovalSent(hash) => approval_tx_hash = Some(hash),
            AttemptEvent::DistributionSent(hash) => tx_hash = Some(hash),
        }
    }

    if let (Some((request, warning)), Some(tx_hash), Some(AttemptState::Pending)) =
        (prepared, tx_hash, transitions.last().copied())
    {
        // Dropping the handle detaches the task; it owns the session guard.
        drop(handle);
        return Ok((
            StatusCode::ACCEPTED,
            Json(SubmitResponse {
                summary: RequestSummary::from(request.as_ref()),
                tx_hash: format!("{tx_hash:#x}"),
                explorer_url: request.network().tx_url(&tx_hash),
                approval_tx_hash: approval_tx_hash.map(|h| format!("{h:#x}")),
                warning,
                transitions,
                status: AttemptState::Pending,
            }),
        ));
    }

    // The channel closed before the attempt reached Pending, so it has ended.
    let report = handle.await.map_err(|e| {
        ApiError::from(DistributionError::SubmissionFailure(format!(
            "attempt task ended unexpectedly: {e}"
        )))
    })??;

    Ok((
        StatusCode::ACCEPTED,
        Json(SubmitResponse {
            summary: RequestSummary::from(&report.request),
            tx_hash: format!("{:#x}", report.tx_hash),
            explorer_url: report.request.network().tx_url(&report.tx_hash),
            approval_tx_hash: report.approval_tx_hash.map(|h| format!("{h:#x}")),
            warning: report.warning,
            status: report.trail.last().copied().unwrap_or(AttemptState::Confirmed),
            transitions: report.trail,
        }),
    ))
}

/// Report whether a broadcast distribution has been mined.
///
/// Transactions the node has not seen yet are reported as pending.
#[utoipa::path(
    get,
    path = "/v1/distributions/{tx_hash}",
    tag = "Distributions",
    params(("tx_hash" = String, Path, description = "Distribute transaction hash")),
    responses(
        (status = 200, description = "Current status", body = DistributionStatusResponse),
        (status = 400, description = "Malformed transaction hash"),
        (status = 503, description = "Blockchain network unavailable")
    )
)]
pub async fn get_distribution_status(
    State(state): State<AppState>,
    Path(raw): Path<String>,
) -> Result<Json<DistributionStatusResponse>, ApiError> {
    let tx_hash: TxHash = raw.trim().parse().map_err(|_| {
        ApiError::bad_request(format!("Invalid transaction hash: {raw}")).with_code("INVALID_TX_HASH")
    })?;

    let receipt = state
        .session
        .backend()
        .transaction_receipt(tx_hash)
        .await
        .map_err(DistributionError::from)?;

    let status = match &receipt {
        None => AttemptState::Pending,
        Some(receipt) if receipt.success => AttemptState::Confirmed,
        Some(_) => AttemptState::Failed,
    };

    Ok(Json(DistributionStatusResponse {
        tx_hash: format!("{tx_hash:#x}"),
        explorer_url: state.session.network().tx_url(&tx_hash),
        status,
        block_number: receipt.as_ref().map(|r| r.block_number),
        gas_used: receipt.as_ref().map(|r| r.gas_used),
    }))
}
