// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    blockchain::{Network, TokenBalance},
    distribution::{
        AttemptState, GasLevel, GasSource, HistoryPage, InvalidAmount, ListFormat,
        RecipientEntry, ResolvedRecipient, TransactionRecord,
    },
    error::ErrorBody,
    state::AppState,
};

pub mod balance;
pub mod distributions;
pub mod gas;
pub mod health;
pub mod history;
pub mod recipients;
pub mod session;

pub fn router(state: AppState) -> Router {
    let v1_routes = Router::new()
        .route("/session", get(session::get_session))
        .route("/balance", get(balance::get_balance))
        .route("/gas-price", get(gas::get_gas_price))
        .route("/recipients/parse", post(recipients::parse_recipients))
        .route("/recipients/template", get(recipients::recipients_template))
        .route(
            "/distributions/estimate",
            post(distributions::estimate_distribution),
        )
        .route("/distributions", post(distributions::submit_distribution))
        .route(
            "/distributions/{tx_hash}",
            get(distributions::get_distribution_status),
        )
        .route("/history", get(history::get_history))
        .with_state(state.clone());

    let health_routes = Router::new()
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .with_state(state);

    Router::new()
        .merge(health_routes)
        .nest("/v1", v1_routes)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(CorsLayer::permissive())
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        health::liveness,
        health::readiness,
        session::get_session,
        balance::get_balance,
        gas::get_gas_price,
        recipients::parse_recipients,
        recipients::recipients_template,
        distributions::estimate_distribution,
        distributions::submit_distribution,
        distributions::get_distribution_status,
        history::get_history
    ),
    components(
        schemas(
            ErrorBody,
            Network,
            TokenBalance,
            ListFormat,
            RecipientEntry,
            ResolvedRecipient,
            InvalidAmount,
            AttemptState,
            GasLevel,
            GasSource,
            TransactionRecord,
            HistoryPage,
            health::HealthResponse,
            health::HealthChecks,
            health::ReadyResponse,
            session::SessionResponse,
            balance::BalanceResponse,
            gas::GasPriceResponse,
            recipients::ParseRecipientsRequest,
            recipients::ParseRecipientsResponse,
            distributions::DistributionBody,
            distributions::RequestSummary,
            distributions::GasEstimateResponse,
            distributions::EstimateResponse,
            distributions::SubmitResponse,
            distributions::DistributionStatusResponse
        )
    ),
    tags(
        (name = "Health", description = "Liveness and readiness probes"),
        (name = "Session", description = "Connected account, network and balance"),
        (name = "Recipients", description = "Recipient list parsing"),
        (name = "Distributions", description = "Estimating, sending and listing distributions")
    )
)]
struct ApiDoc;
