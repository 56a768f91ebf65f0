// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! End-to-end sequencing of an estimate or a send.
//!
//! A submit attempt walks
//!
//! ```text
//! Idle -> Validating -> Resolving -> FeeCheck
//!      -> [ApprovalNeeded -> Approving -> Approved]
//!      -> Submitting -> Pending -> Confirmed | Failed
//! ```
//!
//! Every step is terminal on failure and nothing is retried. Each attempt
//! sends at most one approval and exactly one distribute transaction.

use std::sync::Arc;

use alloy::primitives::TxHash;
use serde::Serialize;
use tokio::{sync::mpsc::UnboundedSender, task::JoinHandle};
use utoipa::ToSchema;

use super::error::DistributionError;
use super::gas::{self, GasEstimate};
use super::recipients::RecipientEntry;
use super::resolver::{partial_resolution_warning, resolve_all, ResolvedRecipient};
use super::session::Session;
use super::validator::{precheck, sender_balance, validate, DistributionRequest};
use crate::blockchain::{TokenBalance, TokenKind, TokenMetadata};

/// Gas ceiling for the distribute call.
pub const DISTRIBUTE_GAS_LIMIT: u64 = 3_000_000;

/// Steps of a single attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum AttemptState {
    Idle,
    Validating,
    Resolving,
    FeeCheck,
    ApprovalNeeded,
    Approving,
    Approved,
    Submitting,
    Pending,
    Confirmed,
    Failed,
}

/// Progress notifications emitted while an attempt runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptEvent {
    Transition(AttemptState),
    /// Validation passed; nothing has been sent yet.
    Prepared {
        request: Box<DistributionRequest>,
        warning: Option<String>,
    },
    ApprovalSent(TxHash),
    DistributionSent(TxHash),
}

/// Recipients and amounts as submitted, before resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DistributionInput {
    pub token: TokenKind,
    pub identifiers: Vec<String>,
    pub amounts: Vec<Option<String>>,
}

impl DistributionInput {
    pub fn from_entries(token: TokenKind, entries: Vec<RecipientEntry>) -> Self {
        let (identifiers, amounts) = entries
            .into_iter()
            .map(|entry| (entry.identifier, entry.amount_text))
            .unzip();
        Self {
            token,
            identifiers,
            amounts,
        }
    }
}

/// Result of a dry run.
#[derive(Debug, Clone)]
pub struct EstimateReport {
    pub request: DistributionRequest,
    pub gas: GasEstimate,
    pub resolved: Vec<ResolvedRecipient>,
    pub warning: Option<String>,
}

/// Result of a confirmed distribution.
#[derive(Debug, Clone)]
pub struct SubmitReport {
    pub request: DistributionRequest,
    pub tx_hash: TxHash,
    pub block_number: u64,
    pub gas_used: u64,
    pub approval_tx_hash: Option<TxHash>,
    pub warning: Option<String>,
    pub trail: Vec<AttemptState>,
    /// Balance read after confirmation; `None` if the refresh failed
    pub balance_after: Option<TokenBalance>,
}

/// A failed attempt together with how far it got.
#[derive(Debug, thiserror::Error)]
#[error("{error}")]
pub struct AttemptFailure {
    #[source]
    pub error: DistributionError,
    pub trail: Vec<AttemptState>,
    /// Distribute transaction hash, if one was broadcast
    pub tx_hash: Option<TxHash>,
    pub approval_tx_hash: Option<TxHash>,
    pub warning: Option<String>,
}

impl AttemptFailure {
    /// Failure before any state was entered.
    fn not_started(error: DistributionError) -> Self {
        Self {
            error,
            trail: Vec::new(),
            tx_hash: None,
            approval_tx_hash: None,
            warning: None,
        }
    }
}

struct Trail {
    states: Vec<AttemptState>,
    events: Option<UnboundedSender<AttemptEvent>>,
    tx_hash: Option<TxHash>,
    approval_tx_hash: Option<TxHash>,
    warning: Option<String>,
}

impl Trail {
    fn new(events: Option<UnboundedSender<AttemptEvent>>) -> Self {
        Self {
            states: vec![AttemptState::Idle],
            events,
            tx_hash: None,
            approval_tx_hash: None,
            warning: None,
        }
    }

    fn current(&self) -> AttemptState {
        self.states.last().copied().unwrap_or(AttemptState::Idle)
    }

    fn advance(&mut self, next: AttemptState) {
        tracing::info!(from = ?self.current(), to = ?next, "Distribution attempt transition");
        self.states.push(next);
        self.emit(AttemptEvent::Transition(next));
    }

    fn emit(&self, event: AttemptEvent) {
        if let Some(events) = &self.events {
            // A dropped receiver only means nobody is watching.
            let _ = events.send(event);
        }
    }

    fn fail(mut self, error: DistributionError) -> AttemptFailure {
        tracing::warn!(
            at = ?self.current(),
            code = error.code(),
            error = %error,
            "Distribution attempt failed"
        );
        self.advance(AttemptState::Failed);
        AttemptFailure {
            error,
            trail: self.states,
            tx_hash: self.tx_hash,
            approval_tx_hash: self.approval_tx_hash,
            warning: self.warning,
        }
    }
}

/// Validate, resolve and fee-check `input`, returning the request and warning.
async fn prepare(
    session: &Session,
    input: &DistributionInput,
    trail: &mut Trail,
) -> Result<(DistributionRequest, Vec<ResolvedRecipient>), DistributionError> {
    trail.advance(AttemptState::Validating);
    precheck(input.identifiers.len(), input.amounts.len())?;

    trail.advance(AttemptState::Resolving);
    let resolved = resolve_all(&input.identifiers, session.names()).await?;
    let resolved_count = resolved
        .iter()
        .filter(|r| r.canonical_address.is_some())
        .count();
    trail.warning = partial_resolution_warning(resolved_count, resolved.len());
    if let Some(warning) = &trail.warning {
        tracing::warn!(resolved = resolved_count, total = resolved.len(), "{warning}");
    }

    trail.advance(AttemptState::FeeCheck);
    let request = validate(session.backend(), input.token, &resolved, &input.amounts).await?;
    Ok((request, resolved))
}

/// Run the pipeline through gas estimation without sending anything.
pub async fn estimate(
    session: &Session,
    input: &DistributionInput,
) -> Result<EstimateReport, DistributionError> {
    let mut trail = Trail::new(None);
    let (request, resolved) = prepare(session, input, &mut trail).await?;
    let gas = gas::estimate(session.backend(), &request).await?;

    tracing::info!(
        network = %request.network(),
        recipients = request.recipient_count(),
        gas_units = %gas.gas_units,
        source = ?gas.source,
        "Distribution estimated"
    );

    Ok(EstimateReport {
        request,
        gas,
        resolved,
        warning: trail.warning,
    })
}

/// Handle to an attempt running in its own task.
pub type AttemptHandle = JoinHandle<Result<SubmitReport, AttemptFailure>>;

/// Claim the session and start a send attempt in a background task.
///
/// Fails immediately with [`DistributionError::AttemptInProgress`] when
/// another attempt holds the session. The task owns the session guard, so
/// dropping the handle (or the request that holds it) does not end the
/// attempt or free the session while a transaction may be in flight.
/// Progress, including the transaction hash as soon as it is known, is
/// pushed to `events` when given.
pub fn spawn_submit(
    session: Arc<Session>,
    input: DistributionInput,
    events: Option<UnboundedSender<AttemptEvent>>,
) -> Result<AttemptHandle, AttemptFailure> {
    let guard = session.begin_attempt().map_err(AttemptFailure::not_started)?;

    Ok(tokio::spawn(async move {
        let _guard = guard;
        run_attempt(&session, &input, events).await
    }))
}

/// Run a full send attempt and wait for its outcome.
pub async fn submit(
    session: &Arc<Session>,
    input: &DistributionInput,
    events: Option<UnboundedSender<AttemptEvent>>,
) -> Result<SubmitReport, AttemptFailure> {
    let handle = spawn_submit(Arc::clone(session), input.clone(), events)?;
    handle.await.map_err(|e| {
        AttemptFailure::not_started(DistributionError::SubmissionFailure(format!(
            "attempt task ended unexpectedly: {e}"
        )))
    })?
}

async fn run_attempt(
    session: &Session,
    input: &DistributionInput,
    events: Option<UnboundedSender<AttemptEvent>>,
) -> Result<SubmitReport, AttemptFailure> {
    let mut trail = Trail::new(events);
    let request = match prepare(session, input, &mut trail).await {
        Ok((request, _)) => request,
        Err(error) => return Err(trail.fail(error)),
    };
    trail.emit(AttemptEvent::Prepared {
        request: Box::new(request.clone()),
        warning: trail.warning.clone(),
    });

    let backend = session.backend();

    if let TokenKind::Erc20(token) = request.token() {
        let allowance = match backend
            .allowance(token, backend.account(), backend.distributor())
            .await
        {
            Ok(allowance) => allowance,
            Err(e) => return Err(trail.fail(e.into())),
        };

        if allowance < request.total_with_fee() {
            trail.advance(AttemptState::ApprovalNeeded);
            let approval = match backend
                .approve(token, backend.distributor(), request.total_with_fee())
                .await
            {
                Ok(hash) => hash,
                Err(e) => {
                    return Err(trail.fail(DistributionError::ApprovalRejectedOrFailed(e.to_string())))
                }
            };
            trail.approval_tx_hash = Some(approval);
            trail.emit(AttemptEvent::ApprovalSent(approval));

            trail.advance(AttemptState::Approving);
            match backend.wait_for_confirmation(approval).await {
                Ok(receipt) if receipt.success => {}
                Ok(_) => {
                    return Err(trail.fail(DistributionError::ApprovalRejectedOrFailed(format!(
                        "approval {approval} reverted"
                    ))))
                }
                Err(e) => {
                    return Err(trail.fail(DistributionError::ApprovalRejectedOrFailed(e.to_string())))
                }
            }
            trail.advance(AttemptState::Approved);
        }
    }

    trail.advance(AttemptState::Submitting);
    let tx_hash = match backend
        .send_distribute(&request.distribute_call(), DISTRIBUTE_GAS_LIMIT)
        .await
    {
        Ok(hash) => hash,
        Err(e) => return Err(trail.fail(DistributionError::SubmissionFailure(e.to_string()))),
    };
    trail.tx_hash = Some(tx_hash);
    trail.emit(AttemptEvent::DistributionSent(tx_hash));
    tracing::info!(%tx_hash, network = %request.network(), "Distribution submitted");

    trail.advance(AttemptState::Pending);
    let receipt = match backend.wait_for_confirmation(tx_hash).await {
        Ok(receipt) if receipt.success => receipt,
        Ok(_) => {
            return Err(trail.fail(DistributionError::ConfirmationFailure {
                tx_hash,
                reason: "transaction reverted".to_string(),
            }))
        }
        Err(e) => {
            return Err(trail.fail(DistributionError::ConfirmationFailure {
                tx_hash,
                reason: e.to_string(),
            }))
        }
    };
    trail.advance(AttemptState::Confirmed);

    let balance_after = refreshed_balance(session, &request).await;

    tracing::info!(
        %tx_hash,
        block = receipt.block_number,
        gas_used = receipt.gas_used,
        recipients = request.recipient_count(),
        "Distribution confirmed"
    );

    Ok(SubmitReport {
        request,
        tx_hash,
        block_number: receipt.block_number,
        gas_used: receipt.gas_used,
        approval_tx_hash: trail.approval_tx_hash,
        warning: trail.warning,
        trail: trail.states,
        balance_after,
    })
}

async fn refreshed_balance(session: &Session, request: &DistributionRequest) -> Option<TokenBalance> {
    match sender_balance(session.backend(), request.token()).await {
        Ok(balance) => {
            let metadata = TokenMetadata {
                symbol: request.symbol().to_string(),
                decimals: request.decimals(),
            };
            Some(TokenBalance::new(request.token(), &metadata, balance))
        }
        Err(e) => {
            tracing::warn!(error = %e, "Balance refresh after confirmation failed");
            None
        }
    }
}
