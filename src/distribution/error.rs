// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Failure taxonomy for a distribution attempt.

use alloy::primitives::TxHash;
use serde::Serialize;
use utoipa::ToSchema;

use super::resolver::ResolveError;
use crate::blockchain::{ChainError, UnsupportedChain};

/// One amount that failed to parse, reported with its line position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct InvalidAmount {
    /// 1-based position in the submitted list
    pub line: usize,
    pub identifier: String,
    /// Raw amount text, absent when the line had no amount column
    pub amount: Option<String>,
    pub reason: String,
}

/// Input problems detected before anything is sent.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationFailure {
    #[error("Please enter at least one recipient and amount")]
    EmptyInput,

    #[error("Recipient count ({recipients}) does not match amount count ({amounts})")]
    CountMismatch { recipients: usize, amounts: usize },

    #[error("Too many recipients: {count} (maximum is {max})")]
    TooManyRecipients { count: usize, max: usize },

    #[error("Invalid recipient addresses: {}", .0.join(", "))]
    InvalidAddresses(Vec<String>),

    #[error("{} invalid amount(s)", .0.len())]
    InvalidAmounts(Vec<InvalidAmount>),

    #[error("No valid recipients after address resolution")]
    NoValidRecipients,
}

impl ValidationFailure {
    pub fn code(&self) -> &'static str {
        match self {
            ValidationFailure::EmptyInput => "EMPTY_INPUT",
            ValidationFailure::CountMismatch { .. } => "COUNT_MISMATCH",
            ValidationFailure::TooManyRecipients { .. } => "TOO_MANY_RECIPIENTS",
            ValidationFailure::InvalidAddresses(_) => "INVALID_ADDRESSES",
            ValidationFailure::InvalidAmounts(_) => "INVALID_AMOUNTS",
            ValidationFailure::NoValidRecipients => "NO_VALID_RECIPIENTS",
        }
    }
}

/// Terminal failure of an estimate or submit attempt.
#[derive(Debug, thiserror::Error)]
pub enum DistributionError {
    #[error("Invalid recipient identifier: {0}")]
    InvalidIdentifier(String),

    #[error(transparent)]
    Validation(#[from] ValidationFailure),

    #[error("Insufficient balance: need {required} {symbol}, have {available} {symbol}")]
    InsufficientBalance {
        symbol: String,
        required: String,
        available: String,
    },

    #[error(transparent)]
    UnsupportedChain(#[from] UnsupportedChain),

    #[error("Token approval rejected or failed: {0}")]
    ApprovalRejectedOrFailed(String),

    #[error("Gas estimation failed: {0}")]
    EstimationFailure(String),

    #[error("Transaction submission failed: {0}")]
    SubmissionFailure(String),

    #[error("Transaction {tx_hash} failed: {reason}")]
    ConfirmationFailure { tx_hash: TxHash, reason: String },

    #[error("A distribution is already in progress for this session")]
    AttemptInProgress,

    #[error(transparent)]
    Chain(#[from] ChainError),
}

impl From<ResolveError> for DistributionError {
    fn from(err: ResolveError) -> Self {
        match err {
            ResolveError::InvalidIdentifier(identifier) => {
                DistributionError::InvalidIdentifier(identifier)
            }
        }
    }
}

const INSUFFICIENT_FUNDS_MESSAGE: &str =
    "Insufficient funds in your wallet to complete this transaction.";
const RPC_FAILURE_MESSAGE: &str = "The transaction failed. This might be due to network congestion or contract limitations. Please try again with fewer recipients or smaller amounts.";

impl DistributionError {
    /// Stable machine-readable identifier.
    pub fn code(&self) -> &'static str {
        match self {
            DistributionError::InvalidIdentifier(_) => "INVALID_IDENTIFIER",
            DistributionError::Validation(failure) => failure.code(),
            DistributionError::InsufficientBalance { .. } => "INSUFFICIENT_BALANCE",
            DistributionError::UnsupportedChain(_) => "UNSUPPORTED_CHAIN",
            DistributionError::ApprovalRejectedOrFailed(_) => "APPROVAL_FAILED",
            DistributionError::EstimationFailure(_) => "ESTIMATION_FAILED",
            DistributionError::SubmissionFailure(_) => "SUBMISSION_FAILED",
            DistributionError::ConfirmationFailure { .. } => "CONFIRMATION_FAILED",
            DistributionError::AttemptInProgress => "ATTEMPT_IN_PROGRESS",
            DistributionError::Chain(_) => "CHAIN_ERROR",
        }
    }

    /// Message suitable for showing to the person who triggered the attempt.
    ///
    /// Node errors mentioning insufficient funds or an internal JSON-RPC
    /// error are replaced with fixed explanations; everything else keeps its
    /// own text.
    pub fn user_message(&self) -> String {
        let raw = self.to_string();
        let lowered = raw.to_lowercase();
        if lowered.contains("insufficient funds") {
            INSUFFICIENT_FUNDS_MESSAGE.to_string()
        } else if lowered.contains("internal json-rpc error") {
            RPC_FAILURE_MESSAGE.to_string()
        } else {
            raw
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_stable() {
        assert_eq!(
            DistributionError::from(ValidationFailure::EmptyInput).code(),
            "EMPTY_INPUT"
        );
        assert_eq!(DistributionError::AttemptInProgress.code(), "ATTEMPT_IN_PROGRESS");
        assert_eq!(
            DistributionError::from(UnsupportedChain(137)).code(),
            "UNSUPPORTED_CHAIN"
        );
    }

    #[test]
    fn node_insufficient_funds_is_translated() {
        let err = DistributionError::SubmissionFailure(
            "server returned an error response: insufficient funds for gas * price + value".into(),
        );
        assert_eq!(err.user_message(), INSUFFICIENT_FUNDS_MESSAGE);
    }

    #[test]
    fn internal_rpc_error_is_translated() {
        let err = DistributionError::SubmissionFailure("Internal JSON-RPC error.".into());
        assert_eq!(err.user_message(), RPC_FAILURE_MESSAGE);
    }

    #[test]
    fn other_errors_keep_their_text() {
        let err = DistributionError::from(ValidationFailure::TooManyRecipients { count: 201, max: 200 });
        assert_eq!(err.user_message(), "Too many recipients: 201 (maximum is 200)");
    }

    #[test]
    fn insufficient_balance_reports_both_figures() {
        let err = DistributionError::InsufficientBalance {
            symbol: "ETH".into(),
            required: "1.01".into(),
            available: "0.5".into(),
        };
        let message = err.to_string();
        assert!(message.contains("1.01 ETH"));
        assert!(message.contains("0.5 ETH"));
    }
}
