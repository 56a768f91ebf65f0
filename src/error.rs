// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::Value;
use utoipa::ToSchema;

use crate::distribution::{DistributionError, ValidationFailure};

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
    pub error_code: Option<&'static str>,
    pub details: Option<Value>,
}

/// JSON error body.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    details: Option<Value>,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            error_code: None,
            details: None,
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn with_code(mut self, code: &'static str) -> Self {
        self.error_code = Some(code);
        self
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }
}

impl From<DistributionError> for ApiError {
    fn from(err: DistributionError) -> Self {
        let status = match &err {
            DistributionError::InvalidIdentifier(_)
            | DistributionError::Validation(_)
            | DistributionError::UnsupportedChain(_) => StatusCode::BAD_REQUEST,
            DistributionError::InsufficientBalance { .. }
            | DistributionError::ApprovalRejectedOrFailed(_)
            | DistributionError::ConfirmationFailure { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            DistributionError::AttemptInProgress => StatusCode::CONFLICT,
            DistributionError::EstimationFailure(_)
            | DistributionError::SubmissionFailure(_)
            | DistributionError::Chain(_) => StatusCode::SERVICE_UNAVAILABLE,
        };

        let details = match &err {
            DistributionError::Validation(ValidationFailure::InvalidAmounts(invalid)) => {
                serde_json::to_value(invalid).ok()
            }
            DistributionError::Validation(ValidationFailure::InvalidAddresses(identifiers)) => {
                serde_json::to_value(identifiers).ok()
            }
            DistributionError::ConfirmationFailure { tx_hash, .. } => {
                Some(serde_json::json!({ "tx_hash": format!("{tx_hash:#x}") }))
            }
            _ => None,
        };

        if status == StatusCode::SERVICE_UNAVAILABLE {
            tracing::error!(code = err.code(), error = %err, "Chain request failed");
        }

        Self {
            status,
            message: err.user_message(),
            error_code: Some(err.code()),
            details,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorBody {
            error: self.message,
            error_code: self.error_code.map(str::to_string),
            details: self.details,
        });
        (self.status, body).into_response()
    }
}
