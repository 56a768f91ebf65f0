// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Recipient list parsing and the CSV template download.

use axum::{
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::distribution::{csv_template, recipients, ListFormat, RecipientEntry, MAX_RECIPIENTS};

/// Template file name offered to browsers.
const TEMPLATE_FILE_NAME: &str = "recipients_template.csv";

#[derive(Debug, Deserialize, ToSchema)]
pub struct ParseRecipientsRequest {
    /// Raw list, one `address_or_name,amount` per line
    pub text: String,
    /// `text` (default) or `csv`
    #[serde(default)]
    pub format: ListFormat,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ParseRecipientsResponse {
    pub entries: Vec<RecipientEntry>,
    pub count: usize,
    /// Whether the list is longer than a single distribution allows
    pub exceeds_limit: bool,
    pub max_recipients: usize,
}

/// Split a pasted list or CSV upload into entries.
///
/// No validation happens here; lines without an amount are returned with
/// `amount_text: null`.
#[utoipa::path(
    post,
    path = "/v1/recipients/parse",
    tag = "Recipients",
    request_body = ParseRecipientsRequest,
    responses(
        (status = 200, description = "Parsed entries", body = ParseRecipientsResponse),
        (status = 400, description = "Malformed request body")
    )
)]
pub async fn parse_recipients(
    Json(request): Json<ParseRecipientsRequest>,
) -> Json<ParseRecipientsResponse> {
    let entries = recipients::parse(&request.text, request.format);
    let count = entries.len();
    Json(ParseRecipientsResponse {
        entries,
        count,
        exceeds_limit: count > MAX_RECIPIENTS,
        max_recipients: MAX_RECIPIENTS,
    })
}

/// Download an example CSV file.
#[utoipa::path(
    get,
    path = "/v1/recipients/template",
    tag = "Recipients",
    responses(
        (status = 200, description = "CSV template", content_type = "text/csv", body = String)
    )
)]
pub async fn recipients_template() -> Response {
    (
        [
            (header::CONTENT_TYPE, "text/csv".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{TEMPLATE_FILE_NAME}\""),
            ),
        ],
        csv_template(),
    )
        .into_response()
}
