// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Recipient list parsing.
//!
//! Both formats are one `identifier,amount` pair per line. Parsing never
//! drops a non-blank line and never invents an amount; the recipient cap is
//! enforced by validation, not here.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::resolver::classify;

/// Header written by [`csv_template`].
pub const CSV_HEADER: &str = "Recipient Address,Amount";

/// One parsed line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct RecipientEntry {
    /// Address, ENS name or basename as typed
    pub identifier: String,
    /// Amount as typed; `None` when the line had no comma
    pub amount_text: Option<String>,
}

/// Input format of a recipient list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ListFormat {
    #[default]
    Text,
    Csv,
}

/// Parse pasted `identifier,amount` lines.
pub fn parse_text(raw: &str) -> Vec<RecipientEntry> {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(split_line)
        .collect()
}

/// Parse an uploaded CSV file.
///
/// Quotes and whitespace around each line are stripped first. The first row
/// is skipped as a header when it is the template header, or when its first
/// column is not a recipient and its amount column holds no digits.
pub fn parse_csv(raw: &str) -> Vec<RecipientEntry> {
    let mut entries: Vec<RecipientEntry> = raw
        .lines()
        .map(strip_quotes)
        .filter(|line| !line.is_empty())
        .map(split_line)
        .collect();

    if entries.first().is_some_and(is_header) {
        entries.remove(0);
    }
    entries
}

/// Parse according to `format`.
pub fn parse(raw: &str, format: ListFormat) -> Vec<RecipientEntry> {
    match format {
        ListFormat::Text => parse_text(raw),
        ListFormat::Csv => parse_csv(raw),
    }
}

/// Downloadable example file.
pub fn csv_template() -> String {
    format!("{CSV_HEADER}\n0x1234...5678,0.1\n0x8765...4321,0.2")
}

fn strip_quotes(line: &str) -> &str {
    line.trim_matches(|c: char| c == '"' || c == '\'' || c.is_whitespace())
}

fn split_line(line: &str) -> RecipientEntry {
    match line.split_once(',') {
        Some((identifier, amount)) => RecipientEntry {
            identifier: identifier.trim().to_string(),
            amount_text: Some(amount.trim().to_string()),
        },
        None => RecipientEntry {
            identifier: line.trim().to_string(),
            amount_text: None,
        },
    }
}

fn is_header(entry: &RecipientEntry) -> bool {
    let Some(amount) = entry.amount_text.as_deref().map(strip_quotes) else {
        return false;
    };
    let identifier = strip_quotes(&entry.identifier);

    if let Some((header_id, header_amount)) = CSV_HEADER.split_once(',') {
        if identifier.eq_ignore_ascii_case(header_id) && amount.eq_ignore_ascii_case(header_amount) {
            return true;
        }
    }

    classify(identifier).is_err() && !amount.bytes().any(|b| b.is_ascii_digit())
}
