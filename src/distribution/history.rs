// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Distribution history rebuilt from contract events.
//!
//! Events are the source of truth. Nothing is stored locally; each call scans
//! the recent block window again.

use std::collections::HashMap;

use alloy::primitives::Address;
use chrono::{DateTime, Utc};
use futures_util::future::join_all;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::error::DistributionError;
use super::session::Session;
use crate::blockchain::{format_amount, DistributionEvent, TokenKind, TokenMetadata};

/// Default page size.
pub const DEFAULT_PER_PAGE: usize = 10;

/// Largest page size accepted.
pub const MAX_PER_PAGE: usize = 100;

/// One past distribution sent by the session account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct TransactionRecord {
    pub tx_hash: String,
    pub block_number: u64,
    pub timestamp: DateTime<Utc>,
    pub token_symbol: String,
    /// Token contract; absent for native ETH
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_address: Option<String>,
    pub recipient_count: usize,
    /// Sum of distributed amounts, formatted with token decimals
    pub total_amount: String,
    pub explorer_url: String,
}

/// A page of records plus totals.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct HistoryPage {
    pub records: Vec<TransactionRecord>,
    pub page: usize,
    pub per_page: usize,
    pub total: usize,
    pub total_pages: usize,
}

/// Rebuild the session account's distributions, newest first.
pub async fn fetch_history(session: &Session) -> Result<Vec<TransactionRecord>, DistributionError> {
    let backend = session.backend();
    let account = session.account();
    let network = session.network();

    let events = backend
        .distribution_events(session.history_lookback())
        .await?;

    let senders = join_all(events.iter().map(|event| backend.transaction_sender(event.tx_hash))).await;
    let mine: Vec<&DistributionEvent> = events
        .iter()
        .zip(senders)
        .filter_map(|(event, sender)| match sender {
            Ok(Some(from)) if from == account => Some(event),
            Ok(_) => None,
            Err(e) => {
                tracing::warn!(tx_hash = %event.tx_hash, error = %e, "Could not load transaction sender");
                None
            }
        })
        .collect();

    // Failed metadata reads are cached as `None` so each token is tried once.
    let mut metadata: HashMap<Address, Option<TokenMetadata>> = HashMap::new();
    let mut records = Vec::with_capacity(mine.len());
    for event in mine {
        let token_metadata = match event.token {
            TokenKind::Native => Some(TokenMetadata::native()),
            TokenKind::Erc20(address) => match metadata.get(&address) {
                Some(cached) => cached.clone(),
                None => {
                    let fetched = match backend.token_metadata(address).await {
                        Ok(fetched) => Some(fetched),
                        Err(e) => {
                            tracing::warn!(
                                token = %address,
                                error = %e,
                                "Could not load token metadata"
                            );
                            None
                        }
                    };
                    metadata.insert(address, fetched.clone());
                    fetched
                }
            },
        };
        let Some(token_metadata) = token_metadata else {
            tracing::warn!(tx_hash = %event.tx_hash, "Skipping distribution with unknown token");
            continue;
        };

        let timestamp = match backend.block_timestamp(event.block_number).await {
            Ok(timestamp) => timestamp,
            Err(e) => {
                tracing::warn!(
                    tx_hash = %event.tx_hash,
                    block = event.block_number,
                    error = %e,
                    "Could not load block timestamp"
                );
                continue;
            }
        };
        records.push(TransactionRecord {
            tx_hash: format!("{:#x}", event.tx_hash),
            block_number: event.block_number,
            timestamp: DateTime::from_timestamp(timestamp as i64, 0).unwrap_or_default(),
            token_symbol: token_metadata.symbol,
            token_address: match event.token {
                TokenKind::Native => None,
                TokenKind::Erc20(address) => Some(address.to_string()),
            },
            recipient_count: event.recipient_count,
            total_amount: format_amount(event.total_amount, token_metadata.decimals),
            explorer_url: network.tx_url(&event.tx_hash),
        });
    }

    records.sort_by(|a, b| b.block_number.cmp(&a.block_number));
    tracing::debug!(records = records.len(), "Rebuilt distribution history");
    Ok(records)
}

/// Slice `records` into 1-based pages.
pub fn paginate(records: Vec<TransactionRecord>, page: usize, per_page: usize) -> HistoryPage {
    let per_page = per_page.clamp(1, MAX_PER_PAGE);
    let page = page.max(1);
    let total = records.len();
    let total_pages = total.div_ceil(per_page);

    let records = records
        .into_iter()
        .skip((page - 1).saturating_mul(per_page))
        .take(per_page)
        .collect();

    HistoryPage {
        records,
        page,
        per_page,
        total,
        total_pages,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use alloy::primitives::{TxHash, U256};

    use super::*;
    use crate::blockchain::mock::{MockBackend, MockNames, ACCOUNT, TOKEN};
    use crate::blockchain::Network;

    fn event(tag: u8, block_number: u64, token: TokenKind, total: u64) -> DistributionEvent {
        DistributionEvent {
            tx_hash: TxHash::repeat_byte(tag),
            block_number,
            token,
            recipient_count: 3,
            total_amount: U256::from(total),
        }
    }

    #[tokio::test]
    async fn test_keeps_own_events_newest_first() {
        let mut backend = MockBackend::new(Network::Base);
        backend.events = vec![
            event(1, 10, TokenKind::Native, 1_500_000_000_000_000_000),
            event(2, 30, TokenKind::Erc20(TOKEN), 2_000_000),
            event(3, 20, TokenKind::Native, 1),
        ];
        backend.senders.insert(TxHash::repeat_byte(1), ACCOUNT);
        backend.senders.insert(TxHash::repeat_byte(2), ACCOUNT);
        backend.senders.insert(TxHash::repeat_byte(3), Address::repeat_byte(0x99));

        let session = Session::new(Arc::new(backend), Arc::new(MockNames::default()));
        let records = fetch_history(&session).await.unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].block_number, 30);
        assert_eq!(records[0].token_symbol, "USDC");
        assert_eq!(records[0].total_amount, "2");
        assert!(records[0].explorer_url.starts_with("https://basescan.org/tx/0x0202"));
        assert_eq!(records[1].token_symbol, "ETH");
        assert_eq!(records[1].total_amount, "1.5");
        assert_eq!(records[1].timestamp.timestamp(), 1_700_000_020);
    }

    #[tokio::test]
    async fn test_unreadable_events_are_skipped() {
        let other_token = Address::repeat_byte(0x71);
        let mut backend = MockBackend::new(Network::Optimism);
        backend.events = vec![
            event(1, 10, TokenKind::Native, 1),
            event(2, 20, TokenKind::Erc20(other_token), 1),
            event(3, 30, TokenKind::Erc20(other_token), 1),
            event(4, 40, TokenKind::Native, 1),
        ];
        for tag in 1..=4 {
            backend.senders.insert(TxHash::repeat_byte(tag), ACCOUNT);
        }
        backend.broken_metadata = vec![other_token];
        backend.broken_blocks = vec![40];

        let backend = Arc::new(backend);
        let session = Session::new(backend.clone(), Arc::new(MockNames::default()));
        let records = fetch_history(&session).await.unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].block_number, 10);
        assert_eq!(backend.count("token_metadata"), 1);
    }

    fn records(count: usize) -> Vec<TransactionRecord> {
        (0..count)
            .map(|i| TransactionRecord {
                tx_hash: format!("0x{i:064x}"),
                block_number: i as u64,
                timestamp: DateTime::from_timestamp(0, 0).unwrap(),
                token_symbol: "ETH".into(),
                token_address: None,
                recipient_count: 1,
                total_amount: "1".into(),
                explorer_url: String::new(),
            })
            .collect()
    }

    #[test]
    fn test_paginate() {
        let page = paginate(records(25), 3, 10);
        assert_eq!(page.records.len(), 5);
        assert_eq!(page.total, 25);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.records[0].block_number, 20);

        let past_end = paginate(records(25), 9, 10);
        assert!(past_end.records.is_empty());

        let clamped = paginate(records(3), 0, 0);
        assert_eq!(clamped.page, 1);
        assert_eq!(clamped.per_page, 1);
        assert_eq!(clamped.records.len(), 1);
    }
}
