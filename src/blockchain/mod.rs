// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Blockchain integration for the DistriButler contract.
//!
//! This module provides:
//! - The [`DistributorBackend`] and [`NameService`] seams used by the pipeline
//! - An alloy JSON-RPC implementation of both
//! - Fixed-point amount parsing and formatting

pub mod backend;
pub mod client;
pub mod distributor;
pub mod erc20;
pub mod names;
pub mod signing;
pub mod transactions;
pub mod types;

#[cfg(test)]
pub mod mock;

pub use backend::{DistributorBackend, NameService};
pub use client::{create_signer, ChainError, EvmClient};
pub use names::EvmNameService;
pub use transactions::{
    format_amount, parse_amount, AmountError, DistributeCall, DistributionEvent, TxReceipt,
};
pub use types::*;
