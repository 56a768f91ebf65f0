// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! DistriButler - batch ETH and ERC-20 distribution service
//!
//! Sends one contract call that pays many recipients on Optimism, Base or
//! Arbitrum. Recipients may be addresses, ENS names or basenames.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `blockchain` - Network table, contract bindings and name resolution
//! - `config` - Environment configuration
//! - `distribution` - Parsing, validation, gas estimation and sending

pub mod api;
pub mod blockchain;
pub mod config;
pub mod distribution;
pub mod error;
pub mod state;
