// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Recipient resolution and transaction assembly.
//!
//! Leaf modules first: [`recipients`] parses lists, [`resolver`] turns names
//! into addresses, [`validator`] builds a [`DistributionRequest`], [`gas`]
//! prices it and [`orchestrator`] sequences an estimate or a send against a
//! [`Session`].

pub mod error;
pub mod gas;
pub mod history;
pub mod orchestrator;
pub mod recipients;
pub mod resolver;
pub mod session;
pub mod validator;

pub use error::{DistributionError, InvalidAmount, ValidationFailure};
pub use gas::{advise, GasAdvice, GasEstimate, GasLevel, GasSource};
pub use history::{fetch_history, paginate, HistoryPage, TransactionRecord};
pub use orchestrator::{
    estimate, spawn_submit, submit, AttemptEvent, AttemptFailure, AttemptHandle, AttemptState,
    DistributionInput, EstimateReport, SubmitReport, DISTRIBUTE_GAS_LIMIT,
};
pub use recipients::{csv_template, parse_csv, parse_text, ListFormat, RecipientEntry};
pub use resolver::{resolve, resolve_all, ResolveError, ResolvedRecipient};
pub use session::Session;
pub use validator::{DistributionRequest, MAX_RECIPIENTS};
