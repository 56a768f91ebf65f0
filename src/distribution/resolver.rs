// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Recipient identifier resolution.

use std::str::FromStr;

use alloy::primitives::Address;
use futures_util::future::join_all;
use serde::Serialize;
use utoipa::ToSchema;

use crate::blockchain::NameService;

/// Suffix routed to the Basename registry.
pub const BASENAME_SUFFIX: &str = ".base";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    /// Neither an address nor something shaped like a name.
    #[error("Invalid recipient identifier: {0}")]
    InvalidIdentifier(String),
}

/// How an identifier will be resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentifierKind {
    Address(Address),
    Basename,
    Ens,
}

/// Outcome of resolving one recipient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct ResolvedRecipient {
    pub identifier: String,
    /// `None` when the name did not resolve
    #[schema(value_type = Option<String>)]
    pub canonical_address: Option<Address>,
}

/// Classify an identifier without touching the network.
pub fn classify(identifier: &str) -> Result<IdentifierKind, ResolveError> {
    let identifier = identifier.trim();
    if is_hex_address(identifier) {
        if let Ok(address) = Address::from_str(identifier) {
            return Ok(IdentifierKind::Address(address));
        }
    }
    if identifier.to_lowercase().ends_with(BASENAME_SUFFIX) {
        return Ok(IdentifierKind::Basename);
    }
    if identifier.contains('.') && !identifier.starts_with('.') && !identifier.ends_with('.') {
        return Ok(IdentifierKind::Ens);
    }
    Err(ResolveError::InvalidIdentifier(identifier.to_string()))
}

fn is_hex_address(s: &str) -> bool {
    s.len() == 42
        && (s.starts_with("0x") || s.starts_with("0X"))
        && s[2..].bytes().all(|b| b.is_ascii_hexdigit())
}

/// Resolve one identifier.
///
/// Literal addresses are returned as-is with no lookup. Names that do not
/// resolve, resolve to the zero address, or whose lookup fails all come back
/// as `Ok(None)`.
pub async fn resolve(
    identifier: &str,
    names: &dyn NameService,
) -> Result<Option<Address>, ResolveError> {
    let lookup = match classify(identifier)? {
        IdentifierKind::Address(address) => return Ok(Some(address)),
        IdentifierKind::Basename => names.resolve_basename(identifier.trim()).await,
        IdentifierKind::Ens => names.resolve_ens(identifier.trim()).await,
    };

    match lookup {
        Ok(Some(address)) if !address.is_zero() => Ok(Some(address)),
        Ok(_) => {
            tracing::warn!(identifier, "Name did not resolve to an address");
            Ok(None)
        }
        Err(e) => {
            tracing::warn!(identifier, error = %e, "Name lookup failed");
            Ok(None)
        }
    }
}

/// Resolve every identifier concurrently, keeping input order.
///
/// All identifiers are classified first, so a malformed one fails the whole
/// batch before any lookup is issued.
pub async fn resolve_all(
    identifiers: &[String],
    names: &dyn NameService,
) -> Result<Vec<ResolvedRecipient>, ResolveError> {
    for identifier in identifiers {
        classify(identifier)?;
    }

    let lookups = identifiers.iter().map(|identifier| async move {
        let canonical_address = resolve(identifier, names).await.ok().flatten();
        ResolvedRecipient {
            identifier: identifier.clone(),
            canonical_address,
        }
    });
    Ok(join_all(lookups).await)
}

/// Warning shown when some recipients were dropped.
pub fn partial_resolution_warning(resolved: usize, total: usize) -> Option<String> {
    (resolved < total).then(|| {
        format!(
            "Some addresses could not be resolved. Proceeding with {resolved} out of {total} recipients."
        )
    })
}
