// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Fee and balance validation.
//!
//! [`validate`] is the only way to obtain a [`DistributionRequest`]. Checks
//! run in a fixed order and stop at the first failure:
//!
//! 1. recipients and amounts are non-empty
//! 2. their counts match
//! 3. at most [`MAX_RECIPIENTS`] entries
//! 4. every kept recipient is a usable address
//! 5. every amount is a positive decimal within token precision
//! 6. the amounts sum without overflow
//! 7. the contract fee is added
//! 8. the sender can cover amount plus fee
//!
//! Steps 1-3 are [`precheck`] and never touch the network.

use alloy::primitives::{Address, U256};

use super::error::{DistributionError, InvalidAmount, ValidationFailure};
use super::resolver::ResolvedRecipient;
use crate::blockchain::{
    format_amount, parse_amount, DistributeCall, DistributorBackend, Network, TokenKind,
    TokenMetadata,
};

/// Hard cap on recipients per distribution. Larger lists are rejected, not split.
pub const MAX_RECIPIENTS: usize = 200;

/// A fully validated distribution, shared by estimation and submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DistributionRequest {
    network: Network,
    token: TokenKind,
    recipients: Vec<(Address, U256)>,
    total_amount: U256,
    fee_amount: U256,
    total_with_fee: U256,
    decimals: u8,
    symbol: String,
}

impl DistributionRequest {
    pub fn network(&self) -> Network {
        self.network
    }

    pub fn token(&self) -> TokenKind {
        self.token
    }

    pub fn recipients(&self) -> &[(Address, U256)] {
        &self.recipients
    }

    pub fn recipient_count(&self) -> usize {
        self.recipients.len()
    }

    pub fn total_amount(&self) -> U256 {
        self.total_amount
    }

    pub fn fee_amount(&self) -> U256 {
        self.fee_amount
    }

    pub fn total_with_fee(&self) -> U256 {
        self.total_with_fee
    }

    pub fn decimals(&self) -> u8 {
        self.decimals
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Human-readable amount in this request's token units.
    pub fn format(&self, amount: U256) -> String {
        format_amount(amount, self.decimals)
    }

    /// Contract call arguments for this request.
    pub fn distribute_call(&self) -> DistributeCall {
        let (recipients, amounts) = self.recipients.iter().copied().unzip();
        DistributeCall {
            token: self.token,
            recipients,
            amounts,
            network: self.network,
            value: match self.token {
                TokenKind::Native => self.total_with_fee,
                TokenKind::Erc20(_) => U256::ZERO,
            },
        }
    }
}

/// Checks that need no chain access.
pub fn precheck(recipient_count: usize, amount_count: usize) -> Result<(), ValidationFailure> {
    if recipient_count == 0 || amount_count == 0 {
        return Err(ValidationFailure::EmptyInput);
    }
    if recipient_count != amount_count {
        return Err(ValidationFailure::CountMismatch {
            recipients: recipient_count,
            amounts: amount_count,
        });
    }
    if recipient_count > MAX_RECIPIENTS {
        return Err(ValidationFailure::TooManyRecipients {
            count: recipient_count,
            max: MAX_RECIPIENTS,
        });
    }
    Ok(())
}

/// Metadata used to parse amounts of `token`.
pub async fn token_metadata(
    backend: &dyn DistributorBackend,
    token: TokenKind,
) -> Result<TokenMetadata, DistributionError> {
    match token {
        TokenKind::Native => Ok(TokenMetadata::native()),
        TokenKind::Erc20(address) => Ok(backend.token_metadata(address).await?),
    }
}

/// Balance of the session account in `token`.
pub async fn sender_balance(
    backend: &dyn DistributorBackend,
    token: TokenKind,
) -> Result<U256, DistributionError> {
    let account = backend.account();
    let balance = match token {
        TokenKind::Native => backend.native_balance(account).await?,
        TokenKind::Erc20(address) => backend.token_balance(address, account).await?,
    };
    Ok(balance)
}

/// Build a [`DistributionRequest`] from resolved recipients and raw amounts.
///
/// `recipients` and `amounts` are parallel. Entries whose name did not
/// resolve are dropped together with their amount.
pub async fn validate(
    backend: &dyn DistributorBackend,
    token: TokenKind,
    recipients: &[ResolvedRecipient],
    amounts: &[Option<String>],
) -> Result<DistributionRequest, DistributionError> {
    precheck(recipients.len(), amounts.len())?;

    let kept: Vec<(usize, &str, Address, Option<&str>)> = recipients
        .iter()
        .zip(amounts)
        .enumerate()
        .filter_map(|(i, (recipient, amount))| {
            recipient
                .canonical_address
                .map(|address| (i + 1, recipient.identifier.as_str(), address, amount.as_deref()))
        })
        .collect();
    if kept.is_empty() {
        return Err(ValidationFailure::NoValidRecipients.into());
    }

    let invalid_addresses: Vec<String> = kept
        .iter()
        .filter(|(_, _, address, _)| address.is_zero())
        .map(|(_, identifier, _, _)| identifier.to_string())
        .collect();
    if !invalid_addresses.is_empty() {
        return Err(ValidationFailure::InvalidAddresses(invalid_addresses).into());
    }

    let network = backend.network();
    let metadata = token_metadata(backend, token).await?;

    let mut parsed = Vec::with_capacity(kept.len());
    let mut invalid_amounts = Vec::new();
    for (line, identifier, address, amount) in &kept {
        let result = match amount {
            Some(text) => parse_amount(text, metadata.decimals).map_err(|e| e.to_string()),
            None => Err("missing amount".to_string()),
        };
        match result {
            Ok(value) => parsed.push((*address, value)),
            Err(reason) => invalid_amounts.push(InvalidAmount {
                line: *line,
                identifier: identifier.to_string(),
                amount: amount.map(str::to_string),
                reason,
            }),
        }
    }
    if !invalid_amounts.is_empty() {
        return Err(ValidationFailure::InvalidAmounts(invalid_amounts).into());
    }

    let mut total_amount = U256::ZERO;
    for (index, (_, value)) in parsed.iter().enumerate() {
        total_amount = total_amount.checked_add(*value).ok_or_else(|| {
            let (line, identifier, _, amount) = kept[index];
            ValidationFailure::InvalidAmounts(vec![InvalidAmount {
                line,
                identifier: identifier.to_string(),
                amount: amount.map(str::to_string),
                reason: "total amount overflows 256 bits".to_string(),
            }])
        })?;
    }

    let fee_amount = backend
        .calculate_fee(total_amount, parsed.len(), network)
        .await?;
    let total_with_fee = total_amount.checked_add(fee_amount).ok_or_else(|| {
        ValidationFailure::InvalidAmounts(vec![InvalidAmount {
            line: 0,
            identifier: String::new(),
            amount: None,
            reason: "total with fee overflows 256 bits".to_string(),
        }])
    })?;

    let balance = sender_balance(backend, token).await?;
    if balance < total_with_fee {
        return Err(DistributionError::InsufficientBalance {
            symbol: metadata.symbol,
            required: format_amount(total_with_fee, metadata.decimals),
            available: format_amount(balance, metadata.decimals),
        });
    }

    tracing::debug!(
        network = %network,
        token = %token,
        recipients = parsed.len(),
        total = %total_amount,
        fee = %fee_amount,
        "Distribution request validated"
    );

    Ok(DistributionRequest {
        network,
        token,
        recipients: parsed,
        total_amount,
        fee_amount,
        total_with_fee,
        decimals: metadata.decimals,
        symbol: metadata.symbol,
    })
}
