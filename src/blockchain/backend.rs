// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Collaborator traits consumed by the distribution pipeline.
//!
//! [`DistributorBackend`] is the connected wallet plus the token and
//! distribution contracts on one network. [`NameService`] resolves ENS names
//! and Base-specific basenames. Both are object safe so a session can hold
//! them behind `Arc<dyn ...>`.

use alloy::primitives::{Address, TxHash, U256};
use async_trait::async_trait;

use super::client::ChainError;
use super::transactions::{DistributeCall, DistributionEvent, TxReceipt};
use super::types::{Network, TokenKind, TokenMetadata};

/// Wallet, token and distribution-contract access for one network.
#[async_trait]
pub trait DistributorBackend: Send + Sync {
    /// Address of the signing account.
    fn account(&self) -> Address;

    /// Network the backend is connected to.
    fn network(&self) -> Network;

    /// Address of the distribution contract on this network.
    fn distributor(&self) -> Address;

    async fn native_balance(&self, owner: Address) -> Result<U256, ChainError>;

    async fn token_metadata(&self, token: Address) -> Result<TokenMetadata, ChainError>;

    async fn token_balance(&self, token: Address, owner: Address) -> Result<U256, ChainError>;

    async fn allowance(
        &self,
        token: Address,
        owner: Address,
        spender: Address,
    ) -> Result<U256, ChainError>;

    /// Broadcast `approve(spender, amount)` and return the transaction hash.
    async fn approve(&self, token: Address, spender: Address, amount: U256)
        -> Result<TxHash, ChainError>;

    /// `calculateFee(totalAmount, recipientCount, network)` on the contract.
    async fn calculate_fee(
        &self,
        total_amount: U256,
        recipient_count: usize,
        network: Network,
    ) -> Result<U256, ChainError>;

    /// Gas units reported by the contract's own `estimateGasCost`.
    async fn estimate_gas_cost(
        &self,
        token: TokenKind,
        recipient_count: usize,
    ) -> Result<U256, ChainError>;

    /// Simulated gas usage of the exact distribute call.
    async fn estimate_distribute_gas(&self, call: &DistributeCall) -> Result<u64, ChainError>;

    /// Current gas price in wei.
    async fn gas_price(&self) -> Result<u128, ChainError>;

    /// Broadcast the distribute call with a fixed gas limit.
    async fn send_distribute(
        &self,
        call: &DistributeCall,
        gas_limit: u64,
    ) -> Result<TxHash, ChainError>;

    /// Wait until the transaction is mined. No timeout is applied.
    async fn wait_for_confirmation(&self, tx_hash: TxHash) -> Result<TxReceipt, ChainError>;

    /// Receipt of a mined transaction, or `None` while it is still pending
    /// or unknown to the node.
    async fn transaction_receipt(&self, tx_hash: TxHash) -> Result<Option<TxReceipt>, ChainError>;

    /// Distribution events emitted within the last `lookback_blocks` blocks.
    async fn distribution_events(
        &self,
        lookback_blocks: u64,
    ) -> Result<Vec<DistributionEvent>, ChainError>;

    /// Unix timestamp of a block.
    async fn block_timestamp(&self, block_number: u64) -> Result<u64, ChainError>;

    /// Sender of a transaction, if the node knows it.
    async fn transaction_sender(&self, tx_hash: TxHash) -> Result<Option<Address>, ChainError>;
}

/// Generic and chain-specific name resolution.
///
/// `Ok(None)` means the name has no address; errors are reserved for
/// transport failures.
#[async_trait]
pub trait NameService: Send + Sync {
    /// Resolve a name through ENS.
    async fn resolve_ens(&self, name: &str) -> Result<Option<Address>, ChainError>;

    /// Resolve a `.base` name through the Basename registry.
    async fn resolve_basename(&self, name: &str) -> Result<Option<Address>, ChainError>;
}
