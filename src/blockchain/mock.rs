// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! In-memory backend and name service for tests.
//!
//! Every trait call is appended to a call log so tests can assert which
//! network operations happened and in what order.

use std::collections::HashMap;
use std::sync::Mutex;

use alloy::primitives::{Address, TxHash, U256};
use async_trait::async_trait;

use super::backend::{DistributorBackend, NameService};
use super::client::ChainError;
use super::transactions::{DistributeCall, DistributionEvent, TxReceipt};
use super::types::{Network, TokenKind, TokenMetadata};

pub const ACCOUNT: Address = Address::repeat_byte(0xA1);
pub const DISTRIBUTOR: Address = Address::repeat_byte(0xD1);
pub const TOKEN: Address = Address::repeat_byte(0x70);

/// Scriptable stand-in for [`super::EvmClient`].
pub struct MockBackend {
    pub network: Network,
    pub native_balance: U256,
    pub token_balance: U256,
    pub token_metadata: TokenMetadata,
    /// Fee charged by `calculateFee`, in basis points of the total.
    pub fee_bps: u64,
    /// `None` makes `estimateGasCost` revert.
    pub contract_gas: Option<U256>,
    /// `None` makes the simulated estimate fail.
    pub simulated_gas: Option<u64>,
    pub gas_price: u128,
    pub approve_send_fails: bool,
    pub approve_reverts: bool,
    pub distribute_send_fails: bool,
    pub distribute_reverts: bool,
    /// Distribute confirmations never arrive.
    pub confirmations_hang: bool,
    /// Token addresses whose metadata read fails.
    pub broken_metadata: Vec<Address>,
    /// Blocks whose timestamp read fails.
    pub broken_blocks: Vec<u64>,
    pub events: Vec<DistributionEvent>,
    pub senders: HashMap<TxHash, Address>,
    allowance: Mutex<U256>,
    pending_approvals: Mutex<HashMap<TxHash, U256>>,
    sent: Mutex<Vec<(DistributeCall, u64)>>,
    broadcast: Mutex<Vec<TxHash>>,
    calls: Mutex<Vec<&'static str>>,
    nonce: Mutex<u8>,
}

impl MockBackend {
    pub fn new(network: Network) -> Self {
        Self {
            network,
            native_balance: U256::from(100u64) * U256::from(10u64).pow(U256::from(18u64)),
            token_balance: U256::from(1_000_000_000_000u64),
            token_metadata: TokenMetadata {
                symbol: "USDC".to_string(),
                decimals: 6,
            },
            fee_bps: 100,
            contract_gas: Some(U256::from(210_000u64)),
            simulated_gas: Some(100_000),
            gas_price: 1_000_000_000,
            approve_send_fails: false,
            approve_reverts: false,
            distribute_send_fails: false,
            distribute_reverts: false,
            confirmations_hang: false,
            broken_metadata: Vec::new(),
            broken_blocks: Vec::new(),
            events: Vec::new(),
            senders: HashMap::new(),
            allowance: Mutex::new(U256::ZERO),
            pending_approvals: Mutex::new(HashMap::new()),
            sent: Mutex::new(Vec::new()),
            broadcast: Mutex::new(Vec::new()),
            calls: Mutex::new(Vec::new()),
            nonce: Mutex::new(0),
        }
    }

    pub fn with_allowance(self, allowance: U256) -> Self {
        *self.allowance.lock().unwrap() = allowance;
        self
    }

    /// Names of the trait methods called so far, in order.
    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, method: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| **c == method).count()
    }

    /// Distribute calls broadcast so far with their gas limits.
    pub fn sent(&self) -> Vec<(DistributeCall, u64)> {
        self.sent.lock().unwrap().clone()
    }

    pub fn current_allowance(&self) -> U256 {
        *self.allowance.lock().unwrap()
    }

    fn record(&self, method: &'static str) {
        self.calls.lock().unwrap().push(method);
    }

    fn next_hash(&self, tag: u8) -> TxHash {
        let mut nonce = self.nonce.lock().unwrap();
        *nonce += 1;
        let mut hash = TxHash::repeat_byte(tag);
        hash.0[31] = *nonce;
        hash
    }
}

const APPROVE_TAG: u8 = 0xAA;
const DISTRIBUTE_TAG: u8 = 0xDD;

#[async_trait]
impl DistributorBackend for MockBackend {
    fn account(&self) -> Address {
        ACCOUNT
    }

    fn network(&self) -> Network {
        self.network
    }

    fn distributor(&self) -> Address {
        DISTRIBUTOR
    }

    async fn native_balance(&self, _owner: Address) -> Result<U256, ChainError> {
        self.record("native_balance");
        Ok(self.native_balance)
    }

    async fn token_metadata(&self, token: Address) -> Result<TokenMetadata, ChainError> {
        self.record("token_metadata");
        if self.broken_metadata.contains(&token) {
            return Err(ChainError::ContractError("execution reverted".to_string()));
        }
        Ok(self.token_metadata.clone())
    }

    async fn token_balance(&self, _token: Address, _owner: Address) -> Result<U256, ChainError> {
        self.record("token_balance");
        Ok(self.token_balance)
    }

    async fn allowance(
        &self,
        _token: Address,
        _owner: Address,
        _spender: Address,
    ) -> Result<U256, ChainError> {
        self.record("allowance");
        Ok(self.current_allowance())
    }

    async fn approve(
        &self,
        _token: Address,
        _spender: Address,
        amount: U256,
    ) -> Result<TxHash, ChainError> {
        self.record("approve");
        if self.approve_send_fails {
            return Err(ChainError::TransactionFailed("user rejected".to_string()));
        }
        let hash = self.next_hash(APPROVE_TAG);
        self.pending_approvals.lock().unwrap().insert(hash, amount);
        Ok(hash)
    }

    async fn calculate_fee(
        &self,
        total_amount: U256,
        _recipient_count: usize,
        _network: Network,
    ) -> Result<U256, ChainError> {
        self.record("calculate_fee");
        Ok(total_amount * U256::from(self.fee_bps) / U256::from(10_000u64))
    }

    async fn estimate_gas_cost(
        &self,
        _token: TokenKind,
        _recipient_count: usize,
    ) -> Result<U256, ChainError> {
        self.record("estimate_gas_cost");
        self.contract_gas
            .ok_or_else(|| ChainError::ContractError("execution reverted".to_string()))
    }

    async fn estimate_distribute_gas(&self, _call: &DistributeCall) -> Result<u64, ChainError> {
        self.record("estimate_distribute_gas");
        self.simulated_gas
            .ok_or_else(|| ChainError::RpcError("estimate failed".to_string()))
    }

    async fn gas_price(&self) -> Result<u128, ChainError> {
        self.record("gas_price");
        Ok(self.gas_price)
    }

    async fn send_distribute(
        &self,
        call: &DistributeCall,
        gas_limit: u64,
    ) -> Result<TxHash, ChainError> {
        self.record("send_distribute");
        if self.distribute_send_fails {
            return Err(ChainError::TransactionFailed("insufficient funds for gas".to_string()));
        }
        self.sent.lock().unwrap().push((call.clone(), gas_limit));
        let hash = self.next_hash(DISTRIBUTE_TAG);
        self.broadcast.lock().unwrap().push(hash);
        Ok(hash)
    }

    async fn wait_for_confirmation(&self, tx_hash: TxHash) -> Result<TxReceipt, ChainError> {
        self.record("wait_for_confirmation");
        if self.confirmations_hang && tx_hash.0[0] == DISTRIBUTE_TAG {
            std::future::pending::<()>().await;
        }
        let success = if tx_hash.0[0] == APPROVE_TAG {
            let approved = self.pending_approvals.lock().unwrap().remove(&tx_hash);
            match approved {
                Some(amount) if !self.approve_reverts => {
                    *self.allowance.lock().unwrap() = amount;
                    true
                }
                _ => false,
            }
        } else {
            !self.distribute_reverts
        };
        Ok(TxReceipt {
            tx_hash,
            block_number: 100,
            gas_used: 90_000,
            success,
        })
    }

    async fn transaction_receipt(&self, tx_hash: TxHash) -> Result<Option<TxReceipt>, ChainError> {
        self.record("transaction_receipt");
        if !self.broadcast.lock().unwrap().contains(&tx_hash) || self.confirmations_hang {
            return Ok(None);
        }
        Ok(Some(TxReceipt {
            tx_hash,
            block_number: 100,
            gas_used: 90_000,
            success: !self.distribute_reverts,
        }))
    }

    async fn distribution_events(
        &self,
        _lookback_blocks: u64,
    ) -> Result<Vec<DistributionEvent>, ChainError> {
        self.record("distribution_events");
        Ok(self.events.clone())
    }

    async fn block_timestamp(&self, block_number: u64) -> Result<u64, ChainError> {
        self.record("block_timestamp");
        if self.broken_blocks.contains(&block_number) {
            return Err(ChainError::RpcError("header not found".to_string()));
        }
        Ok(1_700_000_000 + block_number * 2)
    }

    async fn transaction_sender(&self, tx_hash: TxHash) -> Result<Option<Address>, ChainError> {
        self.record("transaction_sender");
        Ok(self.senders.get(&tx_hash).copied())
    }
}

/// Name service answering from fixed tables.
#[derive(Default)]
pub struct MockNames {
    pub ens: HashMap<String, Address>,
    pub basenames: HashMap<String, Address>,
    /// Names whose lookup fails with a transport error.
    pub failing: Vec<String>,
    lookups: Mutex<usize>,
}

impl MockNames {
    pub fn with_ens(mut self, name: &str, address: Address) -> Self {
        self.ens.insert(name.to_string(), address);
        self
    }

    pub fn with_basename(mut self, name: &str, address: Address) -> Self {
        self.basenames.insert(name.to_string(), address);
        self
    }

    pub fn with_failing(mut self, name: &str) -> Self {
        self.failing.push(name.to_string());
        self
    }

    /// Number of lookups issued against either registry.
    pub fn lookups(&self) -> usize {
        *self.lookups.lock().unwrap()
    }

    fn lookup(
        &self,
        table: &HashMap<String, Address>,
        name: &str,
    ) -> Result<Option<Address>, ChainError> {
        *self.lookups.lock().unwrap() += 1;
        if self.failing.iter().any(|n| n == name) {
            return Err(ChainError::RpcError("lookup timed out".to_string()));
        }
        Ok(table.get(name).copied())
    }
}

#[async_trait]
impl NameService for MockNames {
    async fn resolve_ens(&self, name: &str) -> Result<Option<Address>, ChainError> {
        self.lookup(&self.ens, name)
    }

    async fn resolve_basename(&self, name: &str) -> Result<Option<Address>, ChainError> {
        self.lookup(&self.basenames, name)
    }
}
