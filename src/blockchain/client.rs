// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! JSON-RPC client for the distribution contract.

use std::num::NonZeroUsize;
use std::sync::Mutex;
use std::time::Duration;

use alloy::{
    eips::BlockNumberOrTag,
    network::{EthereumWallet, TransactionResponse},
    primitives::{Address, TxHash, U256},
    providers::{DynProvider, Provider, ProviderBuilder},
    rpc::types::Filter,
    signers::local::PrivateKeySigner,
    sol_types::SolEvent,
};
use async_trait::async_trait;
use lru::LruCache;

use super::backend::DistributorBackend;
use super::distributor::IDistributor;
use super::erc20::Erc20Contract;
use super::transactions::{DistributeCall, DistributionEvent, TxReceipt};
use super::types::*;

/// Interval between receipt polls while waiting for confirmation.
const RECEIPT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Number of token contracts whose metadata is kept in memory.
const TOKEN_METADATA_CACHE_SIZE: usize = 64;

/// Signing client bound to one network and one distribution contract.
pub struct EvmClient {
    network: Network,
    account: Address,
    distributor: Address,
    /// Alloy HTTP provider with the wallet filler installed
    provider: DynProvider,
    /// Token symbol/decimals never change, so they are cached per contract
    token_metadata: Mutex<LruCache<Address, TokenMetadata>>,
}

impl EvmClient {
    /// Connect to `rpc_url` and verify it serves the expected network.
    pub async fn connect(
        network: Network,
        rpc_url: &str,
        distributor: Address,
        signer: PrivateKeySigner,
    ) -> Result<Self, ChainError> {
        let url: url::Url = rpc_url
            .parse()
            .map_err(|e: url::ParseError| ChainError::InvalidRpcUrl(e.to_string()))?;

        let account = signer.address();
        let provider = ProviderBuilder::new()
            .wallet(EthereumWallet::from(signer))
            .connect_http(url)
            .erased();

        let chain_id = provider
            .get_chain_id()
            .await
            .map_err(|e| ChainError::RpcError(e.to_string()))?;
        let connected = Network::from_chain_id(chain_id)?;
        if connected != network {
            return Err(ChainError::NetworkMismatch {
                expected: network,
                actual: connected,
            });
        }

        tracing::info!(
            network = %network,
            account = %account,
            distributor = %distributor,
            "Connected distribution client"
        );

        Ok(Self {
            network,
            account,
            distributor,
            provider,
            token_metadata: Mutex::new(LruCache::new(
                NonZeroUsize::new(TOKEN_METADATA_CACHE_SIZE).unwrap_or(NonZeroUsize::MIN),
            )),
        })
    }

    fn contract(&self) -> IDistributor::IDistributorInstance<&DynProvider> {
        IDistributor::new(self.distributor, &self.provider)
    }

    fn erc20(&self, token: Address) -> Erc20Contract<DynProvider> {
        Erc20Contract::new(&self.provider, token)
    }

    async fn fetch_events<E: SolEvent>(
        &self,
        from_block: u64,
        to_block: u64,
    ) -> Result<Vec<(alloy::rpc::types::Log, E)>, ChainError> {
        let filter = Filter::new()
            .address(self.distributor)
            .event_signature(E::SIGNATURE_HASH)
            .from_block(from_block)
            .to_block(to_block);

        let logs = self
            .provider
            .get_logs(&filter)
            .await
            .map_err(|e| ChainError::RpcError(e.to_string()))?;

        let mut decoded = Vec::with_capacity(logs.len());
        for log in logs {
            match log.log_decode::<E>() {
                Ok(event) => {
                    let data = event.inner.data;
                    decoded.push((log, data));
                }
                Err(e) => {
                    tracing::warn!(
                        tx_hash = ?log.transaction_hash,
                        error = %e,
                        "Skipping undecodable distribution log"
                    );
                }
            }
        }
        Ok(decoded)
    }
}

#[async_trait]
impl DistributorBackend for EvmClient {
    fn account(&self) -> Address {
        self.account
    }

    fn network(&self) -> Network {
        self.network
    }

    fn distributor(&self) -> Address {
        self.distributor
    }

    async fn native_balance(&self, owner: Address) -> Result<U256, ChainError> {
        self.provider
            .get_balance(owner)
            .await
            .map_err(|e| ChainError::RpcError(e.to_string()))
    }

    async fn token_metadata(&self, token: Address) -> Result<TokenMetadata, ChainError> {
        if let Some(cached) = self
            .token_metadata
            .lock()
            .ok()
            .and_then(|mut cache| cache.get(&token).cloned())
        {
            return Ok(cached);
        }

        let metadata = self.erc20(token).metadata().await?;
        if let Ok(mut cache) = self.token_metadata.lock() {
            cache.put(token, metadata.clone());
        }
        Ok(metadata)
    }

    async fn token_balance(&self, token: Address, owner: Address) -> Result<U256, ChainError> {
        self.erc20(token).balance_of(owner).await
    }

    async fn allowance(
        &self,
        token: Address,
        owner: Address,
        spender: Address,
    ) -> Result<U256, ChainError> {
        self.erc20(token).allowance(owner, spender).await
    }

    async fn approve(
        &self,
        token: Address,
        spender: Address,
        amount: U256,
    ) -> Result<TxHash, ChainError> {
        self.erc20(token).approve(spender, amount).await
    }

    async fn calculate_fee(
        &self,
        total_amount: U256,
        recipient_count: usize,
        network: Network,
    ) -> Result<U256, ChainError> {
        self.contract()
            .calculateFee(total_amount, U256::from(recipient_count), network.contract_enum())
            .call()
            .await
            .map_err(|e| ChainError::ContractError(e.to_string()))
    }

    async fn estimate_gas_cost(
        &self,
        token: TokenKind,
        recipient_count: usize,
    ) -> Result<U256, ChainError> {
        self.contract()
            .estimateGasCost(token.contract_address(), U256::from(recipient_count))
            .call()
            .await
            .map_err(|e| ChainError::ContractError(e.to_string()))
    }

    async fn estimate_distribute_gas(&self, call: &DistributeCall) -> Result<u64, ChainError> {
        let contract = self.contract();
        let network = call.network.contract_enum();
        let estimate = match call.token {
            TokenKind::Native => {
                contract
                    .distributeEth(call.recipients.clone(), call.amounts.clone(), network)
                    .from(self.account)
                    .value(call.value)
                    .estimate_gas()
                    .await
            }
            TokenKind::Erc20(token) => {
                contract
                    .distributeTokens(token, call.recipients.clone(), call.amounts.clone(), network)
                    .from(self.account)
                    .estimate_gas()
                    .await
            }
        };
        estimate.map_err(|e| ChainError::RpcError(format!("Gas estimation failed: {e}")))
    }

    async fn gas_price(&self) -> Result<u128, ChainError> {
        self.provider
            .get_gas_price()
            .await
            .map_err(|e| ChainError::RpcError(e.to_string()))
    }

    async fn send_distribute(
        &self,
        call: &DistributeCall,
        gas_limit: u64,
    ) -> Result<TxHash, ChainError> {
        let contract = self.contract();
        let network = call.network.contract_enum();
        let pending = match call.token {
            TokenKind::Native => {
                contract
                    .distributeEth(call.recipients.clone(), call.amounts.clone(), network)
                    .value(call.value)
                    .gas(gas_limit)
                    .send()
                    .await
            }
            TokenKind::Erc20(token) => {
                contract
                    .distributeTokens(token, call.recipients.clone(), call.amounts.clone(), network)
                    .gas(gas_limit)
                    .send()
                    .await
            }
        }
        .map_err(|e| ChainError::TransactionFailed(format!("Failed to send: {e}")))?;

        Ok(*pending.tx_hash())
    }

    async fn wait_for_confirmation(&self, tx_hash: TxHash) -> Result<TxReceipt, ChainError> {
        loop {
            if let Some(receipt) = self.transaction_receipt(tx_hash).await? {
                return Ok(receipt);
            }
            tokio::time::sleep(RECEIPT_POLL_INTERVAL).await;
        }
    }

    async fn transaction_receipt(&self, tx_hash: TxHash) -> Result<Option<TxReceipt>, ChainError> {
        let receipt = self
            .provider
            .get_transaction_receipt(tx_hash)
            .await
            .map_err(|e| ChainError::RpcError(format!("Failed to get receipt: {e}")))?;

        Ok(receipt.map(|receipt| TxReceipt {
            tx_hash,
            block_number: receipt.block_number.unwrap_or(0),
            gas_used: receipt.gas_used,
            success: receipt.status(),
        }))
    }

    async fn distribution_events(
        &self,
        lookback_blocks: u64,
    ) -> Result<Vec<DistributionEvent>, ChainError> {
        let head = self
            .provider
            .get_block_number()
            .await
            .map_err(|e| ChainError::RpcError(e.to_string()))?;
        let from = head.saturating_sub(lookback_blocks);

        let mut events = Vec::new();

        for (log, event) in self.fetch_events::<IDistributor::EthDistributed>(from, head).await? {
            let (Some(tx_hash), Some(block_number)) = (log.transaction_hash, log.block_number) else {
                continue;
            };
            events.push(DistributionEvent {
                tx_hash,
                block_number,
                token: TokenKind::Native,
                recipient_count: event.recipients.len(),
                total_amount: event.amounts.iter().fold(U256::ZERO, |acc, a| acc.saturating_add(*a)),
            });
        }

        for (log, event) in self.fetch_events::<IDistributor::TokensDistributed>(from, head).await? {
            let (Some(tx_hash), Some(block_number)) = (log.transaction_hash, log.block_number) else {
                continue;
            };
            let token = if event.token.is_zero() {
                TokenKind::Native
            } else {
                TokenKind::Erc20(event.token)
            };
            events.push(DistributionEvent {
                tx_hash,
                block_number,
                token,
                recipient_count: event.recipients.len(),
                total_amount: event.amounts.iter().fold(U256::ZERO, |acc, a| acc.saturating_add(*a)),
            });
        }

        Ok(events)
    }

    async fn block_timestamp(&self, block_number: u64) -> Result<u64, ChainError> {
        let block = self
            .provider
            .get_block_by_number(BlockNumberOrTag::Number(block_number))
            .await
            .map_err(|e| ChainError::RpcError(format!("Failed to get block: {e}")))?
            .ok_or_else(|| ChainError::RpcError(format!("Block {block_number} not found")))?;
        Ok(block.header.timestamp)
    }

    async fn transaction_sender(&self, tx_hash: TxHash) -> Result<Option<Address>, ChainError> {
        let tx = self
            .provider
            .get_transaction_by_hash(tx_hash)
            .await
            .map_err(|e| ChainError::RpcError(e.to_string()))?;
        Ok(tx.map(|tx| tx.from()))
    }
}

/// Create a signer from a private key (hex string, `0x` prefix optional).
pub fn create_signer(private_key_hex: &str) -> Result<PrivateKeySigner, ChainError> {
    let trimmed = private_key_hex.trim();
    let key_bytes = alloy::hex::decode(trimmed.strip_prefix("0x").unwrap_or(trimmed))
        .map_err(|e| ChainError::InvalidPrivateKey(e.to_string()))?;

    PrivateKeySigner::from_slice(&key_bytes)
        .map_err(|e| ChainError::InvalidPrivateKey(e.to_string()))
}

/// Errors that can occur during blockchain operations.
#[derive(Debug, thiserror::Error)]
pub enum ChainError {
    #[error("Invalid RPC URL: {0}")]
    InvalidRpcUrl(String),

    #[error("Invalid private key: {0}")]
    InvalidPrivateKey(String),

    #[error(transparent)]
    UnsupportedChain(#[from] UnsupportedChain),

    #[error("RPC serves {actual} but {expected} was configured")]
    NetworkMismatch { expected: Network, actual: Network },

    #[error("RPC error: {0}")]
    RpcError(String),

    #[error("Contract error: {0}")]
    ContractError(String),

    #[error("Transaction failed: {0}")]
    TransactionFailed(String),
}
