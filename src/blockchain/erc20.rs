// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! ERC-20 token contract interactions.

use alloy::{
    primitives::{Address, TxHash, U256},
    providers::Provider,
    sol,
};

use super::client::ChainError;
use super::types::TokenMetadata;

// Define the ERC-20 interface using alloy's sol! macro
sol! {
    #[sol(rpc)]
    interface IERC20 {
        function symbol() external view returns (string);
        function decimals() external view returns (uint8);
        function balanceOf(address account) external view returns (uint256);
        function allowance(address owner, address spender) external view returns (uint256);
        function approve(address spender, uint256 amount) external returns (bool);
    }
}

/// ERC-20 contract wrapper.
pub struct Erc20Contract<P> {
    contract: IERC20::IERC20Instance<P>,
}

impl<P: Provider + Clone> Erc20Contract<P> {
    /// Create a new ERC-20 contract instance.
    pub fn new(provider: &P, address: Address) -> Self {
        Self {
            contract: IERC20::new(address, provider.clone()),
        }
    }

    /// Get the token symbol.
    pub async fn symbol(&self) -> Result<String, ChainError> {
        self.contract
            .symbol()
            .call()
            .await
            .map_err(|e| ChainError::ContractError(e.to_string()))
    }

    /// Get the token decimals.
    pub async fn decimals(&self) -> Result<u8, ChainError> {
        self.contract
            .decimals()
            .call()
            .await
            .map_err(|e| ChainError::ContractError(e.to_string()))
    }

    /// Fetch symbol and decimals.
    ///
    /// Decimals are required to parse amounts, so a failing `decimals()` is an
    /// error. A token without `symbol()` is displayed as `???`.
    pub async fn metadata(&self) -> Result<TokenMetadata, ChainError> {
        let decimals = self.decimals().await?;
        let symbol = self.symbol().await.unwrap_or_else(|_| "???".to_string());
        Ok(TokenMetadata { symbol, decimals })
    }

    /// Get the raw balance of an address.
    pub async fn balance_of(&self, owner: Address) -> Result<U256, ChainError> {
        self.contract
            .balanceOf(owner)
            .call()
            .await
            .map_err(|e| ChainError::ContractError(e.to_string()))
    }

    /// Get the amount `spender` may transfer on behalf of `owner`.
    pub async fn allowance(&self, owner: Address, spender: Address) -> Result<U256, ChainError> {
        self.contract
            .allowance(owner, spender)
            .call()
            .await
            .map_err(|e| ChainError::ContractError(e.to_string()))
    }

    /// Broadcast an `approve` transaction and return its hash without waiting.
    pub async fn approve(&self, spender: Address, amount: U256) -> Result<TxHash, ChainError> {
        let pending = self
            .contract
            .approve(spender, amount)
            .send()
            .await
            .map_err(|e| ChainError::TransactionFailed(format!("Failed to send approval: {e}")))?;
        Ok(*pending.tx_hash())
    }
}
