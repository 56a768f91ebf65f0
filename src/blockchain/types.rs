// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Blockchain types and constants.

use std::{fmt, str::FromStr};

use alloy::primitives::{Address, TxHash, U256};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Static network configuration.
#[derive(Debug, Clone)]
pub struct NetworkConfig {
    /// Network name for display
    pub name: &'static str,
    /// Chain ID
    pub chain_id: u64,
    /// Public RPC endpoint URL
    pub rpc_url: &'static str,
    /// Block explorer URL
    pub explorer_url: &'static str,
}

/// Optimism mainnet configuration.
pub const OPTIMISM: NetworkConfig = NetworkConfig {
    name: "Optimism",
    chain_id: 10,
    rpc_url: "https://mainnet.optimism.io",
    explorer_url: "https://optimistic.etherscan.io",
};

/// Base mainnet configuration.
pub const BASE: NetworkConfig = NetworkConfig {
    name: "Base",
    chain_id: 8453,
    rpc_url: "https://mainnet.base.org",
    explorer_url: "https://basescan.org",
};

/// Arbitrum One configuration.
pub const ARBITRUM: NetworkConfig = NetworkConfig {
    name: "Arbitrum One",
    chain_id: 42161,
    rpc_url: "https://arb1.arbitrum.io/rpc",
    explorer_url: "https://arbiscan.io",
};

/// Ethereum mainnet RPC used for ENS lookups.
pub const ETHEREUM_RPC_URL: &str = "https://eth.llamarpc.com";

/// Native currency symbol on every supported network.
pub const NATIVE_SYMBOL: &str = "ETH";

/// Native currency decimals.
pub const NATIVE_DECIMALS: u8 = 18;

/// A chain id outside the supported set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("Unsupported chain ID: {0}")]
pub struct UnsupportedChain(pub u64);

/// Networks the distribution contract is deployed on.
///
/// The declaration order matches the contract's `Network` enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Optimism,
    Base,
    Arbitrum,
}

impl Network {
    /// Map an EVM chain id onto a supported network.
    pub fn from_chain_id(chain_id: u64) -> Result<Self, UnsupportedChain> {
        match chain_id {
            10 => Ok(Network::Optimism),
            8453 => Ok(Network::Base),
            42161 => Ok(Network::Arbitrum),
            other => Err(UnsupportedChain(other)),
        }
    }

    pub fn config(self) -> NetworkConfig {
        match self {
            Network::Optimism => OPTIMISM,
            Network::Base => BASE,
            Network::Arbitrum => ARBITRUM,
        }
    }

    /// Value of the contract's `Network` enum for this chain.
    pub fn contract_enum(self) -> u8 {
        match self {
            Network::Optimism => 0,
            Network::Base => 1,
            Network::Arbitrum => 2,
        }
    }

    /// Short lowercase key used in configuration and requests.
    pub fn key(self) -> &'static str {
        match self {
            Network::Optimism => "optimism",
            Network::Base => "base",
            Network::Arbitrum => "arbitrum",
        }
    }

    /// Block explorer link for a transaction hash.
    pub fn tx_url(self, tx_hash: &TxHash) -> String {
        format!("{}/tx/{tx_hash:#x}", self.config().explorer_url)
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.config().name)
    }
}

impl FromStr for Network {
    type Err = UnsupportedChain;

    /// Accepts a network key (`optimism`, `base`, `arbitrum`) or a numeric chain id.
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let value = raw.trim().to_ascii_lowercase();
        match value.as_str() {
            "optimism" => Ok(Network::Optimism),
            "base" => Ok(Network::Base),
            "arbitrum" => Ok(Network::Arbitrum),
            other => {
                let chain_id = other.parse::<u64>().map_err(|_| UnsupportedChain(0))?;
                Network::from_chain_id(chain_id)
            }
        }
    }
}

/// Asset being distributed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// The chain's native currency (ETH).
    Native,
    /// An ERC-20 token contract.
    Erc20(Address),
}

impl TokenKind {
    /// Parse the token selector used at the API boundary.
    ///
    /// Empty input, `native`, `eth` and the zero address all select the native currency.
    pub fn parse(raw: Option<&str>) -> Result<Self, String> {
        let value = raw.map(str::trim).unwrap_or_default();
        if value.is_empty() || value.eq_ignore_ascii_case("native") || value.eq_ignore_ascii_case("eth")
        {
            return Ok(TokenKind::Native);
        }
        let address = Address::from_str(value).map_err(|_| format!("Invalid token address: {value}"))?;
        if address.is_zero() {
            Ok(TokenKind::Native)
        } else {
            Ok(TokenKind::Erc20(address))
        }
    }

    /// Address passed to contract functions that take a token parameter.
    pub fn contract_address(&self) -> Address {
        match self {
            TokenKind::Native => Address::ZERO,
            TokenKind::Erc20(address) => *address,
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Native => f.write_str("native"),
            TokenKind::Erc20(address) => write!(f, "{address}"),
        }
    }
}

/// ERC-20 metadata needed to parse and display amounts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenMetadata {
    pub symbol: String,
    pub decimals: u8,
}

impl TokenMetadata {
    pub fn native() -> Self {
        Self {
            symbol: NATIVE_SYMBOL.to_string(),
            decimals: NATIVE_DECIMALS,
        }
    }
}

/// Token balance information.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TokenBalance {
    /// Token symbol (e.g., "ETH", "USDC")
    pub symbol: String,
    /// Balance in smallest unit (wei for native, token decimals for ERC-20)
    pub balance_raw: String,
    /// Balance formatted with decimals
    pub balance_formatted: String,
    /// Number of decimals
    pub decimals: u8,
    /// Contract address (None for native token)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contract_address: Option<String>,
}

impl TokenBalance {
    pub fn new(token: TokenKind, metadata: &TokenMetadata, balance: U256) -> Self {
        Self {
            symbol: metadata.symbol.clone(),
            balance_raw: balance.to_string(),
            balance_formatted: super::format_amount(balance, metadata.decimals),
            decimals: metadata.decimals,
            contract_address: match token {
                TokenKind::Native => None,
                TokenKind::Erc20(address) => Some(address.to_string()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chain_ids_map_to_contract_enum() {
        assert_eq!(Network::from_chain_id(10).unwrap().contract_enum(), 0);
        assert_eq!(Network::from_chain_id(8453).unwrap().contract_enum(), 1);
        assert_eq!(Network::from_chain_id(42161).unwrap().contract_enum(), 2);
    }

    #[test]
    fn unknown_chain_is_rejected() {
        assert_eq!(Network::from_chain_id(1), Err(UnsupportedChain(1)));
        assert_eq!("137".parse::<Network>(), Err(UnsupportedChain(137)));
    }

    #[test]
    fn network_parses_names_and_ids() {
        assert_eq!("Optimism".parse::<Network>().unwrap(), Network::Optimism);
        assert_eq!(" base ".parse::<Network>().unwrap(), Network::Base);
        assert_eq!("42161".parse::<Network>().unwrap(), Network::Arbitrum);
        assert!("polygon".parse::<Network>().is_err());
    }

    #[test]
    fn token_kind_treats_zero_address_as_native() {
        assert_eq!(TokenKind::parse(None).unwrap(), TokenKind::Native);
        assert_eq!(TokenKind::parse(Some("native")).unwrap(), TokenKind::Native);
        assert_eq!(
            TokenKind::parse(Some("0x0000000000000000000000000000000000000000")).unwrap(),
            TokenKind::Native
        );

        let usdc = "0x0b2C639c533813f4Aa9D7837CAf62653d097Ff85";
        assert_eq!(
            TokenKind::parse(Some(usdc)).unwrap(),
            TokenKind::Erc20(usdc.parse().unwrap())
        );
        assert!(TokenKind::parse(Some("usdc")).is_err());
    }

    #[test]
    fn explorer_links_use_network_explorer() {
        let hash = TxHash::repeat_byte(0xab);
        let url = Network::Base.tx_url(&hash);
        assert!(url.starts_with("https://basescan.org/tx/0xabab"));
    }
}
