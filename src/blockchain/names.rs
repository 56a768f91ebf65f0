// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! ENS and Basename lookups.
//!
//! Names are UTS-46 mapped first. ENS names are resolved against Ethereum
//! mainnet through the registry's `resolver(node)` and the resolver's
//! `addr(node)`. Basenames (`*.base`) go to a registry on Base exposing
//! `resolve(string)`.

use alloy::{
    ens::namehash,
    primitives::Address,
    providers::{DynProvider, Provider, ProviderBuilder},
    sol,
};
use async_trait::async_trait;

use super::backend::NameService;
use super::client::ChainError;

/// ENS registry, same address on every network that has one.
pub const ENS_REGISTRY: Address = alloy::primitives::address!("00000000000C2E074eC69A0dFb2997BA6C7d2e1e");

sol! {
    #[sol(rpc)]
    interface IEnsRegistry {
        function resolver(bytes32 node) external view returns (address);
    }

    #[sol(rpc)]
    interface IEnsResolver {
        function addr(bytes32 node) external view returns (address);
    }

    #[sol(rpc)]
    interface IBasenameRegistry {
        function resolve(string name) external view returns (address);
    }
}

/// Map a name through UTS-46 (case folding, width and compatibility
/// mapping, NFC) before hashing.
///
/// Returns `None` for names containing disallowed code points.
fn normalize(name: &str) -> Option<String> {
    let (mapped, result) = idna::domain_to_unicode(name.trim());
    result.ok().map(|()| mapped).filter(|mapped| !mapped.is_empty())
}

/// Read-only name service backed by two JSON-RPC endpoints.
pub struct EvmNameService {
    ens: DynProvider,
    base: DynProvider,
    basename_registry: Option<Address>,
}

impl EvmNameService {
    pub fn new(
        ens_rpc_url: &str,
        base_rpc_url: &str,
        basename_registry: Option<Address>,
    ) -> Result<Self, ChainError> {
        let ens_url: url::Url = ens_rpc_url
            .parse()
            .map_err(|e: url::ParseError| ChainError::InvalidRpcUrl(e.to_string()))?;
        let base_url: url::Url = base_rpc_url
            .parse()
            .map_err(|e: url::ParseError| ChainError::InvalidRpcUrl(e.to_string()))?;

        if basename_registry.is_none() {
            tracing::warn!("No basename registry configured; .base names will not resolve");
        }

        Ok(Self {
            ens: ProviderBuilder::new().connect_http(ens_url).erased(),
            base: ProviderBuilder::new().connect_http(base_url).erased(),
            basename_registry,
        })
    }
}

#[async_trait]
impl NameService for EvmNameService {
    async fn resolve_ens(&self, name: &str) -> Result<Option<Address>, ChainError> {
        let Some(normalized) = normalize(name) else {
            tracing::debug!(name, "Name does not normalize");
            return Ok(None);
        };
        let node = namehash(&normalized);

        let resolver = IEnsRegistry::new(ENS_REGISTRY, &self.ens)
            .resolver(node)
            .call()
            .await
            .map_err(|e| ChainError::ContractError(e.to_string()))?;
        if resolver.is_zero() {
            tracing::debug!(name, "ENS name has no resolver");
            return Ok(None);
        }

        let address = IEnsResolver::new(resolver, &self.ens)
            .addr(node)
            .call()
            .await
            .map_err(|e| ChainError::ContractError(e.to_string()))?;
        Ok((!address.is_zero()).then_some(address))
    }

    async fn resolve_basename(&self, name: &str) -> Result<Option<Address>, ChainError> {
        let Some(registry) = self.basename_registry else {
            return Ok(None);
        };
        let Some(normalized) = normalize(name) else {
            tracing::debug!(name, "Name does not normalize");
            return Ok(None);
        };

        let address = IBasenameRegistry::new(registry, &self.base)
            .resolve(normalized)
            .call()
            .await
            .map_err(|e| ChainError::ContractError(e.to_string()))?;
        Ok((!address.is_zero()).then_some(address))
    }
}
