// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Gas cost estimation for a validated distribution.

use alloy::primitives::U256;
use serde::Serialize;
use utoipa::ToSchema;

use super::error::DistributionError;
use super::validator::DistributionRequest;
use crate::blockchain::{format_amount, DistributorBackend, NATIVE_DECIMALS};

/// Safety margin applied to simulated estimates, as a percentage.
pub const SIMULATION_BUFFER_PERCENT: u64 = 120;

const GWEI: u128 = 1_000_000_000;

/// Which estimator produced the gas figure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum GasSource {
    /// The contract's own `estimateGasCost`
    Contract,
    /// `eth_estimateGas` on the distribute call, plus buffer
    Simulated,
}

/// Estimated native-currency cost of sending a distribution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GasEstimate {
    pub gas_units: U256,
    pub gas_price: u128,
    pub cost_wei: U256,
    /// `cost_wei` formatted in ETH
    pub cost: String,
    pub source: GasSource,
}

/// Estimate the cost of `request` without sending anything.
///
/// The contract estimator is tried first. Any failure there falls back to
/// simulating the exact distribute call and adding a 20% buffer.
pub async fn estimate(
    backend: &dyn DistributorBackend,
    request: &DistributionRequest,
) -> Result<GasEstimate, DistributionError> {
    let (gas_units, source) = match backend
        .estimate_gas_cost(request.token(), request.recipient_count())
        .await
    {
        Ok(units) => (units, GasSource::Contract),
        Err(primary) => {
            tracing::warn!(error = %primary, "Contract gas estimate failed, simulating call");
            let simulated = backend
                .estimate_distribute_gas(&request.distribute_call())
                .await
                .map_err(|fallback| {
                    DistributionError::EstimationFailure(format!(
                        "contract estimator: {primary}; simulation: {fallback}"
                    ))
                })?;
            (with_buffer(simulated), GasSource::Simulated)
        }
    };

    let gas_price = backend
        .gas_price()
        .await
        .map_err(|e| DistributionError::EstimationFailure(e.to_string()))?;

    let cost_wei = gas_units.saturating_mul(U256::from(gas_price));
    Ok(GasEstimate {
        gas_units,
        gas_price,
        cost_wei,
        cost: format_amount(cost_wei, NATIVE_DECIMALS),
        source,
    })
}

fn with_buffer(gas: u64) -> U256 {
    U256::from(gas) * U256::from(SIMULATION_BUFFER_PERCENT) / U256::from(100u64)
}

/// Congestion hint derived from the current gas price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum GasLevel {
    Low,
    Moderate,
    High,
}

impl GasLevel {
    pub fn recommendation(self) -> &'static str {
        match self {
            GasLevel::Low => "Gas prices are low. Good time to transact.",
            GasLevel::Moderate => "Gas prices are moderate. Consider waiting if not urgent.",
            GasLevel::High => "Gas prices are high. Consider waiting for lower prices if possible.",
        }
    }
}

/// Current gas price with an advisory level.
#[derive(Debug, Clone, PartialEq)]
pub struct GasAdvice {
    pub gas_price_wei: u128,
    pub gas_price_gwei: f64,
    pub level: GasLevel,
}

/// Classify a gas price: below 30 gwei is low, below 50 moderate.
pub fn advise(gas_price_wei: u128) -> GasAdvice {
    let level = if gas_price_wei < 30 * GWEI {
        GasLevel::Low
    } else if gas_price_wei < 50 * GWEI {
        GasLevel::Moderate
    } else {
        GasLevel::High
    };
    GasAdvice {
        gas_price_wei,
        gas_price_gwei: gas_price_wei as f64 / GWEI as f64,
        level,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::mock::MockBackend;
    use crate::blockchain::{Network, TokenKind};
    use crate::distribution::resolver::ResolvedRecipient;
    use crate::distribution::validator::validate;
    use alloy::primitives::Address;

    async fn request(backend: &MockBackend) -> DistributionRequest {
        let recipient = ResolvedRecipient {
            identifier: "alice.eth".into(),
            canonical_address: Some(Address::repeat_byte(0x11)),
        };
        validate(backend, TokenKind::Native, &[recipient], &[Some("0.5".into())])
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_contract_estimate_is_primary() {
        let backend = MockBackend::new(Network::Optimism);
        let request = request(&backend).await;
        let estimate = estimate(&backend, &request).await.unwrap();

        assert_eq!(estimate.source, GasSource::Contract);
        assert_eq!(estimate.gas_units, U256::from(210_000u64));
        assert_eq!(estimate.cost_wei, U256::from(210_000u64 * 1_000_000_000));
        assert_eq!(estimate.cost, "0.00021");
        assert_eq!(backend.count("estimate_distribute_gas"), 0);
    }

    #[tokio::test]
    async fn test_fallback_applies_buffer() {
        let mut backend = MockBackend::new(Network::Optimism);
        backend.contract_gas = None;
        backend.simulated_gas = Some(100_000);
        let request = request(&backend).await;
        let estimate = estimate(&backend, &request).await.unwrap();

        assert_eq!(estimate.source, GasSource::Simulated);
        assert_eq!(estimate.gas_units, U256::from(120_000u64));
        assert_eq!(estimate.cost_wei, U256::from(120_000u64 * 1_000_000_000));
    }

    #[tokio::test]
    async fn test_both_paths_failing() {
        let mut backend = MockBackend::new(Network::Optimism);
        backend.contract_gas = None;
        backend.simulated_gas = None;
        let request = request(&backend).await;
        let err = estimate(&backend, &request).await.unwrap_err();
        assert!(matches!(err, DistributionError::EstimationFailure(_)));
        assert_eq!(backend.count("send_distribute"), 0);
    }

    #[test]
    fn test_advise_thresholds() {
        assert_eq!(advise(29 * GWEI).level, GasLevel::Low);
        assert_eq!(advise(30 * GWEI).level, GasLevel::Moderate);
        assert_eq!(advise(49 * GWEI).level, GasLevel::Moderate);
        assert_eq!(advise(50 * GWEI).level, GasLevel::High);
        assert_eq!(advise(GWEI / 2).gas_price_gwei, 0.5);
    }
}
