// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! DistriButler contract interface.
//!
//! Only the surface the service calls is declared here. Fee enforcement and
//! the actual transfers happen on-chain.

use alloy::sol;

sol! {
    #[sol(rpc)]
    interface IDistributor {
        event EthDistributed(address[] recipients, uint256[] amounts);
        event TokensDistributed(address token, address[] recipients, uint256[] amounts);

        function calculateFee(uint256 totalAmount, uint256 recipientCount, uint8 network) external view returns (uint256);
        function estimateGasCost(address token, uint256 recipientCount) external view returns (uint256);
        function distributeEth(address[] recipients, uint256[] amounts, uint8 network) external payable;
        function distributeTokens(address token, address[] recipients, uint256[] amounts, uint8 network) external;
    }
}
