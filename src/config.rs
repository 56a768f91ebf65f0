// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Configuration is read from the environment once at startup.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `NETWORK` | `optimism`, `base`, `arbitrum` or a chain id | `optimism` |
//! | `RPC_URL` | JSON-RPC endpoint for the selected network | Network public RPC |
//! | `DISTRIBUTOR_ADDRESS_OPTIMISM` | Distribution contract on Optimism | Required when selected |
//! | `DISTRIBUTOR_ADDRESS_BASE` | Distribution contract on Base | Required when selected |
//! | `DISTRIBUTOR_ADDRESS_ARBITRUM` | Distribution contract on Arbitrum | Required when selected |
//! | `SIGNER_PRIVATE_KEY` | Hex private key of the sending account | One of the two signer variables is required |
//! | `SIGNER_KEY_PEM` | Path to a SEC1 or PKCS#8 PEM private key | |
//! | `ENS_RPC_URL` | Ethereum mainnet RPC for ENS lookups | `https://eth.llamarpc.com` |
//! | `BASE_RPC_URL` | Base RPC for basename lookups | `https://mainnet.base.org` |
//! | `BASENAME_REGISTRY_ADDRESS` | Basename registry contract | Unset (basenames do not resolve) |
//! | `HISTORY_LOOKBACK_BLOCKS` | Blocks scanned for history | `1000` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;

use alloy::primitives::Address;

use crate::blockchain::{Network, ETHEREUM_RPC_URL};
use crate::distribution::session::DEFAULT_HISTORY_LOOKBACK;

pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const NETWORK_ENV: &str = "NETWORK";
pub const RPC_URL_ENV: &str = "RPC_URL";
pub const SIGNER_PRIVATE_KEY_ENV: &str = "SIGNER_PRIVATE_KEY";
pub const SIGNER_KEY_PEM_ENV: &str = "SIGNER_KEY_PEM";
pub const ENS_RPC_URL_ENV: &str = "ENS_RPC_URL";
pub const BASE_RPC_URL_ENV: &str = "BASE_RPC_URL";
pub const BASENAME_REGISTRY_ENV: &str = "BASENAME_REGISTRY_ADDRESS";
pub const HISTORY_LOOKBACK_ENV: &str = "HISTORY_LOOKBACK_BLOCKS";

/// Logging format selector, read directly by `main` before config loads.
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;

/// Name of the distributor address variable for `network`.
pub fn distributor_env(network: Network) -> String {
    format!("DISTRIBUTOR_ADDRESS_{}", network.key().to_uppercase())
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{var} is required")]
    Missing { var: String },

    #[error("{var} is invalid: {reason}")]
    Invalid { var: String, reason: String },

    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ConfigError {
    fn invalid(var: &str, reason: impl fmt::Display) -> Self {
        ConfigError::Invalid {
            var: var.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Where the signing key comes from.
#[derive(Clone)]
pub enum SignerSource {
    Hex(String),
    PemFile(PathBuf),
}

impl fmt::Debug for SignerSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignerSource::Hex(_) => f.write_str("Hex(<redacted>)"),
            SignerSource::PemFile(path) => f.debug_tuple("PemFile").field(path).finish(),
        }
    }
}

/// Fully resolved service configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub network: Network,
    pub rpc_url: String,
    pub distributor: Address,
    pub signer: SignerSource,
    pub ens_rpc_url: String,
    pub base_rpc_url: String,
    pub basename_registry: Option<Address>,
    pub history_lookback: u64,
}

impl AppConfig {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Load using `lookup` to read variables. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |var: &str| lookup(var).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let host = get(HOST_ENV).unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = match get(PORT_ENV) {
            Some(raw) => raw.parse::<u16>().map_err(|e| ConfigError::invalid(PORT_ENV, e))?,
            None => DEFAULT_PORT,
        };
        let bind_addr: SocketAddr = format!("{host}:{port}")
            .parse()
            .map_err(|e| ConfigError::invalid(HOST_ENV, e))?;

        let network = match get(NETWORK_ENV) {
            Some(raw) => raw
                .parse::<Network>()
                .map_err(|_| ConfigError::invalid(NETWORK_ENV, format!("unsupported network '{raw}'")))?,
            None => Network::Optimism,
        };

        let rpc_url = get(RPC_URL_ENV).unwrap_or_else(|| network.config().rpc_url.to_string());

        let distributor_var = distributor_env(network);
        let distributor = parse_address(
            &distributor_var,
            &get(&distributor_var).ok_or_else(|| ConfigError::Missing {
                var: distributor_var.clone(),
            })?,
        )?;

        let signer = match (get(SIGNER_PRIVATE_KEY_ENV), get(SIGNER_KEY_PEM_ENV)) {
            (Some(hex), _) => SignerSource::Hex(hex),
            (None, Some(path)) => SignerSource::PemFile(PathBuf::from(path)),
            (None, None) => {
                return Err(ConfigError::Missing {
                    var: format!("{SIGNER_PRIVATE_KEY_ENV} or {SIGNER_KEY_PEM_ENV}"),
                })
            }
        };

        let basename_registry = get(BASENAME_REGISTRY_ENV)
            .map(|raw| parse_address(BASENAME_REGISTRY_ENV, &raw))
            .transpose()?;

        let history_lookback = match get(HISTORY_LOOKBACK_ENV) {
            Some(raw) => raw
                .parse::<u64>()
                .map_err(|e| ConfigError::invalid(HISTORY_LOOKBACK_ENV, e))?,
            None => DEFAULT_HISTORY_LOOKBACK,
        };

        Ok(Self {
            bind_addr,
            network,
            rpc_url,
            distributor,
            signer,
            ens_rpc_url: get(ENS_RPC_URL_ENV).unwrap_or_else(|| ETHEREUM_RPC_URL.to_string()),
            base_rpc_url: get(BASE_RPC_URL_ENV)
                .unwrap_or_else(|| Network::Base.config().rpc_url.to_string()),
            basename_registry,
            history_lookback,
        })
    }
}

impl SignerSource {
    /// Read the key material, returning it as hex.
    pub fn load_hex(&self) -> Result<String, ConfigError> {
        match self {
            SignerSource::Hex(hex) => Ok(hex.clone()),
            SignerSource::PemFile(path) => {
                let bytes = std::fs::read(path).map_err(|source| ConfigError::Io {
                    path: path.clone(),
                    source,
                })?;
                crate::blockchain::signing::pem_to_hex(&bytes)
                    .map_err(|e| ConfigError::invalid(SIGNER_KEY_PEM_ENV, e))
            }
        }
    }
}

fn parse_address(var: &str, raw: &str) -> Result<Address, ConfigError> {
    let address: Address = raw.parse().map_err(|e| ConfigError::invalid(var, e))?;
    if address.is_zero() {
        return Err(ConfigError::invalid(var, "zero address"));
    }
    Ok(address)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::io::Write;

    use super::*;

    const DISTRIBUTOR: &str = "0x1111111111111111111111111111111111111111";

    fn load(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|var| map.get(var).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[
            ("DISTRIBUTOR_ADDRESS_OPTIMISM", DISTRIBUTOR),
            ("SIGNER_PRIVATE_KEY", "abcd"),
        ])
        .unwrap();
        assert_eq!(config.bind_addr, "0.0.0.0:8080".parse().unwrap());
        assert_eq!(config.network, Network::Optimism);
        assert_eq!(config.rpc_url, "https://mainnet.optimism.io");
        assert_eq!(config.ens_rpc_url, "https://eth.llamarpc.com");
        assert_eq!(config.base_rpc_url, "https://mainnet.base.org");
        assert_eq!(config.basename_registry, None);
        assert_eq!(config.history_lookback, 1000);
    }

    #[test]
    fn test_distributor_follows_network() {
        let err = load(&[
            ("NETWORK", "base"),
            ("DISTRIBUTOR_ADDRESS_OPTIMISM", DISTRIBUTOR),
            ("SIGNER_PRIVATE_KEY", "abcd"),
        ])
        .unwrap_err();
        assert!(matches!(err, ConfigError::Missing { ref var } if var == "DISTRIBUTOR_ADDRESS_BASE"));

        let config = load(&[
            ("NETWORK", "42161"),
            ("DISTRIBUTOR_ADDRESS_ARBITRUM", DISTRIBUTOR),
            ("SIGNER_PRIVATE_KEY", "abcd"),
            ("RPC_URL", "http://localhost:8545"),
        ])
        .unwrap();
        assert_eq!(config.network, Network::Arbitrum);
        assert_eq!(config.rpc_url, "http://localhost:8545");
    }

    #[test]
    fn test_rejects_bad_values() {
        let base = [("DISTRIBUTOR_ADDRESS_OPTIMISM", DISTRIBUTOR), ("SIGNER_PRIVATE_KEY", "abcd")];

        let with = |extra: (&'static str, &'static str)| {
            let mut vars = base.to_vec();
            vars.push(extra);
            load(&vars)
        };

        assert!(matches!(with(("NETWORK", "polygon")), Err(ConfigError::Invalid { .. })));
        assert!(matches!(with(("PORT", "http")), Err(ConfigError::Invalid { .. })));
        assert!(matches!(
            with(("HISTORY_LOOKBACK_BLOCKS", "-1")),
            Err(ConfigError::Invalid { .. })
        ));
        assert!(matches!(
            with(("BASENAME_REGISTRY_ADDRESS", "0x0000000000000000000000000000000000000000")),
            Err(ConfigError::Invalid { .. })
        ));
    }

    #[test]
    fn test_signer_is_required() {
        let err = load(&[("DISTRIBUTOR_ADDRESS_OPTIMISM", DISTRIBUTOR)]).unwrap_err();
        assert!(matches!(err, ConfigError::Missing { .. }));
    }

    #[test]
    fn test_signer_debug_is_redacted() {
        let source = SignerSource::Hex("deadbeef".into());
        assert!(!format!("{source:?}").contains("deadbeef"));
    }

    #[test]
    fn test_pem_file_signer() {
        use k256::pkcs8::{EncodePrivateKey, LineEnding};

        let key = k256::SecretKey::from_slice(&[0x07; 32]).unwrap();
        let pem = key.to_pkcs8_pem(LineEnding::LF).unwrap();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(pem.as_bytes()).unwrap();

        let path = file.path().to_string_lossy().to_string();
        let config = load(&[
            ("DISTRIBUTOR_ADDRESS_OPTIMISM", DISTRIBUTOR),
            ("SIGNER_KEY_PEM", path.as_str()),
        ])
        .unwrap();
        assert!(matches!(config.signer, SignerSource::PemFile(_)));
        assert_eq!(config.signer.load_hex().unwrap(), "07".repeat(32));
    }

    #[test]
    fn test_missing_pem_file() {
        let source = SignerSource::PemFile(PathBuf::from("/nonexistent/key.pem"));
        assert!(matches!(source.load_hex(), Err(ConfigError::Io { .. })));
    }
}
