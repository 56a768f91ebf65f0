// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Loading the distribution signer from PEM key material.
//!
//! Operators may hand the service either a raw hex key or a PEM file. Both
//! SEC1 (`EC PRIVATE KEY`) and PKCS#8 (`PRIVATE KEY`) encodings of a
//! secp256k1 key are accepted.

use k256::{pkcs8::DecodePrivateKey, SecretKey};

use super::client::ChainError;

/// Decode a PEM private key and return it as bare hex.
pub fn pem_to_hex(pem_bytes: &[u8]) -> Result<String, ChainError> {
    let pem_str = std::str::from_utf8(pem_bytes)
        .map_err(|e| ChainError::InvalidPrivateKey(format!("Invalid UTF-8: {e}")))?;

    let block = pem::parse(pem_str.trim())
        .map_err(|e| ChainError::InvalidPrivateKey(format!("Invalid PEM: {e}")))?;

    let secret_key = match block.tag() {
        "EC PRIVATE KEY" => SecretKey::from_sec1_der(block.contents()).map_err(|e| e.to_string()),
        _ => SecretKey::from_pkcs8_der(block.contents())
            .or_else(|_| SecretKey::from_sec1_der(block.contents()))
            .map_err(|e| e.to_string()),
    }
    .map_err(|e| ChainError::InvalidPrivateKey(format!("Invalid key format: {e}")))?;

    Ok(alloy::hex::encode(secret_key.to_bytes()))
}
