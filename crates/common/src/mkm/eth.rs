//! Raw-hash addresses, as used by Ethereum.
//!
//! ```text
//! digest  = keccak256(x || y)[12..32]
//! address = "0x" + eip55(hex(digest))
//! ```

use std::sync::Arc;

use k256::ecdsa::VerifyingKey;

use super::address::AddressError;
use crate::crypto::keccak256;

const PREFIX: &str = "0x";
/// `0x` followed by 40 hex digits
pub const ETH_ADDRESS_LENGTH: usize = 42;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EthAddress {
    address: Arc<str>,
}

impl EthAddress {
    /// Derive the address of a secp256k1 public key.
    ///
    /// Accepts the uncompressed point with or without its `0x04` prefix,
    /// or the 33-byte compressed point.
    pub fn generate(public_key: &[u8]) -> Result<Self, AddressError> {
        let point = match public_key.len() {
            65 => public_key[1..].to_vec(),
            64 => public_key.to_vec(),
            33 => {
                let key = VerifyingKey::from_sec1_bytes(public_key)
                    .map_err(|e| AddressError::InvalidFormat(format!("public key: {}", e)))?;
                key.to_encoded_point(false).as_bytes()[1..].to_vec()
            }
            len => {
                return Err(AddressError::InvalidFormat(format!(
                    "unsupported public key length: {}",
                    len
                )))
            }
        };
        let digest = keccak256(&point);
        let address = format!("{}{}", PREFIX, eip55(&hex::encode(&digest[12..])));
        Ok(Self {
            address: address.into(),
        })
    }

    /// Accept any `0x`-prefixed 40-digit hex string; the mixed-case
    /// checksum is not enforced
    pub fn parse(address: &str) -> Result<Self, AddressError> {
        if address.len() != ETH_ADDRESS_LENGTH {
            return Err(AddressError::InvalidLength(address.len()));
        }
        let Some(digits) = address.strip_prefix(PREFIX) else {
            return Err(AddressError::InvalidFormat(format!(
                "missing {} prefix: {}",
                PREFIX, address
            )));
        };
        if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(AddressError::InvalidFormat(format!(
                "non-hex characters: {}",
                address
            )));
        }
        Ok(Self {
            address: address.into(),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.address
    }

    /// Whether the address carries a valid EIP-55 mixed-case checksum
    pub fn is_checksummed(&self) -> bool {
        let digits = &self.address[PREFIX.len()..];
        eip55(&digits.to_ascii_lowercase()) == digits
    }
}

/// Uppercase each hex letter whose matching nibble of
/// `keccak256(lowercase hex)` is 8 or more
fn eip55(lower_hex: &str) -> String {
    let hash = keccak256(lower_hex.as_bytes());
    lower_hex
        .chars()
        .enumerate()
        .map(|(i, c)| {
            let byte = hash[i / 2];
            let nibble = if i % 2 == 0 { byte >> 4 } else { byte & 0x0f };
            if c.is_ascii_alphabetic() && nibble >= 8 {
                c.to_ascii_uppercase()
            } else {
                c
            }
        })
        .collect()
}
