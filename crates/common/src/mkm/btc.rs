//! Checksummed base58 addresses.
//!
//! ```text
//! digest  = ripemd160(sha256(fingerprint))
//! head    = network || digest           (21 bytes)
//! code    = sha256(sha256(head))[0..4]
//! address = base58(head || code)        (25 bytes)
//! ```

use std::sync::Arc;

use super::address::AddressError;
use super::entity::EntityType;
use crate::crypto::{hash160, sha256d};

const HEAD_SIZE: usize = 21;
const CODE_SIZE: usize = 4;
const PAYLOAD_SIZE: usize = HEAD_SIZE + CODE_SIZE;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BtcAddress {
    address: Arc<str>,
    network: EntityType,
}

impl BtcAddress {
    /// Derive the address of `fingerprint` (a meta fingerprint or public
    /// key bytes) on `network`
    pub fn generate(fingerprint: &[u8], network: EntityType) -> Self {
        let mut payload = Vec::with_capacity(PAYLOAD_SIZE);
        payload.push(network.0);
        payload.extend_from_slice(&hash160(fingerprint));
        let code = check_code(&payload);
        payload.extend_from_slice(&code);

        Self {
            address: bs58::encode(payload).into_string().into(),
            network,
        }
    }

    /// Decode a base58 address and verify its check code
    pub fn parse(address: &str) -> Result<Self, AddressError> {
        let payload = bs58::decode(address)
            .into_vec()
            .map_err(|e| AddressError::Base58(e.to_string()))?;
        if payload.len() != PAYLOAD_SIZE {
            return Err(AddressError::InvalidFormat(format!(
                "decoded address must be {} bytes, got {}",
                PAYLOAD_SIZE,
                payload.len()
            )));
        }
        let (head, code) = payload.split_at(HEAD_SIZE);
        if check_code(head) != code {
            return Err(AddressError::InvalidChecksum);
        }
        Ok(Self {
            address: address.into(),
            network: EntityType(head[0]),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.address
    }

    pub fn network(&self) -> EntityType {
        self.network
    }
}

fn check_code(head: &[u8]) -> [u8; CODE_SIZE] {
    let digest = sha256d(head);
    let mut code = [0u8; CODE_SIZE];
    code.copy_from_slice(&digest[..CODE_SIZE]);
    code
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_known_addresses() {
        let cases = [
            (EntityType::USER, "1HeqNjAst5TCQ63F7xhjg6bcTbDKrRk7sH"),
            (EntityType::GROUP, "gzSMqUAbFv5DXBL9P34ADsQ66UGdmjFjm"),
            (EntityType(8), "4WMfFbZBZXACwZ9wKKNHZ6muVdGsXBW8Jy"),
        ];
        for (network, expected) in cases {
            let address = BtcAddress::generate(b"hello", network);
            assert_eq!(address.as_str(), expected);
            assert_eq!(address.network(), network);
        }
    }

    #[test]
    fn test_round_trip_keeps_network() {
        for network in [EntityType::USER, EntityType::GROUP, EntityType::ISP] {
            let address = BtcAddress::generate(b"moky", network);
            let parsed = BtcAddress::parse(address.as_str()).unwrap();
            assert_eq!(parsed, address);
            assert_eq!(parsed.network(), network);
        }
    }

    #[test]
    fn test_corruption_rejected() {
        let address = BtcAddress::generate(b"hello", EntityType::USER);
        let mut chars: Vec<char> = address.as_str().chars().collect();
        let last = chars.len() - 1;
        chars[last] = if chars[last] == 'z' { 'y' } else { 'z' };
        let corrupted: String = chars.into_iter().collect();

        assert!(BtcAddress::parse(&corrupted).is_err());
    }

    #[test]
    fn test_invalid_base58() {
        assert!(matches!(
            BtcAddress::parse("0OIl0OIl0OIl0OIl0OIl0OIl0OIl"),
            Err(AddressError::Base58(_))
        ));
        assert!(matches!(
            BtcAddress::parse("1111111111111111111111111111"),
            Err(AddressError::InvalidFormat(_))
        ));
    }
}
