use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::btc::BtcAddress;
use super::entity::EntityType;
use super::eth::EthAddress;
use crate::crypto::KeyError;

/// Errors that can occur while deriving or parsing addresses
#[derive(Debug, thiserror::Error)]
pub enum AddressError {
    #[error("empty address")]
    Empty,
    #[error("unrecognized address length: {0}")]
    InvalidLength(usize),
    #[error("base58 decode error: {0}")]
    Base58(String),
    #[error("address check code mismatch")]
    InvalidChecksum,
    #[error("invalid address format: {0}")]
    InvalidFormat(String),
    #[error("key error: {0}")]
    Key(#[from] KeyError),
    #[error("address error: {0}")]
    Default(#[from] anyhow::Error),
}

/// Address of one of the two broadcast pseudo-entities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BroadcastAddress {
    name: &'static str,
    network: EntityType,
}

impl BroadcastAddress {
    pub fn as_str(&self) -> &'static str {
        self.name
    }

    pub fn network(&self) -> EntityType {
        self.network
    }
}

/// Broadcast address for "any one station"
pub const ANYWHERE: Address = Address::Broadcast(BroadcastAddress {
    name: "anywhere",
    network: EntityType::ANY,
});

/// Broadcast address for "all stations"
pub const EVERYWHERE: Address = Address::Broadcast(BroadcastAddress {
    name: "everywhere",
    network: EntityType::EVERY,
});

/// Entity address
///
/// Addresses compare, hash and display by their string form.
#[derive(Clone)]
pub enum Address {
    /// Checksummed base58 address
    Btc(BtcAddress),
    /// `0x`-prefixed raw-hash address
    Eth(EthAddress),
    Broadcast(BroadcastAddress),
}

impl Address {
    /// Parse an address string without consulting any cache.
    ///
    /// Broadcast names are matched case-insensitively; 26 to 35 characters
    /// is read as base58 with check code, 42 characters as a raw-hash
    /// address.
    pub fn parse(address: &str) -> Result<Self, AddressError> {
        match address.len() {
            0 => return Err(AddressError::Empty),
            8 if address.eq_ignore_ascii_case(ANYWHERE.as_str()) => return Ok(ANYWHERE),
            10 if address.eq_ignore_ascii_case(EVERYWHERE.as_str()) => return Ok(EVERYWHERE),
            _ => {}
        }
        match address.len() {
            26..=35 => BtcAddress::parse(address).map(Address::Btc),
            42 => EthAddress::parse(address).map(Address::Eth),
            len => Err(AddressError::InvalidLength(len)),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Address::Btc(address) => address.as_str(),
            Address::Eth(address) => address.as_str(),
            Address::Broadcast(address) => address.as_str(),
        }
    }

    pub fn network(&self) -> EntityType {
        match self {
            Address::Btc(address) => address.network(),
            Address::Eth(_) => EntityType::USER,
            Address::Broadcast(address) => address.network(),
        }
    }

    pub fn is_broadcast(&self) -> bool {
        self.network().is_broadcast()
    }

    pub fn is_user(&self) -> bool {
        self.network().is_user()
    }

    pub fn is_group(&self) -> bool {
        self.network().is_group()
    }
}

impl PartialEq for Address {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl Eq for Address {}

impl std::hash::Hash for Address {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.as_str().hash(state)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({}, {})", self.as_str(), self.network())
    }
}

impl std::str::FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Address::parse(s)
    }
}

impl Serialize for Address {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Address::parse(&s).map_err(serde::de::Error::custom)
    }
}
