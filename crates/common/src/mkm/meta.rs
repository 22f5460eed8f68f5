//! Meta: the public key and seed an entity's address is derived from.
//!
//! ```text
//! {
//!     "type"       : "1",          // "1" MKM, "2" BTC, "4" ETH
//!     "key"        : {...},        // public key map
//!     "seed"       : "moky",       // optional, becomes the identifier name
//!     "fingerprint": "{BASE64}"    // sign(seed, private key)
//! }
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use super::address::{Address, AddressError};
use super::btc::BtcAddress;
use super::entity::EntityType;
use super::eth::EthAddress;
use super::identifier::{Identifier, IdentifierError};
use crate::crypto::info::{self, KeyMap};
use crate::crypto::{CryptographyKey, KeyError, PrivateKey, PublicKey, SignKey, VerifyKey};

/// Errors that can occur while generating or parsing metas
#[derive(Debug, thiserror::Error)]
pub enum MetaError {
    #[error("missing meta field: {0}")]
    MissingField(&'static str),
    #[error("unknown meta type: {0}")]
    UnknownType(String),
    #[error("meta seed and fingerprint must be both present or both absent")]
    IncompleteFingerprint,
    #[error("invalid meta: {0}")]
    Invalid(String),
    #[error("meta key error: {0}")]
    Key(#[from] KeyError),
    #[error("meta address error: {0}")]
    Address(#[from] AddressError),
    #[error("meta identifier error: {0}")]
    Identifier(#[from] IdentifierError),
    #[error("meta error: {0}")]
    Default(#[from] anyhow::Error),
}

/// Address scheme of a meta
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetaType {
    /// Checksummed address of the fingerprint; requires a seed
    Mkm,
    /// Checksummed address of the public key bytes
    Btc,
    /// Raw-hash address of an ECC public key
    Eth,
}

impl MetaType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetaType::Mkm => "1",
            MetaType::Btc => "2",
            MetaType::Eth => "4",
        }
    }

    /// Parse a type tag; the numeric forms and the names are both accepted
    pub fn parse(tag: &str) -> Result<Self, MetaError> {
        match tag.trim().to_ascii_lowercase().as_str() {
            "1" | "mkm" => Ok(MetaType::Mkm),
            "2" | "btc" => Ok(MetaType::Btc),
            "4" | "eth" => Ok(MetaType::Eth),
            _ => Err(MetaError::UnknownType(tag.to_string())),
        }
    }

    fn from_value(value: &Value) -> Result<Self, MetaError> {
        match value {
            Value::String(tag) => Self::parse(tag),
            Value::Number(number) => Self::parse(&number.to_string()),
            other => Err(MetaError::UnknownType(other.to_string())),
        }
    }
}

impl fmt::Display for MetaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for MetaType {
    type Err = MetaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MetaType::parse(s)
    }
}

/// Entity meta
///
/// Clones share the per-network address memo.
#[derive(Clone)]
pub struct Meta(Arc<MetaInner>);

struct MetaInner {
    meta_type: MetaType,
    key: PublicKey,
    seed: Option<String>,
    fingerprint: Option<Vec<u8>>,
    addresses: RwLock<HashMap<EntityType, Address>>,
}

impl fmt::Debug for Meta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Meta")
            .field("type", &self.0.meta_type)
            .field("key", &self.0.key)
            .field("seed", &self.0.seed)
            .finish_non_exhaustive()
    }
}

impl Meta {
    fn build(
        meta_type: MetaType,
        key: PublicKey,
        seed: Option<String>,
        fingerprint: Option<Vec<u8>>,
    ) -> Self {
        Self(Arc::new(MetaInner {
            meta_type,
            key,
            seed,
            fingerprint,
            addresses: RwLock::new(HashMap::new()),
        }))
    }

    /// Create a meta for `private_key`, signing `seed` into the fingerprint
    pub fn generate(
        meta_type: MetaType,
        private_key: &PrivateKey,
        seed: Option<&str>,
    ) -> Result<Self, MetaError> {
        let key = private_key.public_key()?;
        let seed = seed.filter(|seed| !seed.is_empty());
        let fingerprint = match seed {
            Some(seed) => Some(private_key.sign(seed.as_bytes())?),
            None => None,
        };
        let meta = Self::build(meta_type, key, seed.map(str::to_string), fingerprint);
        meta.validate()?;
        Ok(meta)
    }

    /// Read a meta map, returning it only if the fingerprint checks out
    pub fn parse(map: &KeyMap) -> Result<Self, MetaError> {
        let meta_type = map.get("type").ok_or(MetaError::MissingField("type"))?;
        let meta_type = MetaType::from_value(meta_type)?;
        let key = match map.get("key") {
            Some(Value::Object(key)) => PublicKey::parse(key)?,
            Some(_) => return Err(MetaError::Invalid("key must be an object".to_string())),
            None => return Err(MetaError::MissingField("key")),
        };
        let seed = map.get("seed").and_then(Value::as_str);
        let fingerprint = map.get("fingerprint").and_then(Value::as_str);
        let fingerprint = match (seed, fingerprint) {
            (Some(_), Some(fingerprint)) => Some(info::decode_base64(fingerprint)?),
            (None, None) => None,
            _ => return Err(MetaError::IncompleteFingerprint),
        };

        let meta = Self::build(meta_type, key, seed.map(str::to_string), fingerprint);
        meta.validate()?;
        Ok(meta)
    }

    /// Check the fingerprint against the seed and the type's requirements
    pub fn validate(&self) -> Result<(), MetaError> {
        let inner = &self.0;
        match (&inner.seed, &inner.fingerprint) {
            (Some(seed), Some(fingerprint)) => {
                if !inner.key.verify(seed.as_bytes(), fingerprint) {
                    return Err(MetaError::Invalid(
                        "fingerprint does not match seed".to_string(),
                    ));
                }
            }
            (None, None) if inner.meta_type == MetaType::Mkm => {
                return Err(MetaError::Invalid("MKM meta requires a seed".to_string()));
            }
            (None, None) => {}
            _ => return Err(MetaError::IncompleteFingerprint),
        }
        if inner.meta_type == MetaType::Eth && !matches!(inner.key, PublicKey::Ecc(_)) {
            return Err(MetaError::Invalid("ETH meta requires an ECC key".to_string()));
        }
        Ok(())
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    pub fn meta_type(&self) -> MetaType {
        self.0.meta_type
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.0.key
    }

    pub fn seed(&self) -> Option<&str> {
        self.0.seed.as_deref()
    }

    pub fn fingerprint(&self) -> Option<&[u8]> {
        self.0.fingerprint.as_deref()
    }

    /// Address of this meta on `network`, derived once per network.
    ///
    /// ETH addresses carry no network, so `network` is ignored for them.
    pub fn generate_address(&self, network: EntityType) -> Result<Address, MetaError> {
        let network = match self.0.meta_type {
            MetaType::Eth => EntityType::USER,
            _ => network,
        };
        if let Some(address) = self.0.addresses.read().get(&network) {
            return Ok(address.clone());
        }

        let address = match self.0.meta_type {
            MetaType::Mkm => {
                let fingerprint = self
                    .fingerprint()
                    .ok_or(MetaError::MissingField("fingerprint"))?;
                Address::Btc(BtcAddress::generate(fingerprint, network))
            }
            MetaType::Btc => {
                Address::Btc(BtcAddress::generate(self.0.key.raw_data()?, network))
            }
            MetaType::Eth => Address::Eth(EthAddress::generate(self.0.key.raw_data()?)?),
        };
        self.0
            .addresses
            .write()
            .entry(network)
            .or_insert_with(|| address.clone());
        Ok(address)
    }

    /// Whether `identifier` was generated from this meta
    pub fn matches_identifier(&self, identifier: &Identifier) -> bool {
        if identifier.name() != self.seed() {
            return false;
        }
        match self.generate_address(identifier.network()) {
            Ok(address) => &address == identifier.address(),
            Err(_) => false,
        }
    }

    /// Whether `key` is this meta's key, or signed this meta's seed
    pub fn matches_public_key(&self, key: &PublicKey) -> bool {
        if &self.0.key == key {
            return true;
        }
        match (self.seed(), self.fingerprint()) {
            (Some(seed), Some(fingerprint)) => key.verify(seed.as_bytes(), fingerprint),
            _ => false,
        }
    }

    pub fn to_map(&self) -> KeyMap {
        let mut map = KeyMap::new();
        map.insert("type".into(), self.0.meta_type.as_str().into());
        map.insert("key".into(), Value::Object(self.0.key.to_map()));
        if let Some(seed) = self.seed() {
            map.insert("seed".into(), seed.into());
        }
        if let Some(fingerprint) = self.fingerprint() {
            map.insert("fingerprint".into(), info::encode_base64(fingerprint).into());
        }
        map
    }
}

impl Serialize for Meta {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.to_map().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Meta {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let map = KeyMap::deserialize(deserializer)?;
        Meta::parse(&map).map_err(serde::de::Error::custom)
    }
}
