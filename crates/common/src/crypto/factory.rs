//! Algorithm registry mapping tags to key factories.
//!
//! The shared registry comes populated with the built-in algorithms. Extra
//! algorithms can be registered at runtime; lookups take a read lock only.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use parking_lot::RwLock;

use super::aes::AesKey;
use super::ecc::{EccPrivateKey, EccPublicKey};
use super::info::{self, algorithm, KeyMap};
use super::keys::{KeyError, PrivateKey, PublicKey, SymmetricKey};
use super::plain::PlainKey;
use super::rsa::{RsaPrivateKey, RsaPublicKey};

pub trait SymmetricKeyFactory: Send + Sync {
    fn generate_symmetric_key(&self) -> Result<SymmetricKey, KeyError>;
    fn parse_symmetric_key(&self, info: &KeyMap) -> Result<SymmetricKey, KeyError>;
}

pub trait PrivateKeyFactory: Send + Sync {
    fn generate_private_key(&self) -> Result<PrivateKey, KeyError>;
    fn parse_private_key(&self, info: &KeyMap) -> Result<PrivateKey, KeyError>;
}

pub trait PublicKeyFactory: Send + Sync {
    fn parse_public_key(&self, info: &KeyMap) -> Result<PublicKey, KeyError>;
}

/// Registry of key factories by algorithm tag
#[derive(Default)]
pub struct KeyFactories {
    symmetric: RwLock<HashMap<String, Arc<dyn SymmetricKeyFactory>>>,
    private: RwLock<HashMap<String, Arc<dyn PrivateKeyFactory>>>,
    public: RwLock<HashMap<String, Arc<dyn PublicKeyFactory>>>,
}

impl KeyFactories {
    /// An empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the AES, PLAIN, RSA and ECC factories under all
    /// their tags
    pub fn with_defaults() -> Self {
        let factories = Self::new();

        let aes = Arc::new(AesKeyFactory);
        factories.register_symmetric(algorithm::AES, aes.clone());
        factories.register_symmetric(algorithm::AES_CBC_PKCS7, aes);
        factories.register_symmetric(algorithm::PLAIN, Arc::new(PlainKeyFactory));

        let rsa = Arc::new(RsaKeyFactory);
        for tag in [
            algorithm::RSA,
            algorithm::RSA_SHA256,
            algorithm::RSA_ECB_PKCS1,
        ] {
            factories.register_private(tag, rsa.clone());
            factories.register_public(tag, rsa.clone());
        }

        let ecc = Arc::new(EccKeyFactory);
        for tag in [algorithm::ECC, algorithm::ECDSA_SHA256] {
            factories.register_private(tag, ecc.clone());
            factories.register_public(tag, ecc.clone());
        }

        factories
    }

    /// Process-wide registry used by `SymmetricKey::generate` and friends
    pub fn shared() -> &'static KeyFactories {
        static SHARED: OnceLock<KeyFactories> = OnceLock::new();
        SHARED.get_or_init(KeyFactories::with_defaults)
    }

    pub fn register_symmetric(&self, algorithm: &str, factory: Arc<dyn SymmetricKeyFactory>) {
        self.symmetric.write().insert(algorithm.to_string(), factory);
    }

    pub fn register_private(&self, algorithm: &str, factory: Arc<dyn PrivateKeyFactory>) {
        self.private.write().insert(algorithm.to_string(), factory);
    }

    pub fn register_public(&self, algorithm: &str, factory: Arc<dyn PublicKeyFactory>) {
        self.public.write().insert(algorithm.to_string(), factory);
    }

    fn symmetric_factory(&self, algorithm: &str) -> Result<Arc<dyn SymmetricKeyFactory>, KeyError> {
        self.symmetric
            .read()
            .get(algorithm)
            .cloned()
            .ok_or_else(|| KeyError::UnknownAlgorithm(algorithm.to_string()))
    }

    fn private_factory(&self, algorithm: &str) -> Result<Arc<dyn PrivateKeyFactory>, KeyError> {
        self.private
            .read()
            .get(algorithm)
            .cloned()
            .ok_or_else(|| KeyError::UnknownAlgorithm(algorithm.to_string()))
    }

    fn public_factory(&self, algorithm: &str) -> Result<Arc<dyn PublicKeyFactory>, KeyError> {
        self.public
            .read()
            .get(algorithm)
            .cloned()
            .ok_or_else(|| KeyError::UnknownAlgorithm(algorithm.to_string()))
    }

    pub fn generate_symmetric_key(&self, algorithm: &str) -> Result<SymmetricKey, KeyError> {
        self.symmetric_factory(algorithm)?.generate_symmetric_key()
    }

    pub fn parse_symmetric_key(&self, info: &KeyMap) -> Result<SymmetricKey, KeyError> {
        let algorithm = info::get_algorithm(info)?;
        self.symmetric_factory(algorithm)?.parse_symmetric_key(info)
    }

    pub fn generate_private_key(&self, algorithm: &str) -> Result<PrivateKey, KeyError> {
        self.private_factory(algorithm)?.generate_private_key()
    }

    pub fn parse_private_key(&self, info: &KeyMap) -> Result<PrivateKey, KeyError> {
        let algorithm = info::get_algorithm(info)?;
        self.private_factory(algorithm)?.parse_private_key(info)
    }

    pub fn parse_public_key(&self, info: &KeyMap) -> Result<PublicKey, KeyError> {
        let algorithm = info::get_algorithm(info)?;
        self.public_factory(algorithm)?.parse_public_key(info)
    }
}

pub struct AesKeyFactory;

impl SymmetricKeyFactory for AesKeyFactory {
    fn generate_symmetric_key(&self) -> Result<SymmetricKey, KeyError> {
        AesKey::generate().map(SymmetricKey::Aes)
    }

    fn parse_symmetric_key(&self, info: &KeyMap) -> Result<SymmetricKey, KeyError> {
        AesKey::from_map(info.clone()).map(SymmetricKey::Aes)
    }
}

pub struct PlainKeyFactory;

impl SymmetricKeyFactory for PlainKeyFactory {
    fn generate_symmetric_key(&self) -> Result<SymmetricKey, KeyError> {
        Ok(SymmetricKey::Plain(PlainKey::shared()))
    }

    fn parse_symmetric_key(&self, _info: &KeyMap) -> Result<SymmetricKey, KeyError> {
        Ok(SymmetricKey::Plain(PlainKey::shared()))
    }
}

pub struct RsaKeyFactory;

impl PrivateKeyFactory for RsaKeyFactory {
    fn generate_private_key(&self) -> Result<PrivateKey, KeyError> {
        RsaPrivateKey::generate().map(PrivateKey::Rsa)
    }

    fn parse_private_key(&self, info: &KeyMap) -> Result<PrivateKey, KeyError> {
        RsaPrivateKey::from_map(info.clone()).map(PrivateKey::Rsa)
    }
}

impl PublicKeyFactory for RsaKeyFactory {
    fn parse_public_key(&self, info: &KeyMap) -> Result<PublicKey, KeyError> {
        RsaPublicKey::from_map(info.clone()).map(PublicKey::Rsa)
    }
}

pub struct EccKeyFactory;

impl PrivateKeyFactory for EccKeyFactory {
    fn generate_private_key(&self) -> Result<PrivateKey, KeyError> {
        EccPrivateKey::generate().map(PrivateKey::Ecc)
    }

    fn parse_private_key(&self, info: &KeyMap) -> Result<PrivateKey, KeyError> {
        EccPrivateKey::from_map(info.clone()).map(PrivateKey::Ecc)
    }
}

impl PublicKeyFactory for EccKeyFactory {
    fn parse_public_key(&self, info: &KeyMap) -> Result<PublicKey, KeyError> {
        EccPublicKey::from_map(info.clone()).map(PublicKey::Ecc)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::crypto::keys::CryptographyKey;
    use serde_json::json;

    fn map(value: serde_json::Value) -> KeyMap {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_default_tags() {
        let factories = KeyFactories::with_defaults();
        for tag in [algorithm::AES, algorithm::AES_CBC_PKCS7, algorithm::PLAIN] {
            assert!(factories.generate_symmetric_key(tag).is_ok());
        }
        for tag in [algorithm::ECC, algorithm::ECDSA_SHA256] {
            let key = factories.generate_private_key(tag).unwrap();
            assert!(matches!(key, PrivateKey::Ecc(_)));
        }
        let public_key = factories
            .parse_public_key(&map(json!({"algorithm": "SHA256withRSA", "data": "AAAA"})))
            .unwrap();
        assert!(matches!(public_key, PublicKey::Rsa(_)));
    }

    #[test]
    fn test_unknown_algorithm() {
        let factories = KeyFactories::with_defaults();
        assert!(matches!(
            factories.generate_symmetric_key("DES"),
            Err(KeyError::UnknownAlgorithm(tag)) if tag == "DES"
        ));
        assert!(matches!(
            factories.parse_private_key(&map(json!({"algorithm": "DSA", "data": "x"}))),
            Err(KeyError::UnknownAlgorithm(_))
        ));
        assert!(matches!(
            factories.parse_public_key(&map(json!({"data": "x"}))),
            Err(KeyError::MissingField("algorithm"))
        ));
    }

    #[test]
    fn test_empty_registry_and_registration() {
        let factories = KeyFactories::new();
        assert!(factories.generate_symmetric_key(algorithm::PLAIN).is_err());

        factories.register_symmetric("NONE", Arc::new(PlainKeyFactory));
        let key = factories.generate_symmetric_key("NONE").unwrap();
        assert_eq!(key.algorithm(), algorithm::PLAIN);
    }

    #[test]
    fn test_parse_requires_data() {
        let factories = KeyFactories::with_defaults();
        assert!(matches!(
            factories.parse_symmetric_key(&map(json!({"algorithm": "AES"}))),
            Err(KeyError::MissingField("data"))
        ));
        // the plain key carries no material
        assert!(factories
            .parse_symmetric_key(&map(json!({"algorithm": "PLAIN"})))
            .is_ok());
    }
}
