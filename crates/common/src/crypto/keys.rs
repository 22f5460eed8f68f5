use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::aes::AesKey;
use super::ecc::{EccPrivateKey, EccPublicKey};
use super::factory::KeyFactories;
use super::info::{self, KeyMap};
use super::plain::PlainKey;
use super::rsa::{RsaPrivateKey, RsaPublicKey};

/// Message used to check that two keys belong together
const PROBE: &[u8] = b"dimid key probe: every key pair should agree on this sentence";

/// Errors that can occur during key operations
#[derive(Debug, thiserror::Error)]
pub enum KeyError {
    #[error("missing key field: {0}")]
    MissingField(&'static str),
    #[error("no key factory registered for algorithm: {0}")]
    UnknownAlgorithm(String),
    #[error("invalid key data: {0}")]
    InvalidData(String),
    #[error("invalid initialization vector size, expected {expected}, got {actual}")]
    InvalidIv { expected: usize, actual: usize },
    #[error("{algorithm} key does not support {operation}")]
    Unsupported {
        algorithm: String,
        operation: &'static str,
    },
    #[error("decryption failed: {0}")]
    Decrypt(String),
    #[error("key error: {0}")]
    Default(#[from] anyhow::Error),
}

/// Capabilities shared by every key
pub trait CryptographyKey {
    /// Algorithm tag from the key map
    fn algorithm(&self) -> &str;

    /// The attribute map this key was built from
    fn info(&self) -> &KeyMap;

    /// Canonical byte form of the key material, decoded on first use
    fn data(&self) -> Result<&[u8], KeyError>;

    fn to_map(&self) -> KeyMap {
        self.info().clone()
    }
}

pub trait EncryptKey: CryptographyKey {
    /// Encrypt `plaintext`.
    ///
    /// Algorithm parameters generated during encryption (the AES IV) are
    /// written into `extra` so the caller can transmit them.
    fn encrypt(&self, plaintext: &[u8], extra: &mut KeyMap) -> Result<Vec<u8>, KeyError>;
}

pub trait DecryptKey: CryptographyKey {
    fn decrypt(&self, ciphertext: &[u8], params: &KeyMap) -> Result<Vec<u8>, KeyError>;
}

pub trait SignKey: CryptographyKey {
    fn sign(&self, data: &[u8]) -> Result<Vec<u8>, KeyError>;
}

pub trait VerifyKey: CryptographyKey {
    /// Check `signature` over `data`. Malformed signatures verify as false.
    fn verify(&self, data: &[u8], signature: &[u8]) -> bool;
}

/// Check that `decrypt_key` recovers what `encrypt_key` encrypts
pub fn match_encrypt_key<E, D>(encrypt_key: &E, decrypt_key: &D) -> bool
where
    E: EncryptKey + ?Sized,
    D: DecryptKey + ?Sized,
{
    let mut params = KeyMap::new();
    let ciphertext = match encrypt_key.encrypt(PROBE, &mut params) {
        Ok(ciphertext) => ciphertext,
        Err(_) => return false,
    };
    matches!(decrypt_key.decrypt(&ciphertext, &params), Ok(plaintext) if plaintext == PROBE)
}

/// Check that `verify_key` accepts what `sign_key` signs
pub fn match_sign_key<S, V>(sign_key: &S, verify_key: &V) -> bool
where
    S: SignKey + ?Sized,
    V: VerifyKey + ?Sized,
{
    match sign_key.sign(PROBE) {
        Ok(signature) => verify_key.verify(PROBE, &signature),
        Err(_) => false,
    }
}

/// Symmetric key for message content encryption
#[derive(Clone)]
pub enum SymmetricKey {
    Aes(AesKey),
    /// No-op key for broadcast messages
    Plain(PlainKey),
}

/// Private half of an asymmetric key pair
#[derive(Clone)]
pub enum PrivateKey {
    Rsa(RsaPrivateKey),
    Ecc(EccPrivateKey),
}

/// Public half of an asymmetric key pair
#[derive(Clone)]
pub enum PublicKey {
    Rsa(RsaPublicKey),
    Ecc(EccPublicKey),
}

macro_rules! delegate_key {
    ($name:ident { $($variant:ident),* }) => {
        impl CryptographyKey for $name {
            fn algorithm(&self) -> &str {
                match self { $($name::$variant(key) => key.algorithm(),)* }
            }

            fn info(&self) -> &KeyMap {
                match self { $($name::$variant(key) => key.info(),)* }
            }

            fn data(&self) -> Result<&[u8], KeyError> {
                match self { $($name::$variant(key) => key.data(),)* }
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                match self { $($name::$variant(key) => fmt::Debug::fmt(key, f),)* }
            }
        }

        impl Serialize for $name {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: Serializer,
            {
                self.info().serialize(serializer)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: Deserializer<'de>,
            {
                let info = KeyMap::deserialize(deserializer)?;
                $name::try_from(info).map_err(serde::de::Error::custom)
            }
        }
    };
}

delegate_key!(SymmetricKey { Aes, Plain });
delegate_key!(PrivateKey { Rsa, Ecc });
delegate_key!(PublicKey { Rsa, Ecc });

impl SymmetricKey {
    /// Generate a new key through the shared factory registry
    pub fn generate(algorithm: &str) -> Result<Self, KeyError> {
        KeyFactories::shared().generate_symmetric_key(algorithm)
    }

    /// Parse a key map through the shared factory registry
    pub fn parse(info: &KeyMap) -> Result<Self, KeyError> {
        KeyFactories::shared().parse_symmetric_key(info)
    }

    fn same_instance(&self, other: &Self) -> bool {
        match (self, other) {
            (SymmetricKey::Aes(a), SymmetricKey::Aes(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl EncryptKey for SymmetricKey {
    fn encrypt(&self, plaintext: &[u8], extra: &mut KeyMap) -> Result<Vec<u8>, KeyError> {
        match self {
            SymmetricKey::Aes(key) => key.encrypt(plaintext, extra),
            SymmetricKey::Plain(key) => key.encrypt(plaintext, extra),
        }
    }
}

impl DecryptKey for SymmetricKey {
    fn decrypt(&self, ciphertext: &[u8], params: &KeyMap) -> Result<Vec<u8>, KeyError> {
        match self {
            SymmetricKey::Aes(key) => key.decrypt(ciphertext, params),
            SymmetricKey::Plain(key) => key.decrypt(ciphertext, params),
        }
    }
}

impl PartialEq for SymmetricKey {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (SymmetricKey::Aes(_), SymmetricKey::Aes(_))
            | (SymmetricKey::Plain(_), SymmetricKey::Plain(_)) => {
                self.same_instance(other) || match_encrypt_key(self, other)
            }
            _ => false,
        }
    }
}

impl TryFrom<KeyMap> for SymmetricKey {
    type Error = KeyError;
    fn try_from(info: KeyMap) -> Result<Self, Self::Error> {
        Self::parse(&info)
    }
}

impl PrivateKey {
    pub fn generate(algorithm: &str) -> Result<Self, KeyError> {
        KeyFactories::shared().generate_private_key(algorithm)
    }

    pub fn parse(info: &KeyMap) -> Result<Self, KeyError> {
        KeyFactories::shared().parse_private_key(info)
    }

    /// Public key matching this private key, derived once and cached
    pub fn public_key(&self) -> Result<PublicKey, KeyError> {
        match self {
            PrivateKey::Rsa(key) => key.public_key().cloned().map(PublicKey::Rsa),
            PrivateKey::Ecc(key) => key.public_key().cloned().map(PublicKey::Ecc),
        }
    }

    fn same_instance(&self, other: &Self) -> bool {
        match (self, other) {
            (PrivateKey::Rsa(a), PrivateKey::Rsa(b)) => a.ptr_eq(b),
            (PrivateKey::Ecc(a), PrivateKey::Ecc(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl SignKey for PrivateKey {
    fn sign(&self, data: &[u8]) -> Result<Vec<u8>, KeyError> {
        match self {
            PrivateKey::Rsa(key) => key.sign(data),
            PrivateKey::Ecc(key) => key.sign(data),
        }
    }
}

impl DecryptKey for PrivateKey {
    fn decrypt(&self, ciphertext: &[u8], params: &KeyMap) -> Result<Vec<u8>, KeyError> {
        match self {
            PrivateKey::Rsa(key) => key.decrypt(ciphertext, params),
            PrivateKey::Ecc(key) => Err(KeyError::Unsupported {
                algorithm: key.algorithm().to_string(),
                operation: "decryption",
            }),
        }
    }
}

impl PartialEq for PrivateKey {
    fn eq(&self, other: &Self) -> bool {
        if self.same_instance(other) {
            return true;
        }
        match other.public_key() {
            Ok(public_key) => match_sign_key(self, &public_key),
            Err(_) => false,
        }
    }
}

impl TryFrom<KeyMap> for PrivateKey {
    type Error = KeyError;
    fn try_from(info: KeyMap) -> Result<Self, Self::Error> {
        Self::parse(&info)
    }
}

impl PublicKey {
    pub fn parse(info: &KeyMap) -> Result<Self, KeyError> {
        KeyFactories::shared().parse_public_key(info)
    }

    /// Key bytes in their stored encoding, as hashed into addresses.
    ///
    /// ECC keys keep a compressed point compressed here; RSA keys have a
    /// single encoding and return `data()`.
    pub fn raw_data(&self) -> Result<&[u8], KeyError> {
        match self {
            PublicKey::Rsa(key) => key.data(),
            PublicKey::Ecc(key) => key.raw_data(),
        }
    }
}

impl VerifyKey for PublicKey {
    fn verify(&self, data: &[u8], signature: &[u8]) -> bool {
        match self {
            PublicKey::Rsa(key) => key.verify(data, signature),
            PublicKey::Ecc(key) => key.verify(data, signature),
        }
    }
}

impl EncryptKey for PublicKey {
    fn encrypt(&self, plaintext: &[u8], extra: &mut KeyMap) -> Result<Vec<u8>, KeyError> {
        match self {
            PublicKey::Rsa(key) => key.encrypt(plaintext, extra),
            PublicKey::Ecc(key) => Err(KeyError::Unsupported {
                algorithm: key.algorithm().to_string(),
                operation: "encryption",
            }),
        }
    }
}

impl PartialEq for PublicKey {
    fn eq(&self, other: &Self) -> bool {
        let same_family = matches!(
            (self, other),
            (PublicKey::Rsa(_), PublicKey::Rsa(_)) | (PublicKey::Ecc(_), PublicKey::Ecc(_))
        );
        same_family
            && match (self.data(), other.data()) {
                (Ok(a), Ok(b)) => a == b,
                _ => info::get_str(self.info(), info::field::DATA)
                    == info::get_str(other.info(), info::field::DATA),
            }
    }
}

impl TryFrom<KeyMap> for PublicKey {
    type Error = KeyError;
    fn try_from(info: KeyMap) -> Result<Self, Self::Error> {
        Self::parse(&info)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::crypto::info::algorithm;

    #[test]
    fn test_symmetric_equality_is_behavioral() {
        let key = SymmetricKey::generate(algorithm::AES).unwrap();
        let copy = SymmetricKey::parse(&key.to_map()).unwrap();
        assert!(key == copy);

        let other = SymmetricKey::generate(algorithm::AES).unwrap();
        assert!(key != other);

        let plain = SymmetricKey::generate(algorithm::PLAIN).unwrap();
        assert!(plain == SymmetricKey::generate(algorithm::PLAIN).unwrap());
        assert!(key != plain);
        assert!(plain != key);
    }

    #[test]
    fn test_private_key_equality_across_algorithms() {
        let rsa = PrivateKey::generate(algorithm::RSA).unwrap();
        let ecc = PrivateKey::generate(algorithm::ECC).unwrap();
        assert!(rsa != ecc);
        assert!(ecc != rsa);

        let ecc_copy = PrivateKey::parse(&ecc.to_map()).unwrap();
        assert!(ecc == ecc_copy);
    }

    #[test]
    fn test_public_key_equality_compares_data() {
        let key = PrivateKey::generate(algorithm::ECC).unwrap();
        let public_key = key.public_key().unwrap();
        let parsed = PublicKey::parse(&public_key.to_map()).unwrap();
        assert!(public_key == parsed);

        let other = PrivateKey::generate(algorithm::ECC)
            .unwrap()
            .public_key()
            .unwrap();
        assert!(public_key != other);
    }

    #[test]
    fn test_raw_data_keeps_stored_encoding() {
        let generator = "79be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798";
        let parse = |data: String| {
            let mut info = KeyMap::new();
            info.insert("algorithm".into(), algorithm::ECC.into());
            info.insert("data".into(), data.into());
            PublicKey::parse(&info).unwrap()
        };
        let compressed = parse(format!("02{}", generator));
        let uncompressed = parse(format!(
            "04{}483ada7726a3c4655da4fbfc0e1108a8fd17b448a68554199c47d08ffb10d4b8",
            generator
        ));

        assert_eq!(compressed.raw_data().unwrap().len(), 33);
        assert_eq!(uncompressed.raw_data().unwrap().len(), 65);
        assert_eq!(compressed.data().unwrap(), uncompressed.data().unwrap());
        assert!(compressed == uncompressed);
    }

    #[test]
    fn test_ecc_does_not_encrypt() {
        let key = PrivateKey::generate(algorithm::ECC).unwrap();
        let public_key = key.public_key().unwrap();
        let mut extra = KeyMap::new();
        assert!(matches!(
            public_key.encrypt(b"hi", &mut extra),
            Err(KeyError::Unsupported { .. })
        ));
        assert!(matches!(
            key.decrypt(b"hi", &extra),
            Err(KeyError::Unsupported { .. })
        ));
    }

    #[test]
    fn test_serde_round_trip_through_map() {
        let key = PrivateKey::generate(algorithm::ECC).unwrap();
        let json = serde_json::to_string(&key).unwrap();
        let parsed: PrivateKey = serde_json::from_str(&json).unwrap();
        assert!(key == parsed);

        let bad = serde_json::from_str::<PrivateKey>(r#"{"algorithm": "DSA", "data": "x"}"#);
        assert!(bad.is_err());
    }
}
