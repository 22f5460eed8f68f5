//! ECDSA keys over secp256k1.
//!
//! Key map format:
//!
//! ```text
//! {
//!     "algorithm": "ECC",
//!     "data"     : "{HEX}",   // private: 32-byte scalar, public: SEC1 point
//!     "curve"    : "SECP256k1",
//!     "digest"   : "SHA256"
//! }
//! ```
//!
//! Messages are hashed with SHA-256 and the digest is signed directly.
//! Signatures are DER encoded; raw 64-byte `r || s` is accepted on verify.

use std::fmt;
use std::sync::Arc;

use k256::ecdsa::signature::hazmat::{PrehashSigner, PrehashVerifier};
use k256::ecdsa::{Signature, SigningKey, VerifyingKey};
use once_cell::race::OnceBox;
use rand::rngs::OsRng;

use super::digest::sha256;
use super::info::{self, algorithm, field, KeyMap};
use super::keys::{CryptographyKey, KeyError, SignKey, VerifyKey};

pub const CURVE_SECP256K1: &str = "SECP256k1";
/// Private scalar size in bytes
pub const PRIVATE_KEY_SIZE: usize = 32;
/// Uncompressed SEC1 point size, including the `0x04` prefix
pub const PUBLIC_KEY_SIZE: usize = 65;
/// Raw `r || s` signature size
pub const SIGNATURE_SIZE: usize = 64;

/// secp256k1 private key
#[derive(Clone)]
pub struct EccPrivateKey(Arc<EccPrivateKeyInner>);

struct EccPrivateKeyInner {
    info: KeyMap,
    handle: OnceBox<SigningKey>,
    data: OnceBox<Vec<u8>>,
    public_key: OnceBox<EccPublicKey>,
}

/// secp256k1 public key
#[derive(Clone)]
pub struct EccPublicKey(Arc<EccPublicKeyInner>);

struct EccPublicKeyInner {
    info: KeyMap,
    handle: OnceBox<VerifyingKey>,
    data: OnceBox<Vec<u8>>,
    raw: OnceBox<Vec<u8>>,
}

impl fmt::Debug for EccPrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EccPrivateKey")
            .field("algorithm", &self.algorithm())
            .finish_non_exhaustive()
    }
}

impl fmt::Debug for EccPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EccPublicKey")
            .field("algorithm", &self.algorithm())
            .field("data", &info::get_str(&self.0.info, field::DATA))
            .finish()
    }
}

fn key_map(data: String) -> KeyMap {
    let mut info = KeyMap::new();
    info.insert(field::ALGORITHM.into(), algorithm::ECC.into());
    info.insert(field::DATA.into(), data.into());
    info.insert(field::CURVE.into(), CURVE_SECP256K1.into());
    info.insert(field::DIGEST.into(), "SHA256".into());
    info
}

fn decode_hex(info: &KeyMap) -> Result<Vec<u8>, KeyError> {
    let text = info::get_str(info, field::DATA).ok_or(KeyError::MissingField(field::DATA))?;
    hex::decode(text.trim()).map_err(|e| KeyError::InvalidData(format!("hex decode error: {}", e)))
}

impl EccPrivateKey {
    pub fn generate() -> Result<Self, KeyError> {
        let handle = SigningKey::random(&mut OsRng);
        let key = Self::from_map(key_map(hex::encode(handle.to_bytes())))?;
        let _ = key.0.handle.set(Box::new(handle));
        Ok(key)
    }

    pub fn from_map(info: KeyMap) -> Result<Self, KeyError> {
        info::get_algorithm(&info)?;
        info::require_data(&info)?;
        Ok(Self(Arc::new(EccPrivateKeyInner {
            info,
            handle: OnceBox::new(),
            data: OnceBox::new(),
            public_key: OnceBox::new(),
        })))
    }

    pub(crate) fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    fn handle(&self) -> Result<&SigningKey, KeyError> {
        self.0.handle.get_or_try_init(|| {
            tracing::debug!("loading ECC private key");
            let bytes = decode_hex(&self.0.info)?;
            if bytes.len() != PRIVATE_KEY_SIZE {
                return Err(KeyError::InvalidData(format!(
                    "ECC private key must be {} bytes, got {}",
                    PRIVATE_KEY_SIZE,
                    bytes.len()
                )));
            }
            SigningKey::from_slice(&bytes)
                .map(Box::new)
                .map_err(|e| KeyError::InvalidData(format!("ECC private key: {}", e)))
        })
    }

    /// Matching public key, derived once
    pub fn public_key(&self) -> Result<&EccPublicKey, KeyError> {
        self.0.public_key.get_or_try_init(|| {
            let verifying_key = VerifyingKey::from(self.handle()?);
            let point = verifying_key.to_encoded_point(false);
            let key = EccPublicKey::from_map(key_map(hex::encode(point.as_bytes())))?;
            let _ = key.0.handle.set(Box::new(verifying_key));
            Ok(Box::new(key))
        })
    }
}

impl CryptographyKey for EccPrivateKey {
    fn algorithm(&self) -> &str {
        info::get_str(&self.0.info, field::ALGORITHM).unwrap_or(algorithm::ECC)
    }

    fn info(&self) -> &KeyMap {
        &self.0.info
    }

    /// The 32-byte private scalar
    fn data(&self) -> Result<&[u8], KeyError> {
        let data = self
            .0
            .data
            .get_or_try_init(|| self.handle().map(|key| Box::new(key.to_bytes().to_vec())))?;
        Ok(data.as_slice())
    }
}

impl SignKey for EccPrivateKey {
    fn sign(&self, data: &[u8]) -> Result<Vec<u8>, KeyError> {
        let digest = sha256(data);
        let signature: Signature = self
            .handle()?
            .sign_prehash(&digest)
            .map_err(|e| anyhow::anyhow!("ECDSA signing failed: {}", e))?;
        Ok(signature.to_der().as_bytes().to_vec())
    }
}

impl EccPublicKey {
    /// Build a public key from its map.
    ///
    /// `data` is the hex SEC1 point: compressed (66 chars), uncompressed
    /// (130 chars) or uncompressed without the `04` prefix (128 chars).
    pub fn from_map(info: KeyMap) -> Result<Self, KeyError> {
        info::get_algorithm(&info)?;
        info::require_data(&info)?;
        Ok(Self(Arc::new(EccPublicKeyInner {
            info,
            handle: OnceBox::new(),
            data: OnceBox::new(),
            raw: OnceBox::new(),
        })))
    }

    /// The point bytes exactly as stored in `data`, compressed or not.
    ///
    /// Address derivation hashes these; equality uses the canonical
    /// uncompressed form from `data()`.
    pub fn raw_data(&self) -> Result<&[u8], KeyError> {
        self.handle()?;
        let raw = self
            .0
            .raw
            .get_or_try_init(|| decode_hex(&self.0.info).map(Box::new))?;
        Ok(raw.as_slice())
    }

    fn handle(&self) -> Result<&VerifyingKey, KeyError> {
        self.0.handle.get_or_try_init(|| {
            tracing::debug!("loading ECC public key");
            let mut bytes = decode_hex(&self.0.info)?;
            if bytes.len() == PUBLIC_KEY_SIZE - 1 {
                bytes.insert(0, 0x04);
            }
            VerifyingKey::from_sec1_bytes(&bytes)
                .map(Box::new)
                .map_err(|e| KeyError::InvalidData(format!("ECC public key: {}", e)))
        })
    }
}

impl CryptographyKey for EccPublicKey {
    fn algorithm(&self) -> &str {
        info::get_str(&self.0.info, field::ALGORITHM).unwrap_or(algorithm::ECC)
    }

    fn info(&self) -> &KeyMap {
        &self.0.info
    }

    /// The 65-byte uncompressed point, `0x04 || x || y`
    fn data(&self) -> Result<&[u8], KeyError> {
        let data = self.0.data.get_or_try_init(|| {
            self.handle()
                .map(|key| Box::new(key.to_encoded_point(false).as_bytes().to_vec()))
        })?;
        Ok(data.as_slice())
    }
}

impl VerifyKey for EccPublicKey {
    fn verify(&self, data: &[u8], signature: &[u8]) -> bool {
        let Ok(handle) = self.handle() else {
            return false;
        };
        let parsed = if signature.len() > SIGNATURE_SIZE {
            Signature::from_der(signature)
        } else {
            Signature::from_slice(signature)
        };
        let Ok(signature) = parsed else {
            return false;
        };
        let signature = signature.normalize_s().unwrap_or(signature);
        handle.verify_prehash(&sha256(data), &signature).is_ok()
    }
}
