//! RSA keys: PKCS#1 v1.5 signatures over SHA-256 and chunked PKCS#1 v1.5
//! encryption.
//!
//! Key map format:
//!
//! ```text
//! {
//!     "algorithm": "RSA",
//!     "data"     : "-----BEGIN PUBLIC KEY-----\n...", // PEM, or base64 DER
//!     "mode"     : "ECB",
//!     "padding"  : "PKCS1",
//!     "digest"   : "SHA256"
//! }
//! ```
//!
//! Private keys are read as PKCS#1 or PKCS#8, public keys as SPKI or PKCS#1.
//! Native handles are built on first use and kept for the key's lifetime.

use std::fmt;
use std::sync::Arc;

use once_cell::race::OnceBox;
use rand::rngs::OsRng;
use rsa::pkcs1::{DecodeRsaPrivateKey, DecodeRsaPublicKey, EncodeRsaPrivateKey};
use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePrivateKey, EncodePublicKey};
use rsa::traits::PublicKeyParts;
use rsa::{Pkcs1v15Encrypt, Pkcs1v15Sign};
use rsa::{RsaPrivateKey as NativePrivateKey, RsaPublicKey as NativePublicKey};
use sha2::Sha256;

use super::digest::sha256;
use super::info::{self, algorithm, field, KeyMap};
use super::keys::{CryptographyKey, DecryptKey, EncryptKey, KeyError, SignKey, VerifyKey};

/// Modulus size of generated keys
pub const RSA_KEY_BITS: usize = 1024;
/// PKCS#1 v1.5 encryption padding overhead per block
pub const PKCS1_PADDING_SIZE: usize = 11;

const PRIVATE_KEY_TAG: &str = "PRIVATE KEY";
const PUBLIC_KEY_TAG: &str = "PUBLIC KEY";

/// RSA private key
#[derive(Clone)]
pub struct RsaPrivateKey(Arc<RsaPrivateKeyInner>);

struct RsaPrivateKeyInner {
    info: KeyMap,
    handle: OnceBox<NativePrivateKey>,
    data: OnceBox<Vec<u8>>,
    public_key: OnceBox<RsaPublicKey>,
}

/// RSA public key
#[derive(Clone)]
pub struct RsaPublicKey(Arc<RsaPublicKeyInner>);

struct RsaPublicKeyInner {
    info: KeyMap,
    handle: OnceBox<NativePublicKey>,
    data: OnceBox<Vec<u8>>,
}

impl fmt::Debug for RsaPrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RsaPrivateKey")
            .field("algorithm", &self.algorithm())
            .finish_non_exhaustive()
    }
}

impl fmt::Debug for RsaPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RsaPublicKey")
            .field("algorithm", &self.algorithm())
            .field("data", &info::get_str(&self.0.info, field::DATA))
            .finish()
    }
}

/// Attribute map emitted for generated keys and derived public keys
fn key_map(pem: String) -> KeyMap {
    let mut info = KeyMap::new();
    info.insert(field::ALGORITHM.into(), algorithm::RSA.into());
    info.insert(field::DATA.into(), pem.into());
    info.insert(field::MODE.into(), "ECB".into());
    info.insert(field::PADDING.into(), "PKCS1".into());
    info.insert(field::DIGEST.into(), "SHA256".into());
    info
}

/// DER bytes from either a PEM block or bare base64
fn decode_der(text: &str) -> Result<Vec<u8>, KeyError> {
    if text.contains("-----BEGIN") {
        let pem = pem::parse(text).map_err(|e| anyhow::anyhow!("failed to parse PEM: {}", e))?;
        Ok(pem.contents().to_vec())
    } else {
        info::decode_base64(text)
    }
}

fn data_field(info: &KeyMap) -> Result<&str, KeyError> {
    info::get_str(info, field::DATA).ok_or(KeyError::MissingField(field::DATA))
}

impl RsaPrivateKey {
    /// Generate a new 1024-bit key
    pub fn generate() -> Result<Self, KeyError> {
        let handle = NativePrivateKey::new(&mut OsRng, RSA_KEY_BITS)
            .map_err(|e| anyhow::anyhow!("failed to generate RSA key: {}", e))?;
        let der = handle
            .to_pkcs8_der()
            .map_err(|e| anyhow::anyhow!("failed to encode RSA key: {}", e))?;
        let pem = pem::encode(&pem::Pem::new(PRIVATE_KEY_TAG, der.as_bytes().to_vec()));

        let key = Self::from_map(key_map(pem))?;
        let _ = key.0.handle.set(Box::new(handle));
        Ok(key)
    }

    pub fn from_map(info: KeyMap) -> Result<Self, KeyError> {
        info::get_algorithm(&info)?;
        info::require_data(&info)?;
        Ok(Self(Arc::new(RsaPrivateKeyInner {
            info,
            handle: OnceBox::new(),
            data: OnceBox::new(),
            public_key: OnceBox::new(),
        })))
    }

    pub(crate) fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    fn handle(&self) -> Result<&NativePrivateKey, KeyError> {
        self.0.handle.get_or_try_init(|| {
            tracing::debug!("loading RSA private key");
            let der = decode_der(data_field(&self.0.info)?)?;
            NativePrivateKey::from_pkcs1_der(&der)
                .or_else(|_| NativePrivateKey::from_pkcs8_der(&der))
                .map(Box::new)
                .map_err(|e| KeyError::InvalidData(format!("RSA private key: {}", e)))
        })
    }

    /// Matching public key, derived once
    pub fn public_key(&self) -> Result<&RsaPublicKey, KeyError> {
        self.0.public_key.get_or_try_init(|| {
            let public = self.handle()?.to_public_key();
            let der = public
                .to_public_key_der()
                .map_err(|e| anyhow::anyhow!("failed to encode RSA public key: {}", e))?;
            let pem = pem::encode(&pem::Pem::new(PUBLIC_KEY_TAG, der.as_bytes().to_vec()));

            let key = RsaPublicKey::from_map(key_map(pem))?;
            let _ = key.0.handle.set(Box::new(public));
            Ok(Box::new(key))
        })
    }

    /// Modulus size in bytes
    pub fn size(&self) -> Result<usize, KeyError> {
        Ok(self.handle()?.size())
    }
}

impl CryptographyKey for RsaPrivateKey {
    fn algorithm(&self) -> &str {
        info::get_str(&self.0.info, field::ALGORITHM).unwrap_or(algorithm::RSA)
    }

    fn info(&self) -> &KeyMap {
        &self.0.info
    }

    /// PKCS#1 DER encoding of the private key
    fn data(&self) -> Result<&[u8], KeyError> {
        let data = self.0.data.get_or_try_init(|| {
            self.handle()?
                .to_pkcs1_der()
                .map(|der| Box::new(der.as_bytes().to_vec()))
                .map_err(|e| KeyError::Default(anyhow::anyhow!("failed to encode RSA key: {}", e)))
        })?;
        Ok(data.as_slice())
    }
}

impl SignKey for RsaPrivateKey {
    fn sign(&self, data: &[u8]) -> Result<Vec<u8>, KeyError> {
        let hashed = sha256(data);
        self.handle()?
            .sign(Pkcs1v15Sign::new::<Sha256>(), &hashed)
            .map_err(|e| anyhow::anyhow!("RSA signing failed: {}", e).into())
    }
}

impl DecryptKey for RsaPrivateKey {
    /// Decrypt block by block, each block one modulus long
    fn decrypt(&self, ciphertext: &[u8], _params: &KeyMap) -> Result<Vec<u8>, KeyError> {
        let handle = self.handle()?;
        let block_size = handle.size();
        if ciphertext.len() % block_size != 0 {
            return Err(KeyError::Decrypt(format!(
                "ciphertext length {} is not a multiple of {}",
                ciphertext.len(),
                block_size
            )));
        }

        let mut plaintext = Vec::with_capacity(ciphertext.len());
        for block in ciphertext.chunks(block_size) {
            let part = handle
                .decrypt(Pkcs1v15Encrypt, block)
                .map_err(|e| KeyError::Decrypt(e.to_string()))?;
            plaintext.extend_from_slice(&part);
        }
        Ok(plaintext)
    }
}

impl RsaPublicKey {
    pub fn from_map(info: KeyMap) -> Result<Self, KeyError> {
        info::get_algorithm(&info)?;
        info::require_data(&info)?;
        Ok(Self(Arc::new(RsaPublicKeyInner {
            info,
            handle: OnceBox::new(),
            data: OnceBox::new(),
        })))
    }

    fn handle(&self) -> Result<&NativePublicKey, KeyError> {
        self.0.handle.get_or_try_init(|| {
            tracing::debug!("loading RSA public key");
            let der = decode_der(data_field(&self.0.info)?)?;
            NativePublicKey::from_public_key_der(&der)
                .or_else(|_| NativePublicKey::from_pkcs1_der(&der))
                .map(Box::new)
                .map_err(|e| KeyError::InvalidData(format!("RSA public key: {}", e)))
        })
    }

    /// Modulus size in bytes
    pub fn size(&self) -> Result<usize, KeyError> {
        Ok(self.handle()?.size())
    }
}

impl CryptographyKey for RsaPublicKey {
    fn algorithm(&self) -> &str {
        info::get_str(&self.0.info, field::ALGORITHM).unwrap_or(algorithm::RSA)
    }

    fn info(&self) -> &KeyMap {
        &self.0.info
    }

    /// Big-endian modulus
    fn data(&self) -> Result<&[u8], KeyError> {
        let data = self
            .0
            .data
            .get_or_try_init(|| self.handle().map(|key| Box::new(key.n().to_bytes_be())))?;
        Ok(data.as_slice())
    }
}

impl VerifyKey for RsaPublicKey {
    fn verify(&self, data: &[u8], signature: &[u8]) -> bool {
        let Ok(handle) = self.handle() else {
            return false;
        };
        let hashed = sha256(data);
        handle
            .verify(Pkcs1v15Sign::new::<Sha256>(), &hashed, signature)
            .is_ok()
    }
}

impl EncryptKey for RsaPublicKey {
    /// Encrypt in blocks of `size - 11` bytes and concatenate the results
    fn encrypt(&self, plaintext: &[u8], _extra: &mut KeyMap) -> Result<Vec<u8>, KeyError> {
        let handle = self.handle()?;
        let block_size = handle
            .size()
            .checked_sub(PKCS1_PADDING_SIZE)
            .filter(|size| *size > 0)
            .ok_or_else(|| {
                KeyError::InvalidData(format!(
                    "RSA modulus of {} bytes is too small for PKCS#1 v1.5 padding",
                    handle.size()
                ))
            })?;

        let blocks = plaintext.len().div_ceil(block_size);
        let mut ciphertext = Vec::with_capacity(blocks * handle.size());
        for block in plaintext.chunks(block_size) {
            let part = handle
                .encrypt(&mut OsRng, Pkcs1v15Encrypt, block)
                .map_err(|e| anyhow::anyhow!("RSA encryption failed: {}", e))?;
            ciphertext.extend_from_slice(&part);
        }
        Ok(ciphertext)
    }
}
