//! Cryptographic key model
//!
//! Every key is a thin wrapper around the JSON attribute map it was built
//! from (see [`info`]). Expensive derived state is computed on first use and
//! cached inside the key:
//!
//! - **Symmetric keys**: AES-CBC with PKCS#7 padding, and a PLAIN no-op key
//!   for broadcast content
//! - **Asymmetric keys**: RSA (PKCS#1 v1.5 signatures over SHA-256, chunked
//!   PKCS#1 v1.5 encryption) and ECDSA over secp256k1
//! - **Factories**: [`KeyFactories`] maps algorithm tags to the factory that
//!   generates or parses keys of that algorithm
//!
//! # Equality
//!
//! Keys compare by behavior, not by representation. Two symmetric keys are
//! equal when one decrypts what the other encrypts; a private key equals
//! another when its signatures verify under the other's public key. Public
//! keys compare by their canonical key bytes.

mod aes;
mod digest;
mod ecc;
mod factory;
pub mod info;
mod keys;
mod plain;
mod rsa;

pub use self::aes::{AesKey, AES_BLOCK_SIZE, AES_KEY_SIZE};
pub use self::digest::{hash160, keccak256, ripemd160, sha256, sha256d};
pub use self::ecc::{EccPrivateKey, EccPublicKey};
pub use self::factory::{
    KeyFactories, PrivateKeyFactory, PublicKeyFactory, SymmetricKeyFactory,
};
pub use self::info::KeyMap;
pub use self::keys::{
    match_encrypt_key, match_sign_key, CryptographyKey, DecryptKey, EncryptKey, KeyError,
    PrivateKey, PublicKey, SignKey, SymmetricKey, VerifyKey,
};
pub use self::plain::PlainKey;
pub use self::rsa::{RsaPrivateKey, RsaPublicKey, RSA_KEY_BITS};
