//! Shared fixtures for identity and key integration tests
#![allow(dead_code)]

use common::crypto::info::algorithm;
use common::crypto::PrivateKey;
use common::mkm::{generate_identifier, EntityType, Identifier, Meta, MetaType};

/// Address of the fingerprint `b"hello"` on the user network
pub const HELLO_ADDRESS: &str = "1HeqNjAst5TCQ63F7xhjg6bcTbDKrRk7sH";

/// A fresh ECC private key
pub fn ecc_key() -> PrivateKey {
    PrivateKey::generate(algorithm::ECC).unwrap()
}

/// A fresh RSA private key
pub fn rsa_key() -> PrivateKey {
    PrivateKey::generate(algorithm::RSA).unwrap()
}

/// Generate a key, a meta and an identifier for `seed` on `network`
pub fn setup_entity(
    meta_type: MetaType,
    seed: &str,
    network: EntityType,
) -> (PrivateKey, Meta, Identifier) {
    let key = ecc_key();
    let meta = Meta::generate(meta_type, &key, Some(seed)).unwrap();
    let id = generate_identifier(&meta, network, None).unwrap();
    (key, meta, id)
}
