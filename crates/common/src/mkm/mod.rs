//! Entity identity: metas, addresses and identifiers
//!
//! An entity's identity is derived in three steps:
//!
//! 1. A private key signs the seed (the future identifier name), producing
//!    the **fingerprint** stored in the entity's [`Meta`]
//! 2. The fingerprint, or the public key for some meta types, is hashed into
//!    an [`Address`] tagged with a network [`EntityType`]
//! 3. Seed and address are joined into an [`Identifier`],
//!    `name@address/terminal`
//!
//! The functions in [`factory`] memoize parsed and generated addresses and
//! identifiers in process-wide caches.

mod address;
mod btc;
mod entity;
mod eth;
pub mod factory;
mod identifier;
mod meta;

pub use address::{Address, AddressError, BroadcastAddress, ANYWHERE, EVERYWHERE};
pub use btc::BtcAddress;
pub use entity::EntityType;
pub use eth::EthAddress;
pub use factory::{
    create_identifier, generate_address, generate_identifier, parse_address, parse_identifier,
    reduce_memory,
};
pub use identifier::{anyone, everyone, founder, Identifier, IdentifierError};
pub use meta::{Meta, MetaError, MetaType};
