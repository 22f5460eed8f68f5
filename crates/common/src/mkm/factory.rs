//! Cached constructors for addresses and identifiers.
//!
//! Every address and identifier that gets generated or parsed is memoized in
//! a process-wide [`ThanosCache`] keyed by its string form. The caches only
//! shrink when [`reduce_memory`] is called.

use std::sync::OnceLock;

use super::address::{Address, AddressError};
use super::entity::EntityType;
use super::identifier::{self, Identifier, IdentifierError};
use super::meta::{Meta, MetaError};
use crate::mem::{MemoryCache, ThanosCache};

/// Shared address cache
pub fn address_cache() -> &'static ThanosCache<String, Address> {
    static CACHE: OnceLock<ThanosCache<String, Address>> = OnceLock::new();
    CACHE.get_or_init(ThanosCache::new)
}

/// Shared identifier cache
pub fn id_cache() -> &'static ThanosCache<String, Identifier> {
    static CACHE: OnceLock<ThanosCache<String, Identifier>> = OnceLock::new();
    CACHE.get_or_init(ThanosCache::new)
}

/// Derive the address of `meta` on `network` and cache it
pub fn generate_address(meta: &Meta, network: EntityType) -> Result<Address, MetaError> {
    let address = meta.generate_address(network)?;
    address_cache().put(address.to_string(), address.clone());
    Ok(address)
}

/// Parse an address, consulting the shared cache first
pub fn parse_address(address: &str) -> Result<Address, AddressError> {
    let cache = address_cache();
    if let Some(cached) = cache.get(&address.to_string()) {
        return Ok(cached);
    }
    tracing::debug!(address, "address cache miss");
    let parsed = Address::parse(address)?;
    cache.put(address.to_string(), parsed.clone());
    Ok(parsed)
}

/// Compose an identifier, reusing the cached instance for the same string
pub fn create_identifier(
    name: Option<&str>,
    address: &Address,
    terminal: Option<&str>,
) -> Result<Identifier, IdentifierError> {
    let string = identifier::concat(name, address, terminal);
    let cache = id_cache();
    if let Some(cached) = cache.get(&string) {
        return Ok(cached);
    }
    tracing::debug!(identifier = %string, "identifier cache miss");
    let id = Identifier::new(name, address.clone(), terminal)?;
    cache.put(string, id.clone());
    Ok(id)
}

/// Identifier of `meta` on `network`: the seed as name plus the meta's
/// address
pub fn generate_identifier(
    meta: &Meta,
    network: EntityType,
    terminal: Option<&str>,
) -> Result<Identifier, MetaError> {
    let address = generate_address(meta, network)?;
    Ok(create_identifier(meta.seed(), &address, terminal)?)
}

/// Parse an identifier, consulting the shared cache first
pub fn parse_identifier(identifier: &str) -> Result<Identifier, IdentifierError> {
    let cache = id_cache();
    if let Some(cached) = cache.get(&identifier.to_string()) {
        return Ok(cached);
    }
    tracing::debug!(identifier, "identifier cache miss");
    let id = Identifier::parse(identifier)?;
    cache.put(identifier.to_string(), id.clone());
    Ok(id)
}

/// Sweep both shared caches, returning the number of entries removed
pub fn reduce_memory() -> usize {
    let removed = address_cache().reduce_memory() + id_cache().reduce_memory();
    tracing::trace!(removed, "reduced identity caches");
    removed
}
