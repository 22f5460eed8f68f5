/**
 * Cryptographic key model.
 *  - Symmetric (AES, PLAIN) and asymmetric (RSA, ECC) keys
 *    built from their JSON attribute maps
 *  - Algorithm registry for generating and parsing keys
 */
pub mod crypto;
/**
 * Memoizing caches shared across threads,
 *  shrunk on demand rather than by expiry.
 */
pub mod mem;
/**
 * Entity identity: metas, network-tagged
 *  addresses and `name@address/terminal`
 *  identifiers, with cached constructors.
 */
pub mod mkm;
/**
 * Process-wide message serial numbers.
 */
pub mod serial;
/**
 * Helper for setting build version information
 *  at compile time.
 */
pub mod version;

pub mod prelude {
    pub use crate::crypto::{
        CryptographyKey, DecryptKey, EncryptKey, KeyError, PrivateKey, PublicKey, SignKey,
        SymmetricKey, VerifyKey,
    };
    pub use crate::mkm::{Address, EntityType, Identifier, Meta, MetaType};
    pub use crate::serial::next_serial_number;
    pub use crate::version::build_info;
}
