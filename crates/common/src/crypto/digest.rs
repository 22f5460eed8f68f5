//! One-shot message digests used by signing and address derivation.

use ripemd::Ripemd160;
use sha2::{Digest, Sha256};
use sha3::Keccak256;

pub const SHA256_SIZE: usize = 32;
pub const RIPEMD160_SIZE: usize = 20;
pub const KECCAK256_SIZE: usize = 32;

pub fn sha256(data: &[u8]) -> [u8; SHA256_SIZE] {
    Sha256::digest(data).into()
}

pub fn ripemd160(data: &[u8]) -> [u8; RIPEMD160_SIZE] {
    Ripemd160::digest(data).into()
}

pub fn keccak256(data: &[u8]) -> [u8; KECCAK256_SIZE] {
    Keccak256::digest(data).into()
}

/// `ripemd160(sha256(data))`
pub fn hash160(data: &[u8]) -> [u8; RIPEMD160_SIZE] {
    ripemd160(&sha256(data))
}

/// `sha256(sha256(data))`
pub fn sha256d(data: &[u8]) -> [u8; SHA256_SIZE] {
    sha256(&sha256(data))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_known_vectors() {
        assert_eq!(
            hex::encode(sha256(b"")),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
        assert_eq!(
            hex::encode(ripemd160(b"")),
            "9c1185a5c5e9fc54612808977ee8f548b2258d31"
        );
        assert_eq!(
            hex::encode(keccak256(b"")),
            "c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
        );
    }

    #[test]
    fn test_composed_digests() {
        assert_eq!(hash160(b"abc"), ripemd160(&sha256(b"abc")));
        assert_eq!(sha256d(b"abc"), sha256(&sha256(b"abc")));
    }
}
