use std::fmt;
use std::sync::{Arc, OnceLock};

use super::info::{algorithm, field, KeyMap};
use super::keys::{CryptographyKey, DecryptKey, EncryptKey, KeyError};

/// Symmetric key that leaves content untouched.
///
/// Used for broadcast messages, which are readable by everyone.
#[derive(Clone)]
pub struct PlainKey(Arc<KeyMap>);

impl fmt::Debug for PlainKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlainKey").finish()
    }
}

impl PlainKey {
    /// The shared plain key instance
    pub fn shared() -> Self {
        static SHARED: OnceLock<PlainKey> = OnceLock::new();
        SHARED
            .get_or_init(|| {
                let mut info = KeyMap::new();
                info.insert(field::ALGORITHM.into(), algorithm::PLAIN.into());
                PlainKey(Arc::new(info))
            })
            .clone()
    }
}

impl CryptographyKey for PlainKey {
    fn algorithm(&self) -> &str {
        algorithm::PLAIN
    }

    fn info(&self) -> &KeyMap {
        &self.0
    }

    fn data(&self) -> Result<&[u8], KeyError> {
        Ok(&[])
    }
}

impl EncryptKey for PlainKey {
    fn encrypt(&self, plaintext: &[u8], _extra: &mut KeyMap) -> Result<Vec<u8>, KeyError> {
        Ok(plaintext.to_vec())
    }
}

impl DecryptKey for PlainKey {
    fn decrypt(&self, ciphertext: &[u8], _params: &KeyMap) -> Result<Vec<u8>, KeyError> {
        Ok(ciphertext.to_vec())
    }
}
