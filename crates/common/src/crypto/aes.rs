//! AES-CBC content encryption with PKCS#7 padding
//!
//! Key map format:
//!
//! ```text
//! {
//!     "algorithm": "AES",
//!     "keySize"  : 32,              // optional
//!     "data"     : "{BASE64_ENCODE}" // key bytes
//! }
//! ```
//!
//! The initialization vector travels next to the ciphertext in the message
//! params under `"IV"` (base64).

use std::fmt;
use std::sync::Arc;

use aes::cipher::block_padding::Pkcs7;
use aes::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use once_cell::race::OnceBox;
use serde_json::Value;

use super::info::{self, algorithm, field, KeyMap};
use super::keys::{CryptographyKey, DecryptKey, EncryptKey, KeyError};

/// AES block size in bytes, which is also the IV size
pub const AES_BLOCK_SIZE: usize = 16;
/// Size of generated AES keys in bytes (256 bits)
pub const AES_KEY_SIZE: usize = 32;

/// AES symmetric key
///
/// Clones share the decoded key bytes.
#[derive(Clone)]
pub struct AesKey(Arc<AesKeyInner>);

struct AesKeyInner {
    info: KeyMap,
    data: OnceBox<Vec<u8>>,
}

impl fmt::Debug for AesKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AesKey")
            .field("algorithm", &self.algorithm())
            .finish_non_exhaustive()
    }
}

impl AesKey {
    /// Generate a new random 256-bit key
    pub fn generate() -> Result<Self, KeyError> {
        let mut bytes = vec![0u8; AES_KEY_SIZE];
        getrandom::getrandom(&mut bytes)
            .map_err(|e| anyhow::anyhow!("failed to generate key bytes: {}", e))?;

        let mut info = KeyMap::new();
        info.insert(field::ALGORITHM.into(), algorithm::AES.into());
        info.insert(field::DATA.into(), info::encode_base64(&bytes).into());

        let key = Self::from_map(info)?;
        let _ = key.0.data.set(Box::new(bytes));
        Ok(key)
    }

    /// Build a key from its map. The key bytes are decoded on first use.
    pub fn from_map(info: KeyMap) -> Result<Self, KeyError> {
        info::get_algorithm(&info)?;
        info::require_data(&info)?;
        Ok(Self(Arc::new(AesKeyInner {
            info,
            data: OnceBox::new(),
        })))
    }

    pub(crate) fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// IV from the message params, falling back to one stored on the key
    /// itself by older clients
    fn init_vector(&self, params: &KeyMap) -> Result<Option<Vec<u8>>, KeyError> {
        let encoded = [params, &self.0.info]
            .into_iter()
            .flat_map(|map| [map.get(field::IV), map.get(field::IV_LOWER)])
            .flatten()
            .find_map(Value::as_str);

        let Some(encoded) = encoded else {
            return Ok(None);
        };
        let iv = info::decode_base64(encoded)?;
        if iv.is_empty() {
            return Ok(None);
        }
        if iv.len() != AES_BLOCK_SIZE {
            return Err(KeyError::InvalidIv {
                expected: AES_BLOCK_SIZE,
                actual: iv.len(),
            });
        }
        Ok(Some(iv))
    }

    fn new_init_vector(extra: &mut KeyMap) -> Result<Vec<u8>, KeyError> {
        let mut iv = vec![0u8; AES_BLOCK_SIZE];
        getrandom::getrandom(&mut iv)
            .map_err(|e| anyhow::anyhow!("failed to generate IV: {}", e))?;
        extra.insert(field::IV.into(), info::encode_base64(&iv).into());
        Ok(iv)
    }
}

impl CryptographyKey for AesKey {
    fn algorithm(&self) -> &str {
        info::get_str(&self.0.info, field::ALGORITHM).unwrap_or(algorithm::AES)
    }

    fn info(&self) -> &KeyMap {
        &self.0.info
    }

    fn data(&self) -> Result<&[u8], KeyError> {
        let data = self
            .0
            .data
            .get_or_try_init(|| decode_key(&self.0.info).map(Box::new))?;
        Ok(data.as_slice())
    }
}

impl EncryptKey for AesKey {
    /// Encrypt with AES-CBC.
    ///
    /// If `extra` carries no IV, a random one is generated and written back
    /// into `extra` under `"IV"`.
    fn encrypt(&self, plaintext: &[u8], extra: &mut KeyMap) -> Result<Vec<u8>, KeyError> {
        let iv = match self.init_vector(extra)? {
            Some(iv) => iv,
            None => Self::new_init_vector(extra)?,
        };
        let key = self.data()?;
        match key.len() {
            16 => encrypt_with::<cbc::Encryptor<aes::Aes128>>(key, &iv, plaintext),
            24 => encrypt_with::<cbc::Encryptor<aes::Aes192>>(key, &iv, plaintext),
            _ => encrypt_with::<cbc::Encryptor<aes::Aes256>>(key, &iv, plaintext),
        }
    }
}

impl DecryptKey for AesKey {
    /// Decrypt with AES-CBC.
    ///
    /// Without an IV in `params` an all-zero IV is used; messages from old
    /// clients were encrypted that way.
    fn decrypt(&self, ciphertext: &[u8], params: &KeyMap) -> Result<Vec<u8>, KeyError> {
        let iv = match self.init_vector(params)? {
            Some(iv) => iv,
            None => {
                tracing::warn!("no IV supplied for AES decryption, using zero IV");
                vec![0u8; AES_BLOCK_SIZE]
            }
        };
        let key = self.data()?;
        match key.len() {
            16 => decrypt_with::<cbc::Decryptor<aes::Aes128>>(key, &iv, ciphertext),
            24 => decrypt_with::<cbc::Decryptor<aes::Aes192>>(key, &iv, ciphertext),
            _ => decrypt_with::<cbc::Decryptor<aes::Aes256>>(key, &iv, ciphertext),
        }
    }
}

fn decode_key(info: &KeyMap) -> Result<Vec<u8>, KeyError> {
    let text = info::get_str(info, field::DATA).ok_or(KeyError::MissingField(field::DATA))?;
    let bytes = info::decode_base64(text)?;
    if !matches!(bytes.len(), 16 | 24 | 32) {
        return Err(KeyError::InvalidData(format!(
            "invalid AES key size, expected 16, 24 or 32, got {}",
            bytes.len()
        )));
    }
    // `keySize` is optional; when present it must agree with the key bytes
    let declared = info::get_uint(info, field::KEY_SIZE, bytes.len() as u64);
    if declared != bytes.len() as u64 {
        return Err(KeyError::InvalidData(format!(
            "AES keySize {} does not match {} key bytes",
            declared,
            bytes.len()
        )));
    }
    Ok(bytes)
}

fn encrypt_with<C>(key: &[u8], iv: &[u8], plaintext: &[u8]) -> Result<Vec<u8>, KeyError>
where
    C: KeyIvInit + BlockEncryptMut,
{
    let cipher = C::new_from_slices(key, iv)
        .map_err(|e| anyhow::anyhow!("failed to initialize AES cipher: {}", e))?;
    Ok(cipher.encrypt_padded_vec_mut::<Pkcs7>(plaintext))
}

fn decrypt_with<C>(key: &[u8], iv: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>, KeyError>
where
    C: KeyIvInit + BlockDecryptMut,
{
    let cipher = C::new_from_slices(key, iv)
        .map_err(|e| anyhow::anyhow!("failed to initialize AES cipher: {}", e))?;
    cipher
        .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
        .map_err(|_| KeyError::Decrypt("invalid PKCS#7 padding".to_string()))
}

#[cfg(test)]
mod test {
    use super::*;

    fn params_with_iv(iv: &[u8]) -> KeyMap {
        let mut params = KeyMap::new();
        params.insert(field::IV.into(), info::encode_base64(iv).into());
        params
    }

    #[test]
    fn test_encrypt_decrypt_with_fixed_iv() {
        let key = AesKey::generate().unwrap();
        let mut params = params_with_iv(&[7u8; AES_BLOCK_SIZE]);

        let ciphertext = key.encrypt(b"hello", &mut params).unwrap();
        assert_eq!(ciphertext.len(), AES_BLOCK_SIZE);

        let plaintext = key.decrypt(&ciphertext, &params).unwrap();
        assert_eq!(plaintext, b"hello");

        // a different IV either garbles the block or breaks the padding
        let other = params_with_iv(&[9u8; AES_BLOCK_SIZE]);
        let result = key.decrypt(&ciphertext, &other);
        assert!(result.map(|p| p != b"hello").unwrap_or(true));
    }

    #[test]
    fn test_random_iv_written_back() {
        let key = AesKey::generate().unwrap();
        let mut extra = KeyMap::new();
        let ciphertext = key.encrypt(b"some message", &mut extra).unwrap();

        let iv = info::decode_base64(extra.get(field::IV).and_then(Value::as_str).unwrap());
        assert_eq!(iv.unwrap().len(), AES_BLOCK_SIZE);
        assert_eq!(key.decrypt(&ciphertext, &extra).unwrap(), b"some message");
    }

    #[test]
    fn test_lowercase_iv_accepted() {
        let key = AesKey::generate().unwrap();
        let mut params = KeyMap::new();
        params.insert(
            field::IV_LOWER.into(),
            info::encode_base64(&[1u8; AES_BLOCK_SIZE]).into(),
        );
        let ciphertext = key.encrypt(b"lower", &mut params).unwrap();
        assert!(params.get(field::IV).is_none());
        assert_eq!(key.decrypt(&ciphertext, &params).unwrap(), b"lower");
    }

    #[test]
    fn test_zero_iv_fallback() {
        let key = AesKey::generate().unwrap();
        let mut params = params_with_iv(&[0u8; AES_BLOCK_SIZE]);
        let ciphertext = key.encrypt(b"legacy", &mut params).unwrap();

        let plaintext = key.decrypt(&ciphertext, &KeyMap::new()).unwrap();
        assert_eq!(plaintext, b"legacy");
    }

    #[test]
    fn test_block_aligned_and_empty_plaintext() {
        let key = AesKey::generate().unwrap();
        for plaintext in [&b""[..], &[0x42u8; 16][..], &[0x17u8; 47][..]] {
            let mut params = KeyMap::new();
            let ciphertext = key.encrypt(plaintext, &mut params).unwrap();
            assert_eq!(ciphertext.len() % AES_BLOCK_SIZE, 0);
            assert!(ciphertext.len() > plaintext.len());
            assert_eq!(key.decrypt(&ciphertext, &params).unwrap(), plaintext);
        }
    }

    #[test]
    fn test_malformed_ciphertext() {
        let key = AesKey::generate().unwrap();
        let params = params_with_iv(&[3u8; AES_BLOCK_SIZE]);
        assert!(key.decrypt(&[1, 2, 3], &params).is_err());
    }

    #[test]
    fn test_invalid_iv_size() {
        let key = AesKey::generate().unwrap();
        let mut params = params_with_iv(&[3u8; 8]);
        assert!(matches!(
            key.encrypt(b"x", &mut params),
            Err(KeyError::InvalidIv {
                expected: 16,
                actual: 8
            })
        ));
    }

    #[test]
    fn test_lazy_data_validation() {
        let mut info = KeyMap::new();
        info.insert(field::ALGORITHM.into(), algorithm::AES.into());
        info.insert(field::DATA.into(), info::encode_base64(&[1u8; 10]).into());

        // construction defers decoding
        let key = AesKey::from_map(info).unwrap();
        assert!(key.data().is_err());
        assert!(key.encrypt(b"x", &mut KeyMap::new()).is_err());
    }

    #[test]
    fn test_aes128_key() {
        let mut info = KeyMap::new();
        info.insert(field::ALGORITHM.into(), algorithm::AES.into());
        info.insert(field::DATA.into(), info::encode_base64(&[5u8; 16]).into());
        let key = AesKey::from_map(info).unwrap();

        let mut params = KeyMap::new();
        let ciphertext = key.encrypt(b"short key", &mut params).unwrap();
        assert_eq!(key.decrypt(&ciphertext, &params).unwrap(), b"short key");
    }

    #[test]
    fn test_declared_key_size_checked() {
        let mut info = KeyMap::new();
        info.insert(field::ALGORITHM.into(), algorithm::AES.into());
        info.insert(field::DATA.into(), info::encode_base64(&[5u8; 16]).into());
        info.insert(field::KEY_SIZE.into(), 16.into());
        assert_eq!(AesKey::from_map(info.clone()).unwrap().data().unwrap().len(), 16);

        info.insert(field::KEY_SIZE.into(), 32.into());
        let key = AesKey::from_map(info).unwrap();
        assert!(matches!(key.data(), Err(KeyError::InvalidData(_))));
    }

    #[test]
    fn test_concurrent_first_use() {
        let generated = AesKey::generate().unwrap();
        let key = AesKey::from_map(generated.info().clone()).unwrap();

        let pointers: Vec<usize> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| scope.spawn(|| key.data().unwrap().as_ptr() as usize))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        let memoized = key.data().unwrap();
        assert_eq!(memoized, generated.data().unwrap());
        assert!(pointers.iter().all(|ptr| *ptr == memoized.as_ptr() as usize));
    }

    #[test]
    fn test_missing_data() {
        let mut info = KeyMap::new();
        info.insert(field::ALGORITHM.into(), algorithm::AES.into());
        assert!(matches!(
            AesKey::from_map(info),
            Err(KeyError::MissingField("data"))
        ));
    }
}
