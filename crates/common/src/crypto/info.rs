//! Attribute maps backing every key.
//!
//! Keys travel as JSON objects such as
//! `{"algorithm": "AES", "data": "{BASE64}"}`. This module names the fields
//! and algorithm tags and provides the typed getters the key types use to
//! read them once at construction time.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde_json::{Map, Value};

use super::keys::KeyError;

/// String-keyed attribute map a key is built from and serialized back to
pub type KeyMap = Map<String, Value>;

/// Attribute names used in key maps
pub mod field {
    pub const ALGORITHM: &str = "algorithm";
    pub const DATA: &str = "data";
    pub const MODE: &str = "mode";
    pub const PADDING: &str = "padding";
    pub const DIGEST: &str = "digest";
    pub const CURVE: &str = "curve";
    pub const KEY_SIZE: &str = "keySize";
    pub const IV: &str = "IV";
    pub const IV_LOWER: &str = "iv";
}

/// Algorithm tags understood by the built-in key factories
pub mod algorithm {
    pub const AES: &str = "AES";
    pub const AES_CBC_PKCS7: &str = "AES/CBC/PKCS7Padding";
    pub const PLAIN: &str = "PLAIN";
    pub const RSA: &str = "RSA";
    pub const RSA_SHA256: &str = "SHA256withRSA";
    pub const RSA_ECB_PKCS1: &str = "RSA/ECB/PKCS1Padding";
    pub const ECC: &str = "ECC";
    pub const ECDSA_SHA256: &str = "SHA256withECDSA";
}

/// Read the `algorithm` tag of a key map
pub fn get_algorithm(info: &KeyMap) -> Result<&str, KeyError> {
    get_str(info, field::ALGORITHM).ok_or(KeyError::MissingField(field::ALGORITHM))
}

pub(crate) fn get_str<'a>(info: &'a KeyMap, key: &str) -> Option<&'a str> {
    info.get(key).and_then(Value::as_str)
}

/// Read an unsigned integer that may have been encoded as a number or a string
pub(crate) fn get_uint(info: &KeyMap, key: &str, default: u64) -> u64 {
    match info.get(key) {
        Some(Value::Number(n)) => n.as_u64().unwrap_or(default),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(default),
        _ => default,
    }
}

/// Fetch the non-empty `data` field, which every key except PLAIN requires
pub(crate) fn require_data(info: &KeyMap) -> Result<(), KeyError> {
    match get_str(info, field::DATA) {
        Some(text) if !text.is_empty() => Ok(()),
        _ => Err(KeyError::MissingField(field::DATA)),
    }
}

/// Decode base64 transportable data.
///
/// Accepts bare base64 as well as the prefixed forms `base64,{DATA}` and
/// `data:{MIME};base64,{DATA}`.
pub fn decode_base64(text: &str) -> Result<Vec<u8>, KeyError> {
    let payload = match text.rfind(',') {
        Some(pos) => &text[pos + 1..],
        None => text,
    };
    BASE64
        .decode(payload.trim())
        .map_err(|e| KeyError::InvalidData(format!("base64 decode error: {}", e)))
}

pub fn encode_base64(data: &[u8]) -> String {
    BASE64.encode(data)
}

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::json;

    fn map(value: Value) -> KeyMap {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_get_uint_accepts_numbers_and_strings() {
        let info = map(json!({"a": 32, "b": "24", "c": "x"}));
        assert_eq!(get_uint(&info, "a", 0), 32);
        assert_eq!(get_uint(&info, "b", 0), 24);
        assert_eq!(get_uint(&info, "c", 16), 16);
        assert_eq!(get_uint(&info, "missing", 16), 16);
    }

    #[test]
    fn test_require_data() {
        assert!(require_data(&map(json!({"data": "abc"}))).is_ok());
        assert!(matches!(
            require_data(&map(json!({"data": ""}))),
            Err(KeyError::MissingField("data"))
        ));
        assert!(require_data(&map(json!({}))).is_err());
    }

    #[test]
    fn test_decode_base64_prefixes() {
        let encoded = encode_base64(b"hello");
        assert_eq!(decode_base64(&encoded).unwrap(), b"hello");
        assert_eq!(
            decode_base64(&format!("base64,{}", encoded)).unwrap(),
            b"hello"
        );
        assert_eq!(
            decode_base64(&format!("data:text/plain;base64,{}", encoded)).unwrap(),
            b"hello"
        );
        assert!(decode_base64("not base64!").is_err());
    }
}
