use clap::Args;

use common::crypto::{KeyError, KeyFactories};
use common::prelude::CryptographyKey;

/// Generate a key without touching the state directory
#[derive(Args, Debug, Clone)]
pub struct Generate {
    /// Key algorithm: AES, PLAIN, RSA or ECC
    #[arg(long, default_value = "ECC")]
    pub algorithm: String,
}

#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    #[error("key generation failed: {0}")]
    Key(#[from] KeyError),
    #[error("failed to encode key: {0}")]
    Json(#[from] serde_json::Error),
}

impl crate::op::Op for Generate {
    type Error = GenerateError;
    type Output = String;

    fn execute(&self, _ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let factories = KeyFactories::shared();
        // Asymmetric tags take precedence; AES and PLAIN are symmetric only
        let map = match factories.generate_private_key(&self.algorithm) {
            Ok(key) => key.to_map(),
            Err(KeyError::UnknownAlgorithm(_)) => {
                factories.generate_symmetric_key(&self.algorithm)?.to_map()
            }
            Err(e) => return Err(e.into()),
        };
        Ok(serde_json::to_string_pretty(&map)?)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::op::{Op, OpContext};
    use common::crypto::info::KeyMap;

    fn generate(algorithm: &str) -> Result<KeyMap, GenerateError> {
        let json = Generate {
            algorithm: algorithm.to_string(),
        }
        .execute(&OpContext::new(None))?;
        Ok(serde_json::from_str(&json).unwrap())
    }

    #[test]
    fn test_generate_each_family() {
        assert_eq!(generate("ECC").unwrap()["algorithm"], "ECC");
        assert_eq!(generate("AES").unwrap()["algorithm"], "AES");
        assert_eq!(generate("PLAIN").unwrap()["algorithm"], "PLAIN");
    }

    #[test]
    fn test_generate_unknown_algorithm() {
        assert!(matches!(
            generate("DSA"),
            Err(GenerateError::Key(KeyError::UnknownAlgorithm(_)))
        ));
    }
}
