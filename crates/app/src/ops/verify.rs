use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use clap::Args;

use common::crypto::info::KeyMap;
use common::prelude::{KeyError, PublicKey, VerifyKey};

use crate::state::StateError;

/// Check a base64 signature over a message
#[derive(Args, Debug, Clone)]
pub struct Verify {
    /// Signed message, as UTF-8 text
    pub message: String,

    /// Base64 signature
    pub signature: String,

    /// Public key map as JSON; defaults to the stored key's public key
    #[arg(long)]
    pub public_key: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum VerifyError {
    #[error(transparent)]
    State(#[from] StateError),
    #[error("key error: {0}")]
    Key(#[from] KeyError),
    #[error("invalid public key JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("signature is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("signature does not match")]
    Mismatch,
}

impl Verify {
    fn public_key(&self, ctx: &crate::op::OpContext) -> Result<PublicKey, VerifyError> {
        match &self.public_key {
            Some(json) => {
                let map: KeyMap = serde_json::from_str(json)?;
                Ok(PublicKey::parse(&map)?)
            }
            None => Ok(ctx.state()?.load_key()?.public_key()?),
        }
    }
}

impl crate::op::Op for Verify {
    type Error = VerifyError;
    type Output = String;

    fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let key = self.public_key(ctx)?;
        let signature = BASE64.decode(self.signature.trim())?;
        if !key.verify(self.message.as_bytes(), &signature) {
            return Err(VerifyError::Mismatch);
        }
        Ok("signature OK".to_string())
    }
}
