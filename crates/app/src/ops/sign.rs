use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use clap::Args;

use common::prelude::{KeyError, SignKey};

use crate::state::StateError;

/// Sign a message with the stored key, printing the base64 signature
#[derive(Args, Debug, Clone)]
pub struct Sign {
    /// Message to sign, as UTF-8 text
    pub message: String,
}

#[derive(Debug, thiserror::Error)]
pub enum SignError {
    #[error(transparent)]
    State(#[from] StateError),
    #[error("signing failed: {0}")]
    Key(#[from] KeyError),
}

impl crate::op::Op for Sign {
    type Error = SignError;
    type Output = String;

    fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let key = ctx.state()?.load_key()?;
        let signature = key.sign(self.message.as_bytes())?;
        Ok(BASE64.encode(signature))
    }
}
