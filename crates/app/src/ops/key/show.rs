use clap::Args;

use common::prelude::{CryptographyKey, KeyError};

use crate::state::StateError;

/// Print the key stored in the state directory
#[derive(Args, Debug, Clone)]
pub struct Show {
    /// Print the private key map instead of the public key
    #[arg(long)]
    pub private: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum ShowError {
    #[error(transparent)]
    State(#[from] StateError),
    #[error("key error: {0}")]
    Key(#[from] KeyError),
    #[error("failed to encode key: {0}")]
    Json(#[from] serde_json::Error),
}

impl crate::op::Op for Show {
    type Error = ShowError;
    type Output = String;

    fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let key = ctx.state()?.load_key()?;
        let map = if self.private {
            key.to_map()
        } else {
            key.public_key()?.to_map()
        };
        Ok(serde_json::to_string_pretty(&map)?)
    }
}
