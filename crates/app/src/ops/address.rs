use clap::Args;

use common::mkm::{self, MetaError};

use super::{MetaArgs, MetaArgsError};
use crate::state::StateError;

/// Derive the address of the stored key
#[derive(Args, Debug, Clone)]
pub struct Address {
    #[command(flatten)]
    pub meta: MetaArgs,

    /// Also print the meta the address was derived from
    #[arg(long)]
    pub show_meta: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum AddressError {
    #[error(transparent)]
    State(#[from] StateError),
    #[error(transparent)]
    Meta(#[from] MetaArgsError),
    #[error("address derivation failed: {0}")]
    Derive(#[from] MetaError),
    #[error("failed to encode meta: {0}")]
    Json(#[from] serde_json::Error),
}

impl crate::op::Op for Address {
    type Error = AddressError;
    type Output = String;

    fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let state = ctx.state()?;
        let key = state.load_key()?;
        let meta = self.meta.meta(&state, &key)?;
        let network = self.meta.network(&state);

        let address = mkm::generate_address(&meta, network)?;
        tracing::debug!(%address, network = %network, "derived address");

        if self.show_meta {
            let meta = serde_json::to_string_pretty(&meta.to_map())?;
            return Ok(format!("{}\n{}", address, meta));
        }
        Ok(address.to_string())
    }
}
