pub mod address;
pub mod id;
pub mod init;
pub mod key;
pub mod sign;
pub mod verify;
pub mod version;

pub use address::Address;
pub use id::Id;
pub use init::Init;
pub use key::Key;
pub use sign::Sign;
pub use verify::Verify;
pub use version::Version;

use common::prelude::{EntityType, Meta, MetaType, PrivateKey};

use crate::state::{AppState, StateError};

/// Meta settings shared by the commands that derive addresses.
/// Unset flags fall back to the state config.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct MetaArgs {
    /// Seed signed into the meta fingerprint; becomes the identifier name
    #[arg(long)]
    pub seed: Option<String>,

    /// Meta type: 1/mkm, 2/btc or 4/eth
    #[arg(long)]
    pub meta_type: Option<String>,

    /// Network byte of the derived address (0 user, 1 group, ...)
    #[arg(long)]
    pub network: Option<u8>,
}

#[derive(Debug, thiserror::Error)]
pub enum MetaArgsError {
    #[error(transparent)]
    State(#[from] StateError),
    #[error("meta error: {0}")]
    Meta(#[from] common::mkm::MetaError),
}

impl MetaArgs {
    pub fn meta_type(&self, state: &AppState) -> Result<MetaType, MetaArgsError> {
        match &self.meta_type {
            Some(tag) => Ok(MetaType::parse(tag)?),
            None => Ok(state.config.meta_type()?),
        }
    }

    pub fn network(&self, state: &AppState) -> EntityType {
        self.network
            .map(EntityType)
            .unwrap_or_else(|| state.config.network())
    }

    /// Generate the meta of `key` for these settings
    pub fn meta(&self, state: &AppState, key: &PrivateKey) -> Result<Meta, MetaArgsError> {
        let meta_type = self.meta_type(state)?;
        Ok(Meta::generate(meta_type, key, self.seed.as_deref())?)
    }
}
