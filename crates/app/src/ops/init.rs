use clap::Args;

use crate::state::{AppConfig, AppState};

#[derive(Args, Debug, Clone)]
pub struct Init {
    /// Algorithm of the generated private key (ECC or RSA)
    #[arg(long, default_value = "ECC")]
    pub algorithm: String,

    /// Default meta type: 1/mkm, 2/btc or 4/eth
    #[arg(long, default_value = "1")]
    pub meta_type: String,

    /// Default network byte of derived addresses
    #[arg(long, default_value_t = 0)]
    pub network: u8,

    /// Default log level
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

#[derive(Debug, thiserror::Error)]
pub enum InitError {
    #[error("init failed: {0}")]
    StateFailed(#[from] crate::state::StateError),
}

impl crate::op::Op for Init {
    type Error = InitError;
    type Output = String;

    fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let config = AppConfig {
            algorithm: self.algorithm.clone(),
            meta_type: self.meta_type.clone(),
            network: self.network,
            log_level: self.log_level.clone(),
        };

        let state = AppState::init(ctx.config_path.clone(), Some(config))?;
        tracing::info!(dir = %state.dimid_dir.display(), "initialized dimid directory");

        let output = format!(
            "Initialized dimid directory at: {}\n\
             - Key: {}\n\
             - Config: {}\n\
             - Algorithm: {}\n\
             - Meta type: {}\n\
             - Network: {}",
            state.dimid_dir.display(),
            state.key_path.display(),
            state.config_path.display(),
            state.config.algorithm,
            state.config.meta_type,
            state.config.network,
        );

        Ok(output)
    }
}
