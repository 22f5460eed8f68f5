use clap::Args;

use common::mkm::{self, MetaError};

use crate::ops::{MetaArgs, MetaArgsError};
use crate::state::StateError;

/// Build the identifier of the stored key
#[derive(Args, Debug, Clone)]
pub struct Generate {
    #[command(flatten)]
    pub meta: MetaArgs,

    /// Terminal (device) suffix
    #[arg(long)]
    pub terminal: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    #[error(transparent)]
    State(#[from] StateError),
    #[error(transparent)]
    Meta(#[from] MetaArgsError),
    #[error("identifier generation failed: {0}")]
    Identifier(#[from] MetaError),
}

impl crate::op::Op for Generate {
    type Error = GenerateError;
    type Output = String;

    fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let state = ctx.state()?;
        let key = state.load_key()?;
        let meta = self.meta.meta(&state, &key)?;
        let network = self.meta.network(&state);

        let id = mkm::generate_identifier(&meta, network, self.terminal.as_deref())?;
        Ok(id.to_string())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::op::{Op, OpContext};
    use crate::state::AppState;
    use common::prelude::EntityType;
    use tempfile::TempDir;

    #[test]
    fn test_generate_identifier() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("state");
        AppState::init(Some(path.clone()), None).unwrap();
        let ctx = OpContext::new(Some(path));

        let generate = Generate {
            meta: MetaArgs {
                seed: Some("moky".to_string()),
                meta_type: None,
                network: Some(EntityType::GROUP.0),
            },
            terminal: Some("home".to_string()),
        };
        let id = mkm::parse_identifier(&generate.execute(&ctx).unwrap()).unwrap();
        assert_eq!(id.name(), Some("moky"));
        assert_eq!(id.terminal(), Some("home"));
        assert!(id.is_group());
    }

    #[test]
    fn test_mkm_requires_seed() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("state");
        AppState::init(Some(path.clone()), None).unwrap();
        let ctx = OpContext::new(Some(path));

        let generate = Generate {
            meta: MetaArgs::default(),
            terminal: None,
        };
        assert!(generate.execute(&ctx).is_err());
    }
}
