use clap::Args;

use common::mkm::{self, IdentifierError};

/// Split an identifier into its components
#[derive(Args, Debug, Clone)]
pub struct Parse {
    /// Identifier string, `name@address/terminal`
    pub id: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("invalid identifier: {0}")]
    Identifier(#[from] IdentifierError),
}

impl crate::op::Op for Parse {
    type Error = ParseError;
    type Output = String;

    fn execute(&self, _ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let id = mkm::parse_identifier(&self.id)?;
        let network = id.network();
        let kind = if id.is_broadcast() {
            "broadcast"
        } else if id.is_group() {
            "group"
        } else {
            "user"
        };

        Ok(format!(
            "name:     {}\n\
             address:  {}\n\
             terminal: {}\n\
             network:  {} ({:#04x})\n\
             kind:     {}",
            id.name().unwrap_or("-"),
            id.address(),
            id.terminal().unwrap_or("-"),
            network,
            network.0,
            kind,
        ))
    }
}
