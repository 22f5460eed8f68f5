use clap::{Args, Subcommand};

pub mod generate;
pub mod parse;

use crate::op::Op;

crate::command_enum! {
    (Generate, generate::Generate),
    (Parse, parse::Parse),
}

pub type IdCommand = Command;

#[derive(Args, Debug, Clone)]
pub struct Id {
    #[command(subcommand)]
    pub command: IdCommand,
}

impl Op for Id {
    type Error = OpError;
    type Output = OpOutput;

    fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        self.command.execute(ctx)
    }
}
