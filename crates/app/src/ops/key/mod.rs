use clap::{Args, Subcommand};

pub mod generate;
pub mod show;

use crate::op::Op;

crate::command_enum! {
    (Generate, generate::Generate),
    (Show, show::Show),
}

pub type KeyCommand = Command;

#[derive(Args, Debug, Clone)]
pub struct Key {
    #[command(subcommand)]
    pub command: KeyCommand,
}

impl Op for Key {
    type Error = OpError;
    type Output = OpOutput;

    fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        self.command.execute(ctx)
    }
}
