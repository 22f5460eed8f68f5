pub use clap::Parser;

use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "dimid")]
#[command(about = "Generate and inspect DIM identities")]
pub struct Args {
    /// Path to the dimid state directory (defaults to ~/.dimid)
    #[arg(long, global = true)]
    pub config_path: Option<PathBuf>,

    #[command(subcommand)]
    pub command: crate::Command,
}
