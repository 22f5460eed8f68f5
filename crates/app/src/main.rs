mod args;
mod logging;
mod op;
mod ops;
mod state;

use args::Args;
use clap::{Parser, Subcommand};
use op::Op;
use ops::{Address, Id, Init, Key, Sign, Verify, Version};

command_enum! {
    (Init, Init),
    (Key, Key),
    (Address, Address),
    (Id, Id),
    (Sign, Sign),
    (Verify, Verify),
    (Version, Version),
}

fn main() {
    let args = Args::parse();

    // Before init there is no config to read the level from
    let log_level = state::AppState::load(args.config_path.clone())
        .map(|state| state.config.log_level)
        .unwrap_or_else(|_| "info".to_string());
    let guard = logging::init_logging(&log_level);

    let ctx = op::OpContext::new(args.config_path);

    match args.command.execute(&ctx) {
        Ok(output) => {
            println!("{}", output);
        }
        Err(e) => {
            tracing::debug!(error = ?e, "command failed");
            eprintln!("Error: {}", e);
            drop(guard);
            std::process::exit(1);
        }
    }
}
