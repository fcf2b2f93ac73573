pub mod cli;
pub mod commands;
pub mod utils;

use clap::Parser;
use cli::Kitzur;
use commands::handle_command;
use std::process;

/// Run the kitzur CLI application
pub fn run_main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Kitzur::parse();
    if let Err(e) = handle_command(args) {
        log::debug!("Command failed: {:?}", e);
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
