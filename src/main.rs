mod cli;
mod config;
mod core;
mod error;
mod models;
mod player;
mod sources;

#[cfg(feature = "gui")]
mod gui;

use clap::Parser;

fn main() {
    env_logger::init();

    let cli = cli::Cli::parse();

    if let Err(e) = cli::run(cli) {
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}
