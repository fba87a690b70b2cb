//! problemkit
//!
//! Reads a constraint violation list as JSON and prints the matching
//! RFC 7807 problem document.

use clap::Parser;

use problemkit_cli::cli::CliArgs;
use problemkit_cli::tracing_setup::install_tracing_from_config;

fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();

    let config = problemkit_cli::load_config(args.config_path.as_deref()).map_err(|e| {
        eprintln!("failed to load configuration: {e:#}");
        e
    })?;

    install_tracing_from_config(&config.logging);
    tracing::debug!(config_path = ?args.config_path, "configuration loaded");

    let output = problemkit_cli::run(&args, &config)?;
    println!("{output}");

    Ok(())
}
