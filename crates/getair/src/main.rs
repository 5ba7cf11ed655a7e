mod cli;
mod commands;
mod error;
mod output;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.global.verbose);

    if let Err(e) = run(cli).await {
        eprintln!("error: {e}");
        std::process::exit(e.exit_code());
    }
}

fn init_tracing(verbose: u8) {
    let default_filter = match verbose {
        0 => "warn",
        1 => "info,getair_api=debug",
        _ => "debug",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Command::Status => commands::status::handle(&cli.global).await,
        Command::Zones => commands::zones::handle(&cli.global).await,
        Command::Entities => commands::entities::handle(&cli.global).await,
        Command::Devices => commands::devices::handle(&cli.global).await,
        Command::Set(cmd) => commands::set::handle(cmd, &cli.global).await,
        Command::Reset(cmd) => commands::reset::handle(cmd, &cli.global).await,
        Command::Watch => commands::watch::handle(&cli.global).await,
    }
}
