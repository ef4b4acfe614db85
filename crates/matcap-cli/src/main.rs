use clap::Parser;
use matcap_cli::cli::{Cli, Commands};
use std::io;
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::FmtSubscriber;

mod commands;

use commands::{bottlenecks, compare, reference, solve, validate};

fn main() -> ExitCode {
    let cli = Cli::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(cli.log_level)
        .with_writer(io::stderr)
        .finish();
    if let Err(err) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("setting default subscriber failed: {err}");
    }

    info!("matcap v{}", env!("CARGO_PKG_VERSION"));

    let result = match &cli.command {
        Commands::Solve(args) => solve::handle(args),
        Commands::Validate { input } => validate::handle(input),
        Commands::Bottlenecks(args) => bottlenecks::handle(args),
        Commands::Compare(args) => compare::handle(args),
        Commands::Reference(args) => reference::handle(args),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
