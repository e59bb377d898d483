//! OAuth1 CLI - temporary credential server.
//!
//! Provides commands for:
//! - `serve`: Start the temporary credential endpoint
//! - `sign`: Print a signed `Authorization` header for manual testing

mod commands;
mod error;
mod output;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{ServeArgs, SignArgs};
use error::CliError;
use output::Output;

/// OAuth1 - temporary credential server.
#[derive(Parser)]
#[command(name = "oauth1", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the temporary credential endpoint.
    Serve(ServeArgs),
    /// Sign a temporary credential request.
    Sign(SignArgs),
}

fn main() {
    let cli = Cli::parse();
    let output = Output::new();

    let verbose = matches!(&cli.command, Commands::Serve(args) if args.verbose);

    // --verbose enables INFO level, otherwise use RUST_LOG or default to WARN
    let filter = if verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let result = match cli.command {
        Commands::Serve(args) => tokio::runtime::Runtime::new()
            .map_err(CliError::from)
            .and_then(|rt| rt.block_on(args.execute())),
        Commands::Sign(args) => args.execute(&output),
    };

    if let Err(err) = result {
        output.error(&format!("Error: {err}"));
        std::process::exit(1);
    }
}
