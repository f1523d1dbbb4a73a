//! unilog CLI
//!
//! Command-line front end for the logging pipeline: redact text, validate
//! the environment configuration, emit sample records.

use clap::{Parser, Subcommand};

mod commands;

#[derive(Debug, Parser)]
#[command(name = "unilog")]
#[command(about = "unilog - Structured logging and redaction pipeline", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Redact stdin line by line to stdout
    Redact(commands::redact::RedactArgs),
    /// Resolve and validate the logging configuration
    CheckConfig(commands::check_config::CheckConfigArgs),
    /// Emit a sample record through the configured sinks
    Emit(commands::emit::EmitArgs),
}

fn main() {
    // A missing .env file is normal; the process environment still applies.
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Redact(args) => commands::redact::execute(args),
        Commands::CheckConfig(args) => commands::check_config::execute(args),
        Commands::Emit(args) => commands::emit::execute(args),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
