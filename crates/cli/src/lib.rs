pub mod commands;

use std::io;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "detailbook",
    about = "Detailbook operator CLI",
    long_about = "Inspect configuration and the service catalog, and rehearse conversations offline.",
    after_help = "Examples:\n  detailbook doctor --json\n  detailbook catalog\n  detailbook chat --user U-demo"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
    #[command(about = "Validate config, LINE credential readiness, and the service catalog")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "Print the service catalog as a price matrix")]
    Catalog {
        #[arg(long, help = "Catalog TOML file to load instead of the configured one")]
        catalog: Option<PathBuf>,
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "Talk to the booking assistant from stdin without LINE")]
    Chat {
        #[arg(long, default_value = "U-local", help = "User id the conversation runs as")]
        user: String,
        #[arg(long, help = "Catalog TOML file to load instead of the configured one")]
        catalog: Option<PathBuf>,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
        Command::Doctor { json } => commands::doctor::run(json),
        Command::Catalog { catalog, json } => commands::catalog::run(catalog, json),
        Command::Chat { user, catalog } => {
            let stdin = io::stdin();
            commands::chat::run(stdin.lock(), &user, catalog)
        }
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
