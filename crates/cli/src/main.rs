// LeaveGrid CLI - headless workbook import operations

mod exit_codes;
mod import;
mod rates;

use std::process::ExitCode;

use clap::{Parser, Subcommand};

use exit_codes::EXIT_SUCCESS;
use import::ImportCommands;

#[derive(Parser)]
#[command(name = "lgrid")]
#[command(about = "Time-off calendar workbook import (CLI mode, headless)")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Import color-coded time-off workbooks
    Import {
        #[command(subcommand)]
        command: ImportCommands,
    },
}

/// Error carrying its exit code; rendered once at the top level.
#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Import { command } => import::cmd_import(command),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(err) => {
            eprintln!("error: {}", err.message);
            if let Some(hint) = err.hint {
                eprintln!("hint: {hint}");
            }
            ExitCode::from(err.code)
        }
    }
}
