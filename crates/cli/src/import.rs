//! `lgrid import` — run the calendar import against an xlsx workbook.

use std::path::PathBuf;

use clap::Subcommand;
use leavegrid_import::model::WorkbookResult;
use leavegrid_import::ImportConfig;

use crate::exit_codes::{EXIT_IO, EXIT_SHEET_ERRORS, EXIT_USAGE};
use crate::rates::RateTable;
use crate::CliError;

#[derive(Subcommand)]
pub enum ImportCommands {
    /// Run the import and print a summary (or JSON)
    #[command(after_help = "\
Examples:
  lgrid import run timeoff-2024.xlsx
  lgrid import run timeoff-2024.xlsx --json
  lgrid import run timeoff-2024.xlsx --config import.toml --rates rates.toml
  lgrid import run timeoff-2024.xlsx --output result.json")]
    Run {
        /// Path to the .xlsx workbook
        workbook: PathBuf,

        /// Threshold config TOML (defaults apply when omitted)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Accrual rate table TOML (built-in brackets when omitted)
        #[arg(long)]
        rates: Option<PathBuf>,

        /// Output JSON to stdout instead of a human summary
        #[arg(long)]
        json: bool,

        /// Write JSON output to file
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Validate config and rate table files without importing
    #[command(after_help = "\
Examples:
  lgrid import validate --config import.toml --rates rates.toml")]
    Validate {
        /// Threshold config TOML
        #[arg(long)]
        config: Option<PathBuf>,

        /// Accrual rate table TOML
        #[arg(long)]
        rates: Option<PathBuf>,
    },
}

pub fn cmd_import(cmd: ImportCommands) -> Result<(), CliError> {
    match cmd {
        ImportCommands::Run { workbook, config, rates, json, output } => {
            cmd_import_run(workbook, config, rates, json, output)
        }
        ImportCommands::Validate { config, rates } => cmd_import_validate(config, rates),
    }
}

fn load_config(path: Option<&PathBuf>) -> Result<ImportConfig, CliError> {
    match path {
        None => Ok(ImportConfig::default()),
        Some(path) => {
            let text = std::fs::read_to_string(path).map_err(|e| CliError {
                code: EXIT_IO,
                message: format!("cannot read {}: {e}", path.display()),
                hint: None,
            })?;
            ImportConfig::from_toml(&text).map_err(|e| CliError {
                code: EXIT_USAGE,
                message: e.to_string(),
                hint: None,
            })
        }
    }
}

fn load_rates(path: Option<&PathBuf>) -> Result<RateTable, CliError> {
    match path {
        None => Ok(RateTable::default()),
        Some(path) => {
            let text = std::fs::read_to_string(path).map_err(|e| CliError {
                code: EXIT_IO,
                message: format!("cannot read {}: {e}", path.display()),
                hint: None,
            })?;
            RateTable::from_toml(&text)
        }
    }
}

fn cmd_import_run(
    workbook_path: PathBuf,
    config_path: Option<PathBuf>,
    rates_path: Option<PathBuf>,
    json_output: bool,
    output_file: Option<PathBuf>,
) -> Result<(), CliError> {
    let config = load_config(config_path.as_ref())?;
    let rates = load_rates(rates_path.as_ref())?;

    let (workbook, load_report) = leavegrid_io::load_workbook(&workbook_path)
        .map_err(|e| CliError { code: EXIT_IO, message: e.to_string(), hint: None })?;

    let result = leavegrid_import::run_workbook(&workbook, &config, &rates);

    if let Some(ref path) = output_file {
        let json = serde_json::to_string_pretty(&result).map_err(|e| CliError {
            code: EXIT_IO,
            message: format!("cannot serialize result: {e}"),
            hint: None,
        })?;
        std::fs::write(path, json).map_err(|e| CliError {
            code: EXIT_IO,
            message: format!("cannot write {}: {e}", path.display()),
            hint: None,
        })?;
    }

    if json_output {
        let json = serde_json::to_string_pretty(&result).map_err(|e| CliError {
            code: EXIT_IO,
            message: format!("cannot serialize result: {e}"),
            hint: None,
        })?;
        println!("{json}");
    } else {
        print_human_summary(&result, &load_report);
    }

    if result.summary.sheets_failed > 0 {
        return Err(CliError {
            code: EXIT_SHEET_ERRORS,
            message: format!("{} sheet(s) failed to import", result.summary.sheets_failed),
            hint: Some("see per-sheet errors above".into()),
        });
    }
    Ok(())
}

fn print_human_summary(result: &WorkbookResult, load_report: &leavegrid_io::LoadReport) {
    let s = &result.summary;
    println!(
        "Imported {} sheet(s), {} skipped, {} failed",
        s.sheets_imported, s.sheets_skipped, s.sheets_failed
    );
    println!(
        "{} leave entries · {} warnings · {} auto-resolved",
        s.entries, s.warnings, s.resolved
    );
    if !s.hours_by_category.is_empty() {
        let parts: Vec<String> = s
            .hours_by_category
            .iter()
            .map(|(category, hours)| format!("{category} {hours}h"))
            .collect();
        println!("Hours: {}", parts.join(" · "));
    }
    for warning in &load_report.warnings {
        println!("load: {warning}");
    }

    for sheet in &result.sheets {
        if sheet.errors.is_empty() && sheet.warnings.is_empty() && sheet.resolved.is_empty() {
            continue;
        }
        println!("\n{}:", sheet.sheet);
        for error in &sheet.errors {
            println!("  error: {error}");
        }
        for warning in &sheet.warnings {
            println!("  warning: {warning}");
        }
        for resolved in &sheet.resolved {
            println!("  resolved: {resolved}");
        }
    }
}

fn cmd_import_validate(
    config_path: Option<PathBuf>,
    rates_path: Option<PathBuf>,
) -> Result<(), CliError> {
    let config = load_config(config_path.as_ref())?;
    let rates = load_rates(rates_path.as_ref())?;
    println!(
        "config ok ({} legend-distance cap, {}h ack tolerance); rate table ok ({} bracket(s))",
        config.color_max_distance,
        config.ack_tolerance_hours,
        rates.bracket.len()
    );
    Ok(())
}
