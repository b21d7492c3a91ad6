//! Sheet orchestrator: composes the parsers for one employee sheet and
//! isolates failures per sheet.

use leavegrid_engine::{Sheet, Workbook};

use crate::ack::{generate_acks, parse_existing_acks};
use crate::calc::{
    find_calc_anchor_row, parse_carryover_hours, parse_declared_hours, parse_stated_rate,
};
use crate::color::{parse_theme_colors, ThemePalette};
use crate::config::ImportConfig;
use crate::employee::{looks_like_employee_sheet, parse_employee, RateLookup};
use crate::error::ImportError;
use crate::grid::parse_calendar;
use crate::legend::parse_legend;
use crate::model::{SheetResult, WorkbookResult};
use crate::reconcile::reconcile;
use crate::summary::compute_summary;

/// Parse one employee sheet end to end.
///
/// Blocking failures (missing legend, missing PTO-Calc anchor, unusable
/// identity block) abandon this sheet only: they come back as a
/// `SheetResult` whose `errors` list is non-empty, and sibling sheets are
/// unaffected. Nothing escapes to the caller as an `Err`.
pub fn run_sheet(
    sheet: &Sheet,
    palette: &ThemePalette,
    config: &ImportConfig,
    rates: &dyn RateLookup,
) -> SheetResult {
    match run_sheet_inner(sheet, palette, config, rates) {
        Ok(result) => result,
        Err(err) => SheetResult::failed(sheet.name.clone(), err.to_string()),
    }
}

fn run_sheet_inner(
    sheet: &Sheet,
    palette: &ThemePalette,
    config: &ImportConfig,
    rates: &dyn RateLookup,
) -> Result<SheetResult, ImportError> {
    let mut result = SheetResult::empty(sheet.name.clone());

    // Blocking anchors first: without a legend or the PTO-Calc table the
    // calendar cannot be classified or reconciled.
    let legend = parse_legend(sheet, palette)?;
    let anchor_row = find_calc_anchor_row(sheet)?;

    let declared = parse_declared_hours(sheet, anchor_row);
    let carryover = parse_carryover_hours(sheet, anchor_row);
    let stated_rate = parse_stated_rate(sheet, anchor_row);

    let employee = parse_employee(sheet, stated_rate, carryover, rates, config)?;
    result.warnings.extend(employee.warnings);
    result.resolved.extend(employee.resolved);
    let year = employee.info.year;

    let scan = parse_calendar(sheet, year, &legend, palette, config);
    let outcome = reconcile(scan, &declared, config);
    result.warnings.extend(outcome.warnings);
    result.resolved.extend(outcome.resolved);

    result
        .acknowledgements
        .extend(parse_existing_acks(sheet, anchor_row, year));
    result.acknowledgements.extend(generate_acks(
        &outcome.entries,
        &declared,
        &sheet.name,
        year,
        config,
    ));

    result.entries = outcome.entries;
    result.employee = Some(employee.info);
    Ok(result)
}

/// Run the import over every employee-looking sheet in the workbook.
///
/// Sheets without a "Hire Date" label are skipped (summary tabs, cover
/// pages); each remaining sheet parses independently.
pub fn run_workbook(
    workbook: &Workbook,
    config: &ImportConfig,
    rates: &dyn RateLookup,
) -> WorkbookResult {
    let palette = workbook
        .theme_xml
        .as_deref()
        .map(parse_theme_colors)
        .unwrap_or_default();

    let mut sheets = Vec::new();
    let mut skipped_sheets = Vec::new();

    for sheet in workbook.sheets() {
        if !looks_like_employee_sheet(sheet) {
            skipped_sheets.push(sheet.name.clone());
            continue;
        }
        sheets.push(run_sheet(sheet, &palette, config, rates));
    }

    WorkbookResult {
        summary: compute_summary(&sheets, skipped_sheets.len()),
        sheets,
        skipped_sheets,
    }
}
