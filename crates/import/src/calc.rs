//! PTO-Calc section: the sheet's authoritative declared-totals table.
//!
//! Anchored on the literal "January" month label, which drifted by one row
//! across sheet versions — locate the anchor, then read relative to it.

use leavegrid_engine::Sheet;

use crate::error::ImportError;
use crate::model::DeclaredMonth;

/// Month-label column (column B).
pub const CALC_MONTH_COL: usize = 1;
/// Candidate rows for the January label (sheet rows 42 and 43).
pub const CALC_ANCHOR_ROWS: [usize; 2] = [41, 42];
/// Declared used-hours column (column S).
pub const CALC_USED_COL: usize = 18;
/// Carryover column (column L), read on the January row.
pub const CALC_CARRYOVER_COL: usize = 11;
/// Stated accrual rate column (column N), read on the December row.
pub const CALC_RATE_COL: usize = 13;

/// Locate the January anchor row, trying both known layouts.
pub fn find_calc_anchor_row(sheet: &Sheet) -> Result<usize, ImportError> {
    CALC_ANCHOR_ROWS
        .iter()
        .copied()
        .find(|row| {
            sheet
                .text(*row, CALC_MONTH_COL)
                .map(|t| t.eq_ignore_ascii_case("january"))
                .unwrap_or(false)
        })
        .ok_or_else(|| ImportError::CalcAnchorMissing {
            sheet: sheet.name.clone(),
        })
}

/// Twelve declared month rows from the anchor down. Blank or unparsable
/// cells coerce to 0 — an empty row means no declared usage, not an error.
pub fn parse_declared_hours(sheet: &Sheet, anchor_row: usize) -> Vec<DeclaredMonth> {
    (0..12)
        .map(|offset| DeclaredMonth {
            month: offset as u32 + 1,
            used_hours: sheet.number(anchor_row + offset, CALC_USED_COL).unwrap_or(0.0),
        })
        .collect()
}

/// Carryover hours from the January row.
pub fn parse_carryover_hours(sheet: &Sheet, anchor_row: usize) -> f64 {
    sheet.number(anchor_row, CALC_CARRYOVER_COL).unwrap_or(0.0)
}

/// The accrual rate the sheet itself states, from the December row.
/// Non-authoritative; the computed rate wins on mismatch.
pub fn parse_stated_rate(sheet: &Sheet, anchor_row: usize) -> Option<f64> {
    sheet.number(anchor_row + 11, CALC_RATE_COL)
}

#[cfg(test)]
mod tests {
    use super::*;
    use leavegrid_engine::Cell;

    const MONTHS: [&str; 12] = [
        "January", "February", "March", "April", "May", "June", "July", "August", "September",
        "October", "November", "December",
    ];

    fn calc_sheet(anchor_row: usize) -> Sheet {
        let mut sheet = Sheet::new("Jane");
        for (i, month) in MONTHS.iter().enumerate() {
            sheet.set(anchor_row + i, CALC_MONTH_COL, Cell::text(*month));
            sheet.set(anchor_row + i, CALC_USED_COL, Cell::number(8.0 * i as f64));
        }
        sheet.set(anchor_row, CALC_CARRYOVER_COL, Cell::number(12.5));
        sheet.set(anchor_row + 11, CALC_RATE_COL, Cell::number(0.46));
        sheet
    }

    #[test]
    fn anchor_found_on_either_candidate_row() {
        for row in CALC_ANCHOR_ROWS {
            let sheet = calc_sheet(row);
            assert_eq!(find_calc_anchor_row(&sheet).unwrap(), row);
        }
    }

    #[test]
    fn anchor_missing_is_blocking() {
        let sheet = calc_sheet(10); // laid out somewhere unexpected
        let err = find_calc_anchor_row(&sheet).unwrap_err();
        assert!(matches!(err, ImportError::CalcAnchorMissing { .. }));
    }

    #[test]
    fn declared_hours_read_twelve_rows() {
        let sheet = calc_sheet(41);
        let declared = parse_declared_hours(&sheet, 41);
        assert_eq!(declared.len(), 12);
        assert_eq!(declared[0], DeclaredMonth { month: 1, used_hours: 0.0 });
        assert_eq!(declared[11], DeclaredMonth { month: 12, used_hours: 88.0 });
    }

    #[test]
    fn blank_declared_cells_coerce_to_zero() {
        let mut sheet = Sheet::new("S");
        sheet.set(41, CALC_MONTH_COL, Cell::text("January"));
        sheet.set(43, CALC_USED_COL, Cell::text("n/a"));
        let declared = parse_declared_hours(&sheet, 41);
        assert!(declared.iter().all(|d| d.used_hours == 0.0));
    }

    #[test]
    fn numeric_text_coerces() {
        let mut sheet = Sheet::new("S");
        sheet.set(41, CALC_MONTH_COL, Cell::text("January"));
        sheet.set(41, CALC_USED_COL, Cell::text(" 16 "));
        let declared = parse_declared_hours(&sheet, 41);
        assert_eq!(declared[0].used_hours, 16.0);
    }

    #[test]
    fn carryover_and_stated_rate() {
        let sheet = calc_sheet(42);
        assert_eq!(parse_carryover_hours(&sheet, 42), 12.5);
        assert_eq!(parse_stated_rate(&sheet, 42), Some(0.46));

        let empty = Sheet::new("S");
        assert_eq!(parse_carryover_hours(&empty, 42), 0.0);
        assert_eq!(parse_stated_rate(&empty, 42), None);
    }
}
