//! Calendar grid walk: the only place that knows the twelve-month
//! geometry.
//!
//! The walk under-commits on purpose: a cell either matches the legend and
//! becomes a raw entry, or it is handed downstream untouched as an
//! unmatched colored/noted cell. Guessing happens in the reconciliation
//! passes, never here.

use chrono::NaiveDate;
use leavegrid_engine::{CellValue, Sheet};

use crate::color::{match_legend_color, resolve_fill, ThemePalette};
use crate::config::ImportConfig;
use crate::legend::Legend;
use crate::model::{GridScan, RawEntry, Rgb, UnmatchedCell};
use crate::notes::normalize_note_text;

/// Month grids are laid out 3 across by 4 down.
pub const GRID_COLS: usize = 3;
/// First grid's title row (sheet row 3).
pub const GRID_FIRST_ROW: usize = 2;
/// First grid's first day column (column B).
pub const GRID_FIRST_COL: usize = 1;
/// Rows from one grid origin to the next: title + weekday header +
/// 6 week rows + gap.
pub const GRID_ROW_STRIDE: usize = 9;
/// Columns from one grid origin to the next: 7 day columns + gap.
pub const GRID_COL_STRIDE: usize = 8;
/// Title and weekday-header rows above the day cells.
pub const GRID_HEADER_ROWS: usize = 2;
pub const GRID_WEEK_ROWS: usize = 6;
pub const GRID_DAY_COLS: usize = 7;

/// Origin (title-row, first-day-column) of month `m` (0-11).
pub fn month_origin(month0: usize) -> (usize, usize) {
    let grid_row = month0 / GRID_COLS;
    let grid_col = month0 % GRID_COLS;
    (
        GRID_FIRST_ROW + grid_row * GRID_ROW_STRIDE,
        GRID_FIRST_COL + grid_col * GRID_COL_STRIDE,
    )
}

/// A day cell's value: the day-of-month number, optionally trailed by a
/// superscript marker digit encoding partial-day hours ("15⁴" = day 15,
/// 4 hours).
pub fn parse_day_cell_value(value: &CellValue) -> Option<(u32, Option<u32>)> {
    match value {
        CellValue::Number(n) => {
            if n.fract() == 0.0 && (1.0..=31.0).contains(n) {
                Some((*n as u32, None))
            } else {
                None
            }
        }
        CellValue::Text(s) => {
            let s = s.trim();
            let marker_at = s.char_indices().find(|(_, c)| superscript_digit(*c).is_some());
            let (day_part, marker) = match marker_at {
                Some((idx, c)) => (&s[..idx], superscript_digit(c)),
                None => (s, None),
            };
            let day: u32 = day_part.trim().parse().ok()?;
            if (1..=31).contains(&day) {
                Some((day, marker))
            } else {
                None
            }
        }
        _ => None,
    }
}

fn superscript_digit(c: char) -> Option<u32> {
    match c {
        '¹' => Some(1),
        '²' => Some(2),
        '³' => Some(3),
        '⁴' => Some(4),
        '⁵' => Some(5),
        '⁶' => Some(6),
        '⁷' => Some(7),
        '⁸' => Some(8),
        '⁹' => Some(9),
        _ => None,
    }
}

/// Solid white reads as background, not as a fill signal.
fn is_background(rgb: Rgb) -> bool {
    rgb == [255, 255, 255]
}

/// Walk all twelve month grids for one reporting year.
pub fn parse_calendar(
    sheet: &Sheet,
    year: i32,
    legend: &Legend,
    palette: &ThemePalette,
    config: &ImportConfig,
) -> GridScan {
    let mut scan = GridScan::default();

    for month0 in 0..12 {
        let (origin_row, origin_col) = month_origin(month0);
        for week in 0..GRID_WEEK_ROWS {
            for day_col in 0..GRID_DAY_COLS {
                let row = origin_row + GRID_HEADER_ROWS + week;
                let col = origin_col + day_col;

                let Some((day, marker)) = parse_day_cell_value(sheet.value(row, col)) else {
                    continue;
                };
                let Some(date) = NaiveDate::from_ymd_opt(year, month0 as u32 + 1, day) else {
                    continue;
                };

                let color = sheet
                    .fill(row, col)
                    .and_then(|f| resolve_fill(&f, palette))
                    .filter(|rgb| !is_background(*rgb));
                let note = sheet.note(row, col).map(normalize_note_text);

                match color.and_then(|rgb| match_legend_color(rgb, &legend.swatches, config)) {
                    Some((swatch, category)) => {
                        scan.entries.push(RawEntry {
                            date,
                            category,
                            hours: config.default_day_hours,
                            note,
                            partial_color: legend.is_partial(swatch),
                            marker_hours: marker.map(f64::from),
                        });
                    }
                    None if note.is_some() => {
                        scan.unmatched_noted.push(UnmatchedCell { date, color, note });
                    }
                    None if color.is_some() => {
                        scan.unmatched_colored.push(UnmatchedCell { date, color, note });
                    }
                    None => {} // no color, no note: not a leave day
                }
            }
        }
    }

    scan
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::LeaveCategory;
    use leavegrid_engine::{Cell, FillRef};

    const SICK: Rgb = [255, 0, 0];
    const PTO: Rgb = [0, 176, 80];
    const PARTIAL: Rgb = [146, 208, 80];

    fn test_legend() -> Legend {
        Legend {
            swatches: vec![
                (SICK, LeaveCategory::Sick),
                (PTO, LeaveCategory::Pto),
                (PARTIAL, LeaveCategory::Pto),
            ],
            partial_colors: vec![PARTIAL],
        }
    }

    /// Place day `day` of month `month0` at a deterministic grid position.
    fn day_pos(month0: usize, day: u32) -> (usize, usize) {
        let (origin_row, origin_col) = month_origin(month0);
        let idx = (day - 1) as usize;
        (
            origin_row + GRID_HEADER_ROWS + idx / GRID_DAY_COLS,
            origin_col + idx % GRID_DAY_COLS,
        )
    }

    fn set_day(sheet: &mut Sheet, month0: usize, day: u32, cell: Cell) {
        let (row, col) = day_pos(month0, day);
        sheet.set(row, col, cell);
    }

    #[test]
    fn grid_origins_tile_three_by_four() {
        assert_eq!(month_origin(0), (2, 1));
        assert_eq!(month_origin(2), (2, 17));
        assert_eq!(month_origin(3), (11, 1));
        assert_eq!(month_origin(11), (29, 17));
    }

    #[test]
    fn day_value_forms() {
        assert_eq!(parse_day_cell_value(&CellValue::Number(15.0)), Some((15, None)));
        assert_eq!(
            parse_day_cell_value(&CellValue::Text("15⁴".into())),
            Some((15, Some(4)))
        );
        assert_eq!(parse_day_cell_value(&CellValue::Text("7".into())), Some((7, None)));
        assert_eq!(parse_day_cell_value(&CellValue::Number(15.5)), None);
        assert_eq!(parse_day_cell_value(&CellValue::Number(32.0)), None);
        assert_eq!(parse_day_cell_value(&CellValue::Text("Mon".into())), None);
        assert_eq!(parse_day_cell_value(&CellValue::Empty), None);
    }

    #[test]
    fn colored_days_become_raw_entries() {
        let mut sheet = Sheet::new("Jane");
        set_day(&mut sheet, 0, 6, Cell::number(6.0).with_fill(FillRef::Argb(SICK)));
        set_day(&mut sheet, 0, 7, Cell::number(7.0).with_fill(FillRef::Argb(PTO)));
        set_day(&mut sheet, 0, 8, Cell::number(8.0)); // plain day

        let scan = parse_calendar(
            &sheet,
            2024,
            &test_legend(),
            &ThemePalette::default(),
            &ImportConfig::default(),
        );
        assert_eq!(scan.entries.len(), 2);
        assert_eq!(scan.entries[0].category, LeaveCategory::Sick);
        assert_eq!(scan.entries[0].date, NaiveDate::from_ymd_opt(2024, 1, 6).unwrap());
        assert_eq!(scan.entries[0].hours, 8.0);
        assert!(scan.unmatched_colored.is_empty());
        assert!(scan.unmatched_noted.is_empty());
    }

    #[test]
    fn partial_color_and_marker_travel_with_entry() {
        let mut sheet = Sheet::new("Jane");
        set_day(
            &mut sheet,
            3,
            15,
            Cell::text("15⁴").with_fill(FillRef::Argb(PARTIAL)),
        );
        let scan = parse_calendar(
            &sheet,
            2024,
            &test_legend(),
            &ThemePalette::default(),
            &ImportConfig::default(),
        );
        assert_eq!(scan.entries.len(), 1);
        assert!(scan.entries[0].partial_color);
        assert_eq!(scan.entries[0].marker_hours, Some(4.0));
        assert_eq!(scan.entries[0].category, LeaveCategory::Pto);
    }

    #[test]
    fn unknown_fill_goes_to_unmatched_colored() {
        let mut sheet = Sheet::new("Jane");
        // Saturated blue: colored, but no legend swatch is close
        set_day(&mut sheet, 1, 14, Cell::number(14.0).with_fill(FillRef::Argb([0, 0, 255])));
        let scan = parse_calendar(
            &sheet,
            2024,
            &test_legend(),
            &ThemePalette::default(),
            &ImportConfig::default(),
        );
        assert!(scan.entries.is_empty());
        assert_eq!(scan.unmatched_colored.len(), 1);
        assert_eq!(scan.unmatched_colored[0].color, Some([0, 0, 255]));
    }

    #[test]
    fn noted_uncolored_goes_to_unmatched_noted() {
        let mut sheet = Sheet::new("Jane");
        set_day(&mut sheet, 1, 9, Cell::number(9.0).with_note("4 hours PTO"));
        let scan = parse_calendar(
            &sheet,
            2024,
            &test_legend(),
            &ThemePalette::default(),
            &ImportConfig::default(),
        );
        assert!(scan.entries.is_empty());
        assert_eq!(scan.unmatched_noted.len(), 1);
        assert_eq!(scan.unmatched_noted[0].note.as_deref(), Some("4 hours PTO"));
    }

    #[test]
    fn noted_beats_colored_for_unmatched_routing() {
        let mut sheet = Sheet::new("Jane");
        set_day(
            &mut sheet,
            1,
            10,
            Cell::number(10.0)
                .with_fill(FillRef::Argb([0, 0, 255]))
                .with_note("dentist"),
        );
        let scan = parse_calendar(
            &sheet,
            2024,
            &test_legend(),
            &ThemePalette::default(),
            &ImportConfig::default(),
        );
        assert_eq!(scan.unmatched_noted.len(), 1);
        assert!(scan.unmatched_colored.is_empty());
    }

    #[test]
    fn white_fill_is_background() {
        let mut sheet = Sheet::new("Jane");
        set_day(
            &mut sheet,
            1,
            11,
            Cell::number(11.0).with_fill(FillRef::Argb([255, 255, 255])),
        );
        let scan = parse_calendar(
            &sheet,
            2024,
            &test_legend(),
            &ThemePalette::default(),
            &ImportConfig::default(),
        );
        assert!(scan.entries.is_empty());
        assert!(scan.unmatched_colored.is_empty());
    }

    #[test]
    fn invalid_dates_are_ignored() {
        let mut sheet = Sheet::new("Jane");
        // Feb 30 does not exist; 2023 is not a leap year for Feb 29
        set_day(&mut sheet, 1, 30, Cell::number(30.0).with_fill(FillRef::Argb(SICK)));
        set_day(&mut sheet, 1, 29, Cell::number(29.0).with_fill(FillRef::Argb(SICK)));
        let scan = parse_calendar(
            &sheet,
            2023,
            &test_legend(),
            &ThemePalette::default(),
            &ImportConfig::default(),
        );
        assert!(scan.entries.is_empty());
    }
}
