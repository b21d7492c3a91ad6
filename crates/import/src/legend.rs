//! Per-sheet color legend: swatch colors to leave categories.

use leavegrid_engine::Sheet;

use crate::color::{resolve_fill, ThemePalette};
use crate::error::ImportError;
use crate::model::{LeaveCategory, Rgb};

/// Column the legend lives in (column Z).
pub const LEGEND_COL: usize = 25;
/// The header is expected somewhere in the top rows of the sheet.
pub const LEGEND_SCAN_ROWS: usize = 30;
/// Label rows read below the header.
pub const LEGEND_MAX_ROWS: usize = 10;

/// Resolved legend: swatch colors with their categories, plus the set of
/// colors meaning "partial day". The partial tag travels with matched grid
/// cells as a flag, not a category change.
#[derive(Debug, Clone, Default)]
pub struct Legend {
    pub swatches: Vec<(Rgb, LeaveCategory)>,
    pub partial_colors: Vec<Rgb>,
}

impl Legend {
    pub fn is_partial(&self, swatch: Rgb) -> bool {
        self.partial_colors.contains(&swatch)
    }
}

/// Fixed label table. Unrecognized labels are cosmetic-only legend rows
/// and are skipped, not errored.
fn label_category(label: &str) -> Option<LeaveCategory> {
    let label = label.trim();
    if label.eq_ignore_ascii_case("sick") {
        Some(LeaveCategory::Sick)
    } else if label.eq_ignore_ascii_case("full pto")
        || label.eq_ignore_ascii_case("partial pto")
        || label.eq_ignore_ascii_case("planned pto")
    {
        Some(LeaveCategory::Pto)
    } else if label.eq_ignore_ascii_case("bereavement") {
        Some(LeaveCategory::Bereavement)
    } else if label.eq_ignore_ascii_case("jury duty") {
        Some(LeaveCategory::JuryDuty)
    } else {
        None
    }
}

/// Scan the legend column for a cell whose trimmed text equals "Legend".
pub fn find_legend_header_row(sheet: &Sheet) -> Option<usize> {
    (0..LEGEND_SCAN_ROWS).find(|row| {
        sheet
            .text(*row, LEGEND_COL)
            .map(|t| t.eq_ignore_ascii_case("legend"))
            .unwrap_or(false)
    })
}

/// Read the legend rows below the header into a color → category map.
///
/// A missing header is a blocking error for the sheet: the calendar
/// cannot be classified without the legend.
pub fn parse_legend(sheet: &Sheet, palette: &ThemePalette) -> Result<Legend, ImportError> {
    let header_row = find_legend_header_row(sheet).ok_or_else(|| ImportError::LegendMissing {
        sheet: sheet.name.clone(),
    })?;

    let mut legend = Legend {
        swatches: Vec::new(),
        partial_colors: parse_partial_colors(sheet, palette),
    };

    for row in header_row + 1..=header_row + LEGEND_MAX_ROWS {
        let Some(label) = sheet.text(row, LEGEND_COL) else {
            continue;
        };
        let Some(category) = label_category(label) else {
            continue;
        };
        let Some(fill) = sheet.fill(row, LEGEND_COL) else {
            continue;
        };
        if let Some(rgb) = resolve_fill(&fill, palette) {
            legend.swatches.push((rgb, category));
        }
    }

    Ok(legend)
}

/// Independent pass collecting the colors whose label is exactly
/// "Partial PTO". A sheet without partial-day coloring yields an empty
/// set — that is not an error.
pub fn parse_partial_colors(sheet: &Sheet, palette: &ThemePalette) -> Vec<Rgb> {
    let Some(header_row) = find_legend_header_row(sheet) else {
        return Vec::new();
    };

    let mut colors = Vec::new();
    for row in header_row + 1..=header_row + LEGEND_MAX_ROWS {
        let is_partial = sheet
            .text(row, LEGEND_COL)
            .map(|t| t == "Partial PTO")
            .unwrap_or(false);
        if !is_partial {
            continue;
        }
        if let Some(rgb) = sheet.fill(row, LEGEND_COL).and_then(|f| resolve_fill(&f, palette)) {
            colors.push(rgb);
        }
    }
    colors
}
