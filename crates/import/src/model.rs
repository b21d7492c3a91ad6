use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

/// An absolute RGB color after theme/tint resolution.
pub type Rgb = [u8; 3];

// ---------------------------------------------------------------------------
// Categories
// ---------------------------------------------------------------------------

/// Leave category a legend swatch (or note keyword) maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LeaveCategory {
    Pto,
    Sick,
    Bereavement,
    JuryDuty,
}

impl std::fmt::Display for LeaveCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pto => write!(f, "PTO"),
            Self::Sick => write!(f, "Sick"),
            Self::Bereavement => write!(f, "Bereavement"),
            Self::JuryDuty => write!(f, "Jury Duty"),
        }
    }
}

// ---------------------------------------------------------------------------
// Grid parser output
// ---------------------------------------------------------------------------

/// A day cell the grid walk classified against the legend.
#[derive(Debug, Clone)]
pub struct RawEntry {
    pub date: NaiveDate,
    pub category: LeaveCategory,
    pub hours: f64,
    pub note: Option<String>,
    /// Matched legend color was tagged "Partial PTO".
    pub partial_color: bool,
    /// Superscript digit trailing the day number, when present.
    pub marker_hours: Option<f64>,
}

/// A day cell the grid walk could not classify. Handed downstream as-is.
#[derive(Debug, Clone)]
pub struct UnmatchedCell {
    pub date: NaiveDate,
    pub color: Option<Rgb>,
    pub note: Option<String>,
}

/// Everything the grid walk produced for one sheet.
#[derive(Debug, Default)]
pub struct GridScan {
    pub entries: Vec<RawEntry>,
    /// Non-legend fill, no note. Likely a different convention (holiday
    /// shading) — never forced into a category.
    pub unmatched_colored: Vec<UnmatchedCell>,
    /// Note but no color classification. Could be incidental commentary.
    pub unmatched_noted: Vec<UnmatchedCell>,
}

// ---------------------------------------------------------------------------
// PTO-Calc section
// ---------------------------------------------------------------------------

/// One declared month row from the PTO-Calc table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DeclaredMonth {
    /// 1-12.
    pub month: u32,
    pub used_hours: f64,
}

// ---------------------------------------------------------------------------
// Final entries
// ---------------------------------------------------------------------------

/// Final unit of output: one reconciled leave day.
///
/// Invariants: `hours` is positive and at most the sanity cap; at most one
/// entry per (date, category) pair.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeaveEntry {
    pub date: NaiveDate,
    pub category: LeaveCategory,
    pub hours: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub partial_color: bool,
    pub note_derived: bool,
}

// ---------------------------------------------------------------------------
// Acknowledgements
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AckType {
    Employee,
    Admin,
}

impl std::fmt::Display for AckType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Employee => write!(f, "employee"),
            Self::Admin => write!(f, "admin"),
        }
    }
}

/// `status: None` means the month reconciles within tolerance; `Warning`
/// means a human must review, with `note` explaining the signed delta.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AckStatus {
    Warning,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Acknowledgement {
    /// "YYYY-MM".
    pub month: String,
    pub ack_type: AckType,
    pub status: Option<AckStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Month key used by acknowledgements and warnings.
pub fn month_key(year: i32, month: u32) -> String {
    format!("{year:04}-{month:02}")
}

// ---------------------------------------------------------------------------
// Employee
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct EmployeeInfo {
    pub name: String,
    /// Deterministic match-proposal identifier (`jane-public@…`).
    pub identifier: String,
    pub hire_date: NaiveDate,
    /// Reporting year the twelve grids cover.
    pub year: i32,
    pub carryover_hours: f64,
    /// Rate the sheet itself states, when present. Non-authoritative.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stated_rate: Option<f64>,
    /// Authoritative daily accrual rate from the rate-lookup collaborator.
    pub daily_rate: f64,
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// Everything produced for one employee sheet.
///
/// `errors` non-empty means the sheet's data is unusable; `warnings` and
/// `resolved` are audit streams (human review needed vs auto-corrected).
#[derive(Debug, Clone, Serialize)]
pub struct SheetResult {
    pub sheet: String,
    pub employee: Option<EmployeeInfo>,
    pub entries: Vec<LeaveEntry>,
    pub acknowledgements: Vec<Acknowledgement>,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
    pub resolved: Vec<String>,
}

impl SheetResult {
    pub fn empty(sheet: impl Into<String>) -> Self {
        SheetResult {
            sheet: sheet.into(),
            employee: None,
            entries: Vec::new(),
            acknowledgements: Vec::new(),
            warnings: Vec::new(),
            errors: Vec::new(),
            resolved: Vec::new(),
        }
    }

    /// A sheet whose parse was abandoned on a blocking error.
    pub fn failed(sheet: impl Into<String>, error: impl Into<String>) -> Self {
        let mut result = SheetResult::empty(sheet);
        result.errors.push(error.into());
        result
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ImportSummary {
    pub sheets_imported: usize,
    pub sheets_failed: usize,
    pub sheets_skipped: usize,
    pub entries: usize,
    pub hours_by_category: BTreeMap<String, f64>,
    pub acknowledgement_warnings: usize,
    pub warnings: usize,
    pub resolved: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct WorkbookResult {
    pub summary: ImportSummary,
    pub sheets: Vec<SheetResult>,
    /// Sheets that did not look like employee sheets and were skipped.
    pub skipped_sheets: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn month_key_is_zero_padded() {
        assert_eq!(month_key(2024, 3), "2024-03");
        assert_eq!(month_key(2024, 11), "2024-11");
    }

    #[test]
    fn category_display() {
        assert_eq!(LeaveCategory::Pto.to_string(), "PTO");
        assert_eq!(LeaveCategory::JuryDuty.to_string(), "Jury Duty");
    }

    #[test]
    fn failed_sheet_result_carries_error() {
        let result = SheetResult::failed("Jane", "legend missing");
        assert_eq!(result.errors, vec!["legend missing"]);
        assert!(result.entries.is_empty());
        assert!(result.employee.is_none());
    }
}
