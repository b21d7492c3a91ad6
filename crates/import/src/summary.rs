use crate::model::{AckStatus, ImportSummary, SheetResult};

/// Compute workbook-level statistics from per-sheet results.
pub fn compute_summary(sheets: &[SheetResult], skipped: usize) -> ImportSummary {
    let mut summary = ImportSummary {
        sheets_skipped: skipped,
        ..Default::default()
    };

    for sheet in sheets {
        if sheet.errors.is_empty() {
            summary.sheets_imported += 1;
        } else {
            summary.sheets_failed += 1;
        }
        summary.entries += sheet.entries.len();
        summary.warnings += sheet.warnings.len();
        summary.resolved += sheet.resolved.len();
        summary.acknowledgement_warnings += sheet
            .acknowledgements
            .iter()
            .filter(|a| a.status == Some(AckStatus::Warning))
            .count();
        for entry in &sheet.entries {
            *summary
                .hours_by_category
                .entry(entry.category.to_string())
                .or_insert(0.0) += entry.hours;
        }
    }

    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Acknowledgement, AckType, LeaveCategory, LeaveEntry};
    use chrono::NaiveDate;

    #[test]
    fn summary_counts() {
        let mut good = SheetResult::empty("Jane");
        good.entries.push(LeaveEntry {
            date: NaiveDate::from_ymd_opt(2024, 1, 5).unwrap(),
            category: LeaveCategory::Pto,
            hours: 8.0,
            note: None,
            partial_color: false,
            note_derived: false,
        });
        good.entries.push(LeaveEntry {
            date: NaiveDate::from_ymd_opt(2024, 1, 8).unwrap(),
            category: LeaveCategory::Sick,
            hours: 4.0,
            note: None,
            partial_color: false,
            note_derived: false,
        });
        good.warnings.push("w".into());
        good.acknowledgements.push(Acknowledgement {
            month: "2024-01".into(),
            ack_type: AckType::Employee,
            status: Some(crate::model::AckStatus::Warning),
            note: None,
        });

        let bad = SheetResult::failed("Broken", "legend header not found");

        let summary = compute_summary(&[good, bad], 1);
        assert_eq!(summary.sheets_imported, 1);
        assert_eq!(summary.sheets_failed, 1);
        assert_eq!(summary.sheets_skipped, 1);
        assert_eq!(summary.entries, 2);
        assert_eq!(summary.warnings, 1);
        assert_eq!(summary.acknowledgement_warnings, 1);
        assert_eq!(summary.hours_by_category["PTO"], 8.0);
        assert_eq!(summary.hours_by_category["Sick"], 4.0);
    }
}
