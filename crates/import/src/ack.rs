//! Acknowledgement records: pre-existing sign-off marks plus derived
//! monthly comparisons.
//!
//! The two sources are independent and intentionally not merged or
//! deduplicated here — precedence belongs to the caller.

use chrono::Datelike;
use leavegrid_engine::Sheet;

use crate::config::ImportConfig;
use crate::model::{
    month_key, Acknowledgement, AckStatus, AckType, DeclaredMonth, LeaveCategory, LeaveEntry,
};

/// Employee sign-off column (column U), on the PTO-Calc month rows.
pub const ACK_EMPLOYEE_COL: usize = 20;
/// Admin sign-off column (column V).
pub const ACK_ADMIN_COL: usize = 21;

/// Glyphs accepted as a pre-existing sign-off mark.
const CHECKMARKS: [&str; 3] = ["\u{2713}", "\u{2714}", "\u{221A}"];

fn is_checkmark(text: &str) -> bool {
    CHECKMARKS.contains(&text.trim())
}

/// Read pre-existing sign-off marks off the PTO-Calc month rows. A mark
/// is recorded unconditionally — it is the human's statement, not ours.
pub fn parse_existing_acks(sheet: &Sheet, anchor_row: usize, year: i32) -> Vec<Acknowledgement> {
    let mut acks = Vec::new();
    for offset in 0..12 {
        let month = offset as u32 + 1;
        let row = anchor_row + offset;
        for (col, ack_type) in [
            (ACK_EMPLOYEE_COL, AckType::Employee),
            (ACK_ADMIN_COL, AckType::Admin),
        ] {
            if sheet.text(row, col).map(is_checkmark).unwrap_or(false) {
                acks.push(Acknowledgement {
                    month: month_key(year, month),
                    ack_type,
                    status: None,
                    note: None,
                });
            }
        }
    }
    acks
}

/// Sum of reconciled entries for one month, restricted to the categories
/// the PTO-Calc table tracks (PTO only, by convention).
fn calendar_pto_total(entries: &[LeaveEntry], month: u32) -> f64 {
    entries
        .iter()
        .filter(|e| e.date.month() == month && e.category == LeaveCategory::Pto)
        .map(|e| e.hours)
        .sum()
}

/// Derive an acknowledgement pair per declared month: clean when the
/// calendar-derived total agrees with the declared total within
/// tolerance, warning-status with a signed-delta note otherwise.
pub fn generate_acks(
    entries: &[LeaveEntry],
    declared: &[DeclaredMonth],
    sheet_name: &str,
    year: i32,
    config: &ImportConfig,
) -> Vec<Acknowledgement> {
    let mut acks = Vec::new();

    for decl in declared {
        let total = calendar_pto_total(entries, decl.month);
        let delta = total - decl.used_hours;
        let month = month_key(year, decl.month);

        let (status, note) = if delta.abs() <= config.ack_tolerance_hours {
            (None, None)
        } else {
            (
                Some(AckStatus::Warning),
                Some(format!(
                    "{sheet_name} {month}: calendar PTO {total:.2}h vs declared {:.2}h ({delta:+.2}h)",
                    decl.used_hours
                )),
            )
        };

        for ack_type in [AckType::Employee, AckType::Admin] {
            acks.push(Acknowledgement {
                month: month.clone(),
                ack_type,
                status,
                note: note.clone(),
            });
        }
    }

    acks
}
