//! Reconciliation: a sequence of narrowing passes over the grid walk's
//! raw output.
//!
//! Each pass is a pure `(state) -> state` stage that consumes the current
//! entry/flag set and produces a refined one plus its own warnings and
//! resolved notes, so every correction stays traceable to one stage.
//! Later passes only act on ambiguity that survived earlier ones; an
//! entry settled by a higher-confidence pass is locked and never
//! re-opened.

use chrono::{Datelike, NaiveDate, Weekday};

use crate::config::ImportConfig;
use crate::model::{
    month_key, DeclaredMonth, GridScan, LeaveCategory, LeaveEntry, UnmatchedCell,
};
use crate::notes;

/// A raw entry being narrowed toward a final `LeaveEntry`.
#[derive(Debug, Clone)]
struct WorkingEntry {
    date: NaiveDate,
    category: LeaveCategory,
    hours: f64,
    note: Option<String>,
    partial_color: bool,
    marker_hours: Option<f64>,
    note_derived: bool,
    /// Settled by a higher-confidence pass; later passes must not touch it.
    locked: bool,
}

#[derive(Debug, Default)]
struct ReconcileState {
    entries: Vec<WorkingEntry>,
    unmatched_colored: Vec<UnmatchedCell>,
    unmatched_noted: Vec<UnmatchedCell>,
    warnings: Vec<String>,
    resolved: Vec<String>,
}

/// Final output of the pipeline.
#[derive(Debug, Default)]
pub struct ReconcileOutcome {
    pub entries: Vec<LeaveEntry>,
    pub warnings: Vec<String>,
    pub resolved: Vec<String>,
}

/// Run every pass in order and finalize.
pub fn reconcile(
    scan: GridScan,
    declared: &[DeclaredMonth],
    config: &ImportConfig,
) -> ReconcileOutcome {
    let state = ingest(scan, config);
    let state = apply_note_overrides(state, config);
    let state = drop_worked_days(state);
    let state = adjust_partial_days(state, config);
    let state = reclassify_by_declared_totals(state, declared, config);
    let state = flag_unresolved(state);
    finalize(state, config)
}

// ---------------------------------------------------------------------------
// Pass 0: ingest + duplicate collapse
// ---------------------------------------------------------------------------

fn ingest(scan: GridScan, _config: &ImportConfig) -> ReconcileState {
    let mut state = ReconcileState {
        unmatched_colored: scan.unmatched_colored,
        unmatched_noted: scan.unmatched_noted,
        ..Default::default()
    };

    for raw in scan.entries {
        let duplicate = state
            .entries
            .iter()
            .any(|e| e.date == raw.date && e.category == raw.category);
        if duplicate {
            state
                .warnings
                .push(format!("{}: duplicate {} cell ignored", raw.date, raw.category));
            continue;
        }
        state.entries.push(WorkingEntry {
            date: raw.date,
            category: raw.category,
            hours: raw.hours,
            note: raw.note,
            partial_color: raw.partial_color,
            marker_hours: raw.marker_hours,
            note_derived: false,
            locked: false,
        });
    }

    state
}

// ---------------------------------------------------------------------------
// Pass 1: note overrides
// ---------------------------------------------------------------------------

/// Strict note hours (and a category keyword, when present) beat the
/// color-derived guess. Noted-but-uncolored cells that carry both a
/// category keyword and an hours quantity are classified here too — the
/// bare-number fallback is allowed for them because no color
/// classification exists to contradict.
fn apply_note_overrides(mut state: ReconcileState, config: &ImportConfig) -> ReconcileState {
    for entry in &mut state.entries {
        let Some(note) = entry.note.clone() else {
            continue;
        };

        if let Some(hours) = notes::parse_hours_strict(&note, config.max_entry_hours) {
            if (hours - entry.hours).abs() > f64::EPSILON {
                state.resolved.push(format!(
                    "{}: note '{}' overrides {} hours ({} -> {})",
                    entry.date, note, entry.category, entry.hours, hours
                ));
            }
            entry.hours = hours;
            entry.note_derived = true;
            entry.locked = true;

            if let Some(category) = notes::category_keyword(&note) {
                if category != entry.category {
                    state.resolved.push(format!(
                        "{}: note '{}' reclassifies {} -> {}",
                        entry.date, note, entry.category, category
                    ));
                    entry.category = category;
                }
            }
        } else if let Some(category) = notes::category_keyword(&note) {
            // Type-only override: hours stay color-derived.
            if category != entry.category {
                state.resolved.push(format!(
                    "{}: note '{}' reclassifies {} -> {}",
                    entry.date, note, entry.category, category
                ));
                entry.category = category;
                entry.locked = true;
            }
        }
    }

    // Noted cells without a color classification.
    let mut still_unmatched = Vec::new();
    for cell in std::mem::take(&mut state.unmatched_noted) {
        let note = cell.note.clone().unwrap_or_default();
        let category = notes::category_keyword(&note);
        let hours = notes::parse_hours_strict(&note, config.max_entry_hours)
            .or_else(|| notes::parse_hours_bare(&note, config.max_entry_hours));
        match (category, hours) {
            (Some(category), Some(hours)) => {
                state.resolved.push(format!(
                    "{}: uncolored cell classified as {} {}h from note '{}'",
                    cell.date, category, hours, note
                ));
                state.entries.push(WorkingEntry {
                    date: cell.date,
                    category,
                    hours,
                    note: cell.note,
                    partial_color: false,
                    marker_hours: None,
                    note_derived: true,
                    locked: true,
                });
            }
            _ => still_unmatched.push(cell),
        }
    }
    state.unmatched_noted = still_unmatched;

    state
}

// ---------------------------------------------------------------------------
// Pass 2: worked-day detection
// ---------------------------------------------------------------------------

/// A colored day whose note says the employee actually worked is not
/// leave. The note is preserved as an audit line rather than an entry.
fn drop_worked_days(mut state: ReconcileState) -> ReconcileState {
    let mut kept = Vec::with_capacity(state.entries.len());
    for entry in std::mem::take(&mut state.entries) {
        let worked = entry
            .note
            .as_deref()
            .map(notes::is_worked_note)
            .unwrap_or(false);
        if worked {
            state.resolved.push(format!(
                "{}: colored {} but worked ('{}'), not imported as leave",
                entry.date,
                entry.category,
                entry.note.as_deref().unwrap_or("")
            ));
        } else {
            kept.push(entry);
        }
    }
    state.entries = kept;

    // Worked notes on unclassified cells are commentary, not a problem.
    let mut still_unmatched = Vec::new();
    for cell in std::mem::take(&mut state.unmatched_noted) {
        let worked = cell
            .note
            .as_deref()
            .map(notes::is_worked_note)
            .unwrap_or(false);
        if worked {
            state.resolved.push(format!(
                "{}: worked-day note '{}' recorded, no leave imported",
                cell.date,
                cell.note.as_deref().unwrap_or("")
            ));
        } else {
            still_unmatched.push(cell);
        }
    }
    state.unmatched_noted = still_unmatched;

    state
}

// ---------------------------------------------------------------------------
// Pass 3: partial-day adjustment
// ---------------------------------------------------------------------------

fn is_weekend_adjacent(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Mon | Weekday::Fri)
}

/// Partial-color entries drop from the full-day default to their marked
/// fraction: a superscript digit gives the hours outright; without one,
/// the configured partial default applies, and weekend-adjacent days get
/// the smaller conservative fraction.
fn adjust_partial_days(mut state: ReconcileState, config: &ImportConfig) -> ReconcileState {
    for entry in &mut state.entries {
        if !entry.partial_color || entry.locked {
            continue;
        }
        if let Some(marker) = entry.marker_hours {
            entry.hours = marker.min(config.max_entry_hours);
        } else if is_weekend_adjacent(entry.date) {
            entry.hours = config.partial_edge_hours;
            state.resolved.push(format!(
                "{}: unmarked partial day next to a weekend, conservatively {}h",
                entry.date, config.partial_edge_hours
            ));
        } else {
            entry.hours = config.partial_day_hours;
        }
    }
    state
}

// ---------------------------------------------------------------------------
// Pass 4: reclassification against declared totals
// ---------------------------------------------------------------------------

/// When a month's calendar-derived PTO total falls short of the declared
/// PTO-Calc total, the difference usually hides in mis-colored Sick (or,
/// rarely, Bereavement) days. Move a chronological subset across only if
/// it lands within tolerance of the deficit; otherwise move nothing and
/// flag the month. A surplus is never "fixed" by deleting days.
fn reclassify_by_declared_totals(
    mut state: ReconcileState,
    declared: &[DeclaredMonth],
    config: &ImportConfig,
) -> ReconcileState {
    let tol = config.ack_tolerance_hours;

    for decl in declared {
        let year = match state
            .entries
            .iter()
            .find(|e| e.date.month() == decl.month)
            .map(|e| e.date.year())
        {
            Some(y) => y,
            // Nothing on the calendar for this month: nothing to move,
            // any declared-total disagreement is the ack pass's to flag.
            None => continue,
        };

        let pto_total: f64 = state
            .entries
            .iter()
            .filter(|e| e.date.month() == decl.month && e.category == LeaveCategory::Pto)
            .map(|e| e.hours)
            .sum();
        let deficit = decl.used_hours - pto_total;
        if deficit <= tol {
            continue;
        }

        let mut moved_sum = 0.0;
        let mut moved: Vec<(NaiveDate, LeaveCategory)> = Vec::new();
        for source in [LeaveCategory::Sick, LeaveCategory::Bereavement] {
            let mut candidates: Vec<(NaiveDate, f64)> = state
                .entries
                .iter()
                .filter(|e| {
                    e.date.month() == decl.month && e.category == source && !e.locked
                })
                .map(|e| (e.date, e.hours))
                .collect();
            candidates.sort_by_key(|(date, _)| *date);

            for (date, hours) in candidates {
                if moved_sum + tol >= deficit {
                    break;
                }
                if moved_sum + hours <= deficit + tol {
                    moved_sum += hours;
                    moved.push((date, source));
                }
            }
            if moved_sum + tol >= deficit {
                break;
            }
        }

        if !moved.is_empty() && (moved_sum - deficit).abs() <= tol {
            for entry in &mut state.entries {
                if moved.contains(&(entry.date, entry.category)) && !entry.locked {
                    state.resolved.push(format!(
                        "{}: {} reclassified to PTO to match declared {} total of {}h",
                        entry.date,
                        entry.category,
                        month_key(year, decl.month),
                        decl.used_hours
                    ));
                    entry.category = LeaveCategory::Pto;
                    entry.locked = true;
                }
            }
        } else {
            state.warnings.push(format!(
                "{}: declared PTO {}h but calendar shows {}h; no reclassification resolves the difference",
                month_key(year, decl.month),
                decl.used_hours,
                pto_total
            ));
        }
    }

    state
}

// ---------------------------------------------------------------------------
// Pass 5: surface surviving ambiguity
// ---------------------------------------------------------------------------

/// Whatever is still unresolved becomes a warning on the sheet result —
/// never silently dropped, never silently guessed.
fn flag_unresolved(mut state: ReconcileState) -> ReconcileState {
    for cell in state.unmatched_colored.drain(..) {
        let color = cell
            .color
            .map(|c| format!("#{:02X}{:02X}{:02X}", c[0], c[1], c[2]))
            .unwrap_or_else(|| "?".into());
        state.warnings.push(format!(
            "{}: colored {} but matches no legend color",
            cell.date, color
        ));
    }
    for cell in state.unmatched_noted.drain(..) {
        state.warnings.push(format!(
            "{}: note '{}' could not be classified",
            cell.date,
            cell.note.as_deref().unwrap_or("")
        ));
    }
    state
}

// ---------------------------------------------------------------------------
// Finalize
// ---------------------------------------------------------------------------

/// Enforce entry invariants and produce a byte-stable ordering.
fn finalize(mut state: ReconcileState, config: &ImportConfig) -> ReconcileOutcome {
    let mut entries: Vec<LeaveEntry> = Vec::with_capacity(state.entries.len());
    for entry in state.entries {
        if entry.hours <= 0.0 {
            state.warnings.push(format!(
                "{}: {} entry dropped, non-positive hours {}",
                entry.date, entry.category, entry.hours
            ));
            continue;
        }
        let mut hours = entry.hours;
        if hours > config.max_entry_hours {
            state.warnings.push(format!(
                "{}: {} hours {} clamped to {}",
                entry.date, entry.category, hours, config.max_entry_hours
            ));
            hours = config.max_entry_hours;
        }
        entries.push(LeaveEntry {
            date: entry.date,
            category: entry.category,
            hours,
            note: entry.note,
            partial_color: entry.partial_color,
            note_derived: entry.note_derived,
        });
    }

    entries.sort_by(|a, b| (a.date, a.category).cmp(&(b.date, b.category)));

    ReconcileOutcome {
        entries,
        warnings: state.warnings,
        resolved: state.resolved,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RawEntry;

    fn date(month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, month, day).unwrap()
    }

    fn raw(month: u32, day: u32, category: LeaveCategory) -> RawEntry {
        RawEntry {
            date: date(month, day),
            category,
            hours: 8.0,
            note: None,
            partial_color: false,
            marker_hours: None,
        }
    }

    fn declared(month: u32, hours: f64) -> DeclaredMonth {
        DeclaredMonth {
            month,
            used_hours: hours,
        }
    }

    #[test]
    fn strict_note_overrides_category_and_hours() {
        let mut entry = raw(2, 6, LeaveCategory::Sick);
        entry.note = Some("4 hours PTO".into());
        let scan = GridScan {
            entries: vec![entry],
            ..Default::default()
        };
        let out = reconcile(scan, &[], &ImportConfig::default());
        assert_eq!(out.entries.len(), 1);
        assert_eq!(out.entries[0].category, LeaveCategory::Pto);
        assert_eq!(out.entries[0].hours, 4.0);
        assert!(out.entries[0].note_derived);
        assert!(out.resolved.len() >= 2); // hours + category lines
    }

    #[test]
    fn type_only_note_keeps_color_hours() {
        let mut entry = raw(2, 6, LeaveCategory::Sick);
        entry.note = Some("actually PTO".into());
        let scan = GridScan {
            entries: vec![entry],
            ..Default::default()
        };
        let out = reconcile(scan, &[], &ImportConfig::default());
        assert_eq!(out.entries[0].category, LeaveCategory::Pto);
        assert_eq!(out.entries[0].hours, 8.0);
        assert!(!out.entries[0].note_derived);
    }

    #[test]
    fn noted_uncolored_cell_with_keyword_and_bare_hours_classifies() {
        let scan = GridScan {
            unmatched_noted: vec![UnmatchedCell {
                date: date(3, 11),
                color: None,
                note: Some("sick 4".into()),
            }],
            ..Default::default()
        };
        let out = reconcile(scan, &[], &ImportConfig::default());
        assert_eq!(out.entries.len(), 1);
        assert_eq!(out.entries[0].category, LeaveCategory::Sick);
        assert_eq!(out.entries[0].hours, 4.0);
        assert!(out.entries[0].note_derived);
        assert!(out.warnings.is_empty());
    }

    #[test]
    fn noted_uncolored_cell_without_keyword_warns() {
        let scan = GridScan {
            unmatched_noted: vec![UnmatchedCell {
                date: date(3, 11),
                color: None,
                note: Some("dentist at 2".into()),
            }],
            ..Default::default()
        };
        let out = reconcile(scan, &[], &ImportConfig::default());
        assert!(out.entries.is_empty());
        assert_eq!(out.warnings.len(), 1);
        assert!(out.warnings[0].contains("dentist"));
    }

    #[test]
    fn worked_note_drops_colored_entry() {
        let mut entry = raw(5, 20, LeaveCategory::Pto);
        entry.note = Some("worked, make up for 5/3".into());
        let scan = GridScan {
            entries: vec![entry],
            ..Default::default()
        };
        let out = reconcile(scan, &[], &ImportConfig::default());
        assert!(out.entries.is_empty());
        assert_eq!(out.resolved.len(), 1);
        assert!(out.resolved[0].contains("worked"));
    }

    #[test]
    fn partial_marker_sets_hours() {
        let mut entry = raw(4, 16, LeaveCategory::Pto); // 2024-04-16 is a Tuesday
        entry.partial_color = true;
        entry.marker_hours = Some(3.0);
        let scan = GridScan {
            entries: vec![entry],
            ..Default::default()
        };
        let out = reconcile(scan, &[], &ImportConfig::default());
        assert_eq!(out.entries[0].hours, 3.0);
    }

    #[test]
    fn unmarked_partial_defaults_and_edge_days_are_conservative() {
        let mut midweek = raw(4, 17, LeaveCategory::Pto); // Wednesday
        midweek.partial_color = true;
        let mut friday = raw(4, 19, LeaveCategory::Pto); // Friday
        friday.partial_color = true;
        let scan = GridScan {
            entries: vec![midweek, friday],
            ..Default::default()
        };
        let config = ImportConfig::default();
        let out = reconcile(scan, &[], &config);
        assert_eq!(out.entries[0].hours, config.partial_day_hours);
        assert_eq!(out.entries[1].hours, config.partial_edge_hours);
        assert!(out.resolved.iter().any(|r| r.contains("weekend")));
    }

    #[test]
    fn note_override_wins_over_partial_adjustment() {
        let mut entry = raw(4, 16, LeaveCategory::Pto);
        entry.partial_color = true;
        entry.note = Some("6 hours".into());
        let scan = GridScan {
            entries: vec![entry],
            ..Default::default()
        };
        let out = reconcile(scan, &[], &ImportConfig::default());
        // Locked by the note pass; partial adjustment must not re-open it
        assert_eq!(out.entries[0].hours, 6.0);
    }

    #[test]
    fn sick_days_move_to_pto_to_cover_declared_deficit() {
        let scan = GridScan {
            entries: vec![
                raw(6, 3, LeaveCategory::Pto),
                raw(6, 10, LeaveCategory::Sick),
                raw(6, 17, LeaveCategory::Sick),
            ],
            ..Default::default()
        };
        // Declared 24h PTO; calendar shows 8h PTO + 16h Sick
        let out = reconcile(
            scan,
            &[declared(6, 24.0)],
            &ImportConfig::default(),
        );
        let pto: Vec<_> = out
            .entries
            .iter()
            .filter(|e| e.category == LeaveCategory::Pto)
            .collect();
        assert_eq!(pto.len(), 3);
        assert!(out.warnings.is_empty());
        assert_eq!(
            out.resolved
                .iter()
                .filter(|r| r.contains("reclassified to PTO"))
                .count(),
            2
        );
    }

    #[test]
    fn partial_deficit_moves_only_what_fits() {
        let scan = GridScan {
            entries: vec![
                raw(6, 3, LeaveCategory::Pto),
                raw(6, 10, LeaveCategory::Sick),
                raw(6, 17, LeaveCategory::Sick),
            ],
            ..Default::default()
        };
        // Deficit of 8h: exactly one sick day moves, chronologically first
        let out = reconcile(
            scan,
            &[declared(6, 16.0)],
            &ImportConfig::default(),
        );
        let sick: Vec<_> = out
            .entries
            .iter()
            .filter(|e| e.category == LeaveCategory::Sick)
            .collect();
        assert_eq!(sick.len(), 1);
        assert_eq!(sick[0].date, date(6, 17));
    }

    #[test]
    fn unresolvable_deficit_moves_nothing_and_warns() {
        let scan = GridScan {
            entries: vec![raw(6, 10, LeaveCategory::Sick)],
            ..Default::default()
        };
        // Deficit 4h, but the only sick day is 8h: moving it overshoots
        let out = reconcile(
            scan,
            &[declared(6, 4.0)],
            &ImportConfig::default(),
        );
        assert_eq!(
            out.entries
                .iter()
                .filter(|e| e.category == LeaveCategory::Sick)
                .count(),
            1
        );
        assert!(out.warnings.iter().any(|w| w.contains("2024-06")));
    }

    #[test]
    fn bereavement_covers_remainder_after_sick() {
        let scan = GridScan {
            entries: vec![
                raw(7, 8, LeaveCategory::Sick),
                raw(7, 15, LeaveCategory::Bereavement),
            ],
            ..Default::default()
        };
        let out = reconcile(
            scan,
            &[declared(7, 16.0)],
            &ImportConfig::default(),
        );
        assert!(out
            .entries
            .iter()
            .all(|e| e.category == LeaveCategory::Pto));
    }

    #[test]
    fn note_locked_entries_never_reclassify() {
        let mut locked = raw(8, 5, LeaveCategory::Sick);
        locked.note = Some("sick 8 hours".into());
        let scan = GridScan {
            entries: vec![locked],
            ..Default::default()
        };
        let out = reconcile(
            scan,
            &[declared(8, 8.0)],
            &ImportConfig::default(),
        );
        // The note says Sick; the declared-total pass may not flip it
        assert_eq!(out.entries[0].category, LeaveCategory::Sick);
        assert!(out.warnings.iter().any(|w| w.contains("2024-08")));
    }

    #[test]
    fn duplicate_day_category_collapses() {
        let scan = GridScan {
            entries: vec![raw(9, 2, LeaveCategory::Pto), raw(9, 2, LeaveCategory::Pto)],
            ..Default::default()
        };
        let out = reconcile(scan, &[], &ImportConfig::default());
        assert_eq!(out.entries.len(), 1);
        assert!(out.warnings.iter().any(|w| w.contains("duplicate")));
    }

    #[test]
    fn output_is_sorted_and_deterministic() {
        let scan = || GridScan {
            entries: vec![
                raw(9, 20, LeaveCategory::Sick),
                raw(9, 2, LeaveCategory::Pto),
                raw(3, 14, LeaveCategory::Bereavement),
            ],
            ..Default::default()
        };
        let a = reconcile(scan(), &[], &ImportConfig::default());
        let b = reconcile(scan(), &[], &ImportConfig::default());
        assert_eq!(a.entries, b.entries);
        assert_eq!(a.entries[0].date, date(3, 14));
        assert_eq!(a.entries[2].date, date(9, 20));
    }

    #[test]
    fn unmatched_colored_cells_surface_as_warnings() {
        let scan = GridScan {
            unmatched_colored: vec![UnmatchedCell {
                date: date(10, 31),
                color: Some([128, 128, 0]),
                note: None,
            }],
            ..Default::default()
        };
        let out = reconcile(scan, &[], &ImportConfig::default());
        assert_eq!(out.warnings.len(), 1);
        assert!(out.warnings[0].contains("#808000"));
    }
}
