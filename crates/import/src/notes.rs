//! Cell note interpretation: hours quantities and keywords out of
//! unconstrained free text.
//!
//! Two confidence tiers. The strict form — a number with an hour-unit
//! word — is authoritative enough to override a color-derived entry. The
//! bare-number fallback is only trusted where no color classification
//! exists at all, and its neighbor guard keeps digits embedded in dates or
//! other tokens ("3/15", "x2") from ever reading as hours.

use std::sync::OnceLock;

use regex::Regex;

use crate::model::LeaveCategory;

fn strict_hours_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)(\d+(?:\.\d+)?)\s*(?:hours|hrs|hr|h)\b").unwrap()
    })
}

fn number_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\d+(?:\.\d+)?").unwrap())
}

/// Collapse rich-text line breaks and run boundaries into single spaces.
pub fn normalize_note_text(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Strict parse: a number immediately followed by an hour-unit word.
/// Accepted only within (0, cap].
pub fn parse_hours_strict(text: &str, cap: f64) -> Option<f64> {
    let caps = strict_hours_re().captures(text)?;
    let hours: f64 = caps.get(1)?.as_str().parse().ok()?;
    in_range(hours, cap)
}

/// True only for the strict unit-suffixed form. Reconciliation uses this
/// to decide whether a note alone may override a color-derived entry.
pub fn is_strict_hours_match(text: &str) -> bool {
    strict_hours_re().is_match(text)
}

/// Bare-number fallback. Characters adjacent to the match are inspected
/// because the regex crate has no lookaround: a digit glued to `/`, `-`,
/// `:`, `.` or another digit is part of some other token (a date
/// fragment, a time) and is skipped.
pub fn parse_hours_bare(text: &str, cap: f64) -> Option<f64> {
    for m in number_re().find_iter(text) {
        let before = text[..m.start()].chars().next_back();
        let after = text[m.end()..].chars().next();
        if neighbor_blocks(before) || neighbor_blocks(after) {
            continue;
        }
        if let Ok(hours) = m.as_str().parse::<f64>() {
            if let Some(hours) = in_range(hours, cap) {
                return Some(hours);
            }
        }
    }
    None
}

fn neighbor_blocks(c: Option<char>) -> bool {
    matches!(c, Some(c) if c.is_ascii_alphanumeric() || matches!(c, '/' | '-' | ':' | '.' | '%'))
}

fn in_range(hours: f64, cap: f64) -> Option<f64> {
    if hours > 0.0 && hours <= cap {
        Some(hours)
    } else {
        None
    }
}

/// Leave-category keyword named in the note, if any.
pub fn category_keyword(text: &str) -> Option<LeaveCategory> {
    let lower = text.to_lowercase();
    let has_word = |w: &str| {
        lower.match_indices(w).any(|(i, _)| {
            let before = lower[..i].chars().next_back();
            let after = lower[i + w.len()..].chars().next();
            !matches!(before, Some(c) if c.is_alphanumeric())
                && !matches!(after, Some(c) if c.is_alphanumeric())
        })
    };
    if has_word("pto") || has_word("vacation") {
        Some(LeaveCategory::Pto)
    } else if has_word("sick") {
        Some(LeaveCategory::Sick)
    } else if has_word("bereavement") {
        Some(LeaveCategory::Bereavement)
    } else if has_word("jury") {
        Some(LeaveCategory::JuryDuty)
    } else {
        None
    }
}

const WORKED_KEYWORDS: [&str; 4] = ["worked", "make up", "makeup", "offset"];

/// Over-coloring safety valve: a colored day whose note says the employee
/// actually worked is not leave.
pub fn is_worked_note(text: &str) -> bool {
    let lower = text.to_lowercase();
    WORKED_KEYWORDS.iter().any(|k| lower.contains(k))
}
