//! Employee identity block and accrual rate.

use chrono::NaiveDate;
use leavegrid_engine::Sheet;

use crate::config::ImportConfig;
use crate::error::ImportError;
use crate::model::EmployeeInfo;

/// Label column scanned for the identity block (column A).
pub const IDENTITY_LABEL_COL: usize = 0;
/// Rows scanned for identity labels.
pub const IDENTITY_SCAN_ROWS: usize = 8;

/// The external accrual business-rule table, consumed as a pure function.
/// Ground truth: on a stated-vs-computed mismatch, this side wins.
pub trait RateLookup {
    /// Daily accrual rate in hours for an employee hired on `hire_date`,
    /// evaluated as of `as_of`.
    fn effective_daily_rate(&self, hire_date: NaiveDate, as_of: NaiveDate) -> f64;
}

/// Everything parsed from the identity block plus audit lines.
#[derive(Debug)]
pub struct EmployeeParse {
    pub info: EmployeeInfo,
    pub warnings: Vec<String>,
    pub resolved: Vec<String>,
}

/// Sheet-detection probe: an employee sheet carries a "Hire Date" label
/// near the top. The caller decides what to do with sheets that don't.
pub fn looks_like_employee_sheet(sheet: &Sheet) -> bool {
    find_label_row(sheet, "hire date").is_some()
}

fn find_label_row(sheet: &Sheet, label: &str) -> Option<usize> {
    (0..IDENTITY_SCAN_ROWS).find(|row| {
        sheet
            .text(*row, IDENTITY_LABEL_COL)
            .map(|t| t.eq_ignore_ascii_case(label))
            .unwrap_or(false)
    })
}

const HIRE_DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%m/%d/%Y", "%m/%d/%y"];

fn parse_date_text(text: &str) -> Option<NaiveDate> {
    HIRE_DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(text.trim(), fmt).ok())
}

/// Strip one trailing parenthetical: "3/4/2019 (part-time)" -> "3/4/2019".
fn strip_trailing_parenthetical(text: &str) -> Option<&str> {
    let text = text.trim_end();
    if !text.ends_with(')') {
        return None;
    }
    let open = text.rfind('(')?;
    Some(text[..open].trim_end())
}

/// Extract employee identity and compute the authoritative rate.
///
/// Hire-date text sometimes carries a trailing parenthetical suffix
/// (employment-type annotation). If direct parsing fails, the suffix is
/// stripped and the parse retried — recorded as a `resolved` note, never
/// a silent fix.
pub fn parse_employee(
    sheet: &Sheet,
    stated_rate: Option<f64>,
    carryover_hours: f64,
    rates: &dyn RateLookup,
    config: &ImportConfig,
) -> Result<EmployeeParse, ImportError> {
    let mut warnings = Vec::new();
    let mut resolved = Vec::new();

    let hire_row = find_label_row(sheet, "hire date").ok_or_else(|| ImportError::IdentityMissing {
        sheet: sheet.name.clone(),
        field: "Hire Date",
    })?;
    let hire_text = sheet
        .text(hire_row, IDENTITY_LABEL_COL + 1)
        .ok_or_else(|| ImportError::IdentityMissing {
            sheet: sheet.name.clone(),
            field: "Hire Date",
        })?;

    let hire_date = match parse_date_text(hire_text) {
        Some(date) => date,
        None => {
            let stripped = strip_trailing_parenthetical(hire_text)
                .and_then(|t| parse_date_text(t).map(|d| (t.to_string(), d)));
            match stripped {
                Some((kept, date)) => {
                    resolved.push(format!(
                        "hire date '{hire_text}' parsed as '{kept}' after dropping trailing parenthetical"
                    ));
                    date
                }
                None => {
                    return Err(ImportError::HireDateParse {
                        sheet: sheet.name.clone(),
                        value: hire_text.to_string(),
                    })
                }
            }
        }
    };

    let year_row = find_label_row(sheet, "year").ok_or_else(|| ImportError::IdentityMissing {
        sheet: sheet.name.clone(),
        field: "Year",
    })?;
    let year = sheet
        .number(year_row, IDENTITY_LABEL_COL + 1)
        .map(|n| n as i32)
        .filter(|y| (1990..=2100).contains(y))
        .ok_or_else(|| ImportError::IdentityMissing {
            sheet: sheet.name.clone(),
            field: "Year",
        })?;

    // Rate as of year end; the spreadsheet's own figure is advisory only.
    let year_end = NaiveDate::from_ymd_opt(year, 12, 31).expect("valid year end");
    let daily_rate = rates.effective_daily_rate(hire_date, year_end);
    if let Some(stated) = stated_rate {
        if (stated - daily_rate).abs() > config.rate_tolerance {
            warnings.push(format!(
                "stated accrual rate {stated} differs from computed {daily_rate}; using computed"
            ));
        }
    }

    let name = sheet.name.trim().to_string();
    let identifier = generate_identifier(&name, &config.identity_domain);

    Ok(EmployeeParse {
        info: EmployeeInfo {
            name,
            identifier,
            hire_date,
            year,
            carryover_hours,
            stated_rate,
            daily_rate,
        },
        warnings,
        resolved,
    })
}

/// Stable identifier from a display name: `firstname-lastname@domain`,
/// or `firstname@domain` for single-word names. Middle tokens drop.
/// Deterministic and collision-prone; it only proposes a match against
/// existing records, never auto-merges.
pub fn generate_identifier(name: &str, domain: &str) -> String {
    let tokens: Vec<String> = name
        .split_whitespace()
        .map(|t| {
            t.chars()
                .filter(|c| c.is_alphanumeric())
                .collect::<String>()
                .to_lowercase()
        })
        .filter(|t| !t.is_empty())
        .collect();

    match tokens.as_slice() {
        [] => format!("unknown@{domain}"),
        [only] => format!("{only}@{domain}"),
        [first, .., last] => format!("{first}-{last}@{domain}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use leavegrid_engine::Cell;

    struct FixedRate(f64);

    impl RateLookup for FixedRate {
        fn effective_daily_rate(&self, _hire: NaiveDate, _as_of: NaiveDate) -> f64 {
            self.0
        }
    }

    fn identity_sheet(hire_text: &str) -> Sheet {
        let mut sheet = Sheet::new("Jane Q. Public");
        sheet.set(0, 0, Cell::text("Hire Date"));
        sheet.set(0, 1, Cell::text(hire_text));
        sheet.set(1, 0, Cell::text("Year"));
        sheet.set(1, 1, Cell::number(2024.0));
        sheet
    }

    #[test]
    fn sheet_detection_requires_hire_date_label() {
        assert!(looks_like_employee_sheet(&identity_sheet("2019-03-04")));
        assert!(!looks_like_employee_sheet(&Sheet::new("Summary")));
    }

    #[test]
    fn plain_hire_date_parses_without_audit_lines() {
        let sheet = identity_sheet("3/4/2019");
        let parse =
            parse_employee(&sheet, None, 0.0, &FixedRate(0.46), &ImportConfig::default()).unwrap();
        assert_eq!(
            parse.info.hire_date,
            NaiveDate::from_ymd_opt(2019, 3, 4).unwrap()
        );
        assert_eq!(parse.info.year, 2024);
        assert!(parse.resolved.is_empty());
        assert!(parse.warnings.is_empty());
    }

    #[test]
    fn parenthetical_suffix_is_stripped_and_audited() {
        let sheet = identity_sheet("3/4/2019 (contract to hire)");
        let parse =
            parse_employee(&sheet, None, 0.0, &FixedRate(0.46), &ImportConfig::default()).unwrap();
        assert_eq!(
            parse.info.hire_date,
            NaiveDate::from_ymd_opt(2019, 3, 4).unwrap()
        );
        assert_eq!(parse.resolved.len(), 1);
        assert!(parse.resolved[0].contains("parenthetical"));
    }

    #[test]
    fn unparsable_hire_date_is_an_error() {
        let sheet = identity_sheet("sometime in spring");
        let err = parse_employee(&sheet, None, 0.0, &FixedRate(0.46), &ImportConfig::default())
            .unwrap_err();
        assert!(matches!(err, ImportError::HireDateParse { .. }));
    }

    #[test]
    fn rate_mismatch_warns_and_computed_wins() {
        let sheet = identity_sheet("2019-03-04");
        let parse = parse_employee(
            &sheet,
            Some(0.31),
            12.0,
            &FixedRate(0.46),
            &ImportConfig::default(),
        )
        .unwrap();
        assert_eq!(parse.info.daily_rate, 0.46);
        assert_eq!(parse.info.stated_rate, Some(0.31));
        assert_eq!(parse.info.carryover_hours, 12.0);
        assert_eq!(parse.warnings.len(), 1);
        assert!(parse.warnings[0].contains("using computed"));
    }

    #[test]
    fn rate_within_tolerance_is_quiet() {
        let sheet = identity_sheet("2019-03-04");
        let parse = parse_employee(
            &sheet,
            Some(0.465),
            0.0,
            &FixedRate(0.46),
            &ImportConfig::default(),
        )
        .unwrap();
        assert!(parse.warnings.is_empty());
    }

    #[test]
    fn identifier_generation() {
        assert_eq!(
            generate_identifier("Jane Q. Public", "acme.example"),
            "jane-public@acme.example"
        );
        assert_eq!(generate_identifier("Cher", "acme.example"), "cher@acme.example");
        assert_eq!(
            generate_identifier("  Ana-María   de la Cruz ", "acme.example"),
            "anamaría-cruz@acme.example"
        );
    }
}
