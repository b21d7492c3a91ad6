//! Tenure-bracket accrual rate table.
//!
//! The import engine treats the rate lookup as an external business-rule
//! collaborator; this TOML-configured table is the CLI's implementation
//! of that collaborator.

use chrono::NaiveDate;
use leavegrid_import::employee::RateLookup;
use serde::Deserialize;

use crate::CliError;
use crate::exit_codes::EXIT_USAGE;

#[derive(Debug, Clone, Deserialize)]
pub struct RateTable {
    pub bracket: Vec<RateBracket>,
}

/// One tenure bracket: employees with at least `min_years` of tenure at
/// the as-of date accrue `daily_hours` per day.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct RateBracket {
    pub min_years: f64,
    pub daily_hours: f64,
}

impl Default for RateTable {
    /// 10 / 15 / 20 days per year across 260 working days.
    fn default() -> Self {
        RateTable {
            bracket: vec![
                RateBracket { min_years: 0.0, daily_hours: 0.31 },
                RateBracket { min_years: 3.0, daily_hours: 0.46 },
                RateBracket { min_years: 7.0, daily_hours: 0.62 },
            ],
        }
    }
}

impl RateTable {
    pub fn from_toml(input: &str) -> Result<Self, CliError> {
        let table: RateTable = toml::from_str(input).map_err(|e| CliError {
            code: EXIT_USAGE,
            message: format!("invalid rate table: {e}"),
            hint: Some("expected [[bracket]] entries with min_years and daily_hours".into()),
        })?;
        table.validate()?;
        Ok(table)
    }

    pub fn validate(&self) -> Result<(), CliError> {
        let usage = |message: String| CliError { code: EXIT_USAGE, message, hint: None };
        if self.bracket.is_empty() {
            return Err(usage("rate table needs at least one bracket".into()));
        }
        if self.bracket[0].min_years != 0.0 {
            return Err(usage("first rate bracket must start at min_years = 0".into()));
        }
        for pair in self.bracket.windows(2) {
            if pair[1].min_years <= pair[0].min_years {
                return Err(usage("rate brackets must be in ascending min_years order".into()));
            }
        }
        if self.bracket.iter().any(|b| b.daily_hours <= 0.0) {
            return Err(usage("daily_hours must be positive".into()));
        }
        Ok(())
    }
}

impl RateLookup for RateTable {
    fn effective_daily_rate(&self, hire_date: NaiveDate, as_of: NaiveDate) -> f64 {
        let tenure_years = (as_of - hire_date).num_days() as f64 / 365.25;
        self.bracket
            .iter()
            .rev()
            .find(|b| tenure_years >= b.min_years)
            .or(self.bracket.first())
            .map(|b| b.daily_hours)
            .unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn default_brackets_select_by_tenure() {
        let table = RateTable::default();
        // 1 year in: first bracket
        assert_eq!(
            table.effective_daily_rate(date(2023, 6, 1), date(2024, 12, 31)),
            0.31
        );
        // 5 years in: second
        assert_eq!(
            table.effective_daily_rate(date(2019, 3, 4), date(2024, 12, 31)),
            0.46
        );
        // 10 years in: third
        assert_eq!(
            table.effective_daily_rate(date(2014, 1, 2), date(2024, 12, 31)),
            0.62
        );
    }

    #[test]
    fn hire_after_as_of_uses_first_bracket() {
        let table = RateTable::default();
        assert_eq!(
            table.effective_daily_rate(date(2025, 6, 1), date(2024, 12, 31)),
            0.31
        );
    }

    #[test]
    fn parse_and_validate() {
        let table = RateTable::from_toml(
            r#"
[[bracket]]
min_years = 0.0
daily_hours = 0.25

[[bracket]]
min_years = 2.0
daily_hours = 0.5
"#,
        )
        .unwrap();
        assert_eq!(table.bracket.len(), 2);

        assert!(RateTable::from_toml("bracket = []").is_err());
        assert!(RateTable::from_toml(
            "[[bracket]]\nmin_years = 1.0\ndaily_hours = 0.5"
        )
        .is_err());
        assert!(RateTable::from_toml(
            "[[bracket]]\nmin_years = 0.0\ndaily_hours = 0.5\n[[bracket]]\nmin_years = 0.0\ndaily_hours = 0.6"
        )
        .is_err());
    }
}
