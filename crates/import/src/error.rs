use std::fmt;

/// Blocking, sheet-scoped failures. Anything here makes per-month
/// reconciliation impossible for that sheet; sibling sheets proceed.
#[derive(Debug)]
pub enum ImportError {
    /// No "Legend" header in the legend column — the calendar cannot be
    /// classified without it.
    LegendMissing { sheet: String },
    /// Neither candidate row carries the "January" anchor — declared
    /// totals and rate logic are unusable.
    CalcAnchorMissing { sheet: String },
    /// A required identity cell (hire date, year) is absent.
    IdentityMissing { sheet: String, field: &'static str },
    /// Hire date text did not parse, even after stripping a trailing
    /// parenthetical.
    HireDateParse { sheet: String, value: String },
    /// TOML parse / deserialization error.
    ConfigParse(String),
    /// Config validation error (non-positive threshold, empty domain, ...).
    ConfigValidation(String),
}

impl fmt::Display for ImportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LegendMissing { sheet } => {
                write!(f, "sheet '{sheet}': legend header not found")
            }
            Self::CalcAnchorMissing { sheet } => {
                write!(f, "sheet '{sheet}': PTO-Calc \"January\" anchor not found")
            }
            Self::IdentityMissing { sheet, field } => {
                write!(f, "sheet '{sheet}': missing {field}")
            }
            Self::HireDateParse { sheet, value } => {
                write!(f, "sheet '{sheet}': cannot parse hire date '{value}'")
            }
            Self::ConfigParse(msg) => write!(f, "config parse error: {msg}"),
            Self::ConfigValidation(msg) => write!(f, "config validation error: {msg}"),
        }
    }
}

impl std::error::Error for ImportError {}
