use serde::Deserialize;

use crate::error::ImportError;

/// Named thresholds for the approximate-matching and reconciliation
/// passes. Everything a calibration pass might tune lives here rather
/// than inline in the matching logic.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    /// Minimum chroma (max channel minus min channel) before a cell fill
    /// is even considered a leave color. Near-gray/near-white fills —
    /// banding, zebra striping — never match below this.
    pub chroma_min: f64,
    /// Maximum Euclidean RGB distance for a legend match. Beyond it the
    /// cell is "unmatched colored", not forced into the nearest category.
    pub color_max_distance: f64,
    /// Hours credited to a plain full-day leave cell.
    pub default_day_hours: f64,
    /// Hours for a partial-color cell with no superscript marker.
    pub partial_day_hours: f64,
    /// Conservative hours for an unmarked partial cell on a
    /// weekend-adjacent day (Monday/Friday).
    pub partial_edge_hours: f64,
    /// Sanity cap on any single entry's hours.
    pub max_entry_hours: f64,
    /// Absolute delta under which a calendar-vs-declared monthly total is
    /// considered reconciled.
    pub ack_tolerance_hours: f64,
    /// Allowed drift between the sheet's stated accrual rate and the
    /// computed one before a warning is raised.
    pub rate_tolerance: f64,
    /// Domain appended to generated employee identifiers.
    pub identity_domain: String,
}

impl Default for ImportConfig {
    fn default() -> Self {
        ImportConfig {
            chroma_min: 12.0,
            color_max_distance: 60.0,
            default_day_hours: 8.0,
            partial_day_hours: 4.0,
            partial_edge_hours: 2.0,
            max_entry_hours: 24.0,
            ack_tolerance_hours: 0.1,
            rate_tolerance: 0.01,
            identity_domain: "acme.example".into(),
        }
    }
}

impl ImportConfig {
    pub fn from_toml(input: &str) -> Result<Self, ImportError> {
        let config: ImportConfig =
            toml::from_str(input).map_err(|e| ImportError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ImportError> {
        let positive = [
            ("chroma_min", self.chroma_min),
            ("color_max_distance", self.color_max_distance),
            ("default_day_hours", self.default_day_hours),
            ("partial_day_hours", self.partial_day_hours),
            ("partial_edge_hours", self.partial_edge_hours),
            ("max_entry_hours", self.max_entry_hours),
            ("rate_tolerance", self.rate_tolerance),
        ];
        for (name, value) in positive {
            if value <= 0.0 {
                return Err(ImportError::ConfigValidation(format!(
                    "{name} must be positive, got {value}"
                )));
            }
        }
        if self.ack_tolerance_hours < 0.0 {
            return Err(ImportError::ConfigValidation(format!(
                "ack_tolerance_hours must not be negative, got {}",
                self.ack_tolerance_hours
            )));
        }
        if self.default_day_hours > self.max_entry_hours {
            return Err(ImportError::ConfigValidation(
                "default_day_hours exceeds max_entry_hours".into(),
            ));
        }
        if self.identity_domain.trim().is_empty() {
            return Err(ImportError::ConfigValidation(
                "identity_domain must not be empty".into(),
            ));
        }
        Ok(())
    }
}
