use serde::{Deserialize, Serialize};

/// A cell value as loaded from the workbook. Formula cells carry their
/// cached result, never the formula source — the import engine only ever
/// looks at computed values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CellValue {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
}

impl Default for CellValue {
    fn default() -> Self {
        CellValue::Empty
    }
}

impl CellValue {
    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Text content, if any. Numbers and bools are not stringified here;
    /// callers that want coercion use `display()`.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Numeric coercion: numbers pass through, numeric-looking text
    /// parses, everything else is None.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(*n),
            CellValue::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn display(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Text(s) => s.clone(),
            CellValue::Number(n) => {
                if n.fract() == 0.0 {
                    format!("{}", *n as i64)
                } else {
                    format!("{}", n)
                }
            }
            CellValue::Bool(b) => {
                if *b {
                    "TRUE".into()
                } else {
                    "FALSE".into()
                }
            }
        }
    }
}

/// A cell fill reference as it appears in the file, before resolution
/// against the workbook theme. Explicit colors carry RGB directly; theme
/// colors carry a palette slot plus a lighten/darken tint.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum FillRef {
    /// Explicit color (alpha already dropped).
    Argb([u8; 3]),
    /// Theme palette slot 0-11 plus tint in [-1.0, 1.0].
    Theme { slot: u8, tint: f64 },
}

/// One workbook cell: value, fill reference, attached note.
///
/// The note is already normalized to plain text by the loader (rich-text
/// runs joined, author prefix stripped).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Cell {
    pub value: CellValue,
    pub fill: Option<FillRef>,
    pub note: Option<String>,
}

impl Cell {
    pub fn text(value: impl Into<String>) -> Self {
        Cell {
            value: CellValue::Text(value.into()),
            ..Default::default()
        }
    }

    pub fn number(value: f64) -> Self {
        Cell {
            value: CellValue::Number(value),
            ..Default::default()
        }
    }

    pub fn with_fill(mut self, fill: FillRef) -> Self {
        self.fill = Some(fill);
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}
