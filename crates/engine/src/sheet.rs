use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::cell::{Cell, CellValue, FillRef};

/// One worksheet: sparse cell storage keyed by 0-based (row, col).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Sheet {
    pub name: String,
    cells: HashMap<(usize, usize), Cell>,
}

impl Sheet {
    pub fn new(name: impl Into<String>) -> Self {
        Sheet {
            name: name.into(),
            cells: HashMap::new(),
        }
    }

    pub fn set(&mut self, row: usize, col: usize, cell: Cell) {
        self.cells.insert((row, col), cell);
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<&Cell> {
        self.cells.get(&(row, col))
    }

    pub fn cell_mut(&mut self, row: usize, col: usize) -> &mut Cell {
        self.cells.entry((row, col)).or_default()
    }

    pub fn value(&self, row: usize, col: usize) -> &CellValue {
        static EMPTY: CellValue = CellValue::Empty;
        self.cells.get(&(row, col)).map(|c| &c.value).unwrap_or(&EMPTY)
    }

    /// Trimmed text of a cell, None when the cell is empty or non-text.
    pub fn text(&self, row: usize, col: usize) -> Option<&str> {
        self.value(row, col)
            .as_text()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    pub fn number(&self, row: usize, col: usize) -> Option<f64> {
        self.value(row, col).as_number()
    }

    pub fn fill(&self, row: usize, col: usize) -> Option<FillRef> {
        self.cells.get(&(row, col)).and_then(|c| c.fill)
    }

    pub fn note(&self, row: usize, col: usize) -> Option<&str> {
        self.cells
            .get(&(row, col))
            .and_then(|c| c.note.as_deref())
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }
}
