use serde::{Deserialize, Serialize};

use crate::sheet::Sheet;

/// A loaded workbook: ordered sheets plus the raw theme part.
///
/// The theme XML is carried verbatim; palette resolution is the import
/// engine's job, since only it knows how approximate a theme color may be
/// before classification must refuse it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Workbook {
    sheets: Vec<Sheet>,
    pub theme_xml: Option<String>,
}

impl Workbook {
    pub fn new() -> Self {
        Workbook::default()
    }

    pub fn add_sheet(&mut self, sheet: Sheet) {
        self.sheets.push(sheet);
    }

    pub fn sheets(&self) -> &[Sheet] {
        &self.sheets
    }

    pub fn sheets_mut(&mut self) -> &mut [Sheet] {
        &mut self.sheets
    }

    pub fn sheet_by_name(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name == name)
    }

    pub fn sheet_names(&self) -> Vec<String> {
        self.sheets.iter().map(|s| s.name.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sheet_lookup_by_name() {
        let mut wb = Workbook::new();
        wb.add_sheet(Sheet::new("Jane Public"));
        wb.add_sheet(Sheet::new("Cher"));
        assert!(wb.sheet_by_name("Cher").is_some());
        assert!(wb.sheet_by_name("Nobody").is_none());
        assert_eq!(wb.sheet_names(), vec!["Jane Public", "Cher"]);
    }
}
