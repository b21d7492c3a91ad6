//! Excel file import (xlsx).
//!
//! One-way conversion into the engine's workbook model. Cell values come
//! from calamine; fills, notes and the theme part are read out of the ZIP
//! archive directly so theme slot + tint survive to the import engine.

use std::fmt;
use std::io::{Read, Seek};
use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader as CalamineReader, Sheets};
use leavegrid_engine::{Cell, CellValue, Sheet, Workbook};
use zip::ZipArchive;

use crate::xlsx_parts;

#[derive(Debug)]
pub enum XlsxError {
    Open(String),
    SheetRead { sheet: String, message: String },
    Zip(String),
}

impl fmt::Display for XlsxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open(msg) => write!(f, "cannot open workbook: {msg}"),
            Self::SheetRead { sheet, message } => {
                write!(f, "cannot read sheet '{sheet}': {message}")
            }
            Self::Zip(msg) => write!(f, "cannot read workbook archive: {msg}"),
        }
    }
}

impl std::error::Error for XlsxError {}

/// Stats about a load, for the import report.
#[derive(Debug, Default)]
pub struct LoadReport {
    pub sheets_loaded: usize,
    pub cells_loaded: usize,
    pub fills_applied: usize,
    pub notes_loaded: usize,
    pub warnings: Vec<String>,
}

/// Load an xlsx file into the in-memory workbook model.
pub fn load_workbook(path: &Path) -> Result<(Workbook, LoadReport), XlsxError> {
    let mut report = LoadReport::default();
    let mut workbook = Workbook::new();

    // Pass 1: cell values via calamine.
    let mut sheets: Sheets<_> =
        open_workbook_auto(path).map_err(|e| XlsxError::Open(e.to_string()))?;
    let sheet_names: Vec<String> = sheets.sheet_names().to_vec();

    for sheet_name in &sheet_names {
        let range = sheets
            .worksheet_range(sheet_name)
            .map_err(|e| XlsxError::SheetRead {
                sheet: sheet_name.clone(),
                message: e.to_string(),
            })?;

        let mut sheet = Sheet::new(sheet_name.clone());
        let (start_row, start_col) = range.start().unwrap_or((0, 0));

        for (row_idx, row) in range.rows().enumerate() {
            for (col_idx, data) in row.iter().enumerate() {
                let Some(value) = convert_value(data) else {
                    continue;
                };
                let row = start_row as usize + row_idx;
                let col = start_col as usize + col_idx;
                sheet.set(row, col, Cell { value, fill: None, note: None });
                report.cells_loaded += 1;
            }
        }

        workbook.add_sheet(sheet);
        report.sheets_loaded += 1;
    }

    // Pass 2: fills, notes, theme out of the ZIP.
    let file = std::fs::File::open(path).map_err(|e| XlsxError::Zip(e.to_string()))?;
    let mut archive = ZipArchive::new(file).map_err(|e| XlsxError::Zip(e.to_string()))?;
    apply_archive_parts(&mut archive, &sheet_names, &mut workbook, &mut report);

    Ok((workbook, report))
}

fn convert_value(data: &Data) -> Option<CellValue> {
    match data {
        Data::Empty => None,
        Data::String(s) => {
            if s.trim().is_empty() {
                None
            } else {
                Some(CellValue::Text(s.clone()))
            }
        }
        Data::Float(n) => Some(CellValue::Number(*n)),
        Data::Int(n) => Some(CellValue::Number(*n as f64)),
        Data::Bool(b) => Some(CellValue::Bool(*b)),
        Data::DateTime(dt) => Some(CellValue::Number(dt.as_f64())),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Some(CellValue::Text(s.clone())),
        Data::Error(_) => None,
    }
}

/// Second pass over the raw archive: styles.xml fill references applied
/// through per-cell style ids, notes from each sheet's comments part,
/// theme XML carried verbatim.
fn apply_archive_parts<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    sheet_names: &[String],
    workbook: &mut Workbook,
    report: &mut LoadReport,
) {
    workbook.theme_xml = read_zip_file(archive, "xl/theme/theme1.xml").ok();
    if workbook.theme_xml.is_none() {
        report
            .warnings
            .push("no theme part; theme colors resolve against the default palette".into());
    }

    let fill_table = match read_zip_file(archive, "xl/styles.xml") {
        Ok(xml) => {
            let (table, unsupported) = xlsx_parts::parse_fill_table(&xml);
            report.warnings.extend(unsupported);
            table
        }
        Err(_) => {
            report
                .warnings
                .push("no styles part; cell fills unavailable".into());
            Vec::new()
        }
    };

    let workbook_xml = read_zip_file(archive, "xl/workbook.xml").unwrap_or_default();
    let rels_xml = read_zip_file(archive, "xl/_rels/workbook.xml.rels").unwrap_or_default();
    let ws_paths = xlsx_parts::resolve_worksheet_paths(&workbook_xml, &rels_xml, sheet_names);

    for (sheet_idx, ws_path) in ws_paths.iter().enumerate() {
        let Some(ws_path) = ws_path else {
            report.warnings.push(format!(
                "worksheet part for sheet '{}' not found; fills and notes skipped",
                sheet_names[sheet_idx]
            ));
            continue;
        };

        // Fills via per-cell style ids.
        if !fill_table.is_empty() {
            if let Ok(ws_xml) = read_zip_file(archive, ws_path) {
                for (row, col, style_id) in xlsx_parts::parse_sheet_cell_styles(&ws_xml) {
                    if let Some(Some(fill)) = fill_table.get(style_id) {
                        if let Some(sheet) = workbook_sheet_mut(workbook, sheet_idx) {
                            sheet.cell_mut(row, col).fill = Some(*fill);
                            report.fills_applied += 1;
                        }
                    }
                }
            }
        }

        // Notes via the sheet's comments part.
        let rels_path = sheet_rels_path(ws_path);
        if let Ok(sheet_rels) = read_zip_file(archive, &rels_path) {
            if let Some(target) = xlsx_parts::find_comments_target(&sheet_rels) {
                let comments_path = xlsx_parts::resolve_part_path(ws_path, &target);
                if let Ok(comments_xml) = read_zip_file(archive, &comments_path) {
                    for (row, col, text) in xlsx_parts::parse_comments_xml(&comments_xml) {
                        if let Some(sheet) = workbook_sheet_mut(workbook, sheet_idx) {
                            sheet.cell_mut(row, col).note = Some(text);
                            report.notes_loaded += 1;
                        }
                    }
                }
            }
        }
    }
}

fn workbook_sheet_mut(workbook: &mut Workbook, idx: usize) -> Option<&mut Sheet> {
    workbook.sheets_mut().get_mut(idx)
}

/// "xl/worksheets/sheet1.xml" → "xl/worksheets/_rels/sheet1.xml.rels"
fn sheet_rels_path(ws_path: &str) -> String {
    match ws_path.rsplit_once('/') {
        Some((dir, file)) => format!("{dir}/_rels/{file}.rels"),
        None => format!("_rels/{ws_path}.rels"),
    }
}

fn read_zip_file<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    path: &str,
) -> Result<String, String> {
    let mut file = archive
        .by_name(path)
        .map_err(|e| format!("'{path}' not found: {e}"))?;
    let mut content = String::new();
    file.read_to_string(&mut content)
        .map_err(|e| format!("cannot read '{path}': {e}"))?;
    Ok(content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_conversion() {
        assert_eq!(convert_value(&Data::Empty), None);
        assert_eq!(convert_value(&Data::String("  ".into())), None);
        assert_eq!(
            convert_value(&Data::String("Legend".into())),
            Some(CellValue::Text("Legend".into()))
        );
        assert_eq!(convert_value(&Data::Int(15)), Some(CellValue::Number(15.0)));
        assert_eq!(convert_value(&Data::Float(8.5)), Some(CellValue::Number(8.5)));
        assert_eq!(convert_value(&Data::Bool(true)), Some(CellValue::Bool(true)));
    }

    #[test]
    fn rels_path_for_worksheet() {
        assert_eq!(
            sheet_rels_path("xl/worksheets/sheet1.xml"),
            "xl/worksheets/_rels/sheet1.xml.rels"
        );
    }

    #[test]
    fn missing_file_is_open_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_workbook(&dir.path().join("nope.xlsx")).unwrap_err();
        assert!(matches!(err, XlsxError::Open(_)));
    }
}
