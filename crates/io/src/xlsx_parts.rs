//! XML part parsers for XLSX archives: fill references from styles.xml,
//! per-cell style ids from worksheet XML, comment text, and the
//! workbook.xml / rels plumbing that locates those parts.

use std::collections::HashMap;

use leavegrid_engine::FillRef;
use quick_xml::events::Event;
use quick_xml::Reader;

// =============================================================================
// styles.xml → per-style fill references
// =============================================================================

/// Fill reference captured from one `<fill>` entry.
#[derive(Debug, Clone, Copy, Default)]
struct ParsedFill {
    fill: Option<FillRef>,
    pattern_none: bool,
}

/// Parse styles.xml into a cellXfs-indexed fill table.
///
/// `table[style_id]` is the fill a cell with `s="style_id"` carries, with
/// theme slot + tint preserved — resolution against the palette happens in
/// the import engine, not here. Unsupported color forms (indexed palette
/// references) come back in the second tuple element.
pub fn parse_fill_table(xml: &str) -> (Vec<Option<FillRef>>, Vec<String>) {
    let mut unsupported: Vec<String> = Vec::new();
    let fills = parse_fills(xml, &mut unsupported);
    let fill_ids = parse_cell_xf_fill_ids(xml);

    let table = fill_ids
        .into_iter()
        .map(|fill_id| {
            fill_id
                .and_then(|id| fills.get(id).copied())
                .and_then(|f| if f.pattern_none { None } else { f.fill })
        })
        .collect();

    (table, unsupported)
}

/// Parse the `<fills>` section. Only the foreground color of a pattern
/// fill matters — that is the visible cell background for solid fills.
fn parse_fills(xml: &str, unsupported: &mut Vec<String>) -> Vec<ParsedFill> {
    let mut fills = Vec::new();
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();
    let mut depth = 0; // 0 = outside, 1 = inside <fills>, 2 = inside <fill>
    let mut in_pattern_fill = false;
    let mut current = ParsedFill::default();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => match e.name().as_ref() {
                b"fills" if depth == 0 => depth = 1,
                b"fill" if depth == 1 => {
                    depth = 2;
                    current = ParsedFill::default();
                }
                b"patternFill" if depth == 2 => {
                    in_pattern_fill = true;
                    current.pattern_none = pattern_is_none(e);
                }
                b"fgColor" if in_pattern_fill => {
                    current.fill = parse_color_attrs(e, unsupported);
                }
                _ => {}
            },
            Ok(Event::Empty(ref e)) => match e.name().as_ref() {
                b"patternFill" if depth == 2 => {
                    current.pattern_none = pattern_is_none(e);
                }
                b"fgColor" if in_pattern_fill => {
                    current.fill = parse_color_attrs(e, unsupported);
                }
                _ => {}
            },
            Ok(Event::End(ref e)) => match e.name().as_ref() {
                b"patternFill" => in_pattern_fill = false,
                b"fill" if depth == 2 => {
                    fills.push(current);
                    depth = 1;
                    in_pattern_fill = false;
                }
                b"fills" if depth == 1 => break,
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(_) => break,
            _ => {}
        }
        buf.clear();
    }

    fills
}

fn pattern_is_none(e: &quick_xml::events::BytesStart) -> bool {
    e.attributes()
        .flatten()
        .any(|a| a.key.as_ref() == b"patternType" && a.value.as_ref() == b"none")
}

/// Parse a color element's attributes into a fill reference.
/// rgb wins over theme; indexed palette references are not carried.
fn parse_color_attrs(
    e: &quick_xml::events::BytesStart,
    unsupported: &mut Vec<String>,
) -> Option<FillRef> {
    let mut rgb: Option<[u8; 3]> = None;
    let mut theme: Option<u8> = None;
    let mut tint: f64 = 0.0;
    let mut indexed = false;

    for attr in e.attributes().flatten() {
        match attr.key.as_ref() {
            b"rgb" => rgb = parse_rgb_hex(&attr.value),
            b"theme" => {
                theme = std::str::from_utf8(&attr.value)
                    .ok()
                    .and_then(|s| s.parse().ok());
            }
            b"tint" => {
                tint = std::str::from_utf8(&attr.value)
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(0.0);
            }
            b"indexed" => indexed = true,
            _ => {}
        }
    }

    if let Some(rgb) = rgb {
        return Some(FillRef::Argb(rgb));
    }
    if let Some(slot) = theme {
        return Some(FillRef::Theme { slot, tint });
    }
    if indexed && !unsupported.iter().any(|s| s.starts_with("indexed")) {
        unsupported.push("indexed palette colors not carried".to_string());
    }
    None
}

/// AARRGGBB or RRGGBB hex, alpha dropped.
fn parse_rgb_hex(hex: &[u8]) -> Option<[u8; 3]> {
    let s = std::str::from_utf8(hex).ok()?;
    let s = s.trim_start_matches('#');
    let s = if s.len() == 8 { &s[2..] } else { s };
    if s.len() != 6 {
        return None;
    }
    let r = u8::from_str_radix(&s[0..2], 16).ok()?;
    let g = u8::from_str_radix(&s[2..4], 16).ok()?;
    let b = u8::from_str_radix(&s[4..6], 16).ok()?;
    Some([r, g, b])
}

/// Parse `<cellXfs>` into per-style fillId values.
fn parse_cell_xf_fill_ids(xml: &str) -> Vec<Option<usize>> {
    let mut ids = Vec::new();
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();
    let mut in_cell_xfs = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) => match e.name().as_ref() {
                b"cellXfs" => in_cell_xfs = true,
                b"xf" if in_cell_xfs => {
                    let mut fill_id = None;
                    let mut apply_fill = true;
                    for attr in e.attributes().flatten() {
                        match attr.key.as_ref() {
                            b"fillId" => {
                                fill_id = std::str::from_utf8(&attr.value)
                                    .ok()
                                    .and_then(|s| s.parse().ok());
                            }
                            b"applyFill" => {
                                apply_fill = attr.value.as_ref() == b"1"
                                    || attr.value.as_ref() == b"true";
                            }
                            _ => {}
                        }
                    }
                    // applyFill=0 with a non-default fillId still renders in
                    // Excel; only an absent fillId yields no fill
                    let _ = apply_fill;
                    ids.push(fill_id);
                }
                _ => {}
            },
            Ok(Event::End(ref e)) if e.name().as_ref() == b"cellXfs" => break,
            Ok(Event::Eof) => break,
            Err(_) => break,
            _ => {}
        }
        buf.clear();
    }

    ids
}

// =============================================================================
// Worksheet XML → per-cell style ids
// =============================================================================

/// Extract (row, col, style_id) triples from a worksheet. Style id 0 is
/// the default and skipped.
pub fn parse_sheet_cell_styles(xml: &str) -> Vec<(usize, usize, usize)> {
    let mut cell_styles = Vec::new();
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e))
                if e.name().as_ref() == b"c" =>
            {
                let mut style_id: Option<usize> = None;
                let mut cell_ref: Option<String> = None;
                for attr in e.attributes().flatten() {
                    match attr.key.as_ref() {
                        b"s" => {
                            style_id = std::str::from_utf8(&attr.value)
                                .ok()
                                .and_then(|s| s.parse().ok());
                        }
                        b"r" => {
                            cell_ref = Some(String::from_utf8_lossy(&attr.value).to_string());
                        }
                        _ => {}
                    }
                }
                if let (Some(style_id), Some(ref cell_ref)) = (style_id, &cell_ref) {
                    if style_id > 0 {
                        if let Some((row, col)) = parse_cell_ref(cell_ref) {
                            cell_styles.push((row, col, style_id));
                        }
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(_) => break,
            _ => {}
        }
        buf.clear();
    }

    cell_styles
}

/// Parse a cell reference like "B5" into (row, col) = (4, 1).
pub fn parse_cell_ref(r: &str) -> Option<(usize, usize)> {
    let mut col_part = String::new();
    let mut row_part = String::new();

    for ch in r.chars() {
        if ch.is_ascii_alphabetic() {
            col_part.push(ch);
        } else if ch.is_ascii_digit() {
            row_part.push(ch);
        }
    }

    if col_part.is_empty() || row_part.is_empty() {
        return None;
    }

    let mut col: usize = 0;
    for ch in col_part.chars() {
        col = col * 26 + (ch.to_ascii_uppercase() as usize - 'A' as usize + 1);
    }
    col = col.saturating_sub(1);

    let row: usize = row_part.parse().ok()?;
    Some((row.saturating_sub(1), col))
}

// =============================================================================
// Comments part → per-cell note text
// =============================================================================

/// Parse a comments part into (row, col, text) triples. Rich-text runs
/// are joined into a single plain string.
pub fn parse_comments_xml(xml: &str) -> Vec<(usize, usize, String)> {
    let mut comments = Vec::new();
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(false);
    let mut buf = Vec::new();

    let mut current_ref: Option<(usize, usize)> = None;
    let mut in_text = false;
    let mut collecting_t = false;
    let mut text = String::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => match e.name().as_ref() {
                b"comment" => {
                    for attr in e.attributes().flatten() {
                        if attr.key.as_ref() == b"ref" {
                            current_ref =
                                parse_cell_ref(&String::from_utf8_lossy(&attr.value));
                        }
                    }
                    text.clear();
                }
                b"text" => in_text = current_ref.is_some(),
                b"t" if in_text => collecting_t = true,
                _ => {}
            },
            Ok(Event::Text(ref t)) if collecting_t => {
                if let Ok(s) = t.xml_content() {
                    text.push_str(&s);
                }
            }
            Ok(Event::End(ref e)) => match e.name().as_ref() {
                b"t" => collecting_t = false,
                b"text" => in_text = false,
                b"comment" => {
                    if let Some((row, col)) = current_ref.take() {
                        let trimmed = text.trim();
                        if !trimmed.is_empty() {
                            comments.push((row, col, trimmed.to_string()));
                        }
                    }
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(_) => break,
            _ => {}
        }
        buf.clear();
    }

    comments
}

/// Find the comments part target in a worksheet's rels, if any.
pub fn find_comments_target(rels_xml: &str) -> Option<String> {
    let mut reader = Reader::from_str(rels_xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e))
                if e.name().as_ref() == b"Relationship" =>
            {
                let mut is_comments = false;
                let mut target = None;
                for attr in e.attributes().flatten() {
                    match attr.key.as_ref() {
                        b"Type" => {
                            is_comments = String::from_utf8_lossy(&attr.value)
                                .ends_with("/comments");
                        }
                        b"Target" => {
                            target = Some(String::from_utf8_lossy(&attr.value).to_string());
                        }
                        _ => {}
                    }
                }
                if is_comments {
                    if let Some(target) = target {
                        return Some(target);
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(_) => break,
            _ => {}
        }
        buf.clear();
    }

    None
}

/// Resolve a rels target relative to the part that referenced it.
/// "../comments1.xml" referenced from "xl/worksheets/sheet1.xml" is
/// "xl/comments1.xml".
pub fn resolve_part_path(referencing_part: &str, target: &str) -> String {
    if let Some(stripped) = target.strip_prefix('/') {
        return stripped.to_string();
    }
    let mut dir: Vec<&str> = referencing_part.split('/').collect();
    dir.pop(); // drop the file name
    for segment in target.split('/') {
        match segment {
            ".." => {
                dir.pop();
            }
            "." => {}
            s => dir.push(s),
        }
    }
    dir.join("/")
}

// =============================================================================
// workbook.xml + rels → worksheet part paths
// =============================================================================

/// Resolve worksheet XML paths for specific sheet names (in order).
pub fn resolve_worksheet_paths(
    workbook_xml: &str,
    rels_xml: &str,
    sheet_names: &[String],
) -> Vec<Option<String>> {
    // workbook.xml: (name, rId) pairs
    let mut name_to_rid: Vec<(String, String)> = Vec::new();
    let mut reader = Reader::from_str(workbook_xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e))
                if e.name().as_ref() == b"sheet" =>
            {
                let mut name = None;
                let mut rid = None;
                for attr in e.attributes().flatten() {
                    match attr.key.as_ref() {
                        b"name" => name = Some(String::from_utf8_lossy(&attr.value).to_string()),
                        b"r:id" => rid = Some(String::from_utf8_lossy(&attr.value).to_string()),
                        _ => {}
                    }
                }
                if let (Some(name), Some(rid)) = (name, rid) {
                    name_to_rid.push((name, rid));
                }
            }
            Ok(Event::Eof) => break,
            Err(_) => break,
            _ => {}
        }
        buf.clear();
    }

    // rels: rId → target
    let mut rid_to_target: HashMap<String, String> = HashMap::new();
    let mut reader = Reader::from_str(rels_xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e))
                if e.name().as_ref() == b"Relationship" =>
            {
                let mut id = None;
                let mut target = None;
                for attr in e.attributes().flatten() {
                    match attr.key.as_ref() {
                        b"Id" => id = Some(String::from_utf8_lossy(&attr.value).to_string()),
                        b"Target" => {
                            target = Some(String::from_utf8_lossy(&attr.value).to_string());
                        }
                        _ => {}
                    }
                }
                if let (Some(id), Some(target)) = (id, target) {
                    rid_to_target.insert(id, target);
                }
            }
            Ok(Event::Eof) => break,
            Err(_) => break,
            _ => {}
        }
        buf.clear();
    }

    let name_rid_map: HashMap<&str, &str> = name_to_rid
        .iter()
        .map(|(n, r)| (n.as_str(), r.as_str()))
        .collect();

    sheet_names
        .iter()
        .map(|name| {
            name_rid_map
                .get(name.as_str())
                .and_then(|rid| rid_to_target.get(*rid))
                .map(|target| resolve_part_path("xl/workbook.xml", target))
        })
        .collect()
}

// =============================================================================
// Tests
// =============================================================================
