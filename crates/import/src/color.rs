//! Theme palette resolution and approximate color matching.
//!
//! Workbook colors arrive either as explicit RGB or as a theme slot plus a
//! tint. The palette comes from the workbook's theme XML; when that part
//! is missing or unreadable we fall back to the stock Office palette, which
//! is what the hand-maintained sheets were authored against anyway.

use leavegrid_engine::FillRef;
use quick_xml::events::Event;
use quick_xml::Reader;

use crate::config::ImportConfig;
use crate::model::{LeaveCategory, Rgb};

/// Theme palette: 12 slots in the order cell `theme="N"` references use —
/// lt1, dk1, lt2, dk2, accent1-6, hyperlink, followed hyperlink.
///
/// Note the light/dark pair swap versus theme XML, which declares
/// dk1, lt1, dk2, lt2 first.
#[derive(Debug, Clone, PartialEq)]
pub struct ThemePalette {
    slots: [Rgb; 12],
}

/// Stock Office palette, used when the workbook carries no usable theme.
const DEFAULT_PALETTE: [Rgb; 12] = [
    [0xFF, 0xFF, 0xFF], // lt1
    [0x00, 0x00, 0x00], // dk1
    [0xE7, 0xE6, 0xE6], // lt2
    [0x44, 0x54, 0x6A], // dk2
    [0x44, 0x72, 0xC4], // accent1
    [0xED, 0x7D, 0x31], // accent2
    [0xA5, 0xA5, 0xA5], // accent3
    [0xFF, 0xC0, 0x00], // accent4
    [0x5B, 0x9B, 0xD5], // accent5
    [0x70, 0xAD, 0x47], // accent6
    [0x05, 0x63, 0xC1], // hlink
    [0x95, 0x4F, 0x72], // folHlink
];

/// Theme XML block names in declaration order, paired with the palette
/// slot each one lands in.
const THEME_BLOCK_SLOTS: [(&str, usize); 12] = [
    ("dk1", 1),
    ("lt1", 0),
    ("dk2", 3),
    ("lt2", 2),
    ("accent1", 4),
    ("accent2", 5),
    ("accent3", 6),
    ("accent4", 7),
    ("accent5", 8),
    ("accent6", 9),
    ("hlink", 10),
    ("folHlink", 11),
];

impl Default for ThemePalette {
    fn default() -> Self {
        ThemePalette {
            slots: DEFAULT_PALETTE,
        }
    }
}

impl ThemePalette {
    pub fn slot(&self, idx: u8) -> Option<Rgb> {
        self.slots.get(idx as usize).copied()
    }
}

/// Parse the 12 named color blocks out of a workbook theme part.
///
/// Each block prefers a system-color reference's "last used" value
/// (`<a:sysClr lastClr="...">`) over a literal (`<a:srgbClr val="...">`).
/// If not a single block resolves, the default palette is returned whole;
/// individually missing blocks fall back slot-by-slot.
pub fn parse_theme_colors(theme_xml: &str) -> ThemePalette {
    let mut slots: [Option<Rgb>; 12] = [None; 12];
    let mut current_slot: Option<usize> = None;

    let mut reader = Reader::from_str(theme_xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) => {
                let name = e.name();
                let local = local_name(name.as_ref());
                if let Some((_, slot)) = THEME_BLOCK_SLOTS.iter().find(|(n, _)| *n == local) {
                    current_slot = Some(*slot);
                } else if let Some(slot) = current_slot {
                    match local {
                        "sysClr" => {
                            for attr in e.attributes().flatten() {
                                if attr.key.as_ref().ends_with(b"lastClr") {
                                    if let Some(rgb) = parse_rgb_hex(&attr.value) {
                                        slots[slot] = Some(rgb);
                                    }
                                }
                            }
                        }
                        "srgbClr" => {
                            for attr in e.attributes().flatten() {
                                if attr.key.as_ref() == b"val" {
                                    // sysClr lastClr wins if both appear
                                    if slots[slot].is_none() {
                                        if let Some(rgb) = parse_rgb_hex(&attr.value) {
                                            slots[slot] = Some(rgb);
                                        }
                                    }
                                }
                            }
                        }
                        _ => {}
                    }
                }
            }
            Ok(Event::End(ref e)) => {
                let name = e.name();
                let local = local_name(name.as_ref());
                if THEME_BLOCK_SLOTS.iter().any(|(n, _)| *n == local) {
                    current_slot = None;
                }
            }
            Ok(Event::Eof) => break,
            Err(_) => break,
            _ => {}
        }
        buf.clear();
    }

    if slots.iter().all(|s| s.is_none()) {
        return ThemePalette::default();
    }

    let mut resolved = DEFAULT_PALETTE;
    for (i, slot) in slots.iter().enumerate() {
        if let Some(rgb) = slot {
            resolved[i] = *rgb;
        }
    }
    ThemePalette { slots: resolved }
}

/// Strip an XML namespace prefix: `a:srgbClr` → `srgbClr`.
fn local_name(name: &[u8]) -> &str {
    let start = name.iter().rposition(|b| *b == b':').map_or(0, |i| i + 1);
    std::str::from_utf8(&name[start..]).unwrap_or("")
}

/// Parse RRGGBB (or AARRGGBB, alpha dropped) hex into RGB.
fn parse_rgb_hex(hex: &[u8]) -> Option<Rgb> {
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

/// Resolve a fill reference to an absolute color. None for theme slots
/// outside the palette.
pub fn resolve_fill(fill: &FillRef, palette: &ThemePalette) -> Option<Rgb> {
    match fill {
        FillRef::Argb(rgb) => Some(*rgb),
        FillRef::Theme { slot, tint } => {
            let base = palette.slot(*slot)?;
            if tint.abs() < f64::EPSILON {
                Some(base)
            } else {
                Some(apply_tint(base, *tint))
            }
        }
    }
}

/// Per-channel tint transform: positive tint moves toward white, negative
/// toward black, proportionally, clamped to the channel range.
fn apply_tint(rgb: Rgb, tint: f64) -> Rgb {
    let mut out = [0u8; 3];
    for (i, c) in rgb.iter().enumerate() {
        let c = *c as f64;
        let t = if tint > 0.0 {
            c + (255.0 - c) * tint
        } else {
            c * (1.0 + tint)
        };
        out[i] = t.round().clamp(0.0, 255.0) as u8;
    }
    out
}

/// Euclidean distance over the three channels.
pub fn color_distance(a: Rgb, b: Rgb) -> f64 {
    let dr = a[0] as f64 - b[0] as f64;
    let dg = a[1] as f64 - b[1] as f64;
    let db = a[2] as f64 - b[2] as f64;
    (dr * dr + dg * dg + db * db).sqrt()
}

/// Max channel minus min channel: a proxy for how saturated a fill is.
pub fn chroma(c: Rgb) -> u8 {
    let max = c[0].max(c[1]).max(c[2]);
    let min = c[0].min(c[1]).min(c[2]);
    max - min
}

/// Find the closest legend swatch for a cell color.
///
/// Refuses near-gray cells outright (chroma guard — anti-aliased banding
/// and zebra striping must never classify as leave), and refuses matches
/// beyond the distance threshold: such a cell is "unmatched colored", not
/// forced into the nearest category. Returns the winning swatch color
/// alongside its category so callers can consult the partial-color set.
pub fn match_legend_color(
    cell: Rgb,
    swatches: &[(Rgb, LeaveCategory)],
    config: &ImportConfig,
) -> Option<(Rgb, LeaveCategory)> {
    if (chroma(cell) as f64) < config.chroma_min {
        return None;
    }

    let mut best: Option<(f64, Rgb, LeaveCategory)> = None;
    for (swatch, category) in swatches {
        let dist = color_distance(cell, *swatch);
        if best.as_ref().map_or(true, |(d, _, _)| dist < *d) {
            best = Some((dist, *swatch, *category));
        }
    }

    match best {
        Some((dist, swatch, category)) if dist <= config.color_max_distance => {
            Some((swatch, category))
        }
        _ => None,
    }
}
