//! Text width measurement.

use std::collections::HashMap;

use ttf_parser::Face;

use crate::error::{LayoutError, LayoutResult};
use crate::fonts::FontId;

/// Page units (millimetres) per typographic point.
pub const PT_TO_UNITS: f32 = 25.4 / 72.0;

/// Width oracle for shaped text.
///
/// Implementations must be deterministic: the same `(text, font, size)`
/// always yields the same width.
pub trait TextMeasurer: Send + Sync {
    /// Width of display-order `text` in page units.
    fn measure_text(&self, text: &str, font: FontId, size_pt: f32) -> f32;

    /// Whether the measurer has real metrics for `font`.
    ///
    /// Consulted once per face when the layout engine resolves fallbacks.
    fn has_font(&self, _font: FontId) -> bool {
        true
    }
}

/// Metric-free estimate based on per-character em classes.
#[derive(Clone, Copy, Debug, Default)]
pub struct HeuristicMeasurer;

impl TextMeasurer for HeuristicMeasurer {
    fn measure_text(&self, text: &str, font: FontId, size_pt: f32) -> f32 {
        heuristic_measure_text(text, font, size_pt)
    }
}

pub(crate) fn heuristic_measure_text(text: &str, font: FontId, size_pt: f32) -> f32 {
    let em_sum: f32 = text.chars().map(glyph_em_width).sum();
    let weight_scale = if font.is_bold() { 1.06 } else { 1.0 };
    em_sum * size_pt * PT_TO_UNITS * weight_scale
}

fn glyph_em_width(ch: char) -> f32 {
    match ch {
        ' ' | '\u{00A0}' => 0.28,
        '\t' => 1.12,
        'i' | 'l' | 'I' | '|' | '!' => 0.24,
        '.' | ',' | ':' | ';' | '\'' | '"' | '`' => 0.26,
        '-' | '\u{2010}' | '\u{2013}' | '\u{2014}' => 0.34,
        '(' | ')' | '[' | ']' | '{' | '}' => 0.30,
        'f' | 't' | 'j' | 'r' => 0.34,
        'm' | 'w' | 'M' | 'W' | '@' | '%' | '&' | '#' => 0.80,
        '•' => 0.36,
        c if is_transparent_mark(c) => 0.0,
        c if c.is_ascii_digit() => 0.56,
        c if c.is_ascii_uppercase() => 0.66,
        c if c.is_ascii_lowercase() => 0.52,
        c if c.is_whitespace() => 0.28,
        c if c.is_ascii_punctuation() => 0.42,
        c if is_arabic(c) => 0.50,
        _ => 0.58,
    }
}

fn is_arabic(ch: char) -> bool {
    matches!(ch,
        '\u{0600}'..='\u{06FF}'
        | '\u{0750}'..='\u{077F}'
        | '\u{FB50}'..='\u{FDFF}'
        | '\u{FE70}'..='\u{FEFF}')
}

fn is_transparent_mark(ch: char) -> bool {
    matches!(ch, '\u{064B}'..='\u{065F}' | '\u{0670}' | '\u{200C}' | '\u{200D}')
}

struct LoadedFace {
    data: Vec<u8>,
    units_per_em: f32,
}

/// Measurer backed by TrueType advance widths.
///
/// Characters a registered face has no glyph for, and faces that were never
/// registered, fall back to the heuristic estimate.
#[derive(Default)]
pub struct TtfMeasurer {
    faces: HashMap<FontId, LoadedFace>,
}

impl core::fmt::Debug for TtfMeasurer {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let mut fonts: Vec<_> = self.faces.keys().collect();
        fonts.sort();
        f.debug_struct("TtfMeasurer").field("faces", &fonts).finish()
    }
}

impl TtfMeasurer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register TrueType/OpenType data for `font`, replacing any earlier face.
    pub fn register_face(&mut self, font: FontId, data: Vec<u8>) -> LayoutResult<()> {
        let units_per_em = {
            let face = Face::parse(&data, 0)
                .map_err(|err| LayoutError::Font(format!("{}: {}", font.name(), err)))?;
            face.units_per_em()
        };
        if units_per_em == 0 {
            return Err(LayoutError::Font(format!(
                "{}: font reports zero units per em",
                font.name()
            )));
        }
        log::debug!(
            "registered {} ({} bytes, {} units/em)",
            font.name(),
            data.len(),
            units_per_em
        );
        self.faces.insert(
            font,
            LoadedFace {
                data,
                units_per_em: f32::from(units_per_em),
            },
        );
        Ok(())
    }

    pub fn registered_fonts(&self) -> impl Iterator<Item = FontId> + '_ {
        self.faces.keys().copied()
    }
}

impl TextMeasurer for TtfMeasurer {
    fn measure_text(&self, text: &str, font: FontId, size_pt: f32) -> f32 {
        let Some(loaded) = self.faces.get(&font) else {
            return heuristic_measure_text(text, font, size_pt);
        };
        let Ok(face) = Face::parse(&loaded.data, 0) else {
            return heuristic_measure_text(text, font, size_pt);
        };
        let size_units = size_pt * PT_TO_UNITS;
        let scale = size_units / loaded.units_per_em;
        text.chars()
            .map(|ch| {
                face.glyph_index(ch)
                    .and_then(|gid| face.glyph_hor_advance(gid))
                    .map(|advance| f32::from(advance) * scale)
                    .unwrap_or_else(|| glyph_em_width(ch) * size_units)
            })
            .sum()
    }

    fn has_font(&self, font: FontId) -> bool {
        self.faces.contains_key(&font)
    }
}
