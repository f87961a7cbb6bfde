//! Contextual Arabic joining and visual reordering.
//!
//! Output of [`shape`] is display order for a left-to-right drawing pipeline:
//! letters are replaced by their positional presentation forms and the run
//! order is reversed per the bidi algorithm. It is only fit for measuring and
//! drawing.

use unicode_bidi::{BidiInfo, Level};

use crate::error::ShapeError;

const LAM: char = '\u{0644}';
const TATWEEL: char = '\u{0640}';

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Joining {
    /// Joins on neither side (hamza, non-Arabic characters).
    None,
    /// Joins only to the preceding letter.
    Right,
    /// Joins on both sides.
    Dual,
    /// Forces joining on both neighbours without changing shape (tatweel).
    Causing,
    /// Skipped when looking for neighbours (harakat).
    Transparent,
}

impl Joining {
    fn joins_forward(self) -> bool {
        matches!(self, Self::Dual | Self::Causing)
    }

    fn joins_backward(self) -> bool {
        matches!(self, Self::Right | Self::Dual | Self::Causing)
    }
}

/// Isolated presentation form and joining class for U+0621..=U+064A.
///
/// Dual-joining letters have four consecutive forms (isolated, final,
/// initial, medial); right-joining letters have two.
const LETTER_FORMS: [(u16, Joining); 42] = [
    (0xFE80, Joining::None),  // 0621 hamza
    (0xFE81, Joining::Right), // 0622 alef with madda
    (0xFE83, Joining::Right), // 0623 alef with hamza above
    (0xFE85, Joining::Right), // 0624 waw with hamza
    (0xFE87, Joining::Right), // 0625 alef with hamza below
    (0xFE89, Joining::Dual),  // 0626 yeh with hamza
    (0xFE8D, Joining::Right), // 0627 alef
    (0xFE8F, Joining::Dual),  // 0628 beh
    (0xFE93, Joining::Right), // 0629 teh marbuta
    (0xFE95, Joining::Dual),  // 062A teh
    (0xFE99, Joining::Dual),  // 062B theh
    (0xFE9D, Joining::Dual),  // 062C jeem
    (0xFEA1, Joining::Dual),  // 062D hah
    (0xFEA5, Joining::Dual),  // 062E khah
    (0xFEA9, Joining::Right), // 062F dal
    (0xFEAB, Joining::Right), // 0630 thal
    (0xFEAD, Joining::Right), // 0631 reh
    (0xFEAF, Joining::Right), // 0632 zain
    (0xFEB1, Joining::Dual),  // 0633 seen
    (0xFEB5, Joining::Dual),  // 0634 sheen
    (0xFEB9, Joining::Dual),  // 0635 sad
    (0xFEBD, Joining::Dual),  // 0636 dad
    (0xFEC1, Joining::Dual),  // 0637 tah
    (0xFEC5, Joining::Dual),  // 0638 zah
    (0xFEC9, Joining::Dual),  // 0639 ain
    (0xFECD, Joining::Dual),  // 063A ghain
    (0, Joining::None),       // 063B
    (0, Joining::None),       // 063C
    (0, Joining::None),       // 063D
    (0, Joining::None),       // 063E
    (0, Joining::None),       // 063F
    (0, Joining::Causing),    // 0640 tatweel
    (0xFED1, Joining::Dual),  // 0641 feh
    (0xFED5, Joining::Dual),  // 0642 qaf
    (0xFED9, Joining::Dual),  // 0643 kaf
    (0xFEDD, Joining::Dual),  // 0644 lam
    (0xFEE1, Joining::Dual),  // 0645 meem
    (0xFEE5, Joining::Dual),  // 0646 noon
    (0xFEE9, Joining::Dual),  // 0647 heh
    (0xFEED, Joining::Right), // 0648 waw
    (0xFEEF, Joining::Right), // 0649 alef maksura
    (0xFEF1, Joining::Dual),  // 064A yeh
];

fn letter_entry(ch: char) -> Option<(u16, Joining)> {
    let idx = (ch as u32).checked_sub(0x0621)? as usize;
    LETTER_FORMS.get(idx).copied()
}

fn joining(ch: char) -> Joining {
    if is_transparent(ch) {
        return Joining::Transparent;
    }
    letter_entry(ch).map_or(Joining::None, |(_, join)| join)
}

fn is_transparent(ch: char) -> bool {
    matches!(ch, '\u{064B}'..='\u{065F}' | '\u{0670}')
}

/// Isolated and final lam-alef ligatures for the alef following a lam.
fn lam_alef_ligature(alef: char) -> Option<(u16, u16)> {
    match alef {
        '\u{0622}' => Some((0xFEF5, 0xFEF6)),
        '\u{0623}' => Some((0xFEF7, 0xFEF8)),
        '\u{0625}' => Some((0xFEF9, 0xFEFA)),
        '\u{0627}' => Some((0xFEFB, 0xFEFC)),
        _ => None,
    }
}

fn is_paragraph_separator(ch: char) -> bool {
    matches!(ch, '\n' | '\r' | '\u{1C}'..='\u{1E}' | '\u{85}' | '\u{2029}')
}

fn is_presentation_form(ch: char) -> bool {
    matches!(ch, '\u{FB50}'..='\u{FDFF}' | '\u{FE70}'..='\u{FEFE}')
}

fn form_char(code: u16) -> char {
    char::from_u32(u32::from(code)).unwrap_or(char::REPLACEMENT_CHARACTER)
}

/// Joining class of the nearest non-transparent neighbour.
fn neighbour(chars: &[char], idx: usize, forward: bool) -> Joining {
    let mut cursor = idx;
    loop {
        let next = if forward {
            cursor.checked_add(1).filter(|n| *n < chars.len())
        } else {
            cursor.checked_sub(1)
        };
        let Some(n) = next else {
            return Joining::None;
        };
        match joining(chars[n]) {
            Joining::Transparent => cursor = n,
            other => return other,
        }
    }
}

/// Replace Arabic letters with their contextual presentation forms.
fn join_letters(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut idx = 0;
    while idx < chars.len() {
        let ch = chars[idx];
        let Some((base, join)) = letter_entry(ch) else {
            out.push(ch);
            idx += 1;
            continue;
        };
        if ch == TATWEEL || base == 0 {
            out.push(ch);
            idx += 1;
            continue;
        }

        let joins_prev = join.joins_backward() && neighbour(&chars, idx, false).joins_forward();

        if ch == LAM {
            if let Some((isolated, fin)) = chars.get(idx + 1).copied().and_then(lam_alef_ligature)
            {
                out.push(form_char(if joins_prev { fin } else { isolated }));
                idx += 2;
                continue;
            }
        }

        let joins_next = join.joins_forward() && neighbour(&chars, idx, true).joins_backward();
        let offset = match (joins_prev, joins_next) {
            (false, false) => 0,
            (true, false) => 1,
            (false, true) => 2,
            (true, true) => 3,
        };
        out.push(form_char(base + offset));
        idx += 1;
    }
    out
}

/// Shape one line for right-to-left display, reporting why it cannot be.
///
/// With `rtl == false` the text is returned unchanged.
pub fn try_shape(text: &str, rtl: bool) -> Result<String, ShapeError> {
    if !rtl || text.is_empty() {
        return Ok(text.to_string());
    }
    if text.chars().any(is_paragraph_separator) {
        return Err(ShapeError::MultipleParagraphs);
    }
    if let Some((pos, _)) = text.char_indices().find(|(_, ch)| is_presentation_form(*ch)) {
        return Err(ShapeError::AlreadyShaped(pos));
    }

    let joined = join_letters(text);
    let bidi = BidiInfo::new(&joined, Some(Level::rtl()));
    match bidi.paragraphs.as_slice() {
        [] => Ok(String::new()),
        [para] => Ok(bidi.reorder_line(para, para.range.clone()).into_owned()),
        _ => Err(ShapeError::MultipleParagraphs),
    }
}

/// Shape one line for display. Falls back to the logical text when shaping
/// is not possible; never fails.
pub fn shape(text: &str, rtl: bool) -> String {
    match try_shape(text, rtl) {
        Ok(shaped) => shaped,
        Err(err) => {
            log::debug!("shaping fallback for {:?}: {}", text, err);
            text.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ltr_text_is_untouched() {
        assert_eq!(shape("Fluency 42 wpm", false), "Fluency 42 wpm");
        assert_eq!(shape("مرحبا", false), "مرحبا");
    }

    #[test]
    fn beh_takes_positional_forms() {
        // beh beh beh: initial, medial, final; reversed for display
        let shaped = shape("\u{0628}\u{0628}\u{0628}", true);
        assert_eq!(shaped, "\u{FE90}\u{FE92}\u{FE91}");
    }

    #[test]
    fn right_joining_letter_breaks_the_chain() {
        // dal beh: dal isolated, beh isolated (dal never joins forward)
        let shaped = shape("\u{062F}\u{0628}", true);
        assert_eq!(shaped, "\u{FE8F}\u{FEA9}");
    }

    #[test]
    fn lam_alef_forms_ligature() {
        assert_eq!(shape("\u{0644}\u{0627}", true), "\u{FEFB}");
        // beh lam alef: beh initial, final lam-alef
        assert_eq!(shape("\u{0628}\u{0644}\u{0627}", true), "\u{FEFC}\u{FE91}");
    }

    #[test]
    fn harakat_do_not_break_joining() {
        let shaped = shape("\u{0628}\u{064E}\u{0628}", true);
        assert!(shaped.contains('\u{FE91}'));
        assert!(shaped.contains('\u{FE90}'));
    }

    #[test]
    fn latin_run_keeps_order_inside_rtl_line() {
        let shaped = shape("\u{0628} abc", true);
        assert!(shaped.contains("abc"));
        assert!(shaped.starts_with("abc"));
    }

    #[test]
    fn malformed_input_falls_back_to_logical_text() {
        assert_eq!(
            try_shape("\u{0628}\n\u{0628}", true),
            Err(ShapeError::MultipleParagraphs)
        );
        assert_eq!(shape("\u{0628}\n\u{0628}", true), "\u{0628}\n\u{0628}");
        assert_eq!(
            try_shape("a\u{FE8F}", true),
            Err(ShapeError::AlreadyShaped(1))
        );
    }
}
