//! Markup-noise removal for single lines of model output.

/// Characters removed wherever they appear: emphasis, heading and bracket
/// markers, plus a stray byte-order mark.
const NOISE_CHARS: [char; 5] = ['*', '#', '[', ']', '\u{FEFF}'];

/// Glyph bullets stripped from the line start even without a following space.
const GLYPH_BULLETS: [char; 5] = ['•', '·', '●', '▪', '◦'];

/// ASCII-ish list markers. Only stripped as a run followed by whitespace (or
/// the end of the line) so `-5` keeps its sign.
const DASH_BULLETS: [char; 4] = ['-', '+', '–', '—'];

/// Strip list markers, emphasis and heading/bracket markers and surrounding
/// whitespace from one raw line.
///
/// Total and idempotent: `normalize(&normalize(s)) == normalize(s)`.
pub fn normalize(line: &str) -> String {
    let cleaned: String = line.chars().filter(|c| !NOISE_CHARS.contains(c)).collect();
    let mut rest = cleaned.trim();
    loop {
        let stripped = strip_leading_marker(rest);
        if stripped.len() == rest.len() {
            break;
        }
        rest = stripped.trim_start();
    }
    rest.trim().to_string()
}

/// Whether a raw line was written as a list item: a glyph bullet, or a
/// dash/`*` marker followed by whitespace.
pub fn is_bullet_line(raw: &str) -> bool {
    let mut chars = raw.trim_start().chars();
    match chars.next() {
        Some(c) if GLYPH_BULLETS.contains(&c) => true,
        Some(c) if DASH_BULLETS.contains(&c) || c == '*' => {
            chars.next().is_some_and(char::is_whitespace)
        }
        _ => false,
    }
}

fn strip_leading_marker(text: &str) -> &str {
    let glyphs = text.trim_start_matches(|c| GLYPH_BULLETS.contains(&c));
    if glyphs.len() != text.len() {
        return glyphs;
    }
    let after_run = text.trim_start_matches(|c| DASH_BULLETS.contains(&c));
    if after_run.len() == text.len() {
        return text;
    }
    match after_run.chars().next() {
        None => after_run,
        Some(c) if c.is_whitespace() => after_run,
        Some(_) => text,
    }
}
