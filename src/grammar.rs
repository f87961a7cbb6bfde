//! Grammar descriptor for model output conventions.
//!
//! The model answers in one of two conventions: flat `label|value` lines with
//! bracketed section headers, or the same content wrapped in explicit
//! `SCORES_START`/`NOTES_START` blocks. Both are described by one
//! [`ParseGrammar`] so the parser itself has no per-language branches.

use serde::{Deserialize, Serialize};

use crate::error::{ReportError, ReportResult};
use crate::model::LangMode;

/// Explicit block markers for the delimited convention.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelimiterMarkers {
    pub scores_start: String,
    pub scores_end: String,
    pub notes_start: String,
    pub notes_end: String,
}

impl Default for DelimiterMarkers {
    fn default() -> Self {
        Self {
            scores_start: "SCORES_START".to_string(),
            scores_end: "SCORES_END".to_string(),
            notes_start: "NOTES_START".to_string(),
            notes_end: "NOTES_END".to_string(),
        }
    }
}

/// Punctuation trimmed from both ends of a header candidate.
const HEADER_PUNCTUATION: [char; 12] =
    [':', '：', '.', '。', '(', ')', '"', '«', '»', '-', '_', '،'];

/// Drop a leading list number such as `1.`, `2)` or `١-`.
fn strip_enumeration(line: &str) -> &str {
    let rest = line.trim_start_matches(|c: char| {
        c.is_ascii_digit() || ('\u{0660}'..='\u{0669}').contains(&c) || ('\u{06F0}'..='\u{06F9}').contains(&c)
    });
    if rest.len() == line.len() {
        return line;
    }
    match rest.strip_prefix(['.', ')', '-', '٫']) {
        Some(after) => after.trim_start(),
        None => line,
    }
}

/// Block marker recognized on a line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Delimiter {
    ScoresStart,
    ScoresEnd,
    NotesStart,
    NotesEnd,
}

/// Configuration of one output convention.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParseGrammar {
    /// Score label routed to the overall level instead of the score list.
    pub reserved_key: String,
    /// Note-section headers, in report order.
    pub sections: Vec<String>,
    /// Block markers; `None` selects the flat convention.
    pub delimiters: Option<DelimiterMarkers>,
    /// Overall level used when the model omits it.
    pub default_level: String,
    /// Label/value separator.
    pub separator: char,
}

impl Default for ParseGrammar {
    fn default() -> Self {
        Self::english()
    }
}

impl ParseGrammar {
    /// Flat Arabic convention.
    pub fn arabic() -> Self {
        Self {
            reserved_key: "التقييم العام".to_string(),
            sections: vec![
                "تحليل الأخطاء".to_string(),
                "مؤشرات الأداء".to_string(),
                "التوصيات".to_string(),
            ],
            delimiters: None,
            default_level: "متوسط".to_string(),
            separator: '|',
        }
    }

    /// Delimited English convention.
    pub fn english() -> Self {
        Self {
            reserved_key: "Overall Level".to_string(),
            sections: vec![
                "Error Analysis".to_string(),
                "Performance Overview".to_string(),
                "Recommendations".to_string(),
            ],
            delimiters: Some(DelimiterMarkers::default()),
            default_level: "Medium".to_string(),
            separator: '|',
        }
    }

    /// Preset for a language mode.
    pub fn for_mode(mode: LangMode) -> Self {
        match mode {
            LangMode::Arabic => Self::arabic(),
            LangMode::English => Self::english(),
        }
    }

    /// Load an integrator-supplied descriptor. Missing fields take the
    /// English defaults.
    pub fn from_json(json: &str) -> ReportResult<Self> {
        let grammar: Self = serde_json::from_str(json)?;
        grammar.validate()?;
        Ok(grammar)
    }

    /// Reject descriptors the parser cannot apply unambiguously.
    pub fn validate(&self) -> ReportResult<()> {
        if self.reserved_key.trim().is_empty() {
            return Err(ReportError::InvalidGrammar(
                "reserved key must not be empty".to_string(),
            ));
        }
        if self.sections.is_empty() {
            return Err(ReportError::InvalidGrammar(
                "at least one note section is required".to_string(),
            ));
        }
        if let Some(idx) = self.sections.iter().position(|s| s.trim().is_empty()) {
            return Err(ReportError::InvalidGrammar(format!(
                "note section {} has an empty header",
                idx
            )));
        }
        if self.separator.is_whitespace() {
            return Err(ReportError::InvalidGrammar(
                "separator must not be whitespace".to_string(),
            ));
        }
        if let Some(markers) = &self.delimiters {
            let all = [
                &markers.scores_start,
                &markers.scores_end,
                &markers.notes_start,
                &markers.notes_end,
            ];
            if all.iter().any(|m| m.trim().is_empty()) {
                return Err(ReportError::InvalidGrammar(
                    "delimiter markers must not be empty".to_string(),
                ));
            }
            for (i, a) in all.iter().enumerate() {
                if all[i + 1..].iter().any(|b| a.contains(b.as_str()) || b.contains(a.as_str())) {
                    return Err(ReportError::InvalidGrammar(format!(
                        "delimiter marker '{}' overlaps another marker",
                        a
                    )));
                }
            }
        }
        Ok(())
    }

    /// `true` when the delimited convention is active.
    pub fn is_delimited(&self) -> bool {
        self.delimiters.is_some()
    }

    /// Whether a score label names the overall level.
    pub fn is_reserved_key(&self, label: &str) -> bool {
        label
            .to_lowercase()
            .contains(&self.reserved_key.trim().to_lowercase())
    }

    /// Index of the section this normalized line is a header for.
    ///
    /// A leading enumeration (`1.`, `2)`, `١.`) and wrapping punctuation are
    /// ignored. A line equal to a header always matches; a line that merely
    /// contains one matches only when it was not written as a bullet
    /// (`bulleted` is the raw line's state, see [`is_bullet_line`]).
    ///
    /// [`is_bullet_line`]: crate::normalize::is_bullet_line
    pub fn match_section(&self, line: &str, bulleted: bool) -> Option<usize> {
        let candidate = strip_enumeration(line.trim())
            .trim_matches(|c: char| c.is_whitespace() || HEADER_PUNCTUATION.contains(&c))
            .to_lowercase();
        if candidate.is_empty() {
            return None;
        }
        let headers: Vec<String> = self
            .sections
            .iter()
            .map(|header| header.trim().to_lowercase())
            .collect();
        if let Some(idx) = headers.iter().position(|header| *header == candidate) {
            return Some(idx);
        }
        if bulleted {
            return None;
        }
        headers
            .iter()
            .position(|header| candidate.contains(header.as_str()))
    }

    /// Block marker carried by this normalized line, if any.
    pub fn match_delimiter(&self, line: &str) -> Option<Delimiter> {
        let markers = self.delimiters.as_ref()?;
        if line.contains(markers.scores_start.as_str()) {
            Some(Delimiter::ScoresStart)
        } else if line.contains(markers.scores_end.as_str()) {
            Some(Delimiter::ScoresEnd)
        } else if line.contains(markers.notes_start.as_str()) {
            Some(Delimiter::NotesStart)
        } else if line.contains(markers.notes_end.as_str()) {
            Some(Delimiter::NotesEnd)
        } else {
            None
        }
    }

    /// Split a line with exactly one separator into `(label, value)`.
    pub fn split_field<'a>(&self, line: &'a str) -> Option<(&'a str, &'a str)> {
        let mut parts = line.split(self.separator);
        let label = parts.next()?;
        let value = parts.next()?;
        if parts.next().is_some() {
            return None;
        }
        Some((label.trim(), value.trim()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_validate() {
        assert!(ParseGrammar::arabic().validate().is_ok());
        assert!(ParseGrammar::english().validate().is_ok());
        assert!(!ParseGrammar::arabic().is_delimited());
        assert!(ParseGrammar::english().is_delimited());
    }

    #[test]
    fn section_headers_match_case_insensitively_with_trailing_colon() {
        let grammar = ParseGrammar::english();
        assert_eq!(grammar.match_section("error analysis:", false), Some(0));
        assert_eq!(grammar.match_section("Recommendations", false), Some(2));
        assert_eq!(ParseGrammar::arabic().match_section("التوصيات:", false), Some(2));
    }

    #[test]
    fn numbered_and_suffixed_headers_match() {
        let en = ParseGrammar::english();
        assert_eq!(en.match_section("1. Error Analysis", false), Some(0));
        assert_eq!(en.match_section("2) Performance Overview:", false), Some(1));
        assert_eq!(en.match_section("Recommendations (for home)", false), Some(2));
        let ar = ParseGrammar::arabic();
        assert_eq!(ar.match_section("١. التوصيات", false), Some(2));
        assert_eq!(ar.match_section("التوصيات المقترحة", false), Some(2));
        assert_eq!(ar.match_section("«مؤشرات الأداء»", false), Some(1));
    }

    #[test]
    fn bullets_only_match_whole_headers() {
        let en = ParseGrammar::english();
        assert_eq!(en.match_section("Recommendations are to read daily", true), None);
        assert_eq!(en.match_section("Recommendations:", true), Some(2));
        assert_eq!(en.match_section("2024 was a good year", false), None);
    }

    #[test]
    fn split_field_requires_exactly_one_separator() {
        let grammar = ParseGrammar::english();
        assert_eq!(
            grammar.split_field(" Fluency | 42 wpm "),
            Some(("Fluency", "42 wpm"))
        );
        assert_eq!(grammar.split_field("a|b|c"), None);
        assert_eq!(grammar.split_field("no separator"), None);
        assert_eq!(grammar.split_field("|"), Some(("", "")));
    }

    #[test]
    fn reserved_key_matches_by_containment() {
        let grammar = ParseGrammar::english();
        assert!(grammar.is_reserved_key("Overall Level"));
        assert!(grammar.is_reserved_key("overall level (final)"));
        assert!(!grammar.is_reserved_key("Fluency"));
    }

    #[test]
    fn from_json_fills_defaults_and_validates() {
        let grammar =
            ParseGrammar::from_json(r#"{"reserved_key":"Level","delimiters":null}"#).unwrap();
        assert_eq!(grammar.reserved_key, "Level");
        assert!(!grammar.is_delimited());
        assert_eq!(grammar.sections.len(), 3);

        let err = ParseGrammar::from_json(r#"{"sections":[]}"#).unwrap_err();
        assert!(matches!(err, ReportError::InvalidGrammar(_)));

        let err = ParseGrammar::from_json("{not json").unwrap_err();
        assert!(matches!(err, ReportError::Json(_)));
    }

    #[test]
    fn overlapping_markers_are_rejected() {
        let mut grammar = ParseGrammar::english();
        if let Some(markers) = grammar.delimiters.as_mut() {
            markers.notes_end = "NOTES".to_string();
        }
        assert!(grammar.validate().is_err());
    }
}
