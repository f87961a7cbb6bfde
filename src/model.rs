//! Assessment record data model.

use serde::{Deserialize, Serialize};

/// Report language. Selects writing direction, grammar preset, fonts and
/// column mirroring.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LangMode {
    /// Right-to-left Arabic report with flat `label|value` model output.
    Arabic,
    /// Left-to-right English report with delimited model output.
    English,
}

impl LangMode {
    /// Writing direction of this mode.
    pub fn direction(self) -> WritingDirection {
        match self {
            Self::Arabic => WritingDirection::RightToLeft,
            Self::English => WritingDirection::LeftToRight,
        }
    }

    /// `true` for right-to-left modes.
    pub fn is_rtl(self) -> bool {
        self.direction() == WritingDirection::RightToLeft
    }

    /// Short language tag (`ar` / `en`).
    pub fn tag(self) -> &'static str {
        match self {
            Self::Arabic => "ar",
            Self::English => "en",
        }
    }

    /// Parse a language tag such as `ar`, `en-US` or `arabic`.
    pub fn from_tag(tag: &str) -> Option<Self> {
        let lower = tag.trim().to_ascii_lowercase();
        if lower.starts_with("ar") {
            Some(Self::Arabic)
        } else if lower.starts_with("en") {
            Some(Self::English)
        } else {
            None
        }
    }
}

/// Horizontal writing direction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WritingDirection {
    LeftToRight,
    RightToLeft,
}

/// One `(criterion, value)` score row.
///
/// Values stay opaque strings: the model may answer `__/25` literally.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreEntry {
    pub label: String,
    pub value: String,
}

impl ScoreEntry {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }
}

/// Bullets collected under one configured note-section header.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteSection {
    /// Section header as configured in the grammar.
    pub name: String,
    /// Bullet lines in order of appearance.
    pub bullets: Vec<String>,
}

/// Structured extraction from one raw model answer.
///
/// Built once by the parser and never mutated afterwards.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssessmentRecord {
    overall_level: String,
    scores: Vec<ScoreEntry>,
    notes: Vec<NoteSection>,
}

impl AssessmentRecord {
    /// Assemble a record. Empty note sections are dropped.
    pub fn new(
        overall_level: impl Into<String>,
        scores: Vec<ScoreEntry>,
        notes: Vec<NoteSection>,
    ) -> Self {
        let notes = notes
            .into_iter()
            .filter(|section| !section.bullets.is_empty())
            .collect();
        Self {
            overall_level: overall_level.into(),
            scores,
            notes,
        }
    }

    /// Overall classification label, raw as the model wrote it.
    pub fn overall_level(&self) -> &str {
        &self.overall_level
    }

    /// Score rows in order of first appearance.
    pub fn scores(&self) -> &[ScoreEntry] {
        &self.scores
    }

    /// Non-empty note sections in grammar order.
    pub fn notes(&self) -> &[NoteSection] {
        &self.notes
    }

    /// Bullets of the named section, if it has any.
    pub fn note(&self, name: &str) -> Option<&[String]> {
        self.notes
            .iter()
            .find(|section| section.name == name)
            .map(|section| section.bullets.as_slice())
    }

    /// `true` when neither scores nor notes were recovered.
    pub fn is_empty(&self) -> bool {
        self.scores.is_empty() && self.notes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lang_mode_maps_direction_and_tags() {
        assert!(LangMode::Arabic.is_rtl());
        assert!(!LangMode::English.is_rtl());
        assert_eq!(LangMode::from_tag("en-US"), Some(LangMode::English));
        assert_eq!(LangMode::from_tag("AR"), Some(LangMode::Arabic));
        assert_eq!(LangMode::from_tag("fr"), None);
    }

    #[test]
    fn record_drops_empty_sections() {
        let record = AssessmentRecord::new(
            "High",
            vec![ScoreEntry::new("Fluency", "42 wpm")],
            vec![
                NoteSection {
                    name: "Error Analysis".to_string(),
                    bullets: vec!["missed 'the'".to_string()],
                },
                NoteSection {
                    name: "Recommendations".to_string(),
                    bullets: Vec::new(),
                },
            ],
        );
        assert_eq!(record.notes().len(), 1);
        assert!(record.note("Recommendations").is_none());
        assert!(!record.is_empty());
    }
}
