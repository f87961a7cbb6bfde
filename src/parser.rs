//! Single-pass record parser.
//!
//! The parser is total: any input yields a record, and lines it cannot place
//! are dropped. Model output is unreliable, so nothing here returns an error.

use crate::grammar::{Delimiter, ParseGrammar};
use crate::model::{AssessmentRecord, LangMode, NoteSection, ScoreEntry};
use crate::normalize::{is_bullet_line, normalize};

/// Parse raw model output with the preset grammar of `mode`.
pub fn parse(raw_text: &str, mode: LangMode) -> AssessmentRecord {
    RecordParser::for_mode(mode).parse(raw_text)
}

/// Parser bound to one grammar descriptor.
#[derive(Clone, Debug, Default)]
pub struct RecordParser {
    grammar: ParseGrammar,
}

impl RecordParser {
    pub fn new(grammar: ParseGrammar) -> Self {
        Self { grammar }
    }

    pub fn for_mode(mode: LangMode) -> Self {
        Self::new(ParseGrammar::for_mode(mode))
    }

    pub fn grammar(&self) -> &ParseGrammar {
        &self.grammar
    }

    /// Parse a complete answer.
    pub fn parse(&self, raw_text: &str) -> AssessmentRecord {
        let mut session = self.session();
        for line in raw_text.lines() {
            session.push_line(line);
        }
        session.finish()
    }

    /// Start a streaming session, e.g. for line-by-line model output.
    pub fn session(&self) -> ParseSession<'_> {
        ParseSession::new(&self.grammar)
    }
}

/// Where the next line may land.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Cursor {
    /// No block marker seen yet; scores and notes are both accepted.
    Unscoped,
    Scores,
    Notes,
    /// After an end marker; only the reserved key is honored.
    Closed,
}

impl Cursor {
    fn accepts_scores(self) -> bool {
        matches!(self, Self::Unscoped | Self::Scores)
    }

    fn accepts_notes(self) -> bool {
        matches!(self, Self::Unscoped | Self::Notes)
    }
}

/// Incremental parser state. Feed lines with [`push_line`](Self::push_line)
/// and collect the record with [`finish`](Self::finish).
#[derive(Clone, Debug)]
pub struct ParseSession<'g> {
    grammar: &'g ParseGrammar,
    cursor: Cursor,
    overall_level: Option<String>,
    scores: Vec<ScoreEntry>,
    sections: Vec<Vec<String>>,
    current_section: Option<usize>,
}

impl<'g> ParseSession<'g> {
    fn new(grammar: &'g ParseGrammar) -> Self {
        Self {
            grammar,
            cursor: Cursor::Unscoped,
            overall_level: None,
            scores: Vec::with_capacity(8),
            sections: vec![Vec::new(); grammar.sections.len()],
            current_section: None,
        }
    }

    /// Consume one raw line.
    pub fn push_line(&mut self, raw_line: &str) {
        let line = normalize(raw_line);
        if line.is_empty() {
            return;
        }

        if let Some(delimiter) = self.grammar.match_delimiter(&line) {
            self.enter(delimiter);
            return;
        }

        if let Some((label, value)) = self.grammar.split_field(&line) {
            if self.grammar.is_reserved_key(label) {
                if !value.is_empty() {
                    self.overall_level = Some(value.to_string());
                }
                return;
            }
            if self.cursor.accepts_scores() {
                if !label.is_empty() {
                    self.scores.push(ScoreEntry::new(label, value));
                }
                return;
            }
        }

        if self.cursor.accepts_notes() {
            if let Some(idx) = self.grammar.match_section(&line, is_bullet_line(raw_line)) {
                self.current_section = Some(idx);
                return;
            }
            if let Some(bullets) = self
                .current_section
                .and_then(|idx| self.sections.get_mut(idx))
            {
                bullets.push(line);
                return;
            }
        }

        log::trace!("dropping unplaced line ({:?}): {}", self.cursor, line);
    }

    fn enter(&mut self, delimiter: Delimiter) {
        self.cursor = match delimiter {
            Delimiter::ScoresStart => Cursor::Scores,
            Delimiter::NotesStart => Cursor::Notes,
            Delimiter::ScoresEnd | Delimiter::NotesEnd => Cursor::Closed,
        };
        self.current_section = None;
        log::trace!("delimiter {:?} -> cursor {:?}", delimiter, self.cursor);
    }

    /// Close the session and build the record.
    pub fn finish(self) -> AssessmentRecord {
        let notes = self
            .grammar
            .sections
            .iter()
            .zip(self.sections)
            .map(|(name, bullets)| NoteSection {
                name: name.clone(),
                bullets,
            })
            .collect();
        let level = self
            .overall_level
            .unwrap_or_else(|| self.grammar.default_level.clone());
        AssessmentRecord::new(level, self.scores, notes)
    }
}
