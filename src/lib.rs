//! Structured record extraction for model-written reading assessments.
//!
//! A generative model grades a recorded reading and answers in loosely
//! formatted text: `label|value` score lines, one overall-level line, and
//! a few headed bullet sections. This crate turns that text into an
//! immutable [`AssessmentRecord`] without ever failing on malformed input.
//!
//! Layout and drawing live in `reading-report-render`.
//!
//! # Usage
//!
//! ```rust
//! use reading_report::{parse, LangMode};
//!
//! let raw = "Fluency|42 wpm\nOverall Level|High\nNOTES_START\n# Error Analysis\n- mispronounced 'the'\nNOTES_END";
//! let record = parse(raw, LangMode::English);
//!
//! assert_eq!(record.overall_level(), "High");
//! assert_eq!(record.scores()[0].label, "Fluency");
//! assert_eq!(record.note("Error Analysis"), Some(&["mispronounced 'the'".to_string()][..]));
//! ```

#![cfg_attr(
    not(test),
    deny(
        clippy::expect_used,
        clippy::unwrap_used,
        clippy::panic,
        clippy::todo,
        clippy::unimplemented
    )
)]

pub mod error;
pub mod grammar;
pub mod model;
pub mod normalize;
pub mod parser;

pub use error::ReportError;
pub use grammar::{DelimiterMarkers, ParseGrammar};
pub use model::{AssessmentRecord, LangMode, NoteSection, ScoreEntry, WritingDirection};
pub use normalize::{is_bullet_line, normalize};
pub use parser::{parse, ParseSession, RecordParser};
