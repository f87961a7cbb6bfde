//! Render IR, text shaping and the paginated layout engine for
//! `reading-report`.
//!
//! ```
//! use reading_report::{parse, LangMode};
//! use reading_report_render::{LayoutConfig, LayoutEngine, ReportContext};
//!
//! let record = parse("Fluency|42 wpm\nOverall Level|High", LangMode::English);
//! let engine = LayoutEngine::new(LayoutConfig::default()).unwrap();
//! let pages = engine.render(&record, LangMode::English, &ReportContext::new("Sam", "2024-05-01"));
//! assert_eq!(pages.len(), 1);
//! ```

#![cfg_attr(
    not(test),
    deny(
        clippy::disallowed_methods,
        clippy::expect_used,
        clippy::unwrap_used,
        clippy::panic,
        clippy::panic_in_result_fn,
        clippy::todo,
        clippy::unimplemented
    )
)]

mod canvas;
mod error;
mod fonts;
mod measure;
mod render_ir;
mod render_layout;
mod shaping;
mod tier;
mod wrap;

pub use canvas::{replay_pages, PageCanvas};
pub use error::{LayoutError, LayoutResult, ShapeError};
pub use fonts::{FontFallbacks, FontId, ResolvedFonts};
pub use measure::{HeuristicMeasurer, TextMeasurer, TtfMeasurer, PT_TO_UNITS};
pub use render_ir::{
    CircleCommand, Color, DrawCommand, PageChromeConfig, RectCommand, RenderPage, TextAlign,
    TextCommand,
};
pub use render_layout::{
    badge_label, badge_label_size_pt, LayoutConfig, LayoutEngine, PageGeometry, Palette,
    ReportContext, ReportStrings,
};
pub use shaping::{shape, try_shape};
pub use tier::{KeywordTierClassifier, Tier, TierClassifier};
pub use wrap::{LineWrapper, WrappedLine};
