use std::sync::Arc;

use serde::{Deserialize, Serialize};

use reading_report::{AssessmentRecord, LangMode, ParseGrammar, ScoreEntry};

use crate::error::{LayoutError, LayoutResult};
use crate::fonts::{FontFallbacks, FontId, ResolvedFonts};
use crate::measure::{HeuristicMeasurer, TextMeasurer, PT_TO_UNITS};
use crate::render_ir::{
    CircleCommand, Color, DrawCommand, PageChromeConfig, RectCommand, RenderPage, TextAlign,
    TextCommand,
};
use crate::shaping::shape;
use crate::tier::{KeywordTierClassifier, Tier, TierClassifier};
use crate::wrap::{LineWrapper, WrappedLine};

/// Slack for accumulated float error when testing whether a box fits.
const FIT_EPSILON: f32 = 0.001;

/// Page size and margins in page units (millimetres).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PageGeometry {
    pub width: f32,
    pub height: f32,
    pub margin_left: f32,
    pub margin_right: f32,
    pub margin_top: f32,
    pub margin_bottom: f32,
}

impl PageGeometry {
    /// A4 portrait with the report's margins.
    pub const A4: Self = Self {
        width: 210.0,
        height: 297.0,
        margin_left: 10.0,
        margin_right: 10.0,
        margin_top: 10.0,
        margin_bottom: 27.0,
    };

    pub fn content_width(&self) -> f32 {
        self.width - self.margin_left - self.margin_right
    }

    /// Lowest y content may reach.
    pub fn content_bottom(&self) -> f32 {
        self.height - self.margin_bottom
    }

    pub fn content_height(&self) -> f32 {
        self.content_bottom() - self.margin_top
    }
}

impl Default for PageGeometry {
    fn default() -> Self {
        Self::A4
    }
}

/// Report colors.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Palette {
    /// Title, headings, frame and badge outline.
    pub primary: Color,
    /// Subtitle, table header band and note-row borders.
    pub accent: Color,
    pub body_text: Color,
    pub header_text: Color,
    pub info_header_fill: Color,
    pub grid: Color,
    pub row_fill: Color,
    pub row_alt_fill: Color,
    pub note_title_fill: Color,
    pub footer_text: Color,
    pub badge_high: Color,
    pub badge_medium: Color,
    pub badge_low: Color,
    pub badge_text: Color,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            primary: Color::rgb(101, 67, 33),
            accent: Color::rgb(184, 134, 11),
            body_text: Color::rgb(50, 50, 50),
            header_text: Color::WHITE,
            info_header_fill: Color::rgb(240, 240, 240),
            grid: Color::rgb(200, 200, 200),
            row_fill: Color::WHITE,
            row_alt_fill: Color::rgb(245, 245, 245),
            note_title_fill: Color::rgb(253, 245, 230),
            footer_text: Color::rgb(128, 128, 128),
            badge_high: Color::rgb(218, 165, 32),
            badge_medium: Color::rgb(192, 192, 192),
            badge_low: Color::rgb(205, 127, 50),
            badge_text: Color::WHITE,
        }
    }
}

impl Palette {
    pub fn badge_fill(&self, tier: Tier) -> Color {
        match tier {
            Tier::High => self.badge_high,
            Tier::Medium => self.badge_medium,
            Tier::Low => self.badge_low,
        }
    }
}

/// Layout configuration. Lengths are page units, text sizes are points.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LayoutConfig {
    pub geometry: PageGeometry,
    /// Frame and page-number footer.
    pub page_chrome: PageChromeConfig,
    pub palette: Palette,
    pub title_size_pt: f32,
    pub title_line_height: f32,
    pub subtitle_size_pt: f32,
    pub subtitle_line_height: f32,
    /// Space between the title band and the info block.
    pub title_gap: f32,
    pub info_cell_height: f32,
    pub info_date_width: f32,
    pub info_name_width: f32,
    pub info_size_pt: f32,
    /// Horizontal inset of left/right aligned cell text.
    pub cell_text_inset: f32,
    pub badge_radius: f32,
    pub badge_stroke_width: f32,
    pub badge_caption_height: f32,
    pub badge_caption_size_pt: f32,
    pub heading_size_pt: f32,
    pub heading_height: f32,
    pub reference_size_pt: f32,
    pub reference_line_height: f32,
    /// Space after each block.
    pub block_gap: f32,
    pub score_row_height: f32,
    pub score_value_width: f32,
    pub table_size_pt: f32,
    pub grid_stroke_width: f32,
    pub note_title_width: f32,
    pub note_padding: f32,
    pub note_line_height: f32,
    pub note_min_height: f32,
    pub note_size_pt: f32,
    pub note_title_size_pt: f32,
    pub note_row_gap: f32,
    pub note_stroke_width: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            geometry: PageGeometry::A4,
            page_chrome: PageChromeConfig::default(),
            palette: Palette::default(),
            title_size_pt: 18.0,
            title_line_height: 10.0,
            subtitle_size_pt: 14.0,
            subtitle_line_height: 8.0,
            title_gap: 6.0,
            info_cell_height: 10.0,
            info_date_width: 80.0,
            info_name_width: 70.0,
            info_size_pt: 12.0,
            cell_text_inset: 2.0,
            badge_radius: 10.0,
            badge_stroke_width: 0.5,
            badge_caption_height: 6.0,
            badge_caption_size_pt: 11.0,
            heading_size_pt: 14.0,
            heading_height: 10.0,
            reference_size_pt: 12.0,
            reference_line_height: 7.0,
            block_gap: 8.0,
            score_row_height: 10.0,
            score_value_width: 60.0,
            table_size_pt: 12.0,
            grid_stroke_width: 0.2,
            note_title_width: 45.0,
            note_padding: 5.0,
            note_line_height: 7.0,
            note_min_height: 20.0,
            note_size_pt: 11.0,
            note_title_size_pt: 13.0,
            note_row_gap: 3.0,
            note_stroke_width: 0.3,
        }
    }
}

impl LayoutConfig {
    /// Default configuration on a custom page.
    pub fn for_geometry(geometry: PageGeometry) -> Self {
        Self {
            geometry,
            ..Self::default()
        }
    }

    pub fn content_width(&self) -> f32 {
        self.geometry.content_width()
    }

    /// Width available to bullet text inside a note row.
    pub fn note_text_width(&self) -> f32 {
        self.content_width() - self.note_title_width - 2.0 * self.note_padding
    }

    /// Reject geometry that makes wrapping or pagination ill-defined.
    pub fn validate(&self) -> LayoutResult<()> {
        let g = &self.geometry;
        for (name, value) in [("page width", g.width), ("page height", g.height)] {
            if !(value.is_finite() && value > 0.0) {
                return Err(LayoutError::geometry(format!(
                    "{name} must be positive, got {value}"
                )));
            }
        }
        for (name, value) in [
            ("left margin", g.margin_left),
            ("right margin", g.margin_right),
            ("top margin", g.margin_top),
            ("bottom margin", g.margin_bottom),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(LayoutError::geometry(format!(
                    "{name} must be non-negative, got {value}"
                )));
            }
        }
        if g.content_width() <= 0.0 {
            return Err(LayoutError::geometry("margins leave no content width"));
        }
        if g.content_height() <= 0.0 {
            return Err(LayoutError::geometry("margins leave no content height"));
        }
        for (name, value) in [
            ("title line height", self.title_line_height),
            ("subtitle line height", self.subtitle_line_height),
            ("info cell height", self.info_cell_height),
            ("heading height", self.heading_height),
            ("reference line height", self.reference_line_height),
            ("score row height", self.score_row_height),
            ("note line height", self.note_line_height),
            ("badge radius", self.badge_radius),
            ("title size", self.title_size_pt),
            ("subtitle size", self.subtitle_size_pt),
            ("info size", self.info_size_pt),
            ("heading size", self.heading_size_pt),
            ("reference size", self.reference_size_pt),
            ("table size", self.table_size_pt),
            ("note size", self.note_size_pt),
            ("note title size", self.note_title_size_pt),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(LayoutError::geometry(format!(
                    "{name} must be positive, got {value}"
                )));
            }
        }
        if self.note_title_width <= 2.0 * self.note_padding {
            return Err(LayoutError::geometry(
                "note title column is narrower than its padding",
            ));
        }
        if self.note_text_width() <= 0.0 {
            return Err(LayoutError::geometry(
                "note columns leave no width for bullet text",
            ));
        }
        if self.score_value_width <= 0.0 || self.score_value_width >= self.content_width() {
            return Err(LayoutError::geometry(
                "score column must be narrower than the content width",
            ));
        }
        if self.info_date_width <= 0.0
            || self.info_name_width <= 0.0
            || self.info_date_width + self.info_name_width + 2.0 * self.badge_radius
                > self.content_width()
        {
            return Err(LayoutError::geometry(
                "info table and level badge do not fit the content width",
            ));
        }
        if self.note_line_height + 2.0 * self.note_padding > g.content_height() {
            return Err(LayoutError::geometry(
                "a single note line does not fit on a page",
            ));
        }
        Ok(())
    }
}

/// Fixed strings of one language mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReportStrings {
    pub title: &'static str,
    pub subtitle: &'static str,
    pub date_heading: &'static str,
    pub name_heading: &'static str,
    pub reference_heading: &'static str,
    pub scores_heading: &'static str,
    pub criterion_heading: &'static str,
    pub score_heading: &'static str,
    pub notes_heading: &'static str,
    pub badge_caption: &'static str,
    pub page_label: &'static str,
    pub bullet_prefix: &'static str,
    pub default_student_name: &'static str,
}

impl ReportStrings {
    pub const ARABIC: Self = Self {
        title: "تقرير تقييم القراءة",
        subtitle: "نظام التقييم الصوتي الذكي",
        date_heading: "تاريخ التقييم",
        name_heading: "اسم الطالب",
        reference_heading: "النص المقروء:",
        scores_heading: "نتائج التقييم:",
        criterion_heading: "المعيار",
        score_heading: "الدرجة",
        notes_heading: "الملاحظات:",
        badge_caption: "المستوى",
        page_label: "صفحة",
        bullet_prefix: "• ",
        default_student_name: "طالب",
    };

    pub const ENGLISH: Self = Self {
        title: "Reading Assessment Report",
        subtitle: "Smart Reading Assessment System",
        date_heading: "Date",
        name_heading: "Student Name",
        reference_heading: "Reference Text:",
        scores_heading: "Assessment Scores:",
        criterion_heading: "Criteria",
        score_heading: "Score",
        notes_heading: "Detailed Feedback:",
        badge_caption: "Level",
        page_label: "Page",
        bullet_prefix: "- ",
        default_student_name: "Student",
    };

    pub fn for_mode(mode: LangMode) -> Self {
        match mode {
            LangMode::Arabic => Self::ARABIC,
            LangMode::English => Self::ENGLISH,
        }
    }

    /// Footer text for a 1-based page number.
    pub fn page_footer(&self, page_number: usize) -> String {
        format!("{} {}", self.page_label, page_number)
    }
}

/// Caller-supplied values printed in the report header.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportContext {
    /// Falls back to the mode's default name when blank.
    pub student_name: String,
    pub assessment_date: String,
    /// Text the student read aloud; the reference block is omitted when blank.
    pub reference_text: String,
    /// Badge label when the overall level sanitizes to nothing. `None` uses
    /// the mode preset's default level.
    #[serde(default)]
    pub default_level: Option<String>,
}

impl ReportContext {
    pub fn new(student_name: impl Into<String>, assessment_date: impl Into<String>) -> Self {
        Self {
            student_name: student_name.into(),
            assessment_date: assessment_date.into(),
            reference_text: String::new(),
            default_level: None,
        }
    }

    pub fn with_reference(mut self, reference_text: impl Into<String>) -> Self {
        self.reference_text = reference_text.into();
        self
    }

    /// Use the default level of the grammar the record was parsed with.
    pub fn with_default_level(mut self, level: impl Into<String>) -> Self {
        self.default_level = Some(level.into());
        self
    }

    fn fallback_level(&self, mode: LangMode) -> String {
        match self.default_level.as_deref().map(str::trim) {
            Some(level) if !level.is_empty() => level.to_string(),
            _ => ParseGrammar::for_mode(mode).default_level,
        }
    }
}

/// Badge text: `%` and `|` removed, `fallback` when nothing is left.
pub fn badge_label(overall_level: &str, fallback: &str) -> String {
    let cleaned: String = overall_level
        .chars()
        .filter(|c| !matches!(c, '%' | '|'))
        .collect();
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        fallback.to_string()
    } else {
        cleaned.to_string()
    }
}

/// Badge text size, stepped down so longer labels stay inside the circle.
pub fn badge_label_size_pt(label: &str) -> f32 {
    match label.chars().count() {
        n if n > 7 => 10.0,
        n if n > 5 => 12.0,
        _ => 14.0,
    }
}

/// Deterministic layout engine that turns assessment records into pages.
#[derive(Clone)]
pub struct LayoutEngine {
    cfg: LayoutConfig,
    measurer: Arc<dyn TextMeasurer>,
    classifier: Arc<dyn TierClassifier>,
    fallbacks: FontFallbacks,
    arabic_fonts: ResolvedFonts,
    english_fonts: ResolvedFonts,
}

impl core::fmt::Debug for LayoutEngine {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("LayoutEngine")
            .field("cfg", &self.cfg)
            .field("arabic_fonts", &self.arabic_fonts)
            .field("english_fonts", &self.english_fonts)
            .finish_non_exhaustive()
    }
}

impl LayoutEngine {
    /// Create an engine with heuristic metrics and the default tier keywords.
    ///
    /// Fails when `cfg` does not pass [`LayoutConfig::validate`].
    pub fn new(cfg: LayoutConfig) -> LayoutResult<Self> {
        cfg.validate()?;
        let measurer: Arc<dyn TextMeasurer> = Arc::new(HeuristicMeasurer);
        let fallbacks = FontFallbacks::default();
        let (arabic_fonts, english_fonts) = resolve_fonts(&fallbacks, measurer.as_ref());
        Ok(Self {
            cfg,
            measurer,
            classifier: Arc::new(KeywordTierClassifier::default()),
            fallbacks,
            arabic_fonts,
            english_fonts,
        })
    }

    /// Install a shared text measurer and re-resolve font fallbacks against it.
    pub fn with_text_measurer(mut self, measurer: Arc<dyn TextMeasurer>) -> Self {
        self.measurer = measurer;
        self.refresh_fonts();
        self
    }

    pub fn with_fallbacks(mut self, fallbacks: FontFallbacks) -> Self {
        self.fallbacks = fallbacks;
        self.refresh_fonts();
        self
    }

    /// Replace badge tier classification.
    pub fn with_classifier<C>(mut self, classifier: C) -> Self
    where
        C: TierClassifier + 'static,
    {
        self.classifier = Arc::new(classifier);
        self
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.cfg
    }

    /// Faces used for `mode` after fallback resolution.
    pub fn fonts(&self, mode: LangMode) -> ResolvedFonts {
        match mode {
            LangMode::Arabic => self.arabic_fonts,
            LangMode::English => self.english_fonts,
        }
    }

    fn refresh_fonts(&mut self) {
        let (arabic, english) = resolve_fonts(&self.fallbacks, self.measurer.as_ref());
        self.arabic_fonts = arabic;
        self.english_fonts = english;
    }

    /// Lay out one report. Never fails on record content.
    pub fn render(
        &self,
        record: &AssessmentRecord,
        mode: LangMode,
        ctx: &ReportContext,
    ) -> Vec<RenderPage> {
        let mut pass = ReportPass::new(self, mode, ctx);
        pass.title_band();
        pass.info_block(record);
        pass.reference_block();
        pass.scores_table(record.scores());
        pass.notes(record);
        let mut pages = pass.st.into_pages();
        annotate_page_chrome(&mut pages, self, mode);
        log::debug!(
            "rendered {} report: {} scores, {} note sections, {} pages",
            mode.tag(),
            record.scores().len(),
            record.notes().len(),
            pages.len()
        );
        pages
    }
}

fn resolve_fonts(
    fallbacks: &FontFallbacks,
    measurer: &dyn TextMeasurer,
) -> (ResolvedFonts, ResolvedFonts) {
    let available = |font: FontId| measurer.has_font(font);
    (
        ResolvedFonts::resolve(fallbacks, LangMode::Arabic, available),
        ResolvedFonts::resolve(fallbacks, LangMode::English, available),
    )
}

/// Vertical baseline of text centered in a box.
fn baseline(top: f32, height: f32, size_pt: f32) -> f32 {
    top + height / 2.0 + size_pt * PT_TO_UNITS * 0.35
}

fn aligned_x(box_x: f32, box_w: f32, width: f32, align: TextAlign, inset: f32) -> f32 {
    match align {
        TextAlign::Left => box_x + inset,
        TextAlign::Center => box_x + (box_w - width) / 2.0,
        TextAlign::Right => box_x + box_w - inset - width,
    }
}

/// Pagination state for one render call.
struct LayoutState {
    top: f32,
    bottom: f32,
    page_no: usize,
    cursor_y: f32,
    page: RenderPage,
    emitted: Vec<RenderPage>,
}

impl LayoutState {
    fn new(geometry: &PageGeometry) -> Self {
        Self {
            top: geometry.margin_top,
            bottom: geometry.content_bottom(),
            page_no: 1,
            cursor_y: geometry.margin_top,
            page: RenderPage::new(1),
            emitted: Vec::with_capacity(2),
        }
    }

    fn capacity(&self) -> f32 {
        self.bottom - self.top
    }

    fn remaining(&self) -> f32 {
        self.bottom - self.cursor_y
    }

    fn fits(&self, height: f32) -> bool {
        self.cursor_y + height <= self.bottom + FIT_EPSILON
    }

    fn is_fresh_page(&self) -> bool {
        self.page.is_content_empty()
    }

    /// Break to a new page unless `height` fits below the cursor. A fresh
    /// page never breaks; oversized content overflows it instead.
    fn ensure_space(&mut self, height: f32) {
        if !self.fits(height) && !self.is_fresh_page() {
            self.start_next_page();
        }
    }

    fn start_next_page(&mut self) {
        log::debug!(
            "page {} full at y={:.1}, starting page {}",
            self.page_no,
            self.cursor_y,
            self.page_no + 1
        );
        self.flush_page();
        self.page_no += 1;
        self.cursor_y = self.top;
    }

    fn flush_page(&mut self) {
        let page = core::mem::replace(&mut self.page, RenderPage::new(self.page_no + 1));
        self.emitted.push(page);
    }

    fn push(&mut self, cmd: DrawCommand) {
        self.page.push_content_command(cmd);
    }

    fn into_pages(mut self) -> Vec<RenderPage> {
        self.flush_page();
        self.emitted
    }
}

/// One bullet's wrapped lines; never split across pages.
type BulletLines = Vec<WrappedLine>;

struct ReportPass<'a> {
    cfg: &'a LayoutConfig,
    measurer: &'a dyn TextMeasurer,
    classifier: &'a dyn TierClassifier,
    ctx: &'a ReportContext,
    mode: LangMode,
    rtl: bool,
    fonts: ResolvedFonts,
    strings: ReportStrings,
    st: LayoutState,
}

impl<'a> ReportPass<'a> {
    fn new(engine: &'a LayoutEngine, mode: LangMode, ctx: &'a ReportContext) -> Self {
        Self {
            cfg: &engine.cfg,
            measurer: engine.measurer.as_ref(),
            classifier: engine.classifier.as_ref(),
            ctx,
            mode,
            rtl: mode.is_rtl(),
            fonts: engine.fonts(mode),
            strings: ReportStrings::for_mode(mode),
            st: LayoutState::new(&engine.cfg.geometry),
        }
    }

    fn leading_align(&self) -> TextAlign {
        if self.rtl {
            TextAlign::Right
        } else {
            TextAlign::Left
        }
    }

    fn wrapper(&self) -> LineWrapper<'a> {
        LineWrapper::new(self.measurer)
    }

    fn rect(&self, x: f32, y: f32, width: f32, height: f32, color: Color, stroke: f32) -> RectCommand {
        RectCommand {
            x,
            y,
            width,
            height,
            color,
            stroke_width: stroke,
        }
    }

    fn fill(&mut self, x: f32, y: f32, width: f32, height: f32, color: Color) {
        let rect = self.rect(x, y, width, height, color, 0.0);
        self.st.push(DrawCommand::FillRect(rect));
    }

    fn stroke(&mut self, x: f32, y: f32, width: f32, height: f32, color: Color, stroke: f32) {
        let rect = self.rect(x, y, width, height, color, stroke);
        self.st.push(DrawCommand::StrokeRect(rect));
    }

    /// Shape, measure and place logical `text` inside a horizontal box.
    #[allow(clippy::too_many_arguments)]
    fn text(
        &mut self,
        text: &str,
        font: FontId,
        size_pt: f32,
        color: Color,
        box_x: f32,
        box_w: f32,
        align: TextAlign,
        baseline_y: f32,
    ) {
        let display = shape(text, self.rtl);
        let width = self.measurer.measure_text(&display, font, size_pt);
        self.placed_text(display, width, font, size_pt, color, box_x, box_w, align, baseline_y);
    }

    #[allow(clippy::too_many_arguments)]
    fn placed_text(
        &mut self,
        display: String,
        width: f32,
        font: FontId,
        size_pt: f32,
        color: Color,
        box_x: f32,
        box_w: f32,
        align: TextAlign,
        baseline_y: f32,
    ) {
        if display.is_empty() {
            return;
        }
        let x = aligned_x(box_x, box_w, width, align, self.cfg.cell_text_inset);
        self.st.push(DrawCommand::Text(TextCommand {
            x,
            baseline_y,
            width,
            text: display,
            align,
            font,
            size_pt,
            color,
        }));
    }

    fn title_band(&mut self) {
        let cfg = self.cfg;
        let x = cfg.geometry.margin_left;
        let w = cfg.content_width();

        let top = self.st.cursor_y;
        self.text(
            self.strings.title,
            self.fonts.bold,
            cfg.title_size_pt,
            cfg.palette.primary,
            x,
            w,
            TextAlign::Center,
            baseline(top, cfg.title_line_height, cfg.title_size_pt),
        );
        let top = top + cfg.title_line_height;
        self.text(
            self.strings.subtitle,
            self.fonts.bold,
            cfg.subtitle_size_pt,
            cfg.palette.accent,
            x,
            w,
            TextAlign::Center,
            baseline(top, cfg.subtitle_line_height, cfg.subtitle_size_pt),
        );
        self.st.cursor_y = top + cfg.subtitle_line_height + cfg.title_gap;
    }

    /// Info table (date, name) on the leading side, level badge on the
    /// trailing side.
    fn info_block(&mut self, record: &AssessmentRecord) {
        let cfg = self.cfg;
        let table_w = cfg.info_date_width + cfg.info_name_width;
        let left = cfg.geometry.margin_left;
        let cw = cfg.content_width();
        let (table_x, badge_cx) = if self.rtl {
            (left + cw - table_w, left + cfg.badge_radius)
        } else {
            (left, left + cw - cfg.badge_radius)
        };

        let block_h = (2.0 * cfg.info_cell_height)
            .max(cfg.badge_caption_height + 2.0 * cfg.badge_radius);
        self.st.ensure_space(block_h);
        let top = self.st.cursor_y;

        let name = if self.ctx.student_name.trim().is_empty() {
            self.strings.default_student_name
        } else {
            self.ctx.student_name.trim()
        };
        let cells = [
            (self.strings.date_heading, self.ctx.assessment_date.trim(), cfg.info_date_width),
            (self.strings.name_heading, name, cfg.info_name_width),
        ];
        let mut x = table_x;
        let value_top = top + cfg.info_cell_height;
        for (heading, value, width) in cells {
            self.fill(x, top, width, cfg.info_cell_height, cfg.palette.info_header_fill);
            self.stroke(x, top, width, cfg.info_cell_height, cfg.palette.grid, cfg.grid_stroke_width);
            self.text(
                heading,
                self.fonts.bold,
                cfg.info_size_pt,
                cfg.palette.primary,
                x,
                width,
                TextAlign::Center,
                baseline(top, cfg.info_cell_height, cfg.info_size_pt),
            );
            self.stroke(
                x,
                value_top,
                width,
                cfg.info_cell_height,
                cfg.palette.grid,
                cfg.grid_stroke_width,
            );
            self.text(
                value,
                self.fonts.regular,
                cfg.info_size_pt,
                cfg.palette.body_text,
                x,
                width,
                TextAlign::Center,
                baseline(value_top, cfg.info_cell_height, cfg.info_size_pt),
            );
            x += width;
        }

        self.badge(record, badge_cx, top);
        self.st.cursor_y = top + block_h + cfg.block_gap;
    }

    fn badge(&mut self, record: &AssessmentRecord, cx: f32, top: f32) {
        let cfg = self.cfg;
        let r = cfg.badge_radius;
        self.text(
            self.strings.badge_caption,
            self.fonts.bold,
            cfg.badge_caption_size_pt,
            cfg.palette.primary,
            cx - r,
            2.0 * r,
            TextAlign::Center,
            baseline(top, cfg.badge_caption_height, cfg.badge_caption_size_pt),
        );

        let label = badge_label(record.overall_level(), &self.ctx.fallback_level(self.mode));
        let tier = self.classifier.classify(&label);
        let cy = top + cfg.badge_caption_height + r;
        self.st.push(DrawCommand::Circle(CircleCommand {
            cx,
            cy,
            radius: r,
            fill: cfg.palette.badge_fill(tier),
            stroke: Some(cfg.palette.primary),
            stroke_width: cfg.badge_stroke_width,
        }));
        let size_pt = badge_label_size_pt(&label);
        self.text(
            &label,
            self.fonts.bold,
            size_pt,
            cfg.palette.badge_text,
            cx - r,
            2.0 * r,
            TextAlign::Center,
            cy + size_pt * PT_TO_UNITS * 0.35,
        );
    }

    fn heading(&mut self, text: &str) {
        let cfg = self.cfg;
        let top = self.st.cursor_y;
        self.text(
            text,
            self.fonts.bold,
            cfg.heading_size_pt,
            cfg.palette.primary,
            cfg.geometry.margin_left,
            cfg.content_width(),
            self.leading_align(),
            baseline(top, cfg.heading_height, cfg.heading_size_pt),
        );
        self.st.cursor_y = top + cfg.heading_height;
    }

    fn reference_block(&mut self) {
        let cfg = self.cfg;
        let reference = self.ctx.reference_text.trim();
        if reference.is_empty() {
            return;
        }
        let wrapper = self.wrapper();
        let lines: Vec<WrappedLine> = reference
            .lines()
            .flat_map(|paragraph| {
                wrapper.wrap_measured(
                    paragraph,
                    cfg.content_width(),
                    self.fonts.regular,
                    cfg.reference_size_pt,
                    self.rtl,
                )
            })
            .collect();

        self.st
            .ensure_space(cfg.heading_height + cfg.reference_line_height);
        self.heading(self.strings.reference_heading);
        for line in lines {
            self.st.ensure_space(cfg.reference_line_height);
            let top = self.st.cursor_y;
            self.placed_text(
                line.display,
                line.width,
                self.fonts.regular,
                cfg.reference_size_pt,
                cfg.palette.body_text,
                cfg.geometry.margin_left,
                cfg.content_width(),
                self.leading_align(),
                baseline(top, cfg.reference_line_height, cfg.reference_size_pt),
            );
            self.st.cursor_y = top + cfg.reference_line_height;
        }
        self.st.cursor_y += cfg.block_gap;
    }

    /// `(x, width)` of the criterion and score columns.
    fn score_columns(&self) -> ((f32, f32), (f32, f32)) {
        let cfg = self.cfg;
        let left = cfg.geometry.margin_left;
        let criterion_w = cfg.content_width() - cfg.score_value_width;
        if self.rtl {
            (
                (left + cfg.score_value_width, criterion_w),
                (left, cfg.score_value_width),
            )
        } else {
            ((left, criterion_w), (left + criterion_w, cfg.score_value_width))
        }
    }

    fn score_header_row(&mut self) {
        let cfg = self.cfg;
        let top = self.st.cursor_y;
        let h = cfg.score_row_height;
        let ((cx, cw), (sx, sw)) = self.score_columns();
        let base = baseline(top, h, cfg.table_size_pt);
        self.fill(cfg.geometry.margin_left, top, cfg.content_width(), h, cfg.palette.accent);
        self.text(
            self.strings.criterion_heading,
            self.fonts.bold,
            cfg.table_size_pt,
            cfg.palette.header_text,
            cx,
            cw,
            self.leading_align(),
            base,
        );
        self.text(
            self.strings.score_heading,
            self.fonts.bold,
            cfg.table_size_pt,
            cfg.palette.header_text,
            sx,
            sw,
            TextAlign::Center,
            base,
        );
        self.st.cursor_y = top + h;
    }

    fn scores_table(&mut self, scores: &[ScoreEntry]) {
        if scores.is_empty() {
            return;
        }
        let cfg = self.cfg;
        let h = cfg.score_row_height;
        self.st.ensure_space(cfg.heading_height + 2.0 * h);
        self.heading(self.strings.scores_heading);
        self.score_header_row();

        let ((cx, cw), (sx, sw)) = self.score_columns();
        for (idx, entry) in scores.iter().enumerate() {
            if !self.st.fits(h) {
                self.st.start_next_page();
                self.score_header_row();
            }
            let top = self.st.cursor_y;
            let fill = if idx % 2 == 0 {
                cfg.palette.row_alt_fill
            } else {
                cfg.palette.row_fill
            };
            self.fill(cfg.geometry.margin_left, top, cfg.content_width(), h, fill);
            self.stroke(cx, top, cw, h, cfg.palette.grid, cfg.grid_stroke_width);
            self.stroke(sx, top, sw, h, cfg.palette.grid, cfg.grid_stroke_width);
            let base = baseline(top, h, cfg.table_size_pt);
            self.text(
                &entry.label,
                self.fonts.regular,
                cfg.table_size_pt,
                cfg.palette.body_text,
                cx,
                cw,
                self.leading_align(),
                base,
            );
            self.text(
                &entry.value,
                self.fonts.bold,
                cfg.table_size_pt,
                cfg.palette.body_text,
                sx,
                sw,
                TextAlign::Center,
                base,
            );
            self.st.cursor_y = top + h;
        }
        self.st.cursor_y += cfg.block_gap;
    }

    fn note_row_height(&self, content_lines: usize, title_lines: usize) -> f32 {
        let cfg = self.cfg;
        let lines = content_lines.max(title_lines) as f32;
        (lines * cfg.note_line_height + 2.0 * cfg.note_padding).max(cfg.note_min_height)
    }

    fn wrap_bullets(&self, bullets: &[String]) -> Vec<BulletLines> {
        let cfg = self.cfg;
        let wrapper = self.wrapper();
        bullets
            .iter()
            .map(|bullet| {
                let text = format!("{}{}", self.strings.bullet_prefix, bullet);
                wrapper.wrap_measured(
                    &text,
                    cfg.note_text_width(),
                    self.fonts.regular,
                    cfg.note_size_pt,
                    self.rtl,
                )
            })
            .filter(|lines| !lines.is_empty())
            .collect()
    }

    fn notes(&mut self, record: &AssessmentRecord) {
        let cfg = self.cfg;
        let sections: Vec<(Vec<WrappedLine>, Vec<BulletLines>)> = record
            .notes()
            .iter()
            .map(|section| {
                let title = self.wrapper().wrap_measured(
                    &section.name,
                    cfg.note_title_width - 2.0 * cfg.note_padding,
                    self.fonts.bold,
                    cfg.note_title_size_pt,
                    self.rtl,
                );
                (title, self.wrap_bullets(&section.bullets))
            })
            .filter(|(_, bullets)| !bullets.is_empty())
            .collect();
        let Some((first_title, first_bullets)) = sections.first() else {
            return;
        };

        // Keep the heading with the first row, or with its first bullet when
        // the row is tall enough to be split anyway.
        let first_lines: usize = first_bullets.iter().map(Vec::len).sum();
        let mut lead = self.note_row_height(first_lines, first_title.len());
        if lead > self.st.capacity() + FIT_EPSILON {
            let first_bullet = first_bullets.first().map_or(0, Vec::len);
            lead = self.note_row_height(first_bullet, first_title.len());
        }
        self.st.ensure_space(cfg.heading_height + lead);
        self.heading(self.strings.notes_heading);

        for (title, bullets) in &sections {
            self.note_row(title, bullets);
        }
    }

    /// Place one note row. Rows that fit on a page are atomic; taller rows
    /// are split between bullets with the title repeated.
    fn note_row(&mut self, title: &[WrappedLine], bullets: &[BulletLines]) {
        let total_lines: usize = bullets.iter().map(Vec::len).sum();
        let row_h = self.note_row_height(total_lines, title.len());
        if row_h <= self.st.capacity() + FIT_EPSILON {
            self.st.ensure_space(row_h);
            self.draw_note_row(title, bullets, row_h);
            return;
        }

        log::debug!(
            "note row of {:.1} exceeds page capacity {:.1}, splitting between bullets",
            row_h,
            self.st.capacity()
        );
        let mut start = 0;
        while start < bullets.len() {
            let available = self.st.remaining();
            let mut end = start;
            let mut lines = 0;
            while end < bullets.len() {
                let next = lines + bullets[end].len();
                if self.note_row_height(next, title.len()) > available + FIT_EPSILON {
                    break;
                }
                lines = next;
                end += 1;
            }
            if end == start {
                if !self.st.is_fresh_page() {
                    self.st.start_next_page();
                    continue;
                }
                lines = bullets[start].len();
                end = start + 1;
            }
            let h = self.note_row_height(lines, title.len());
            self.draw_note_row(title, &bullets[start..end], h);
            start = end;
            if start < bullets.len() {
                self.st.start_next_page();
            }
        }
    }

    fn draw_note_row(&mut self, title: &[WrappedLine], bullets: &[BulletLines], row_h: f32) {
        let cfg = self.cfg;
        let left = cfg.geometry.margin_left;
        let title_w = cfg.note_title_width;
        let content_w = cfg.content_width() - title_w;
        let (title_x, content_x) = if self.rtl {
            (left + content_w, left)
        } else {
            (left, left + title_w)
        };
        let top = self.st.cursor_y;
        let pad = cfg.note_padding;
        let lh = cfg.note_line_height;

        self.fill(title_x, top, title_w, row_h, cfg.palette.note_title_fill);
        self.stroke(title_x, top, title_w, row_h, cfg.palette.accent, cfg.note_stroke_width);
        self.stroke(content_x, top, content_w, row_h, cfg.palette.accent, cfg.note_stroke_width);

        let title_top = top + (row_h - title.len() as f32 * lh) / 2.0;
        for (idx, line) in title.iter().enumerate() {
            self.placed_text(
                line.display.clone(),
                line.width,
                self.fonts.bold,
                cfg.note_title_size_pt,
                cfg.palette.primary,
                title_x,
                title_w,
                TextAlign::Center,
                baseline(title_top + idx as f32 * lh, lh, cfg.note_title_size_pt),
            );
        }

        let align = self.leading_align();
        for (idx, line) in bullets.iter().flatten().enumerate() {
            let line_top = top + pad + idx as f32 * lh;
            self.placed_text(
                line.display.clone(),
                line.width,
                self.fonts.regular,
                cfg.note_size_pt,
                cfg.palette.body_text,
                content_x + pad,
                content_w - 2.0 * pad,
                align,
                baseline(line_top, lh, cfg.note_size_pt),
            );
        }
        self.st.cursor_y = top + row_h + cfg.note_row_gap;
    }
}

/// Frame and page-number footer on every page, in the chrome layer.
fn annotate_page_chrome(pages: &mut [RenderPage], engine: &LayoutEngine, mode: LangMode) {
    let cfg = &engine.cfg;
    let chrome = cfg.page_chrome;
    let g = &cfg.geometry;
    let strings = ReportStrings::for_mode(mode);
    let font = engine.fonts(mode).regular;
    for page in pages.iter_mut() {
        if chrome.frame_enabled {
            page.push_chrome_command(DrawCommand::StrokeRect(RectCommand {
                x: chrome.frame_inset,
                y: chrome.frame_inset,
                width: g.width - 2.0 * chrome.frame_inset,
                height: g.height - 2.0 * chrome.frame_inset,
                color: cfg.palette.primary,
                stroke_width: chrome.frame_stroke_width,
            }));
        }
        if chrome.footer_enabled {
            let display = shape(&strings.page_footer(page.page_number), mode.is_rtl());
            let width = engine
                .measurer
                .measure_text(&display, font, chrome.footer_size_pt);
            page.push_chrome_command(DrawCommand::Text(TextCommand {
                x: aligned_x(0.0, g.width, width, TextAlign::Center, 0.0),
                baseline_y: g.height - chrome.footer_baseline_from_bottom,
                width,
                text: display,
                align: TextAlign::Center,
                font,
                size_pt: chrome.footer_size_pt,
                color: cfg.palette.footer_text,
            }));
        }
    }
}
