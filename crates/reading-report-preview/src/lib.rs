//! Developer preview backend for `reading-report-render`.
//!
//! Pages are written either as one SVG document per page or as a JSON dump
//! of the draw commands. Neither is a production document encoder.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use quick_xml::escape::escape;
use serde::Serialize;
use thiserror::Error;

use reading_report::{LangMode, ReportError};
use reading_report_render::{
    replay_pages, CircleCommand, Color, FontId, LayoutError, PageCanvas, PageGeometry,
    RectCommand, RenderPage, TextCommand, TtfMeasurer, PT_TO_UNITS,
};

#[derive(Debug, Error)]
pub enum PreviewError {
    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Layout(#[from] LayoutError),
    #[error(transparent)]
    Grammar(#[from] ReportError),
    #[error("invalid font spec '{0}', expected FACE=PATH with FACE one of naskh, naskh-bold, sans, sans-bold")]
    FontSpec(String),
    #[error("svg formatting failed")]
    Format(#[from] std::fmt::Error),
}

impl PreviewError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Parse a `FACE=PATH` font registration.
pub fn parse_font_spec(spec: &str) -> Result<(FontId, PathBuf), PreviewError> {
    let (face, path) = spec
        .split_once('=')
        .ok_or_else(|| PreviewError::FontSpec(spec.to_string()))?;
    let font = FontId::from_name(face).ok_or_else(|| PreviewError::FontSpec(spec.to_string()))?;
    let path = path.trim();
    if path.is_empty() {
        return Err(PreviewError::FontSpec(spec.to_string()));
    }
    Ok((font, PathBuf::from(path)))
}

/// Read a font file from disk into `measurer`.
pub fn register_font_file(
    measurer: &mut TtfMeasurer,
    font: FontId,
    path: &Path,
) -> Result<(), PreviewError> {
    let data = std::fs::read(path).map_err(|err| PreviewError::io(path, err))?;
    measurer.register_face(font, data)?;
    log::info!("loaded {} from {}", font.name(), path.display());
    Ok(())
}

/// `PageCanvas` producing one standalone SVG document per page.
#[derive(Debug)]
pub struct SvgCanvas {
    geometry: PageGeometry,
    current: String,
    documents: Vec<String>,
}

impl SvgCanvas {
    pub fn new(geometry: PageGeometry) -> Self {
        Self {
            geometry,
            current: String::new(),
            documents: Vec::new(),
        }
    }

    /// Finished SVG documents in page order.
    pub fn into_documents(self) -> Vec<String> {
        self.documents
    }
}

fn font_family(font: FontId) -> &'static str {
    match font {
        FontId::NaskhRegular | FontId::NaskhBold => "'Noto Naskh Arabic', 'Amiri', serif",
        FontId::SansRegular | FontId::SansBold => "'Helvetica', 'Arial', sans-serif",
    }
}

fn hex(color: Color) -> String {
    color.to_hex()
}

impl PageCanvas for SvgCanvas {
    type Error = std::fmt::Error;

    fn begin_page(&mut self, page_number: usize) -> Result<(), Self::Error> {
        let g = self.geometry;
        self.current.clear();
        writeln!(
            self.current,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}mm" height="{h}mm" viewBox="0 0 {w} {h}" data-page="{page_number}">"#,
            w = g.width,
            h = g.height,
        )?;
        writeln!(
            self.current,
            r##"<rect x="0" y="0" width="{}" height="{}" fill="#ffffff"/>"##,
            g.width, g.height
        )
    }

    fn fill_rect(&mut self, rect: &RectCommand) -> Result<(), Self::Error> {
        writeln!(
            self.current,
            r#"<rect x="{:.2}" y="{:.2}" width="{:.2}" height="{:.2}" fill="{}"/>"#,
            rect.x,
            rect.y,
            rect.width,
            rect.height,
            hex(rect.color)
        )
    }

    fn stroke_rect(&mut self, rect: &RectCommand) -> Result<(), Self::Error> {
        writeln!(
            self.current,
            r#"<rect x="{:.2}" y="{:.2}" width="{:.2}" height="{:.2}" fill="none" stroke="{}" stroke-width="{:.2}"/>"#,
            rect.x,
            rect.y,
            rect.width,
            rect.height,
            hex(rect.color),
            rect.stroke_width
        )
    }

    fn circle(&mut self, circle: &CircleCommand) -> Result<(), Self::Error> {
        let stroke = match circle.stroke {
            Some(color) => format!(
                r#" stroke="{}" stroke-width="{:.2}""#,
                hex(color),
                circle.stroke_width
            ),
            None => String::new(),
        };
        writeln!(
            self.current,
            r#"<circle cx="{:.2}" cy="{:.2}" r="{:.2}" fill="{}"{}/>"#,
            circle.cx,
            circle.cy,
            circle.radius,
            hex(circle.fill),
            stroke
        )
    }

    fn text_run(&mut self, text: &TextCommand) -> Result<(), Self::Error> {
        // Text is already in display order; stop the viewer from reordering it.
        let weight = if text.font.is_bold() { "bold" } else { "normal" };
        writeln!(
            self.current,
            r#"<text x="{:.2}" y="{:.2}" font-family="{}" font-size="{:.2}" font-weight="{}" fill="{}" textLength="{:.2}" lengthAdjust="spacingAndGlyphs" direction="ltr" unicode-bidi="bidi-override" xml:space="preserve">{}</text>"#,
            text.x,
            text.baseline_y,
            font_family(text.font),
            text.size_pt * PT_TO_UNITS,
            weight,
            hex(text.color),
            text.width.max(0.01),
            escape(text.text.as_str())
        )
    }

    fn end_page(&mut self) -> Result<(), Self::Error> {
        self.current.push_str("</svg>\n");
        self.documents.push(std::mem::take(&mut self.current));
        Ok(())
    }
}

/// Render pages to SVG documents.
pub fn pages_to_svg(pages: &[RenderPage], geometry: PageGeometry) -> Result<Vec<String>, PreviewError> {
    let mut canvas = SvgCanvas::new(geometry);
    replay_pages(pages, &mut canvas)?;
    Ok(canvas.into_documents())
}

#[derive(Serialize)]
struct PagesPayload<'a> {
    mode: LangMode,
    page_width: f32,
    page_height: f32,
    page_count: usize,
    pages: &'a [RenderPage],
}

/// Pretty JSON dump of the pages with page geometry.
pub fn pages_to_json(
    pages: &[RenderPage],
    mode: LangMode,
    geometry: PageGeometry,
) -> Result<String, PreviewError> {
    let payload = PagesPayload {
        mode,
        page_width: geometry.width,
        page_height: geometry.height,
        page_count: pages.len(),
        pages,
    };
    Ok(serde_json::to_string_pretty(&payload)?)
}

/// Output path of each page: `out` itself for a single page, otherwise
/// `<stem>-<n>.<ext>` next to it.
pub fn page_output_paths(out: &Path, page_count: usize) -> Vec<PathBuf> {
    if page_count <= 1 {
        return vec![out.to_path_buf()];
    }
    let stem = out
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "page".to_string());
    let ext = out
        .extension()
        .map(|e| e.to_string_lossy().into_owned())
        .unwrap_or_else(|| "svg".to_string());
    (1..=page_count)
        .map(|n| out.with_file_name(format!("{stem}-{n}.{ext}")))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use reading_report::parse;
    use reading_report_render::{LayoutConfig, LayoutEngine, ReportContext};

    fn render(raw: &str, mode: LangMode) -> Vec<RenderPage> {
        let engine = LayoutEngine::new(LayoutConfig::default()).unwrap();
        engine.render(&parse(raw, mode), mode, &ReportContext::new("Sam & Co", "2024-05-01"))
    }

    #[test]
    fn svg_has_one_document_per_page() {
        let pages = render("Fluency|42 wpm\nOverall Level|High", LangMode::English);
        let docs = pages_to_svg(&pages, PageGeometry::A4).unwrap();
        assert_eq!(docs.len(), pages.len());
        let doc = &docs[0];
        assert!(doc.starts_with("<svg"));
        assert!(doc.trim_end().ends_with("</svg>"));
        assert!(doc.contains("<circle"));
        assert!(doc.contains("Sam &amp; Co"));
        assert!(doc.contains(r##"fill="#daa520""##));
    }

    #[test]
    fn text_runs_are_xml_escaped() {
        let mut canvas = SvgCanvas::new(PageGeometry::A4);
        canvas.begin_page(1).unwrap();
        canvas
            .text_run(&TextCommand {
                x: 10.0,
                baseline_y: 20.0,
                width: 30.0,
                text: r#"<b> "Tom" & 'Jo'"#.to_string(),
                align: reading_report_render::TextAlign::Left,
                font: FontId::SansRegular,
                size_pt: 11.0,
                color: Color::BLACK,
            })
            .unwrap();
        canvas.end_page().unwrap();
        let doc = &canvas.into_documents()[0];
        assert!(doc.contains("&lt;b&gt; &quot;Tom&quot; &amp; &apos;Jo&apos;"));
        assert!(!doc.contains("<b>"));
    }

    #[test]
    fn json_dump_carries_geometry_and_commands() {
        let pages = render("", LangMode::Arabic);
        let json = pages_to_json(&pages, LangMode::Arabic, PageGeometry::A4).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["mode"], "arabic");
        assert_eq!(value["page_count"], 1);
        assert_eq!(value["pages"][0]["page_number"], 1);
        assert!(value["pages"][0]["content_commands"]
            .as_array()
            .unwrap()
            .iter()
            .any(|cmd| cmd["kind"] == "circle"));
    }

    #[test]
    fn font_specs_parse() {
        let (font, path) = parse_font_spec("naskh-bold=/fonts/Amiri-Bold.ttf").unwrap();
        assert_eq!(font, FontId::NaskhBold);
        assert_eq!(path, PathBuf::from("/fonts/Amiri-Bold.ttf"));
        assert!(matches!(parse_font_spec("serif=x.ttf"), Err(PreviewError::FontSpec(_))));
        assert!(matches!(parse_font_spec("sans"), Err(PreviewError::FontSpec(_))));
        assert!(matches!(parse_font_spec("sans="), Err(PreviewError::FontSpec(_))));
    }

    #[test]
    fn missing_font_file_is_an_io_error() {
        let mut measurer = TtfMeasurer::new();
        let err = register_font_file(
            &mut measurer,
            FontId::SansRegular,
            Path::new("/definitely/not/here.ttf"),
        )
        .unwrap_err();
        assert!(matches!(err, PreviewError::Io { .. }));
    }

    #[test]
    fn multi_page_outputs_are_numbered() {
        let paths = page_output_paths(Path::new("out/report.svg"), 2);
        assert_eq!(
            paths,
            vec![PathBuf::from("out/report-1.svg"), PathBuf::from("out/report-2.svg")]
        );
        assert_eq!(
            page_output_paths(Path::new("report.svg"), 1),
            vec![PathBuf::from("report.svg")]
        );
    }
}
