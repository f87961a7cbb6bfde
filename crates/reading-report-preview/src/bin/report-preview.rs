//! Parse a saved model answer and write a preview of the laid-out report.
//!
//! ```text
//! report-preview answer.txt --mode ar --name "Sara" --out report.svg
//! report-preview answer.txt --format json --out pages.json
//! ```

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, ValueEnum};

use reading_report::{LangMode, ParseGrammar, RecordParser};
use reading_report_preview::{
    pages_to_json, pages_to_svg, page_output_paths, parse_font_spec, register_font_file,
    PreviewError,
};
use reading_report_render::{LayoutConfig, LayoutEngine, ReportContext, ReportStrings, TtfMeasurer};

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// One SVG document per page
    Svg,
    /// Draw commands as JSON
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "report-preview", version, about = "Lay out a reading assessment report", long_about = None)]
struct Args {
    /// Raw model answer (UTF-8 text)
    input: PathBuf,

    /// Report language tag (ar, en, en-US, ...)
    #[arg(long, default_value = "en", value_parser = parse_mode)]
    mode: LangMode,

    /// Student name shown in the info table
    #[arg(long)]
    name: Option<String>,

    /// Assessment date; defaults to today
    #[arg(long)]
    date: Option<String>,

    /// File holding the reference text the student read
    #[arg(long)]
    reference: Option<PathBuf>,

    /// Font face registration, FACE=PATH (repeatable)
    #[arg(long = "font", value_name = "FACE=PATH")]
    fonts: Vec<String>,

    /// JSON parse grammar replacing the mode preset
    #[arg(long)]
    grammar: Option<PathBuf>,

    /// Layout configuration as JSON
    #[arg(long)]
    layout: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Svg)]
    format: OutputFormat,

    /// Output path; multi-page SVG output is numbered next to it
    #[arg(long, short)]
    out: PathBuf,
}

fn parse_mode(tag: &str) -> Result<LangMode, String> {
    LangMode::from_tag(tag).ok_or_else(|| format!("unsupported language tag '{tag}'"))
}

fn read_text(path: &Path) -> Result<String, PreviewError> {
    std::fs::read_to_string(path).map_err(|err| PreviewError::io(path, err))
}

fn write_text(path: &Path, contents: &str) -> Result<(), PreviewError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|err| PreviewError::io(parent, err))?;
    }
    std::fs::write(path, contents).map_err(|err| PreviewError::io(path, err))
}

fn run(args: Args) -> Result<(), PreviewError> {
    let raw = read_text(&args.input)?;

    let parser = match &args.grammar {
        Some(path) => RecordParser::new(ParseGrammar::from_json(&read_text(path)?)?),
        None => RecordParser::for_mode(args.mode),
    };
    let record = parser.parse(&raw);
    log::info!(
        "parsed {} scores, {} note sections, level '{}'",
        record.scores().len(),
        record.notes().len(),
        record.overall_level()
    );

    let cfg = match &args.layout {
        Some(path) => serde_json::from_str::<LayoutConfig>(&read_text(path)?)?,
        None => LayoutConfig::default(),
    };
    let mut engine = LayoutEngine::new(cfg)?;
    if !args.fonts.is_empty() {
        let mut measurer = TtfMeasurer::new();
        for spec in &args.fonts {
            let (font, path) = parse_font_spec(spec)?;
            register_font_file(&mut measurer, font, &path)?;
        }
        engine = engine.with_text_measurer(Arc::new(measurer));
    }

    let strings = ReportStrings::for_mode(args.mode);
    let name = args
        .name
        .unwrap_or_else(|| strings.default_student_name.to_string());
    let date = args
        .date
        .unwrap_or_else(|| chrono::Local::now().format("%Y-%m-%d").to_string());
    let mut ctx = ReportContext::new(name, date)
        .with_default_level(parser.grammar().default_level.clone());
    if let Some(path) = &args.reference {
        ctx = ctx.with_reference(read_text(path)?);
    }

    let pages = engine.render(&record, args.mode, &ctx);
    let geometry = engine.config().geometry;
    match args.format {
        OutputFormat::Json => {
            write_text(&args.out, &pages_to_json(&pages, args.mode, geometry)?)?;
            log::info!("wrote {} pages to {}", pages.len(), args.out.display());
        }
        OutputFormat::Svg => {
            let documents = pages_to_svg(&pages, geometry)?;
            for (path, doc) in page_output_paths(&args.out, documents.len())
                .iter()
                .zip(&documents)
            {
                write_text(path, doc)?;
                log::info!("wrote {}", path.display());
            }
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    match run(Args::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("report-preview: {err}");
            ExitCode::FAILURE
        }
    }
}
