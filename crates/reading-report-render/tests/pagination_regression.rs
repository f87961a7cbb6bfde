use reading_report::{AssessmentRecord, LangMode, NoteSection};
use reading_report_render::{
    DrawCommand, FontId, LayoutConfig, LayoutEngine, RenderPage, ReportContext, TextMeasurer,
};
use std::sync::Arc;

/// One page unit per character, independent of font and size.
struct FixedAdvance;

impl TextMeasurer for FixedAdvance {
    fn measure_text(&self, text: &str, _font: FontId, _size_pt: f32) -> f32 {
        text.chars().count() as f32
    }
}

fn build_engine() -> LayoutEngine {
    LayoutEngine::new(LayoutConfig::default())
        .expect("default config is valid")
        .with_text_measurer(Arc::new(FixedAdvance))
}

fn section(name: &str, bullets: Vec<String>) -> NoteSection {
    NoteSection {
        name: name.to_string(),
        bullets,
    }
}

/// Index of the first page whose content has a text run starting with `prefix`.
fn page_of(pages: &[RenderPage], prefix: &str) -> Option<usize> {
    pages
        .iter()
        .position(|page| page.content_texts().any(|t| t.text.starts_with(prefix)))
}

fn pages_with(pages: &[RenderPage], needle: &str) -> Vec<usize> {
    pages
        .iter()
        .enumerate()
        .filter(|(_, page)| page.content_texts().any(|t| t.text.contains(needle)))
        .map(|(idx, _)| idx)
        .collect()
}

#[test]
fn long_section_breaks_between_bullets_only() {
    // Each bullet wraps to exactly two lines in the 135-unit note column.
    let pad = "x".repeat(100);
    let bullets = (0..40)
        .map(|k| format!("first{k:02}{pad} second{k:02}{pad}"))
        .collect();
    let record = AssessmentRecord::new(
        "High",
        Vec::new(),
        vec![section("Recommendations", bullets)],
    );

    let pages = build_engine().render(&record, LangMode::English, &ReportContext::default());
    assert!(pages.len() >= 3, "expected a multi-page section, got {}", pages.len());

    let first_bullet_page = page_of(&pages, "- first00").expect("first bullet placed");
    let last_bullet_page = page_of(&pages, "- first39").expect("last bullet placed");
    assert_eq!(first_bullet_page, 0, "section starts on the first page");
    assert!(last_bullet_page > first_bullet_page);

    for k in 0..40 {
        let head = page_of(&pages, &format!("- first{k:02}"));
        let tail = page_of(&pages, &format!("second{k:02}"));
        assert!(head.is_some());
        assert_eq!(head, tail, "bullet {k} split across pages");
    }

    // The title is repeated on each page the section occupies.
    let title_pages = pages_with(&pages, "Recommendations");
    assert_eq!(title_pages.len(), last_bullet_page - first_bullet_page + 1);
}

#[test]
fn row_that_fits_a_fresh_page_moves_whole() {
    let record = AssessmentRecord::new(
        "Medium",
        Vec::new(),
        vec![
            section(
                "Error Analysis",
                (0..15).map(|k| format!("err{k:02}")).collect(),
            ),
            section(
                "Recommendations",
                (0..20).map(|k| format!("rec{k:02}")).collect(),
            ),
        ],
    );

    let pages = build_engine().render(&record, LangMode::English, &ReportContext::default());
    assert_eq!(pages.len(), 2);
    assert_eq!(pages_with(&pages, "Error Analysis"), vec![0]);
    assert_eq!(pages_with(&pages, "Recommendations"), vec![1]);
    for k in 0..20 {
        assert_eq!(pages_with(&pages, &format!("rec{k:02}")), vec![1]);
    }

    // The moved row starts at the top margin of the new page.
    let row_top = pages[1]
        .content_commands
        .iter()
        .find_map(|cmd| match cmd {
            DrawCommand::FillRect(rect) => Some(rect.y),
            _ => None,
        })
        .expect("note row on second page");
    assert_eq!(row_top, LayoutConfig::default().geometry.margin_top);
}

#[test]
fn row_fitting_remaining_space_stays_on_page() {
    let record = AssessmentRecord::new(
        "Medium",
        Vec::new(),
        vec![section(
            "Performance Overview",
            (0..10).map(|k| format!("ok{k}")).collect(),
        )],
    );
    let pages = build_engine().render(&record, LangMode::Arabic, &ReportContext::default());
    assert_eq!(pages.len(), 1);
}

#[test]
fn oversized_single_bullet_overflows_alone() {
    // 60 words of 100 characters: one line per word, far taller than a page.
    let huge = vec!["y".repeat(100); 60].join(" ");
    let record = AssessmentRecord::new(
        "Low",
        Vec::new(),
        vec![section("Recommendations", vec!["short".to_string(), huge])],
    );
    let pages = build_engine().render(&record, LangMode::English, &ReportContext::default());
    let short_page = page_of(&pages, "- short").expect("short bullet placed");
    let huge_page = page_of(&pages, "- yyy").expect("huge bullet placed");
    assert!(huge_page > short_page);
    assert_eq!(huge_page, pages.len() - 1);
}

#[test]
fn pages_are_numbered_in_order() {
    let bullets = (0..120).map(|k| format!("note {k}")).collect();
    let record = AssessmentRecord::new("High", Vec::new(), vec![section("Recommendations", bullets)]);
    let pages = build_engine().render(&record, LangMode::English, &ReportContext::default());
    assert!(pages.len() > 1);
    for (idx, page) in pages.iter().enumerate() {
        assert_eq!(page.page_number, idx + 1);
        assert!(!page.content_commands.is_empty());
    }
}
