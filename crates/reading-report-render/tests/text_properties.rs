use proptest::prelude::*;

use reading_report_render::{shape, try_shape, FontId, LineWrapper, TextMeasurer};

struct FixedAdvance;

impl TextMeasurer for FixedAdvance {
    fn measure_text(&self, text: &str, _font: FontId, _size_pt: f32) -> f32 {
        text.chars().count() as f32
    }
}

fn logical_words(lines: &[reading_report_render::WrappedLine]) -> Vec<String> {
    lines
        .iter()
        .flat_map(|line| line.logical.split_whitespace().map(str::to_string))
        .collect()
}

/// Property: shaping left-to-right text is the identity.
#[test]
fn proptest_ltr_shaping_is_identity() {
    proptest!(|(text in "\\PC{0,120}")| {
        prop_assert_eq!(shape(&text, false), text);
    });
}

/// Property: shaping never fails, and falls back to the input when it cannot shape.
#[test]
fn proptest_rtl_shaping_is_total() {
    proptest!(|(text in "\\PC{0,80}")| {
        let shaped = shape(&text, true);
        if try_shape(&text, true).is_err() {
            prop_assert_eq!(shaped, text);
        }
    });
}

/// Property: wrapping keeps every word in order and respects the width limit
/// except for lone words wider than it.
#[test]
fn proptest_wrap_preserves_words_and_width() {
    proptest!(|(words in prop::collection::vec("[a-z]{1,12}", 0..40), max_width in 5.0f32..60.0)| {
        let text = words.join(" ");
        let lines = LineWrapper::new(&FixedAdvance).wrap_measured(
            &text,
            max_width,
            FontId::SansRegular,
            11.0,
            false,
        );
        prop_assert_eq!(logical_words(&lines), words);
        for line in &lines {
            let single_word = !line.logical.contains(' ');
            prop_assert!(line.width <= max_width || single_word, "{:?} wider than {}", line, max_width);
            prop_assert_eq!(&line.display, &line.logical);
        }
    });
}

/// Property: the same guarantees hold for shaped Arabic lines.
#[test]
fn proptest_rtl_wrap_preserves_words_and_width() {
    proptest!(|(words in prop::collection::vec("[\u{0628}\u{062A}\u{0633}\u{0644}\u{0627}\u{062F}\u{0645}]{1,8}", 0..30), max_width in 4.0f32..40.0)| {
        let text = words.join(" ");
        let lines = LineWrapper::new(&FixedAdvance).wrap_measured(
            &text,
            max_width,
            FontId::NaskhRegular,
            11.0,
            true,
        );
        prop_assert_eq!(logical_words(&lines), words);
        for line in &lines {
            let single_word = !line.logical.contains(' ');
            prop_assert!(line.width <= max_width || single_word);
        }
    });
}

#[test]
fn wrap_of_whitespace_is_empty() {
    let lines = LineWrapper::new(&FixedAdvance).wrap("  \n\t ", 10.0, FontId::SansRegular, 11.0, false);
    assert!(lines.is_empty());
}
